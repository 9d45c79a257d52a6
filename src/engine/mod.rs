//! Concurrent pagination engine.
//!
//! Keeps a fixed number of page fetches in flight, streams each completed page
//! into the sink as soon as it arrives, and stops submitting new pages after the
//! first short page.
//!
//! # Concurrency model
//!
//! Every page fetch runs as its own tokio task and reports back over an mpsc
//! channel. The coordinator (the future returned by [`PaginationEngine::run`])
//! is the only owner of the run state: the in-flight map, the stop flag, the
//! next page index and the counters. It also is the only writer to the sink.
//! Fetches overlap; bookkeeping never does.
//!
//! # Termination
//!
//! There is no total-count API, so a page returning fewer than `page_size`
//! records is taken as the end of the data. Once that happens no new page is
//! submitted, but pages already in flight are drained and their records kept.
//! A short page that is not actually the last one (for example a transient
//! empty response) therefore truncates the export; nothing probes past it.

use std::collections::HashMap;
use std::io::Write;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::config::{Config, SearchFilters};
use crate::error::{FetchError, FetchErrorKind, Result};
use crate::fetcher::{PageFetcher, PageRequest};
use crate::format::format_entry;
use crate::sink::LineSink;
use crate::types::{Attribute, PageIndex, RunStats};


/// Upper bound on concurrent page fetches
pub const MAX_WORKER_COUNT: usize = 64;

/// A page fetch result delivered to the coordinator
type Completion = (PageIndex, std::result::Result<Vec<Attribute>, FetchError>);

/// Settings for one pagination run
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Records requested per page
    pub page_size: u32,
    /// Page fetches kept in flight
    pub worker_count: usize,
    /// Filters sent with every page
    pub filters: SearchFilters,
    /// Never request a page above this index
    pub max_pages: Option<u32>,
    /// Count a failed page as a short page
    pub stop_on_fetch_error: bool,
}

impl EngineConfig {
    /// Engine settings for exporting `type_attribute` under `config`
    pub fn from_config(config: &Config, type_attribute: &str) -> Self {
        Self {
            page_size: config.export.batch_size,
            worker_count: config.export.max_workers,
            filters: config.filters_for(type_attribute),
            max_pages: config.export.max_pages,
            stop_on_fetch_error: config.export.stop_on_fetch_error,
        }
    }
}

/// Drives concurrent page fetches for one export run
pub struct PaginationEngine {
    fetcher: Arc<dyn PageFetcher>,
    config: EngineConfig,
}

impl PaginationEngine {
    /// Create an engine over `fetcher`
    ///
    /// A zero `page_size` or `worker_count` is treated as 1; `worker_count` is
    /// capped at [`MAX_WORKER_COUNT`].
    pub fn new(fetcher: Arc<dyn PageFetcher>, mut config: EngineConfig) -> Self {
        config.page_size = config.page_size.max(1);
        config.worker_count = config.worker_count.clamp(1, MAX_WORKER_COUNT);
        Self { fetcher, config }
    }

    /// Settings in effect
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Fetch pages until a short page arrives and every in-flight page is drained
    ///
    /// Lines reach `sink` in completion order, not page order. Failed pages are
    /// logged and contribute nothing; they are never retried.
    ///
    /// # Errors
    ///
    /// Only a sink failure aborts the run. Outstanding fetches are aborted and
    /// the [`Error::Sink`](crate::Error::Sink) is returned.
    pub async fn run<W: Write>(&self, sink: &mut LineSink<W>) -> Result<RunStats> {
        // One send per in-flight task; worker_count is capped in new()
        let (tx, mut rx) = mpsc::channel::<Completion>(self.config.worker_count);
        let mut run = RunState {
            fetcher: Arc::clone(&self.fetcher),
            filters: Arc::new(self.config.filters.clone()),
            limit: self.config.page_size,
            max_pages: self.config.max_pages,
            completions: tx,
            in_flight: HashMap::new(),
            next_page: PageIndex::FIRST,
            stop: false,
            stats: RunStats::default(),
        };

        tracing::debug!(
            type_attribute = %self.config.filters.type_attribute,
            page_size = self.config.page_size,
            workers = self.config.worker_count,
            "starting pagination"
        );

        for _ in 0..self.config.worker_count {
            if !run.submit_next() {
                break;
            }
        }

        while !run.in_flight.is_empty() {
            // Sole suspension point: wait for at least one fetch to resolve
            let Some(first) = rx.recv().await else {
                break;
            };
            let mut ready = vec![first];
            while let Ok(completion) = rx.try_recv() {
                ready.push(completion);
            }

            for (page, outcome) in ready {
                if let Err(e) = run.complete(page, outcome, sink, self.config.stop_on_fetch_error)
                {
                    run.abort_in_flight();
                    return Err(e);
                }
            }
        }

        tracing::debug!(
            pages = run.stats.pages_requested,
            failed = run.stats.pages_failed,
            entries = run.stats.total_entries,
            "pagination finished"
        );
        Ok(run.stats)
    }
}

/// Mutable state of one run, owned by the coordinator
struct RunState {
    fetcher: Arc<dyn PageFetcher>,
    filters: Arc<SearchFilters>,
    limit: u32,
    max_pages: Option<u32>,
    completions: mpsc::Sender<Completion>,
    in_flight: HashMap<PageIndex, JoinHandle<()>>,
    next_page: PageIndex,
    stop: bool,
    stats: RunStats,
}

impl RunState {
    /// Spawn a fetch for the next page index; false if the page cap forbids it
    fn submit_next(&mut self) -> bool {
        let page = self.next_page;
        if self.max_pages.is_some_and(|cap| page.get() > cap) {
            tracing::debug!(page = %page, "page cap reached, not submitting");
            return false;
        }

        let request = PageRequest {
            page,
            limit: self.limit,
            filters: Arc::clone(&self.filters),
        };
        let fetcher = Arc::clone(&self.fetcher);
        let tx = self.completions.clone();

        let handle = tokio::spawn(async move {
            let outcome = AssertUnwindSafe(fetcher.fetch_page(&request))
                .catch_unwind()
                .await
                .unwrap_or_else(|panic| {
                    Err(FetchError::new(
                        request.page,
                        FetchErrorKind::TaskFailed(panic_message(panic.as_ref())),
                    ))
                });
            // The receiver is gone only if the run was aborted
            tx.send((request.page, outcome)).await.ok();
        });

        self.in_flight.insert(page, handle);
        self.next_page = page.next();
        self.stats.pages_requested += 1;
        true
    }

    /// Handle one resolved page: write its entries, update the stop flag, refill
    fn complete<W: Write>(
        &mut self,
        page: PageIndex,
        outcome: std::result::Result<Vec<Attribute>, FetchError>,
        sink: &mut LineSink<W>,
        stop_on_fetch_error: bool,
    ) -> Result<()> {
        self.in_flight.remove(&page);

        let short = match outcome {
            Ok(records) => {
                let received = records.len();
                let mut written = 0u64;
                for record in &records {
                    match format_entry(record) {
                        Some(line) => {
                            sink.append(&line)?;
                            written += 1;
                        }
                        None => self.stats.records_skipped += 1,
                    }
                }
                self.stats.records_received += received as u64;
                self.stats.total_entries += written;
                tracing::debug!(page = %page, records = received, entries = written, "page done");
                received < self.limit as usize
            }
            Err(e) => {
                self.stats.pages_failed += 1;
                tracing::warn!(
                    page = %page,
                    error = %e,
                    error_code = e.kind.error_code(),
                    "page fetch failed, skipping"
                );
                stop_on_fetch_error
            }
        };

        if short && !self.stop {
            self.stop = true;
            tracing::debug!(
                page = %page,
                draining = self.in_flight.len(),
                "short page, no further pages will be requested"
            );
        }

        if !self.stop {
            self.submit_next();
        }
        Ok(())
    }

    fn abort_in_flight(&mut self) {
        for (_, handle) in self.in_flight.drain() {
            handle.abort();
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "fetch task panicked".to_string()
    }
}
