//! Shared test doubles for the pagination engine and exporter tests.

use std::collections::HashMap;
use std::io::Write;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::error::{FetchError, FetchErrorKind};
use crate::fetcher::{PageFetcher, PageRequest};
use crate::types::Attribute;

/// What a scripted page does when fetched
#[derive(Clone, Debug)]
pub(crate) enum PageOutcome {
    Records(Vec<Attribute>),
    Fail,
    Panic,
}

#[derive(Clone, Debug)]
struct PageScript {
    delay: Duration,
    outcome: PageOutcome,
}

/// [`PageFetcher`] that replays scripted pages and records what was asked for
///
/// Unscripted pages return `fallback_size` generated records (0 by default, i.e.
/// an empty, short page).
pub(crate) struct ScriptedFetcher {
    pages: HashMap<u32, PageScript>,
    fallback_size: usize,
    requested: Mutex<Vec<u32>>,
    types_seen: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    completed: AtomicUsize,
}

impl ScriptedFetcher {
    pub(crate) fn new() -> Self {
        Self {
            pages: HashMap::new(),
            fallback_size: 0,
            requested: Mutex::new(Vec::new()),
            types_seen: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            completed: AtomicUsize::new(0),
        }
    }

    /// Every unscripted page returns `size` records
    pub(crate) fn endless(size: usize) -> Self {
        Self {
            fallback_size: size,
            ..Self::new()
        }
    }

    pub(crate) fn page(self, page: u32, records: Vec<Attribute>) -> Self {
        self.script(page, Duration::ZERO, PageOutcome::Records(records))
    }

    pub(crate) fn delayed_page(self, page: u32, delay_ms: u64, records: Vec<Attribute>) -> Self {
        self.script(
            page,
            Duration::from_millis(delay_ms),
            PageOutcome::Records(records),
        )
    }

    pub(crate) fn failing_page(self, page: u32) -> Self {
        self.script(page, Duration::ZERO, PageOutcome::Fail)
    }

    pub(crate) fn panicking_page(self, page: u32) -> Self {
        self.script(page, Duration::ZERO, PageOutcome::Panic)
    }

    fn script(mut self, page: u32, delay: Duration, outcome: PageOutcome) -> Self {
        self.pages.insert(page, PageScript { delay, outcome });
        self
    }

    /// Pages fetched so far, sorted
    pub(crate) fn requested_pages(&self) -> Vec<u32> {
        let mut pages = self.requested.lock().unwrap().clone();
        pages.sort_unstable();
        pages
    }

    /// Attribute types seen across all requests, in request order
    pub(crate) fn types_seen(&self) -> Vec<String> {
        self.types_seen.lock().unwrap().clone()
    }

    /// Fetches that ran to the end (aborted ones never do)
    pub(crate) fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    /// Highest number of fetches observed running at once
    pub(crate) fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

struct InFlightGuard<'a>(&'a AtomicUsize);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl PageFetcher for ScriptedFetcher {
    async fn fetch_page(
        &self,
        request: &PageRequest,
    ) -> std::result::Result<Vec<Attribute>, FetchError> {
        let page = request.page.get();
        self.requested.lock().unwrap().push(page);
        self.types_seen
            .lock()
            .unwrap()
            .push(request.filters.type_attribute.clone());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlightGuard(&self.in_flight);

        let script = self.pages.get(&page).cloned().unwrap_or_else(|| PageScript {
            delay: Duration::ZERO,
            outcome: PageOutcome::Records(full_page(page, self.fallback_size)),
        });

        if !script.delay.is_zero() {
            tokio::time::sleep(script.delay).await;
        } else {
            tokio::task::yield_now().await;
        }

        self.completed.fetch_add(1, Ordering::SeqCst);
        match script.outcome {
            PageOutcome::Records(records) => Ok(records),
            PageOutcome::Fail => Err(FetchError::new(
                request.page,
                FetchErrorKind::Transport("connection reset by peer".into()),
            )),
            PageOutcome::Panic => panic!("scripted panic on page {page}"),
        }
    }
}

/// `size` records whose values encode their page: `p<page>-<i>`, event id = page
pub(crate) fn full_page(page: u32, size: usize) -> Vec<Attribute> {
    (0..size)
        .map(|i| Attribute::new(format!("p{page}-{i}"), u64::from(page)))
        .collect()
}

/// Lines written to an in-memory sink, sorted
pub(crate) fn sorted_lines(bytes: &[u8]) -> Vec<String> {
    let mut lines: Vec<String> = String::from_utf8_lossy(bytes)
        .lines()
        .map(str::to_string)
        .collect();
    lines.sort();
    lines
}

/// Writer that accepts `budget` bytes, then fails every write
pub(crate) struct FailingWriter {
    pub(crate) budget: usize,
}

impl Write for FailingWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        if self.budget == 0 {
            return Err(std::io::Error::other("device full"));
        }
        let n = buf.len().min(self.budget);
        self.budget -= n;
        Ok(n)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
