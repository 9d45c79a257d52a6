//! Export runs, one output file per attribute type.
//!
//! [`Exporter::export`] wires a [`PaginationEngine`] to a file sink for a single
//! target. [`Exporter::export_all`] is the batch driver: it runs the targets one
//! after another and keeps going when one of them fails.

use std::sync::Arc;
use std::time::Instant;

use crate::config::{Config, ExportTarget};
use crate::engine::{EngineConfig, PaginationEngine};
use crate::error::Result;
use crate::fetcher::PageFetcher;
use crate::sink::LineSink;
use crate::types::ExportSummary;

/// Output name that selects every configured batch target
pub const ALL_TARGETS: &str = "all";

/// Runs exports against a shared page fetcher
pub struct Exporter {
    fetcher: Arc<dyn PageFetcher>,
    config: Arc<Config>,
}

impl Exporter {
    /// Create an exporter; `config` is expected to be validated already
    pub fn new(fetcher: Arc<dyn PageFetcher>, config: Arc<Config>) -> Self {
        Self { fetcher, config }
    }

    /// Export one target into `<output_dir>/<output_name>`
    ///
    /// The file is truncated first. On a sink failure the partially written file
    /// is left in place.
    pub async fn export(&self, target: &ExportTarget) -> Result<ExportSummary> {
        let output = self.config.export.output_dir.join(&target.output_name);
        tracing::info!(
            type_attribute = %target.type_attribute,
            output = %output.display(),
            workers = self.config.export.max_workers,
            batch_size = self.config.export.batch_size,
            "starting export"
        );

        let started = Instant::now();
        let mut sink = LineSink::create(&output)?;
        let engine = PaginationEngine::new(
            Arc::clone(&self.fetcher),
            EngineConfig::from_config(&self.config, &target.type_attribute),
        );
        let stats = engine.run(&mut sink).await?;
        sink.finish()?;

        if stats.pages_failed > 0 {
            tracing::warn!(
                type_attribute = %target.type_attribute,
                failed_pages = stats.pages_failed,
                "some pages could not be fetched; output may be incomplete"
            );
        }
        tracing::info!(
            type_attribute = %target.type_attribute,
            output = %output.display(),
            entries = stats.total_entries,
            pages = stats.pages_requested,
            "export finished"
        );

        Ok(ExportSummary {
            target: target.clone(),
            output,
            stats,
            elapsed: started.elapsed(),
        })
    }

    /// Export every target in order, one at a time
    ///
    /// A failing target is logged and does not prevent the remaining ones from
    /// running. Results come back in the order of `targets`.
    pub async fn export_all(
        &self,
        targets: &[ExportTarget],
    ) -> Vec<(ExportTarget, Result<ExportSummary>)> {
        tracing::info!(targets = targets.len(), "starting batch export");

        let mut results = Vec::with_capacity(targets.len());
        for target in targets {
            let result = self.export(target).await;
            if let Err(e) = &result {
                tracing::error!(
                    type_attribute = %target.type_attribute,
                    output = %target.output_name,
                    error = %e,
                    error_code = e.error_code(),
                    "export failed, continuing with next target"
                );
            }
            results.push((target.clone(), result));
        }
        results
    }
}
