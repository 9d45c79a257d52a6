//! # misp-ioc-export
//!
//! Export MISP indicators of compromise into Wazuh CDB lists.
//!
//! Attributes are pulled from MISP's paginated `attributes/restSearch` API by a
//! bounded pool of concurrent page fetches and streamed, as they arrive, into a
//! `value:Event_<id>` list file that Wazuh rules can match against.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use misp_ioc_export::{Config, ExportTarget, Exporter, MispClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut config = Config::default();
//!     config.api.url = "https://misp.example.org/".to_string();
//!     config.api.api_key = "YOUR-AUTOMATION-KEY".to_string();
//!     config.validate()?;
//!
//!     let client = Arc::new(MispClient::new(&config.api)?);
//!     let exporter = Exporter::new(client, Arc::new(config));
//!
//!     let summary = exporter
//!         .export(&ExportTarget::new("misp_sha256", "sha256"))
//!         .await?;
//!     println!("wrote {} entries", summary.stats.total_entries);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Concurrent pagination engine
pub mod engine;
/// Error types
pub mod error;
/// Export runs and the batch driver
pub mod export;
/// Page fetching and the MISP client
pub mod fetcher;
/// CDB entry formatting
pub mod format;
/// Logging setup for the binary
pub mod logging;
/// Output sink
pub mod sink;
/// Core types
pub mod types;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
pub(crate) mod test_helpers;

// Re-export commonly used types
pub use config::{ApiConfig, Config, ExportConfig, ExportTarget, SearchFilters};
pub use engine::{EngineConfig, MAX_WORKER_COUNT, PaginationEngine};
pub use error::{Error, FetchError, FetchErrorKind, Result};
pub use export::{ALL_TARGETS, Exporter};
pub use fetcher::{MispClient, PageFetcher, PageRequest};
pub use format::format_entry;
pub use sink::LineSink;
pub use types::{Attribute, ExportSummary, PageIndex, RunStats};
