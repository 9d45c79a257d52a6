//! Configuration types for misp-ioc-export

use serde::{Deserialize, Serialize};
use std::{path::Path, path::PathBuf, time::Duration};

use crate::engine::MAX_WORKER_COUNT;
use crate::error::{Error, Result};

/// MISP API connection settings
#[derive(Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the MISP instance (e.g. "https://misp.example.org/")
    #[serde(default)]
    pub url: String,

    /// Automation key, sent verbatim in the `Authorization` header
    #[serde(default)]
    pub api_key: String,

    /// Verify the server's TLS certificate (default: true)
    ///
    /// Self-hosted MISP instances frequently run with self-signed certificates;
    /// set to false to accept them.
    #[serde(default = "default_true")]
    pub verify_tls: bool,

    /// Per-request timeout (default: 300 seconds)
    ///
    /// Large pages can take minutes to render server-side.
    #[serde(default = "default_request_timeout", with = "duration_serde")]
    pub timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            api_key: String::new(),
            verify_tls: true,
            timeout: default_request_timeout(),
        }
    }
}

// Keep the automation key out of logs and panic messages
impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("url", &self.url)
            .field("api_key", &"<redacted>")
            .field("verify_tls", &self.verify_tls)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Attribute search filters sent with every page request
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchFilters {
    /// MISP attribute type (default: "sha256")
    #[serde(default = "default_type_attribute")]
    pub type_attribute: String,

    /// Only attributes flagged for IDS use (default: true)
    #[serde(default = "default_true")]
    pub to_ids: bool,

    /// Tag the attributes must carry (default: "NCSA", None = any tag)
    #[serde(default = "default_tags")]
    pub tags: Option<String>,

    /// Recency window on the publish timestamp (default: "90d", None = no window)
    #[serde(default = "default_publish_timestamp")]
    pub publish_timestamp: Option<String>,
}

impl Default for SearchFilters {
    fn default() -> Self {
        Self {
            type_attribute: default_type_attribute(),
            to_ids: true,
            tags: default_tags(),
            publish_timestamp: default_publish_timestamp(),
        }
    }
}

/// Pagination and output settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Records requested per page (default: 1000)
    ///
    /// Larger pages mean fewer calls but higher memory use per page and a greater
    /// risk of server-side timeouts. 1000 works well for most instances; 2000-5000
    /// can be faster on well-provisioned servers.
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,

    /// Number of page fetches kept in flight (default: 5, at most 64)
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,

    /// Highest page index that may ever be requested (None = unbounded)
    ///
    /// Without a cap, a server that never returns a short page keeps the export
    /// paging forever.
    #[serde(default)]
    pub max_pages: Option<u32>,

    /// Treat a failed page as the end of the data (default: true)
    ///
    /// When false, a failed page contributes nothing but its slot is refilled and
    /// paging continues until an actual short page arrives.
    #[serde(default = "default_true")]
    pub stop_on_fetch_error: bool,

    /// Directory the output files are written to (default: ".")
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            max_workers: default_max_workers(),
            max_pages: None,
            stop_on_fetch_error: true,
            output_dir: default_output_dir(),
        }
    }
}

/// One `(output file, attribute type)` pair of a batch export
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportTarget {
    /// Output file name, relative to the output directory
    pub output_name: String,
    /// MISP attribute type exported into it
    pub type_attribute: String,
}

impl ExportTarget {
    /// Create a new target
    pub fn new(output_name: impl Into<String>, type_attribute: impl Into<String>) -> Self {
        Self {
            output_name: output_name.into(),
            type_attribute: type_attribute.into(),
        }
    }
}

/// Main configuration for the exporter
///
/// Fields are organized into sub-configs:
/// - [`api`](ApiConfig): endpoint, credential, TLS, timeout
/// - [`export`](ExportConfig): page size, worker count, output directory (flattened)
/// - [`filters`](SearchFilters): attribute search filters
/// - `batch_targets`: the pairs exported when "all" is requested
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// MISP connection settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Pagination and output settings
    #[serde(flatten)]
    pub export: ExportConfig,

    /// Attribute search filters; `type_attribute` is replaced per target
    #[serde(default)]
    pub filters: SearchFilters,

    /// Targets exported in batch mode
    #[serde(default = "default_batch_targets")]
    pub batch_targets: Vec<ExportTarget>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            export: ExportConfig::default(),
            filters: SearchFilters::default(),
            batch_targets: default_batch_targets(),
        }
    }
}

impl Config {
    /// Load a configuration from a JSON file
    ///
    /// Missing fields take their defaults. The result is not validated; call
    /// [`Config::validate`] once command-line overrides have been applied.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| Error::Config {
            message: format!("failed to read {}: {}", path.display(), e),
            key: None,
        })?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Check that the configuration can drive an export
    pub fn validate(&self) -> Result<()> {
        if self.api.url.trim().is_empty() {
            return Err(Error::config("api.url", "MISP URL must be set"));
        }
        let url = url::Url::parse(&self.api.url)
            .map_err(|e| Error::config("api.url", format!("invalid MISP URL: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::config(
                "api.url",
                format!("unsupported URL scheme '{}'", url.scheme()),
            ));
        }
        if self.api.api_key.trim().is_empty() {
            return Err(Error::config("api.api_key", "MISP API key must be set"));
        }
        if self.export.batch_size == 0 {
            return Err(Error::config("batch_size", "must be at least 1"));
        }
        if !(1..=MAX_WORKER_COUNT).contains(&self.export.max_workers) {
            return Err(Error::config(
                "max_workers",
                format!("must be between 1 and {MAX_WORKER_COUNT}"),
            ));
        }
        if self.export.max_pages == Some(0) {
            return Err(Error::config("max_pages", "must be at least 1 when set"));
        }
        if self.filters.type_attribute.trim().is_empty() {
            return Err(Error::config(
                "filters.type_attribute",
                "attribute type must not be empty",
            ));
        }
        if let Some(target) = self
            .batch_targets
            .iter()
            .find(|t| t.output_name.trim().is_empty() || t.type_attribute.trim().is_empty())
        {
            return Err(Error::config(
                "batch_targets",
                format!("incomplete batch target {target:?}"),
            ));
        }
        Ok(())
    }

    /// Filters for one attribute type, inheriting everything else
    pub fn filters_for(&self, type_attribute: &str) -> SearchFilters {
        SearchFilters {
            type_attribute: type_attribute.to_string(),
            ..self.filters.clone()
        }
    }
}

// Default value functions
fn default_true() -> bool {
    true
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(300) // 5 minutes
}

fn default_type_attribute() -> String {
    "sha256".into()
}

fn default_tags() -> Option<String> {
    Some("NCSA".into())
}

fn default_publish_timestamp() -> Option<String> {
    Some("90d".into())
}

fn default_batch_size() -> u32 {
    1000
}

fn default_max_workers() -> usize {
    5
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_batch_targets() -> Vec<ExportTarget> {
    vec![
        ExportTarget::new("misp_ip-src", "ip-src"),
        ExportTarget::new("misp_ip-dst", "ip-dst"),
        ExportTarget::new("misp_sha256", "sha256"),
        ExportTarget::new("misp_domain", "domain"),
    ]
}

// Duration serialization helper
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
