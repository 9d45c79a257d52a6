//! Test configuration helpers: `.env` credentials and temp-dir backed configs

use misp_ioc_export::{ApiConfig, Config};
use std::path::Path;
use std::time::Duration;

/// Error type for test configuration
#[derive(Debug)]
pub struct ConfigError(pub String);

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Config error: {}", self.0)
    }
}

impl std::error::Error for ConfigError {}

/// Load MISP connection settings from the environment (or `.env`)
///
/// Required environment variables:
/// - `MISP_URL` - Base URL of the instance
/// - `MISP_API_KEY` - Automation key
///
/// Optional environment variables:
/// - `MISP_VERIFY_TLS` - "false" to accept self-signed certificates (default: true)
pub fn load_api_config() -> Result<ApiConfig, ConfigError> {
    dotenvy::dotenv().ok();

    let url = std::env::var("MISP_URL")
        .map_err(|_| ConfigError("MISP_URL not set in environment".to_string()))?;
    let api_key = std::env::var("MISP_API_KEY")
        .map_err(|_| ConfigError("MISP_API_KEY not set in environment".to_string()))?;
    let verify_tls = std::env::var("MISP_VERIFY_TLS")
        .map(|v| v != "false")
        .unwrap_or(true);

    Ok(ApiConfig {
        url,
        api_key,
        verify_tls,
        timeout: Duration::from_secs(120),
    })
}

/// Whether live MISP credentials are available
pub fn has_live_credentials() -> bool {
    load_api_config().is_ok()
}

/// Config pointed at `url` that writes into `output_dir`
pub fn config_for(url: &str, output_dir: &Path) -> Config {
    let mut config = Config::default();
    config.api.url = url.to_string();
    config.api.api_key = MOCK_API_KEY.to_string();
    config.api.timeout = Duration::from_secs(5);
    config.export.output_dir = output_dir.to_path_buf();
    config
}

/// Key the mock server expects in the `Authorization` header
pub const MOCK_API_KEY: &str = "mock-automation-key";
