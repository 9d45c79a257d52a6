//! `misp-ioc-export`: write MISP attributes of one type (or every configured
//! type) into Wazuh CDB list files.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use misp_ioc_export::logging::init_logging;
use misp_ioc_export::{
    ALL_TARGETS, Config, Error, ExportSummary, ExportTarget, Exporter, MispClient, Result,
};

#[derive(Parser)]
#[command(name = "misp-ioc-export")]
#[command(about = "Export MISP indicators of compromise into Wazuh CDB lists")]
#[command(version)]
struct Cli {
    /// Output file name, or "all" to export every configured batch target
    #[arg(default_value = "misp_sha256")]
    output_file: String,

    /// MISP attribute type to export (default: the configured type, "sha256")
    #[arg(short = 't', long = "type")]
    type_attribute: Option<String>,

    /// Directory the list files are written to (created if missing)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Base URL of the MISP instance
    #[arg(long, env = "MISP_URL")]
    url: Option<String>,

    /// MISP automation key
    #[arg(long, env = "MISP_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Accept invalid or self-signed TLS certificates
    #[arg(long)]
    insecure: bool,

    /// Records requested per page
    #[arg(long)]
    batch_size: Option<u32>,

    /// Page fetches kept in flight
    #[arg(long)]
    workers: Option<usize>,

    /// Never request a page above this index
    #[arg(long)]
    max_pages: Option<u32>,

    /// Tag filter; pass an empty string to disable it
    #[arg(long)]
    tags: Option<String>,

    /// Publication window such as "90d"; pass an empty string to disable it
    #[arg(long)]
    published: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    /// Load the configuration file (if any) and layer the flags on top
    fn into_config(self) -> Result<(Config, String, Option<String>)> {
        let mut config = match &self.config {
            Some(path) => Config::from_file(path)?,
            None => Config::default(),
        };

        if let Some(url) = self.url {
            config.api.url = url;
        }
        if let Some(api_key) = self.api_key {
            config.api.api_key = api_key;
        }
        if self.insecure {
            config.api.verify_tls = false;
        }
        if let Some(batch_size) = self.batch_size {
            config.export.batch_size = batch_size;
        }
        if let Some(workers) = self.workers {
            config.export.max_workers = workers;
        }
        if let Some(max_pages) = self.max_pages {
            config.export.max_pages = Some(max_pages);
        }
        if let Some(dir) = self.output_dir {
            config.export.output_dir = dir;
        }
        if let Some(tags) = self.tags {
            config.filters.tags = non_empty(tags);
        }
        if let Some(window) = self.published {
            config.filters.publish_timestamp = non_empty(window);
        }

        Ok((config, self.output_file, self.type_attribute))
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            tracing::error!(error = %e, error_code = e.error_code(), "export aborted");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Returns whether every requested export succeeded
async fn run(cli: Cli) -> Result<bool> {
    let (config, output_file, type_attribute) = cli.into_config()?;
    config.validate()?;

    std::fs::create_dir_all(&config.export.output_dir).map_err(|e| Error::Sink {
        path: config.export.output_dir.clone(),
        source: e,
    })?;

    let client = Arc::new(MispClient::new(&config.api)?);
    let targets = if output_file == ALL_TARGETS {
        config.batch_targets.clone()
    } else {
        let type_attribute =
            type_attribute.unwrap_or_else(|| config.filters.type_attribute.clone());
        vec![ExportTarget::new(output_file, type_attribute)]
    };

    let exporter = Exporter::new(client, Arc::new(config));
    let results = exporter.export_all(&targets).await;

    let mut all_ok = true;
    for (target, result) in &results {
        match result {
            Ok(summary) => print_summary(summary),
            Err(e) => {
                all_ok = false;
                eprintln!(
                    "{} ({}): failed: {}",
                    target.output_name, target.type_attribute, e
                );
            }
        }
    }
    Ok(all_ok)
}

fn print_summary(summary: &ExportSummary) {
    let stats = &summary.stats;
    println!(
        "{} ({}): {} entries from {} pages in {:.1}s -> {}",
        summary.target.output_name,
        summary.target.type_attribute,
        stats.total_entries,
        stats.pages_requested,
        summary.elapsed.as_secs_f64(),
        summary.output.display()
    );
    if stats.pages_failed > 0 {
        println!("  warning: {} page(s) failed, output may be incomplete", stats.pages_failed);
    }
    if stats.records_skipped > 0 {
        println!("  {} record(s) without a value skipped", stats.records_skipped);
    }
}
