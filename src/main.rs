//! depprobe - Dependency confusion scanner for package manifests.
//!
//! CLI entry point.

use clap::Parser;
use depprobe::{Config, DepprobeError, ScanReport, Scanner};
use std::fs;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::parse();

    // Set up logging
    let filter = if config.scan.verbose {
        EnvFilter::new("depprobe=debug,info")
    } else {
        EnvFilter::new("depprobe=info,warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(&config).await {
        Ok(report) if report.has_findings() => ExitCode::FAILURE,
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(config: &Config) -> Result<ScanReport, DepprobeError> {
    let source = config.source().ok_or_else(|| {
        DepprobeError::ConfigError("exactly one of --file or --url is required".to_string())
    })?;

    let scanner = Scanner::new(config.scan.clone())?;

    scanner
        .console()
        .print_progress(&format!("Loading manifest from {}", source));
    let manifest = source.load(&config.scan.http_config()).await?;

    let report = scanner.scan(&manifest, &source.to_string()).await?;
    scanner.console().print_report(&report);

    if let Some(ref output_path) = config.scan.output {
        let json = serde_json::to_string_pretty(&report)?;
        fs::write(output_path, json)?;
        info!("Results written to: {:?}", output_path);
    }

    Ok(report)
}
