//! Configuration handling for the scanner.

use crate::registry::ProbeConfig;
use crate::source::ManifestSource;
use crate::types::{Ecosystem, HttpConfig};
use clap::{ArgGroup, Args, Parser};
use std::path::PathBuf;
use std::time::Duration;

/// Browser-like User-Agent for manifest downloads; some hosts refuse bare clients.
const DEFAULT_FETCH_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/125.0.0.0 Safari/537.36 Edg/125.0.2535.79";

/// Dependency confusion scanner for package manifests.
#[derive(Parser, Debug, Clone)]
#[command(name = "depprobe")]
#[command(author, version, about, long_about = None)]
#[command(group(ArgGroup::new("input").required(true).args(["file", "url"])))]
pub struct Config {
    /// Local input file
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// URL input file
    #[arg(short, long)]
    pub url: Option<String>,

    #[command(flatten)]
    pub scan: ScanConfig,
}

impl Config {
    /// The manifest source selected on the command line.
    pub fn source(&self) -> Option<ManifestSource> {
        match (&self.file, &self.url) {
            (Some(path), None) => Some(ManifestSource::File(path.clone())),
            (None, Some(url)) => Some(ManifestSource::Url(url.clone())),
            _ => None,
        }
    }
}

/// Configuration for a scan.
#[derive(Args, Debug, Clone)]
pub struct ScanConfig {
    /// Package repository system
    #[arg(short = 'l', long = "lang", value_enum, default_value = "npm")]
    pub ecosystem: Ecosystem,

    /// Comma-separated list of known-secure namespaces. Supports wildcards
    #[arg(short = 's', long = "safe", env = "DEPPROBE_SAFE_NAMESPACES", default_value = "")]
    pub safe_namespaces: String,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,

    /// Write the JSON report to a file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Request timeout in seconds
    #[arg(long, default_value = "30")]
    pub timeout: u64,

    /// Maximum retries after a 429 or a failed manifest download
    #[arg(long, default_value = "3")]
    pub max_retries: u32,

    /// Seconds to back off after a 429
    #[arg(long, default_value = "10")]
    pub backoff: u64,

    /// Registry requests per second (0 disables the limit)
    #[arg(long, default_value = "10")]
    pub rate_limit: u32,

    /// Number of registry probes in flight
    #[arg(long, short = 'p', default_value = "1")]
    pub concurrency: usize,

    /// Abandon probes still running after this many seconds
    #[arg(long)]
    pub deadline: Option<u64>,

    /// Custom User-Agent string for manifest downloads
    #[arg(long)]
    pub user_agent: Option<String>,

    /// Skip TLS certificate verification when downloading the manifest
    #[arg(short = 'k', long)]
    pub insecure: bool,

    /// Registry base URL override (mirrors, testing)
    #[arg(long)]
    pub registry_url: Option<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            ecosystem: Ecosystem::Npm,
            safe_namespaces: String::new(),
            verbose: false,
            json: false,
            output: None,
            timeout: 30,
            max_retries: 3,
            backoff: 10,
            rate_limit: 10,
            concurrency: 1,
            deadline: None,
            user_agent: None,
            insecure: false,
            registry_url: None,
        }
    }
}

impl ScanConfig {
    /// HTTP configuration for manifest downloads.
    pub fn http_config(&self) -> HttpConfig {
        HttpConfig {
            timeout_secs: self.timeout,
            max_retries: self.max_retries,
            user_agent: self
                .user_agent
                .clone()
                .unwrap_or_else(|| DEFAULT_FETCH_USER_AGENT.to_string()),
            insecure: self.insecure,
        }
    }

    /// Registry probe configuration.
    pub fn probe_config(&self) -> ProbeConfig {
        ProbeConfig {
            timeout: Duration::from_secs(self.timeout),
            max_retries: self.max_retries,
            backoff: Duration::from_secs(self.backoff),
            rate_limit: self.rate_limit,
            user_agent: format!("depprobe/{}", env!("CARGO_PKG_VERSION")),
            base_url: self.registry_url.clone(),
        }
    }

    /// Overall probe deadline, if any.
    pub fn deadline(&self) -> Option<Duration> {
        self.deadline.map(Duration::from_secs)
    }
}
