//! Core types and errors for the dependency confusion scanner.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::registry::Registry;

/// Errors that can occur during scanning.
#[derive(Error, Debug)]
pub enum DepprobeError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Manifest parse error: {0}")]
    ManifestParse(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

pub type Result<T> = std::result::Result<T, DepprobeError>;

/// A dependency name within one ecosystem's namespace. Never carries a version.
pub type PackageName = String;

/// Package repository system a manifest belongs to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Ecosystem {
    /// package.json or package-lock.json
    Npm,
    /// requirements.txt
    Pip,
    /// Pipfile.lock
    Pipenv,
    /// composer.json
    Composer,
    /// vendor/composer/installed.json
    ComposerInstalled,
    /// pom.xml
    #[value(name = "mvn")]
    #[serde(rename = "mvn")]
    Maven,
    /// Gemfile.lock
    Rubygems,
}

impl Ecosystem {
    /// Public registry the ecosystem's packages are resolved against.
    pub fn registry(self) -> Registry {
        match self {
            Ecosystem::Npm => Registry::Npm,
            Ecosystem::Pip | Ecosystem::Pipenv => Registry::Pypi,
            Ecosystem::Composer | Ecosystem::ComposerInstalled => Registry::Packagist,
            Ecosystem::Maven => Registry::MavenCentral,
            Ecosystem::Rubygems => Registry::RubyGems,
        }
    }

    /// Selector string as accepted on the command line.
    pub fn as_str(self) -> &'static str {
        match self {
            Ecosystem::Npm => "npm",
            Ecosystem::Pip => "pip",
            Ecosystem::Pipenv => "pipenv",
            Ecosystem::Composer => "composer",
            Ecosystem::ComposerInstalled => "composer-installed",
            Ecosystem::Maven => "mvn",
            Ecosystem::Rubygems => "rubygems",
        }
    }
}

impl fmt::Display for Ecosystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of probing a candidate against its public registry.
///
/// Binary on purpose: anything the probe cannot confirm as published
/// (network errors, exhausted retries, abandoned probes) is `Unavailable`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Verdict {
    Available,
    Unavailable,
}

impl Verdict {
    pub fn is_available(self) -> bool {
        matches!(self, Verdict::Available)
    }
}

/// Complete scan result for one manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    /// Ecosystem the manifest was parsed as.
    pub ecosystem: Ecosystem,
    /// File path or URL the manifest was loaded from.
    pub source: String,
    /// Number of candidate occurrences extracted from the manifest.
    pub candidates: usize,
    /// Packages not available publicly, after safe namespace filtering.
    pub unavailable: Vec<PackageName>,
    /// Scan duration in seconds.
    pub duration_secs: f64,
}

impl ScanReport {
    pub fn has_findings(&self) -> bool {
        !self.unavailable.is_empty()
    }
}

/// Configuration for manifest fetch requests.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub user_agent: String,
    /// Skip TLS certificate verification.
    pub insecure: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            max_retries: 3,
            user_agent: "Mozilla/5.0 (compatible; depprobe/0.1)".to_string(),
            insecure: false,
        }
    }
}
