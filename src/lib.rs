//! depprobe - Dependency confusion scanner for package manifests.
//!
//! Reads a manifest from one of several package ecosystems, extracts the
//! dependency names it declares, and reports those not published on the
//! ecosystem's public registry. Those names could be registered by anyone.
//!
//! # Example
//!
//! ```no_run
//! use depprobe::config::ScanConfig;
//! use depprobe::scanner::Scanner;
//! use depprobe::types::Ecosystem;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = ScanConfig {
//!         ecosystem: Ecosystem::Composer,
//!         ..Default::default()
//!     };
//!     let scanner = Scanner::new(config).unwrap();
//!     let manifest = std::fs::read("composer.json").unwrap();
//!     let report = scanner.scan(&manifest, "composer.json").await.unwrap();
//!     println!("{} packages are not public", report.unavailable.len());
//! }
//! ```

pub mod config;
pub mod filter;
pub mod notify;
pub mod parser;
pub mod registry;
pub mod scanner;
pub mod source;
pub mod types;

pub use config::{Config, ScanConfig};
pub use scanner::Scanner;
pub use types::{DepprobeError, Ecosystem, PackageName, Result, ScanReport, Verdict};
