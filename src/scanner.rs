//! Main scanner orchestrating parsing, probing and filtering.

use crate::config::ScanConfig;
use crate::filter::SafeNamespaceFilter;
use crate::notify::ConsoleOutput;
use crate::parser::parser_for;
use crate::registry::RegistryProbe;
use crate::types::{DepprobeError, PackageName, Result, ScanReport, Verdict};
use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Main scanner: one probe and console per run.
pub struct Scanner {
    config: ScanConfig,
    probe: Arc<RegistryProbe>,
    console: Arc<ConsoleOutput>,
    filter: SafeNamespaceFilter,
}

impl Scanner {
    /// Create a new scanner with the given configuration.
    pub fn new(config: ScanConfig) -> Result<Self> {
        if config.concurrency == 0 {
            return Err(DepprobeError::ConfigError(
                "concurrency must be at least 1".to_string(),
            ));
        }

        let console = Arc::new(ConsoleOutput::new(config.verbose, config.json));
        let probe = RegistryProbe::new(config.ecosystem.registry(), config.probe_config())?
            .with_observer(console.clone());
        let filter = SafeNamespaceFilter::new(&config.safe_namespaces);

        Ok(Self {
            config,
            probe: Arc::new(probe),
            console,
            filter,
        })
    }

    pub fn console(&self) -> &ConsoleOutput {
        &self.console
    }

    /// Scan one manifest. `source` labels the report.
    pub async fn scan(&self, raw: &[u8], source: &str) -> Result<ScanReport> {
        let start_time = Instant::now();

        let candidates = parser_for(self.config.ecosystem).parse(raw)?;
        info!(
            "Extracted {} candidate packages from {} ({})",
            candidates.len(),
            source,
            self.config.ecosystem
        );

        let verdicts = self.probe_all(&candidates).await;

        let unavailable: Vec<PackageName> = candidates
            .iter()
            .zip(verdicts)
            .filter(|(_, verdict)| !verdict.is_available())
            .map(|(name, _)| name.clone())
            .collect();

        let unavailable = dedup_in_order(self.filter.filter(unavailable));

        Ok(ScanReport {
            ecosystem: self.config.ecosystem,
            source: source.to_string(),
            candidates: candidates.len(),
            unavailable,
            duration_secs: start_time.elapsed().as_secs_f64(),
        })
    }

    /// Probe every candidate occurrence, returning verdicts in candidate order.
    async fn probe_all(&self, candidates: &[PackageName]) -> Vec<Verdict> {
        let pb = self
            .console
            .create_progress_bar(candidates.len() as u64, "Checking registry");

        let deadline = self
            .config
            .deadline()
            .map(|limit| tokio::time::Instant::now() + limit);
        let probe = &self.probe;
        let pb_ref = pb.as_ref();

        let mut results: Vec<(usize, Verdict)> = stream::iter(candidates.iter().enumerate())
            .map(|(index, name)| async move {
                let verdict = match deadline {
                    Some(deadline) => {
                        match tokio::time::timeout_at(deadline, probe.check(name)).await {
                            Ok(verdict) => verdict,
                            Err(_) => {
                                warn!("Run deadline expired, abandoning probe for {}", name);
                                Verdict::Unavailable
                            }
                        }
                    }
                    None => probe.check(name).await,
                };
                if let Some(pb) = pb_ref {
                    pb.inc(1);
                }
                (index, verdict)
            })
            .buffer_unordered(self.config.concurrency)
            .collect()
            .await;

        if let Some(pb) = pb {
            pb.finish_and_clear();
        }

        // Restore candidate order
        results.sort_by_key(|(index, _)| *index);
        results.into_iter().map(|(_, verdict)| verdict).collect()
    }
}

/// Drop repeated names, keeping the first occurrence.
fn dedup_in_order(names: Vec<PackageName>) -> Vec<PackageName> {
    let mut seen = HashSet::new();
    names
        .into_iter()
        .filter(|name| {
            let first = seen.insert(name.clone());
            if !first {
                debug!("Collapsing repeated finding: {}", name);
            }
            first
        })
        .collect()
}
