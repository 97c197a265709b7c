//! Known-safe namespace filtering.
//!
//! Callers list namespaces they control on the public registry as
//! comma-separated globs (`@acme/*,acme-*`). Findings matching any of them
//! are dropped from the report.

use glob::{MatchOptions, Pattern};
use tracing::{debug, warn};

/// `*` and `?` stop at `/`, so `@acme/*` covers one scope level.
const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Compiled list of known-safe namespace globs.
#[derive(Debug, Clone, Default)]
pub struct SafeNamespaceFilter {
    patterns: Vec<Pattern>,
}

impl SafeNamespaceFilter {
    /// Compile a comma-separated pattern list.
    ///
    /// Entries are trimmed and empty ones skipped. A malformed pattern is
    /// reported and left out, so it matches nothing.
    pub fn new(pattern_list: &str) -> Self {
        let patterns = pattern_list
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .filter_map(|entry| match Pattern::new(entry) {
                Ok(pattern) => Some(pattern),
                Err(e) => {
                    warn!(
                        "Encountered an error while trying to match a known-safe namespace {} : {}",
                        entry, e
                    );
                    None
                }
            })
            .collect();

        Self { patterns }
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Whether `name` falls in a known-safe namespace.
    pub fn is_safe(&self, name: &str) -> bool {
        self.patterns
            .iter()
            .any(|pattern| pattern.matches_with(name, MATCH_OPTIONS))
    }

    /// Drop safe names, keeping the order of the rest.
    pub fn filter(&self, names: Vec<String>) -> Vec<String> {
        if self.is_empty() {
            return names;
        }
        names
            .into_iter()
            .filter(|name| {
                let safe = self.is_safe(name);
                if safe {
                    debug!("Ignoring known-safe package: {}", name);
                }
                !safe
            })
            .collect()
    }
}
