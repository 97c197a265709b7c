//! Bundler Gemfile.lock parser.
//!
//! ```text
//! GEM
//!   remote: https://rubygems.org/
//!   specs:
//!     rails (7.0.4)
//!       actionpack (= 7.0.4)
//!
//! DEPENDENCIES
//!   acme-auth!
//!   rails (~> 7.0)
//! ```
//!
//! Spec entries sit at four spaces and their dependencies at six, in the
//! `GEM`, `GIT` and `PATH` sections. `DEPENDENCIES` entries sit at two
//! spaces; a trailing `!` marks a non-rubygems source.

use super::{as_text, push_name, ManifestParser};
use crate::types::{DepprobeError, PackageName, Result};
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Source,
    Dependencies,
    Other,
}

impl Section {
    fn from_header(header: &str) -> Self {
        match header {
            "GEM" | "GIT" | "PATH" => Section::Source,
            "DEPENDENCIES" => Section::Dependencies,
            _ => Section::Other,
        }
    }
}

/// Parser for Bundler lockfiles.
#[derive(Debug, Clone, Default)]
pub struct GemfileLockParser;

impl GemfileLockParser {
    pub fn new() -> Self {
        Self
    }
}

impl ManifestParser for GemfileLockParser {
    fn parse(&self, raw: &[u8]) -> Result<Vec<PackageName>> {
        let content = as_text(raw, "Gemfile.lock")?;

        let mut packages = Vec::new();
        let mut section = Section::Other;
        let mut seen_gem_section = false;

        for line in content.lines() {
            let trimmed = line.trim_end();
            if trimmed.is_empty() {
                continue;
            }

            let indent = trimmed.len() - trimmed.trim_start().len();
            if indent == 0 {
                section = Section::from_header(trimmed);
                seen_gem_section |= section != Section::Other;
                trace!("Gemfile.lock section: {}", trimmed);
                continue;
            }

            let entry = match (section, indent) {
                (Section::Source, 4 | 6) => trimmed.trim_start(),
                (Section::Dependencies, 2) => trimmed.trim_start(),
                _ => continue,
            };

            if let Some(name) = entry.split_whitespace().next() {
                push_name(&mut packages, name.trim_end_matches('!'));
            }
        }

        if !seen_gem_section {
            return Err(DepprobeError::ManifestParse(
                "Gemfile.lock has no GEM, GIT, PATH or DEPENDENCIES section".to_string(),
            ));
        }

        Ok(packages)
    }
}
