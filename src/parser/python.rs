//! Python requirements.txt and Pipfile.lock parsers.

use super::{as_text, push_name, ManifestParser};
use crate::types::{DepprobeError, PackageName, Result};
use pep508_rs::Requirement;
use serde::de::IgnoredAny;
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::{trace, warn};

/// Parser for pip requirements files.
///
/// Handles one requirement per line, including `\` continuations, inline
/// comments, extras (`pkg[extra]`), environment markers (`pkg; python_version<"3.8"`),
/// direct references (`pkg @ https://...`) and VCS lines carrying `#egg=pkg`.
/// Option lines (`-r`, `-e`, `--index-url`, ...) are skipped.
#[derive(Debug, Clone, Default)]
pub struct RequirementsParser;

impl RequirementsParser {
    pub fn new() -> Self {
        Self
    }
}

impl ManifestParser for RequirementsParser {
    fn parse(&self, raw: &[u8]) -> Result<Vec<PackageName>> {
        let content = as_text(raw, "requirements file")?;
        let mut packages = Vec::new();

        for line in logical_lines(content) {
            let line = strip_options(strip_comment(&line)).trim();
            if line.is_empty() || line.starts_with('-') {
                continue;
            }

            if let Some(name) = requirement_name(line) {
                push_name(&mut packages, &name);
            }
        }

        Ok(packages)
    }
}

/// Join backslash-continued lines.
fn logical_lines(content: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for line in content.lines() {
        match line.strip_suffix('\\') {
            Some(head) => current.push_str(head),
            None => {
                current.push_str(line);
                lines.push(std::mem::take(&mut current));
            }
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }

    lines
}

/// A `#` starts a comment at line start or after whitespace.
fn strip_comment(line: &str) -> &str {
    if line.trim_start().starts_with('#') {
        return "";
    }
    match line.find(" #").or_else(|| line.find("\t#")) {
        Some(idx) => &line[..idx],
        None => line,
    }
}

/// Per-requirement options (`--hash=...`) follow the requirement itself.
fn strip_options(line: &str) -> &str {
    match line.find(" --").or_else(|| line.find("\t--")) {
        Some(idx) => &line[..idx],
        None => line,
    }
}

fn requirement_name(line: &str) -> Option<String> {
    // VCS and archive URLs name the project through the egg fragment
    if let Some(idx) = line.find("#egg=") {
        let egg = &line[idx + "#egg=".len()..];
        let end = egg.find(['&', ' ', '\t']).unwrap_or(egg.len());
        return parse_requirement_name(&egg[..end]);
    }

    if line.starts_with('.') || line.starts_with('/') {
        trace!("Skipping path requirement: {}", line);
        return None;
    }

    if is_bare_url(line) {
        trace!("Skipping URL requirement: {}", line);
        return None;
    }

    parse_requirement_name(line)
}

/// `https://...` or `git+https://...` with nothing naming the project.
fn is_bare_url(line: &str) -> bool {
    line.split_once("://").is_some_and(|(scheme, _)| {
        !scheme.is_empty()
            && scheme
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '.' | '-'))
    })
}

fn parse_requirement_name(spec: &str) -> Option<String> {
    match spec.parse::<Requirement>() {
        Ok(requirement) => Some(requirement.name.to_string()),
        Err(e) => {
            warn!("Could not find a package name in requirement {}: {}", spec, e);
            None
        }
    }
}

#[derive(Debug, Deserialize)]
struct PipfileLock {
    #[serde(default)]
    default: Option<BTreeMap<String, IgnoredAny>>,
    #[serde(default)]
    develop: Option<BTreeMap<String, IgnoredAny>>,
}

/// Parser for Pipfile.lock `default` and `develop` sections.
#[derive(Debug, Clone, Default)]
pub struct PipfileLockParser;

impl PipfileLockParser {
    pub fn new() -> Self {
        Self
    }
}

impl ManifestParser for PipfileLockParser {
    fn parse(&self, raw: &[u8]) -> Result<Vec<PackageName>> {
        let lock: PipfileLock = serde_json::from_slice(raw)
            .map_err(|e| DepprobeError::ManifestParse(format!("invalid Pipfile.lock: {}", e)))?;

        let mut packages = Vec::new();
        for section in [&lock.default, &lock.develop].into_iter().flatten() {
            for name in section.keys() {
                push_name(&mut packages, name);
            }
        }

        Ok(packages)
    }
}
