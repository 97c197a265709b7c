//! Manifest parsers.
//!
//! Each supported ecosystem turns raw manifest bytes into a flat list of
//! candidate package names:
//! - npm: package.json and package-lock.json
//! - pip: requirements.txt
//! - pipenv: Pipfile.lock
//! - composer: composer.json
//! - composer-installed: vendor/composer/installed.json
//! - mvn: pom.xml
//! - rubygems: Gemfile.lock
//!
//! Parsers only read the schema. Platform packages stay in the list and
//! are resolved by the registry probe.

pub mod composer;
pub mod composer_installed;
pub mod maven;
pub mod npm;
pub mod python;
pub mod rubygems;

pub use composer::ComposerParser;
pub use composer_installed::ComposerInstalledParser;
pub use maven::MavenParser;
pub use npm::NpmParser;
pub use python::{PipfileLockParser, RequirementsParser};
pub use rubygems::GemfileLockParser;

use crate::types::{DepprobeError, Ecosystem, PackageName, Result};

/// Converts a manifest into candidate package names.
pub trait ManifestParser: Send + Sync {
    /// Parse raw manifest bytes. A manifest matching none of the accepted
    /// schemas is an error; no partial list is returned.
    fn parse(&self, raw: &[u8]) -> Result<Vec<PackageName>>;
}

/// Parser for `ecosystem`.
pub fn parser_for(ecosystem: Ecosystem) -> Box<dyn ManifestParser> {
    match ecosystem {
        Ecosystem::Npm => Box::new(NpmParser::new()),
        Ecosystem::Pip => Box::new(RequirementsParser::new()),
        Ecosystem::Pipenv => Box::new(PipfileLockParser::new()),
        Ecosystem::Composer => Box::new(ComposerParser::new()),
        Ecosystem::ComposerInstalled => Box::new(ComposerInstalledParser::new()),
        Ecosystem::Maven => Box::new(MavenParser::new()),
        Ecosystem::Rubygems => Box::new(GemfileLockParser::new()),
    }
}

/// Append `name` unless it is empty after trimming.
pub(crate) fn push_name(packages: &mut Vec<PackageName>, name: &str) {
    let trimmed = name.trim();
    if !trimmed.is_empty() {
        packages.push(trimmed.to_string());
    }
}

/// Decode a text manifest.
pub(crate) fn as_text<'a>(raw: &'a [u8], manifest: &str) -> Result<&'a str> {
    std::str::from_utf8(raw)
        .map_err(|e| DepprobeError::ManifestParse(format!("{} is not valid UTF-8: {}", manifest, e)))
}
