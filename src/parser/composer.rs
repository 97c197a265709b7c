//! composer.json parser.

use super::{push_name, ManifestParser};
use crate::types::{DepprobeError, PackageName, Result};
use serde::de::IgnoredAny;
use serde::Deserialize;
use std::collections::BTreeMap;

#[derive(Debug, Deserialize)]
struct ComposerJson {
    #[serde(default)]
    require: Option<BTreeMap<String, IgnoredAny>>,
    #[serde(rename = "require-dev", default)]
    require_dev: Option<BTreeMap<String, IgnoredAny>>,
}

/// Parser for composer.json `require` and `require-dev` sections.
#[derive(Debug, Clone, Default)]
pub struct ComposerParser;

impl ComposerParser {
    pub fn new() -> Self {
        Self
    }
}

impl ManifestParser for ComposerParser {
    fn parse(&self, raw: &[u8]) -> Result<Vec<PackageName>> {
        let manifest: ComposerJson = serde_json::from_slice(raw)
            .map_err(|e| DepprobeError::ManifestParse(format!("invalid composer.json: {}", e)))?;

        let mut packages = Vec::new();
        for section in [&manifest.require, &manifest.require_dev].into_iter().flatten() {
            for name in section.keys() {
                push_name(&mut packages, name);
            }
        }

        Ok(packages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_require_and_require_dev() {
        let packages = ComposerParser::new()
            .parse(
                br#"{
                    "name": "acme/app",
                    "require": {"php": "^8.1", "ext-json": "*", "acme/core": "^2.0"},
                    "require-dev": {"phpunit/phpunit": "^10.0"}
                }"#,
            )
            .unwrap();

        // Platform packages stay in the list; the probe skips them
        assert_eq!(
            packages,
            vec!["acme/core", "ext-json", "php", "phpunit/phpunit"]
        );
    }

    #[test]
    fn test_parse_without_sections() {
        let packages = ComposerParser::new().parse(br#"{"name": "acme/app"}"#).unwrap();
        assert!(packages.is_empty());
    }

    #[test]
    fn test_parse_rejects_non_object() {
        assert!(ComposerParser::new().parse(br#""acme/core""#).is_err());
        assert!(ComposerParser::new().parse(b"{").is_err());
    }
}
