//! Composer `vendor/composer/installed.json` parser.
//!
//! Composer 1 writes a top-level array of package records. Composer 2
//! wraps the records in an object:
//!
//! ```json
//! {
//!   "packages": [
//!     { "name": "acme/core", "require": { "acme/util": "1.0" } }
//!   ],
//!   "dev-package-names": ["acme/test-helper"]
//! }
//! ```
//!
//! Every record contributes its own name plus the keys of its `require`
//! and `require-dev` maps, so declared dependencies are scanned even when
//! they are not installed. `dev-package-names` follow all records. A bare
//! `null` document holds no packages.

use super::{push_name, ManifestParser};
use crate::types::{DepprobeError, PackageName, Result};
use serde::de::IgnoredAny;
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// One installed package record. Constraint values are never inspected.
#[derive(Debug, Deserialize)]
struct InstalledPackage {
    #[serde(default)]
    name: String,
    #[serde(default)]
    require: Option<BTreeMap<String, IgnoredAny>>,
    #[serde(rename = "require-dev", default)]
    require_dev: Option<BTreeMap<String, IgnoredAny>>,
}

/// Composer 2 layout.
#[derive(Debug, Deserialize)]
struct InstalledManifest {
    #[serde(default)]
    packages: Vec<InstalledPackage>,
    #[serde(rename = "dev-package-names", default)]
    dev_package_names: Vec<String>,
}

/// Parser for Composer installed.json files in either layout.
#[derive(Debug, Clone, Default)]
pub struct ComposerInstalledParser;

impl ComposerInstalledParser {
    pub fn new() -> Self {
        Self
    }
}

impl ManifestParser for ComposerInstalledParser {
    fn parse(&self, raw: &[u8]) -> Result<Vec<PackageName>> {
        let as_array = serde_json::from_slice::<Option<Vec<InstalledPackage>>>(raw);
        let (records, dev_names) = match as_array {
            Ok(Some(records)) => {
                debug!("Read installed.json as package array");
                (records, Vec::new())
            }
            Ok(None) => {
                warn!("installed.json is null, no packages to scan");
                (Vec::new(), Vec::new())
            }
            Err(array_err) => {
                debug!("Not a package array ({}), trying packages object", array_err);
                let manifest: InstalledManifest = serde_json::from_slice(raw).map_err(|e| {
                    DepprobeError::ManifestParse(format!(
                        "installed.json is neither a package array nor a packages object: {}",
                        e
                    ))
                })?;
                (manifest.packages, manifest.dev_package_names)
            }
        };

        let mut packages = Vec::new();
        for record in &records {
            push_record(&mut packages, record);
        }
        for name in &dev_names {
            push_name(&mut packages, name);
        }

        Ok(packages)
    }
}

/// Append a record's own name, then its `require` and `require-dev` keys.
fn push_record(packages: &mut Vec<PackageName>, record: &InstalledPackage) {
    push_name(packages, &record.name);
    for constraints in [&record.require, &record.require_dev].into_iter().flatten() {
        for name in constraints.keys() {
            push_name(packages, name);
        }
    }
}
