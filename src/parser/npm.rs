//! npm package.json and package-lock.json parser.
//!
//! A document carrying `lockfileVersion` is read as a lockfile, anything
//! else as package.json.
//!
//! # package-lock.json
//!
//! Versions 2 and 3 list every installed package under `packages`, keyed
//! by install path:
//!
//! ```json
//! {
//!   "lockfileVersion": 3,
//!   "packages": {
//!     "": { "dependencies": { "express": "^4.18.0" } },
//!     "node_modules/express": { "version": "4.18.2", "dependencies": { "debug": "2.6.9" } }
//!   }
//! }
//! ```
//!
//! Version 1 nests the tree under `dependencies`, with each entry's
//! declared dependencies under `requires`.

use super::{push_name, ManifestParser};
use crate::types::{DepprobeError, PackageName, Result};
use serde::de::IgnoredAny;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

type ConstraintMap = Option<BTreeMap<String, IgnoredAny>>;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PackageJson {
    #[serde(default)]
    dependencies: ConstraintMap,
    #[serde(default)]
    dev_dependencies: ConstraintMap,
    #[serde(default)]
    peer_dependencies: ConstraintMap,
    #[serde(default)]
    optional_dependencies: ConstraintMap,
    /// Usually a name list, but `true` is allowed and means "all".
    #[serde(default)]
    bundled_dependencies: Option<Value>,
    #[serde(default)]
    bundle_dependencies: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct PackageLock {
    #[serde(default)]
    packages: BTreeMap<String, LockPackage>,
    #[serde(default)]
    dependencies: BTreeMap<String, LockDependency>,
}

/// Entry of the v2/v3 `packages` object.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LockPackage {
    #[serde(default)]
    dependencies: ConstraintMap,
    #[serde(default)]
    dev_dependencies: ConstraintMap,
    #[serde(default)]
    peer_dependencies: ConstraintMap,
    #[serde(default)]
    optional_dependencies: ConstraintMap,
}

/// Entry of the v1 `dependencies` tree.
#[derive(Debug, Deserialize)]
struct LockDependency {
    #[serde(default)]
    requires: ConstraintMap,
    #[serde(default)]
    dependencies: Option<BTreeMap<String, LockDependency>>,
}

/// Parser for npm manifests and lockfiles.
#[derive(Debug, Clone, Default)]
pub struct NpmParser;

impl NpmParser {
    pub fn new() -> Self {
        Self
    }

    fn parse_package_json(&self, document: Value) -> Result<Vec<PackageName>> {
        let manifest: PackageJson = serde_json::from_value(document)
            .map_err(|e| DepprobeError::ManifestParse(format!("invalid package.json: {}", e)))?;

        let mut packages = Vec::new();
        push_keys(
            &mut packages,
            [
                &manifest.dependencies,
                &manifest.dev_dependencies,
                &manifest.peer_dependencies,
                &manifest.optional_dependencies,
            ],
        );

        for bundled in [&manifest.bundled_dependencies, &manifest.bundle_dependencies]
            .into_iter()
            .flatten()
        {
            if let Value::Array(names) = bundled {
                for name in names.iter().filter_map(Value::as_str) {
                    push_name(&mut packages, name);
                }
            }
        }

        Ok(packages)
    }

    fn parse_lockfile(&self, document: Value) -> Result<Vec<PackageName>> {
        let lock: PackageLock = serde_json::from_value(document).map_err(|e| {
            DepprobeError::ManifestParse(format!("invalid package-lock.json: {}", e))
        })?;

        let mut packages = Vec::new();

        if !lock.packages.is_empty() {
            debug!("Reading package-lock.json packages object");
            for (path, entry) in &lock.packages {
                // The root ("") and workspace folders are not registry packages
                if path.contains("node_modules/") {
                    push_name(&mut packages, extract_package_name(path));
                }
                push_keys(
                    &mut packages,
                    [
                        &entry.dependencies,
                        &entry.dev_dependencies,
                        &entry.peer_dependencies,
                        &entry.optional_dependencies,
                    ],
                );
            }
        } else {
            debug!("Reading package-lock.json v1 dependency tree");
            push_dependency_tree(&mut packages, &lock.dependencies);
        }

        Ok(packages)
    }
}

impl ManifestParser for NpmParser {
    fn parse(&self, raw: &[u8]) -> Result<Vec<PackageName>> {
        let document: Value = serde_json::from_slice(raw)
            .map_err(|e| DepprobeError::ManifestParse(format!("invalid npm manifest: {}", e)))?;

        if document.get("lockfileVersion").is_some() {
            self.parse_lockfile(document)
        } else {
            self.parse_package_json(document)
        }
    }
}

fn push_keys<'a>(
    packages: &mut Vec<PackageName>,
    sections: impl IntoIterator<Item = &'a ConstraintMap>,
) {
    for section in sections.into_iter().flatten() {
        for name in section.keys() {
            push_name(packages, name);
        }
    }
}

fn push_dependency_tree(
    packages: &mut Vec<PackageName>,
    tree: &BTreeMap<String, LockDependency>,
) {
    for (name, entry) in tree {
        push_name(packages, name);
        push_keys(packages, [&entry.requires]);
        if let Some(ref nested) = entry.dependencies {
            push_dependency_tree(packages, nested);
        }
    }
}

/// Package name from an install path.
///
/// `node_modules/express/node_modules/@types/node` -> `@types/node`
fn extract_package_name(path: &str) -> &str {
    const MARKER: &str = "node_modules/";
    path.rfind(MARKER)
        .map(|idx| &path[idx + MARKER.len()..])
        .unwrap_or(path)
}
