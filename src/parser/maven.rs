//! Maven pom.xml parser.
//!
//! Candidates are rendered as `groupId:artifactId` and collected from the
//! parent, dependencies, dependency management, build plugins (and their
//! dependencies) and the same sections inside profiles.

use super::{as_text, push_name, ManifestParser};
use crate::types::{DepprobeError, PackageName, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::warn;

/// groupId used by Maven for plugins that omit one.
const DEFAULT_PLUGIN_GROUP: &str = "org.apache.maven.plugins";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Pom {
    group_id: Option<String>,
    artifact_id: Option<String>,
    parent: Option<Coordinates>,
    properties: Option<BTreeMap<String, String>>,
    dependencies: Option<DependencyList>,
    dependency_management: Option<DependencyManagement>,
    build: Option<Build>,
    profiles: Option<ProfileList>,
}

/// A `<profile>` carries the same dependency sections as the project.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Profile {
    dependencies: Option<DependencyList>,
    dependency_management: Option<DependencyManagement>,
    build: Option<Build>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Coordinates {
    group_id: Option<String>,
    artifact_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct DependencyList {
    #[serde(default)]
    dependency: Vec<Coordinates>,
}

#[derive(Debug, Default, Deserialize)]
struct DependencyManagement {
    dependencies: Option<DependencyList>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Build {
    plugins: Option<PluginList>,
    plugin_management: Option<PluginManagement>,
}

#[derive(Debug, Default, Deserialize)]
struct PluginManagement {
    plugins: Option<PluginList>,
}

#[derive(Debug, Default, Deserialize)]
struct PluginList {
    #[serde(default)]
    plugin: Vec<Plugin>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Plugin {
    group_id: Option<String>,
    artifact_id: Option<String>,
    dependencies: Option<DependencyList>,
}

#[derive(Debug, Default, Deserialize)]
struct ProfileList {
    #[serde(default)]
    profile: Vec<Profile>,
}

/// Parser for Maven project files.
#[derive(Debug, Clone, Default)]
pub struct MavenParser;

impl MavenParser {
    pub fn new() -> Self {
        Self
    }
}

impl ManifestParser for MavenParser {
    fn parse(&self, raw: &[u8]) -> Result<Vec<PackageName>> {
        let content = as_text(raw, "pom.xml")?;
        let pom: Pom = quick_xml::de::from_str(content)
            .map_err(|e| DepprobeError::ManifestParse(format!("invalid pom.xml: {}", e)))?;

        let resolver = PropertyResolver::new(&pom);
        let mut collector = Collector {
            resolver,
            packages: Vec::new(),
        };

        if let Some(ref parent) = pom.parent {
            collector.push(parent.group_id.as_deref(), parent.artifact_id.as_deref());
        }
        collector.push_sections(
            pom.dependencies.as_ref(),
            pom.dependency_management.as_ref(),
            pom.build.as_ref(),
        );
        if let Some(ref profiles) = pom.profiles {
            for profile in &profiles.profile {
                collector.push_sections(
                    profile.dependencies.as_ref(),
                    profile.dependency_management.as_ref(),
                    profile.build.as_ref(),
                );
            }
        }

        Ok(collector.packages)
    }
}

struct Collector<'a> {
    resolver: PropertyResolver<'a>,
    packages: Vec<PackageName>,
}

impl Collector<'_> {
    fn push_sections(
        &mut self,
        dependencies: Option<&DependencyList>,
        management: Option<&DependencyManagement>,
        build: Option<&Build>,
    ) {
        if let Some(dependencies) = dependencies {
            self.push_dependencies(dependencies);
        }
        if let Some(dependencies) = management.and_then(|m| m.dependencies.as_ref()) {
            self.push_dependencies(dependencies);
        }
        if let Some(build) = build {
            let managed = build
                .plugin_management
                .as_ref()
                .and_then(|m| m.plugins.as_ref());
            for plugins in [build.plugins.as_ref(), managed].into_iter().flatten() {
                for plugin in &plugins.plugin {
                    let group = plugin.group_id.as_deref().unwrap_or(DEFAULT_PLUGIN_GROUP);
                    self.push(Some(group), plugin.artifact_id.as_deref());
                    if let Some(ref dependencies) = plugin.dependencies {
                        self.push_dependencies(dependencies);
                    }
                }
            }
        }
    }

    fn push_dependencies(&mut self, dependencies: &DependencyList) {
        for dependency in &dependencies.dependency {
            self.push(dependency.group_id.as_deref(), dependency.artifact_id.as_deref());
        }
    }

    fn push(&mut self, group_id: Option<&str>, artifact_id: Option<&str>) {
        let group = group_id.map(|g| self.resolver.resolve(g));
        let artifact = artifact_id.map(|a| self.resolver.resolve(a));

        match (group, artifact) {
            (Some(group), Some(artifact)) if !group.is_empty() && !artifact.is_empty() => {
                push_name(&mut self.packages, &format!("{}:{}", group, artifact));
            }
            (group, artifact) => warn!(
                "Skipping incomplete Maven coordinates (groupId: {:?}, artifactId: {:?})",
                group, artifact
            ),
        }
    }
}

/// Expands `${...}` placeholders from `<properties>` and project coordinates.
struct PropertyResolver<'a> {
    properties: BTreeMap<&'a str, &'a str>,
}

impl<'a> PropertyResolver<'a> {
    fn new(pom: &'a Pom) -> Self {
        let mut properties = BTreeMap::new();

        let parent_group = pom.parent.as_ref().and_then(|p| p.group_id.as_deref());
        if let Some(group) = pom.group_id.as_deref().or(parent_group) {
            for key in ["project.groupId", "pom.groupId", "groupId"] {
                properties.insert(key, group.trim());
            }
        }
        if let Some(group) = parent_group {
            properties.insert("project.parent.groupId", group.trim());
        }
        if let Some(artifact) = pom.artifact_id.as_deref() {
            for key in ["project.artifactId", "pom.artifactId", "artifactId"] {
                properties.insert(key, artifact.trim());
            }
        }
        if let Some(ref declared) = pom.properties {
            for (key, value) in declared {
                properties.insert(key.as_str(), value.trim());
            }
        }

        Self { properties }
    }

    /// Unknown placeholders are left in place.
    fn resolve(&self, value: &str) -> String {
        let mut resolved = String::with_capacity(value.len());
        let mut rest = value.trim();

        while let Some(start) = rest.find("${") {
            let Some(len) = rest[start..].find('}') else {
                break;
            };
            let key = &rest[start + 2..start + len];
            resolved.push_str(&rest[..start]);
            match self.properties.get(key) {
                Some(replacement) => resolved.push_str(replacement),
                None => resolved.push_str(&rest[start..=start + len]),
            }
            rest = &rest[start + len + 1..];
        }
        resolved.push_str(rest);

        resolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &str) -> Result<Vec<PackageName>> {
        MavenParser::new().parse(input.as_bytes())
    }

    #[test]
    fn test_parse_dependencies() {
        let packages = parse(
            r#"<?xml version="1.0" encoding="UTF-8"?>
            <project xmlns="http://maven.apache.org/POM/4.0.0">
                <modelVersion>4.0.0</modelVersion>
                <groupId>com.acme</groupId>
                <artifactId>app</artifactId>
                <dependencies>
                    <dependency>
                        <groupId>org.apache.commons</groupId>
                        <artifactId>commons-lang3</artifactId>
                        <version>3.12.0</version>
                    </dependency>
                    <dependency>
                        <groupId>com.acme.internal</groupId>
                        <artifactId>acme-auth</artifactId>
                        <scope>test</scope>
                    </dependency>
                </dependencies>
            </project>"#,
        )
        .unwrap();

        assert_eq!(
            packages,
            vec![
                "org.apache.commons:commons-lang3",
                "com.acme.internal:acme-auth"
            ]
        );
    }

    #[test]
    fn test_parse_parent_management_and_plugins() {
        let packages = parse(
            r#"<project>
                <parent>
                    <groupId>com.acme</groupId>
                    <artifactId>acme-parent</artifactId>
                </parent>
                <artifactId>app</artifactId>
                <dependencyManagement>
                    <dependencies>
                        <dependency>
                            <groupId>com.acme</groupId>
                            <artifactId>acme-bom</artifactId>
                        </dependency>
                    </dependencies>
                </dependencyManagement>
                <build>
                    <plugins>
                        <plugin>
                            <artifactId>maven-compiler-plugin</artifactId>
                        </plugin>
                        <plugin>
                            <groupId>com.acme.build</groupId>
                            <artifactId>acme-maven-plugin</artifactId>
                            <dependencies>
                                <dependency>
                                    <groupId>com.acme.build</groupId>
                                    <artifactId>acme-rules</artifactId>
                                </dependency>
                            </dependencies>
                        </plugin>
                    </plugins>
                </build>
            </project>"#,
        )
        .unwrap();

        assert_eq!(
            packages,
            vec![
                "com.acme:acme-parent",
                "com.acme:acme-bom",
                "org.apache.maven.plugins:maven-compiler-plugin",
                "com.acme.build:acme-maven-plugin",
                "com.acme.build:acme-rules",
            ]
        );
    }

    #[test]
    fn test_resolve_project_and_declared_properties() {
        let packages = parse(
            r#"<project>
                <groupId>com.acme</groupId>
                <artifactId>app</artifactId>
                <properties>
                    <acme.tools.group>com.acme.tools</acme.tools.group>
                </properties>
                <dependencies>
                    <dependency>
                        <groupId>${project.groupId}</groupId>
                        <artifactId>app-core</artifactId>
                    </dependency>
                    <dependency>
                        <groupId>${acme.tools.group}</groupId>
                        <artifactId>lint</artifactId>
                    </dependency>
                    <dependency>
                        <groupId>${undefined.group}</groupId>
                        <artifactId>mystery</artifactId>
                    </dependency>
                </dependencies>
            </project>"#,
        )
        .unwrap();

        assert_eq!(
            packages,
            vec![
                "com.acme:app-core",
                "com.acme.tools:lint",
                "${undefined.group}:mystery"
            ]
        );
    }

    #[test]
    fn test_parse_profile_dependencies() {
        let packages = parse(
            r#"<project>
                <profiles>
                    <profile>
                        <id>internal</id>
                        <dependencies>
                            <dependency>
                                <groupId>com.acme</groupId>
                                <artifactId>acme-metrics</artifactId>
                            </dependency>
                        </dependencies>
                    </profile>
                </profiles>
            </project>"#,
        )
        .unwrap();

        assert_eq!(packages, vec!["com.acme:acme-metrics"]);
    }

    #[test]
    fn test_incomplete_coordinates_are_skipped() {
        let packages = parse(
            r#"<project>
                <dependencies>
                    <dependency><artifactId>orphan</artifactId></dependency>
                </dependencies>
            </project>"#,
        )
        .unwrap();
        assert!(packages.is_empty());
    }

    #[test]
    fn test_malformed_xml_is_fatal() {
        assert!(matches!(
            parse("<project><dependencies><dependency>"),
            Err(DepprobeError::ManifestParse(_))
        ));
    }
}
