//! Public registry endpoints and per-registry platform package tables.

use serde::{Deserialize, Serialize};

/// Names a registry can never host, so they are never probed.
#[derive(Debug)]
pub struct PlatformRules {
    /// Reserved prefixes (e.g. `ext-` for PHP extensions).
    pub prefixes: &'static [&'static str],
    /// Reserved exact names (e.g. the `php` runtime itself).
    pub names: &'static [&'static str],
}

impl PlatformRules {
    pub fn matches(&self, name: &str) -> bool {
        self.names.contains(&name) || self.prefixes.iter().any(|p| name.starts_with(p))
    }
}

const NO_PLATFORM_PACKAGES: PlatformRules = PlatformRules {
    prefixes: &[],
    names: &[],
};

/// https://getcomposer.org/doc/01-basic-usage.md#platform-packages
const COMPOSER_PLATFORM_PACKAGES: PlatformRules = PlatformRules {
    prefixes: &["ext-", "lib-"],
    names: &[
        "php",
        "php-64bit",
        "php-ipv6",
        "php-zts",
        "php-debug",
        "hhvm",
        "composer",
        "composer-plugin-api",
        "composer-runtime-api",
    ],
};

/// A public package registry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Registry {
    Npm,
    Pypi,
    Packagist,
    MavenCentral,
    RubyGems,
}

impl Registry {
    /// Base URL of the public instance.
    pub fn default_base_url(self) -> &'static str {
        match self {
            Registry::Npm => "https://registry.npmjs.org",
            Registry::Pypi => "https://pypi.org",
            Registry::Packagist => "https://packagist.org",
            Registry::MavenCentral => "https://repo1.maven.org/maven2",
            Registry::RubyGems => "https://rubygems.org",
        }
    }

    pub fn platform_rules(self) -> &'static PlatformRules {
        match self {
            Registry::Packagist => &COMPOSER_PLATFORM_PACKAGES,
            Registry::Npm | Registry::Pypi | Registry::MavenCentral | Registry::RubyGems => {
                &NO_PLATFORM_PACKAGES
            }
        }
    }

    pub fn is_platform_package(self, name: &str) -> bool {
        self.platform_rules().matches(name)
    }

    /// Package detail URL for `name` under `base_url`.
    pub fn package_url(self, base_url: &str, name: &str) -> String {
        let base = base_url.trim_end_matches('/');
        match self {
            Registry::Npm => format!("{}/{}", base, urlencoding::encode(name)),
            Registry::Pypi => format!("{}/pypi/{}/json", base, normalize_pypi_name(name)),
            Registry::Packagist => format!("{}/packages/{}", base, name),
            Registry::MavenCentral => match name.split_once(':') {
                Some((group, artifact)) => {
                    format!("{}/{}/{}/", base, group.replace('.', "/"), artifact)
                }
                None => format!("{}/{}/", base, name),
            },
            Registry::RubyGems => format!(
                "{}/api/v1/gems/{}.json",
                base,
                urlencoding::encode(name)
            ),
        }
    }
}

/// PEP 503 normalization. PyPI redirects non-normalized project names,
/// and redirects are not followed by the probe.
fn normalize_pypi_name(name: &str) -> String {
    let mut normalized = String::with_capacity(name.len());
    let mut in_separator_run = false;

    for c in name.chars() {
        if matches!(c, '-' | '_' | '.') {
            if !in_separator_run {
                normalized.push('-');
            }
            in_separator_run = true;
        } else {
            normalized.push(c.to_ascii_lowercase());
            in_separator_run = false;
        }
    }

    normalized
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_composer_platform_packages() {
        let registry = Registry::Packagist;
        assert!(registry.is_platform_package("php"));
        assert!(registry.is_platform_package("ext-json"));
        assert!(registry.is_platform_package("lib-curl"));
        assert!(registry.is_platform_package("composer-plugin-api"));
        assert!(!registry.is_platform_package("acme/core"));
        assert!(!registry.is_platform_package("phpunit/phpunit"));
    }

    #[test]
    fn test_other_registries_have_no_platform_packages() {
        assert!(!Registry::Npm.is_platform_package("ext-json"));
        assert!(!Registry::Pypi.is_platform_package("php"));
    }

    #[test]
    fn test_npm_scoped_url_is_encoded() {
        assert_eq!(
            Registry::Npm.package_url("https://registry.npmjs.org", "@acme/ui"),
            "https://registry.npmjs.org/%40acme%2Fui"
        );
    }

    #[test]
    fn test_pypi_url_normalizes_name() {
        assert_eq!(
            Registry::Pypi.package_url("https://pypi.org/", "Zope.Interface__Extra"),
            "https://pypi.org/pypi/zope-interface-extra/json"
        );
    }

    #[test]
    fn test_packagist_url() {
        assert_eq!(
            Registry::Packagist.package_url("https://packagist.org", "acme/core"),
            "https://packagist.org/packages/acme/core"
        );
    }

    #[test]
    fn test_maven_url_uses_group_path() {
        assert_eq!(
            Registry::MavenCentral.package_url(
                "https://repo1.maven.org/maven2",
                "org.apache.commons:commons-lang3"
            ),
            "https://repo1.maven.org/maven2/org/apache/commons/commons-lang3/"
        );
    }

    #[test]
    fn test_rubygems_url() {
        assert_eq!(
            Registry::RubyGems.package_url("https://rubygems.org", "rails"),
            "https://rubygems.org/api/v1/gems/rails.json"
        );
    }
}
