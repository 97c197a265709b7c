//! Public registry probe: decides whether a package name is published.

use crate::registry::endpoint::Registry;
use crate::registry::throttle::Throttle;
use crate::types::{Result, Verdict};
use governor::{Quota, RateLimiter};
use reqwest::{Client, StatusCode};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace, warn};

type DirectRateLimiter = RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// Configuration for registry probes.
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    pub timeout: Duration,
    /// Retries after a 429, on top of the first attempt.
    pub max_retries: u32,
    /// Fixed wait after each 429.
    pub backoff: Duration,
    /// Requests per second across the run, 0 for unlimited.
    pub rate_limit: u32,
    pub user_agent: String,
    /// Overrides the registry's public base URL.
    pub base_url: Option<String>,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_retries: 3,
            backoff: Duration::from_secs(10),
            rate_limit: 10,
            user_agent: "depprobe/0.1".to_string(),
            base_url: None,
        }
    }
}

/// Receives per-candidate progress from the probe.
pub trait ProbeObserver: Send + Sync {
    /// A platform package was resolved without a request.
    fn on_skip(&self, _name: &str) {}

    /// The registry answered a request for `name`.
    fn on_response(&self, _name: &str, _url: &str, _status: StatusCode) {}

    /// The request for `name` failed before a response arrived.
    fn on_error(&self, _name: &str, _url: &str, _error: &reqwest::Error) {}
}

/// Observer that ignores everything.
pub struct SilentObserver;

impl ProbeObserver for SilentObserver {}

/// Probe for one registry, sharing a pooled client and backoff gate across calls.
pub struct RegistryProbe {
    client: Client,
    registry: Registry,
    base_url: String,
    config: ProbeConfig,
    throttle: Arc<Throttle>,
    rate_limiter: Option<Arc<DirectRateLimiter>>,
    observer: Arc<dyn ProbeObserver>,
}

impl RegistryProbe {
    /// Create a new probe for `registry`.
    pub fn new(registry: Registry, config: ProbeConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            // A redirect is not proof of existence
            .redirect(reqwest::redirect::Policy::none())
            .http1_only()
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(30))
            .build()?;

        let rate_limiter = NonZeroU32::new(config.rate_limit)
            .map(|per_second| Arc::new(RateLimiter::direct(Quota::per_second(per_second))));

        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| registry.default_base_url().to_string());

        Ok(Self {
            client,
            registry,
            base_url,
            config,
            throttle: Arc::new(Throttle::new()),
            rate_limiter,
            observer: Arc::new(SilentObserver),
        })
    }

    /// Route per-candidate progress to `observer`.
    pub fn with_observer(mut self, observer: Arc<dyn ProbeObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Whether `name` is published on the public registry.
    pub async fn is_public(&self, name: &str) -> bool {
        self.check(name).await.is_available()
    }

    /// Classify `name`.
    ///
    /// Platform packages are `Available` without a request. Otherwise only a
    /// 200 is `Available`; a 429 backs off globally and retries up to
    /// `max_retries` times, and the retried attempt's outcome is returned.
    /// Transport errors, exhausted retries and every other status are
    /// `Unavailable`.
    pub async fn check(&self, name: &str) -> Verdict {
        if self.registry.is_platform_package(name) {
            trace!("Platform package, not probing: {}", name);
            self.observer.on_skip(name);
            return Verdict::Available;
        }

        let url = self.registry.package_url(&self.base_url, name);
        let mut retries = 0;

        loop {
            self.throttle.wait().await;
            if let Some(ref limiter) = self.rate_limiter {
                limiter.until_ready().await;
            }

            trace!("Checking {}", url);
            let status = match self.client.get(&url).send().await {
                Ok(response) => response.status(),
                Err(e) => {
                    self.observer.on_error(name, &url, &e);
                    warn!("Error when trying to request {}: {}", url, e);
                    return Verdict::Unavailable;
                }
            };
            self.observer.on_response(name, &url, status);

            if status == StatusCode::OK {
                debug!("Package exists: {}", name);
                return Verdict::Available;
            }

            if status == StatusCode::TOO_MANY_REQUESTS {
                if retries >= self.config.max_retries {
                    warn!("Maximum number of retries exhausted for package {}", name);
                    return Verdict::Unavailable;
                }
                retries += 1;
                warn!(
                    "Registry responded with 429 (Too many requests), throttling and retrying {} ({}/{})",
                    name, retries, self.config.max_retries
                );
                self.throttle.trip(self.config.backoff).await;
                continue;
            }

            debug!("Package NOT FOUND: {} (HTTP {})", name, status);
            return Verdict::Unavailable;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn test_config(server: &mockito::Server) -> ProbeConfig {
        ProbeConfig {
            timeout: Duration::from_secs(5),
            backoff: Duration::from_millis(5),
            rate_limit: 0,
            base_url: Some(server.url()),
            ..Default::default()
        }
    }

    #[derive(Default)]
    struct RecordingObserver {
        events: Mutex<Vec<String>>,
    }

    impl ProbeObserver for RecordingObserver {
        fn on_skip(&self, name: &str) {
            self.events.lock().unwrap().push(format!("skip {}", name));
        }

        fn on_response(&self, name: &str, _url: &str, status: StatusCode) {
            self.events
                .lock()
                .unwrap()
                .push(format!("{} {}", name, status.as_u16()));
        }
    }

    #[tokio::test]
    async fn test_existing_package_is_public() {
        let mut server = mockito::Server::new_async().await;
        let m = server
            .mock("GET", "/packages/acme/core")
            .with_status(200)
            .expect(1)
            .create_async()
            .await;

        let probe = RegistryProbe::new(Registry::Packagist, test_config(&server)).unwrap();
        assert!(probe.is_public("acme/core").await);
        m.assert_async().await;
    }

    #[tokio::test]
    async fn test_missing_package_is_not_public() {
        let mut server = mockito::Server::new_async().await;
        let m = server
            .mock("GET", "/packages/acme/internal")
            .with_status(404)
            .expect(1)
            .create_async()
            .await;

        let probe = RegistryProbe::new(Registry::Packagist, test_config(&server)).unwrap();
        assert_eq!(probe.check("acme/internal").await, Verdict::Unavailable);
        m.assert_async().await;
    }

    #[tokio::test]
    async fn test_platform_packages_are_never_requested() {
        let mut server = mockito::Server::new_async().await;
        let m = server
            .mock("GET", mockito::Matcher::Any)
            .with_status(404)
            .expect(0)
            .create_async()
            .await;

        let probe = RegistryProbe::new(Registry::Packagist, test_config(&server)).unwrap();
        for name in ["php", "ext-json", "ext-mbstring", "lib-icu", "composer-runtime-api"] {
            assert!(probe.is_public(name).await, "{} should be public", name);
        }
        m.assert_async().await;
    }

    #[tokio::test]
    async fn test_rate_limited_exhausts_after_four_attempts() {
        let mut server = mockito::Server::new_async().await;
        let m = server
            .mock("GET", "/packages/acme/busy")
            .with_status(429)
            .expect(4)
            .create_async()
            .await;

        let probe = RegistryProbe::new(Registry::Packagist, test_config(&server)).unwrap();
        assert!(!probe.is_public("acme/busy").await);
        m.assert_async().await;
    }

    #[tokio::test]
    async fn test_retry_result_is_returned() {
        let mut server = mockito::Server::new_async().await;
        let throttled = server
            .mock("GET", "/packages/acme/flaky")
            .with_status(429)
            .expect(1)
            .create_async()
            .await;
        let ok = server
            .mock("GET", "/packages/acme/flaky")
            .with_status(200)
            .expect(1)
            .create_async()
            .await;

        let probe = RegistryProbe::new(Registry::Packagist, test_config(&server)).unwrap();
        assert!(probe.is_public("acme/flaky").await);
        throttled.assert_async().await;
        ok.assert_async().await;
    }

    #[tokio::test]
    async fn test_redirect_is_not_followed() {
        let mut server = mockito::Server::new_async().await;
        let target = format!("{}/packages/acme/new-name", server.url());
        let redirect = server
            .mock("GET", "/packages/acme/old-name")
            .with_status(301)
            .with_header("location", &target)
            .expect(1)
            .create_async()
            .await;
        let followed = server
            .mock("GET", "/packages/acme/new-name")
            .with_status(200)
            .expect(0)
            .create_async()
            .await;

        let probe = RegistryProbe::new(Registry::Packagist, test_config(&server)).unwrap();
        assert!(!probe.is_public("acme/old-name").await);
        redirect.assert_async().await;
        followed.assert_async().await;
    }

    #[tokio::test]
    async fn test_server_error_is_not_retried() {
        let mut server = mockito::Server::new_async().await;
        let m = server
            .mock("GET", "/packages/acme/broken")
            .with_status(503)
            .expect(1)
            .create_async()
            .await;

        let probe = RegistryProbe::new(Registry::Packagist, test_config(&server)).unwrap();
        assert!(!probe.is_public("acme/broken").await);
        m.assert_async().await;
    }

    #[tokio::test]
    async fn test_rate_limit_spaces_requests() {
        let mut server = mockito::Server::new_async().await;
        let m = server
            .mock("GET", mockito::Matcher::Any)
            .with_status(200)
            .expect(3)
            .create_async()
            .await;

        let config = ProbeConfig {
            rate_limit: 2,
            ..test_config(&server)
        };
        let probe = RegistryProbe::new(Registry::RubyGems, config).unwrap();

        let start = std::time::Instant::now();
        for name in ["rack", "rails", "sinatra"] {
            assert!(probe.is_public(name).await);
        }

        // Burst of two, the third waits for a replenished cell
        assert!(start.elapsed() >= Duration::from_millis(400));
        m.assert_async().await;
    }

    #[tokio::test]
    async fn test_transport_error_is_not_public() {
        let config = ProbeConfig {
            timeout: Duration::from_secs(2),
            rate_limit: 0,
            // Nothing listens on the discard port
            base_url: Some("http://127.0.0.1:9".to_string()),
            ..Default::default()
        };

        let probe = RegistryProbe::new(Registry::Npm, config).unwrap();
        assert_eq!(probe.check("left-pad").await, Verdict::Unavailable);
    }

    #[tokio::test]
    async fn test_observer_sees_each_attempt() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/left-pad")
            .with_status(200)
            .create_async()
            .await;

        let observer = Arc::new(RecordingObserver::default());
        let probe = RegistryProbe::new(Registry::Npm, test_config(&server))
            .unwrap()
            .with_observer(observer.clone());

        assert!(probe.is_public("left-pad").await);

        let events = observer.events.lock().unwrap();
        assert_eq!(events.as_slice(), ["left-pad 200"]);
    }
}
