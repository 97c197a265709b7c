//! Public registry checking module.
//!
//! Decides whether candidate packages are published on their ecosystem's
//! public registry, with a shared backoff gate for rate limiting.

pub mod endpoint;
pub mod probe;
mod throttle;

pub use endpoint::{PlatformRules, Registry};
pub use probe::{ProbeConfig, ProbeObserver, RegistryProbe, SilentObserver};
