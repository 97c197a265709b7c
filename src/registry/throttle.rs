//! Run-wide backoff gate shared by every probe worker.

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::trace;

/// Once any worker sees a 429, every worker holds off until the gate reopens.
#[derive(Debug, Default)]
pub struct Throttle {
    resume_at: Mutex<Option<Instant>>,
}

impl Throttle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until the gate is open. The reopen time is re-read after every
    /// sleep since another worker may have extended it.
    pub async fn wait(&self) {
        loop {
            let resume_at = *self.resume_at.lock().await;
            match resume_at {
                Some(at) if at > Instant::now() => {
                    trace!("Throttled, waiting {:?}", at - Instant::now());
                    tokio::time::sleep_until(at).await;
                }
                _ => return,
            }
        }
    }

    /// Close the gate for `backoff`. An already later reopen time wins.
    pub async fn trip(&self, backoff: Duration) {
        let candidate = Instant::now() + backoff;
        let mut resume_at = self.resume_at.lock().await;
        match *resume_at {
            Some(existing) if existing >= candidate => {}
            _ => *resume_at = Some(candidate),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    async fn is_closed(throttle: &Throttle) -> bool {
        matches!(*throttle.resume_at.lock().await, Some(at) if at > Instant::now())
    }

    #[tokio::test]
    async fn test_open_gate_does_not_wait() {
        let throttle = Throttle::new();
        let start = Instant::now();
        throttle.wait().await;
        assert!(start.elapsed() < Duration::from_millis(50));
        assert!(!is_closed(&throttle).await);
    }

    #[tokio::test]
    async fn test_trip_closes_gate_for_backoff() {
        let throttle = Throttle::new();
        throttle.trip(Duration::from_millis(60)).await;
        assert!(is_closed(&throttle).await);

        let start = Instant::now();
        throttle.wait().await;
        assert!(start.elapsed() >= Duration::from_millis(50));
        assert!(!is_closed(&throttle).await);
    }

    #[tokio::test]
    async fn test_shorter_trip_does_not_shorten_gate() {
        let throttle = Throttle::new();
        throttle.trip(Duration::from_millis(80)).await;
        throttle.trip(Duration::from_millis(1)).await;

        let start = Instant::now();
        throttle.wait().await;
        assert!(start.elapsed() >= Duration::from_millis(60));
    }

    #[tokio::test]
    async fn test_parked_waiter_honors_extended_gate() {
        let throttle = Arc::new(Throttle::new());
        throttle.trip(Duration::from_millis(50)).await;

        let start = Instant::now();
        let waiter = {
            let throttle = throttle.clone();
            tokio::spawn(async move {
                throttle.wait().await;
                is_closed(&throttle).await
            })
        };

        tokio::time::sleep(Duration::from_millis(10)).await;
        throttle.trip(Duration::from_millis(200)).await;

        let closed_on_release = waiter.await.unwrap();
        assert!(!closed_on_release);
        assert!(start.elapsed() >= Duration::from_millis(190));
    }
}
