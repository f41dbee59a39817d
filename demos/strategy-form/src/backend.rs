//! Simulated caching API
//!
//! Every call sleeps for the configured latency. With `fail_every = n`,
//! every n-th call fails with an `ApiError` whose body carries
//! `data.message`, the way the real API reports validation and lock errors.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use form_dispatch::ApiError;
use serde_json::json;

use crate::strategy::Strategy;

#[derive(Debug, Clone)]
pub struct SimBackend {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    latency: Duration,
    fail_every: u32,
    calls: AtomicU32,
    saved: Mutex<HashMap<u64, Strategy>>,
}

impl SimBackend {
    pub fn new(latency: Duration, fail_every: u32) -> Self {
        Self {
            inner: Arc::new(Inner {
                latency,
                fail_every,
                calls: AtomicU32::new(0),
                saved: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// The last strategy saved for a target, if any.
    pub fn saved_strategy(&self, target_id: u64) -> Option<Strategy> {
        self.inner
            .saved
            .lock()
            .ok()
            .and_then(|saved| saved.get(&target_id).cloned())
    }

    pub fn calls(&self) -> u32 {
        self.inner.calls.load(Ordering::SeqCst)
    }

    /// `PUT /cache` for one target.
    pub fn update_strategy(
        &self,
        target_id: u64,
        strategy: Strategy,
    ) -> impl Future<Output = Result<(), ApiError>> + Send + 'static {
        let inner = self.inner.clone();
        let fails = self.next_call_fails();
        async move {
            tokio::time::sleep(inner.latency).await;
            if fails {
                tracing::debug!(target_id, "Simulated save failure");
                return Err(ApiError::new(
                    500,
                    json!({ "data": { "message": "Could not save the caching policy. Try again." } }),
                ));
            }
            if let Ok(mut saved) = inner.saved.lock() {
                saved.insert(target_id, strategy);
            }
            Ok(())
        }
    }

    /// `POST /cache/invalidate` for one database.
    pub fn invalidate(
        &self,
        database_id: u64,
    ) -> impl Future<Output = Result<(), ApiError>> + Send + 'static {
        let latency = self.inner.latency;
        let fails = self.next_call_fails();
        async move {
            tokio::time::sleep(latency).await;
            if fails {
                tracing::debug!(database_id, "Simulated invalidation failure");
                return Err(ApiError::new(
                    409,
                    json!({ "data": { "message": format!("Cache for database {database_id} is locked") } }),
                ));
            }
            Ok(())
        }
    }

    fn next_call_fails(&self) -> bool {
        let call = self.inner.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner.fail_every > 0 && call % self.inner.fail_every == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_save_persists_after_latency() {
        let backend = SimBackend::new(Duration::from_millis(200), 0);
        let start = tokio::time::Instant::now();

        backend.update_strategy(2, Strategy::Nocache).await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(200));
        assert_eq!(backend.saved_strategy(2), Some(Strategy::Nocache));
        assert_eq!(backend.saved_strategy(3), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_every_nth_call_fails() {
        let backend = SimBackend::new(Duration::ZERO, 2);

        assert!(backend.invalidate(1).await.is_ok());
        let err = backend.update_strategy(1, Strategy::Nocache).await.unwrap_err();
        assert_eq!(err.status, 500);
        assert!(backend.saved_strategy(1).is_none());

        assert!(backend.invalidate(1).await.is_ok());
        let err = backend.invalidate(1).await.unwrap_err();
        assert_eq!(
            form_dispatch::extract_message(&err.body).as_deref(),
            Some("Cache for database 1 is locked")
        );
        assert_eq!(backend.calls(), 4);
    }
}
