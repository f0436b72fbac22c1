//! Clock abstraction
//!
//! Every time-window rule reads "now" through a [`Clock`] so tests can
//! pin or script the current time.

use std::future::Future;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Duration, Utc};

use super::errors::DomainError;

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub type SharedClock = Arc<dyn Clock>;

/// Wall-clock time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: RwLock<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: RwLock::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        if let Ok(mut guard) = self.now.write() {
            *guard = now;
        }
    }

    pub fn advance(&self, by: Duration) {
        if let Ok(mut guard) = self.now.write() {
            *guard += by;
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        match self.now.read() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

/// Bound a store call by `limit`; on expiry the call fails with
/// [`DomainError::Timeout`] naming `operation`.
pub async fn with_deadline<T, F>(
    limit: std::time::Duration,
    operation: &str,
    fut: F,
) -> Result<T, DomainError>
where
    F: Future<Output = Result<T, DomainError>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(operation, limit_ms = limit.as_millis() as u64, "Store call timed out");
            Err(DomainError::Timeout(format!(
                "{} did not complete within {}ms",
                operation,
                limit.as_millis()
            )))
        }
    }
}
