//! Per-client submission quota tracking
//!
//! The store is an owned object with an injected clock so window arithmetic
//! can be tested deterministically. The trait seam exists because the quota
//! record may live in a remote document store in other deployments; callers
//! treat store errors as fail-open (availability over strict enforcement).

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Clock abstraction so quota windows can be driven by tests
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock backed by the system time
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Settable clock for tests
///
/// This type is intended for test use only; production code constructs
/// stores with [`SystemClock`].
#[derive(Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().expect("manual clock mutex poisoned");
        *now = *now + by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().expect("manual clock mutex poisoned")
    }
}

#[derive(Debug, Error)]
#[error("quota store unavailable: {0}")]
pub struct QuotaStoreError(pub String);

/// Outcome of a quota check for one client address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaDecision {
    pub allowed: bool,
    pub remaining: u32,
    pub reset_at: DateTime<Utc>,
}

/// One quota record, keyed by client address in the store
#[derive(Debug, Clone)]
struct QuotaEntry {
    count: u32,
    reset_at: DateTime<Utc>,
    last_seen: DateTime<Utc>,
}

#[async_trait]
pub trait QuotaStore: Send + Sync {
    /// Check the client's quota and count this request against it
    ///
    /// The check and the increment happen in one call; within a process the
    /// memory store makes them atomic. A remote implementation performs a
    /// logical read-then-write and may admit one extra request under
    /// concurrent submissions from the same client.
    async fn check_and_count(&self, client_id: &str) -> Result<QuotaDecision, QuotaStoreError>;

    /// Drop expired records, returning how many were removed
    async fn sweep(&self) -> Result<usize, QuotaStoreError>;
}

/// In-memory quota store with lazy expiry on read
pub struct MemoryQuotaStore {
    entries: Mutex<HashMap<String, QuotaEntry>>,
    limit: u32,
    window: Duration,
    clock: Arc<dyn Clock>,
}

impl MemoryQuotaStore {
    pub fn new(limit: u32, window: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            limit,
            window,
            clock,
        }
    }
}

#[async_trait]
impl QuotaStore for MemoryQuotaStore {
    async fn check_and_count(&self, client_id: &str) -> Result<QuotaDecision, QuotaStoreError> {
        let now = self.clock.now();
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| QuotaStoreError("quota map mutex poisoned".to_string()))?;

        if let Some(entry) = entries.get_mut(client_id) {
            if now <= entry.reset_at {
                if entry.count >= self.limit {
                    return Ok(QuotaDecision {
                        allowed: false,
                        remaining: 0,
                        reset_at: entry.reset_at,
                    });
                }
                entry.count += 1;
                entry.last_seen = now;
                return Ok(QuotaDecision {
                    allowed: true,
                    remaining: self.limit - entry.count,
                    reset_at: entry.reset_at,
                });
            }
            tracing::debug!(
                client = client_id,
                last_seen = %entry.last_seen,
                "Quota window lapsed, starting a fresh one"
            );
        }

        // First request from this address, or the stored window has lapsed
        let reset_at = now + self.window;
        entries.insert(
            client_id.to_string(),
            QuotaEntry {
                count: 1,
                reset_at,
                last_seen: now,
            },
        );
        Ok(QuotaDecision {
            allowed: true,
            remaining: self.limit.saturating_sub(1),
            reset_at,
        })
    }

    async fn sweep(&self) -> Result<usize, QuotaStoreError> {
        let now = self.clock.now();
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| QuotaStoreError("quota map mutex poisoned".to_string()))?;
        let before = entries.len();
        entries.retain(|_, entry| now <= entry.reset_at);
        Ok(before - entries.len())
    }
}
