//! Two-tier memoization of gate lookups
//!
//! Decisions are recomputed per request, but their two inputs (a
//! platform's latest enabled version and the deadline applicable to one
//! client version) change only when administrators edit policy, so they
//! are memoized in two tiers: a request-scoped map dropped at request end,
//! and a process-wide TTL cache shared by all in-flight requests. A failure
//! in the shared tier is a miss, never an error; policy store failures
//! propagate and are never cached.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::platform::Platform;
use crate::policy::StoreError;
use crate::version::AppVersion;

/// A memoized lookup result.
///
/// Absent values are cached too: "no deadline configured" is as cacheable
/// as a concrete deadline.
#[derive(Debug, Clone, PartialEq)]
pub enum CachedLookup {
    /// Result of a deadline lookup for one (platform, client version).
    Deadline(Option<DateTime<Utc>>),
    /// Result of a latest-version lookup for one platform.
    Latest(Option<AppVersion>),
}

impl CachedLookup {
    /// The deadline carried by this entry.
    ///
    /// Keys are typed by construction, so a shape mismatch cannot occur
    /// through the public API; it reads as an absent value.
    pub fn into_deadline(self) -> Option<DateTime<Utc>> {
        match self {
            CachedLookup::Deadline(deadline) => deadline,
            CachedLookup::Latest(_) => None,
        }
    }

    /// The latest version carried by this entry.
    pub fn into_latest(self) -> Option<AppVersion> {
        match self {
            CachedLookup::Latest(latest) => latest,
            CachedLookup::Deadline(_) => None,
        }
    }
}

/// Cache key for the deadline lookup.
///
/// Keyed by (platform, client version): the deadline depends on which
/// version is asking.
pub fn deadline_key(platform: Platform, client_version: &AppVersion) -> String {
    format!("gate.deadline.{}.{}", platform.as_str(), client_version)
}

/// Cache key for the latest-version lookup, shared by every client of the
/// platform.
pub fn latest_key(platform: Platform) -> String {
    format!("gate.latest.{}", platform.as_str())
}

/// Per-request memoization tier.
///
/// Create one per inbound request and drop it at request end; scopes are
/// never shared across requests.
#[derive(Debug, Default)]
pub struct RequestScope {
    entries: HashMap<String, CachedLookup>,
}

impl RequestScope {
    pub fn new() -> Self {
        Self::default()
    }

    fn get(&self, key: &str) -> Option<CachedLookup> {
        self.entries.get(key).cloned()
    }

    fn insert(&mut self, key: String, value: CachedLookup) {
        self.entries.insert(key, value);
    }
}

/// Process-wide, time-bounded cache tier.
///
/// Implementations synchronize internally and may evict entries early under
/// their own capacity policy. Any failure reads as a miss.
pub trait SharedCache: Send + Sync {
    /// Look up a live entry; expired or missing keys return `None`.
    fn get(&self, key: &str) -> Option<CachedLookup>;

    /// Store `value` under `key` for at most `ttl`. Last write wins on
    /// concurrent stores of the same key.
    fn set(&self, key: &str, value: CachedLookup, ttl: Duration);
}

/// In-process [`SharedCache`] holding entries in a mutex-guarded map.
///
/// Expiry is checked on read and stale entries are evicted lazily. A
/// poisoned lock degrades to a permanent miss rather than an error.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, (CachedLookup, DateTime<Utc>)>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SharedCache for MemoryCache {
    fn get(&self, key: &str) -> Option<CachedLookup> {
        let mut entries = self.entries.lock().ok()?;
        match entries.get(key) {
            Some((_, expires_at)) if *expires_at <= Utc::now() => {
                entries.remove(key);
                None
            }
            Some((value, _)) => Some(value.clone()),
            None => None,
        }
    }

    fn set(&self, key: &str, value: CachedLookup, ttl: Duration) {
        let Ok(mut entries) = self.entries.lock() else {
            return;
        };
        let Ok(ttl) = chrono::Duration::from_std(ttl) else {
            return;
        };
        entries.insert(key.to_string(), (value, Utc::now() + ttl));
    }
}

/// Read-through composition of the two tiers.
pub struct DecisionCache<C> {
    shared: C,
    ttl: Duration,
}

impl<C: SharedCache> DecisionCache<C> {
    pub fn new(shared: C, ttl: Duration) -> Self {
        Self { shared, ttl }
    }

    /// Fetch `key` through both tiers, computing on a cold path.
    ///
    /// A request-tier hit returns immediately; a shared-tier hit back-fills
    /// the request tier; a full miss runs `compute`, stores the result in
    /// both tiers and returns it. Compute errors propagate without being
    /// cached, so a failed policy read is retried on the next call.
    pub fn get_or_compute<F>(
        &self,
        scope: &mut RequestScope,
        key: &str,
        compute: F,
    ) -> Result<CachedLookup, StoreError>
    where
        F: FnOnce() -> Result<CachedLookup, StoreError>,
    {
        if let Some(value) = scope.get(key) {
            return Ok(value);
        }
        if let Some(value) = self.shared.get(key) {
            scope.insert(key.to_string(), value.clone());
            return Ok(value);
        }

        debug!("Cache miss for {}, computing", key);
        let value = compute()?;
        self.shared.set(key, value.clone(), self.ttl);
        scope.insert(key.to_string(), value.clone());

        Ok(value)
    }
}
