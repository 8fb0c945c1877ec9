//! Request-facing gate: detection, cached lookups and response annotations

use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::gate::cache::{
    CachedLookup, DecisionCache, RequestScope, SharedCache, deadline_key, latest_key,
};
use crate::gate::decision::{self, Decision};
use crate::platform::{ClientApp, Platform, PlatformMatchers};
use crate::policy::{PolicyStore, StoreError};
use crate::version::AppVersion;

/// Status code for rejecting clients past their upgrade deadline.
pub const UPGRADE_REQUIRED_STATUS: u16 = 426;

/// Response header carrying the newest version available to the client.
pub const LATEST_VERSION_HEADER: &str = "X-App-Latest-Version";

/// Response header carrying the client's upgrade deadline, ISO-8601.
pub const UPGRADE_DEADLINE_HEADER: &str = "X-App-Upgrade-Date";

/// Evaluation result for one recognized mobile client.
#[derive(Debug, Clone, PartialEq)]
pub struct GateOutcome {
    pub platform: Platform,
    pub client_version: AppVersion,
    pub decision: Decision,
}

impl GateOutcome {
    /// Whether the caller must reject the request with
    /// [`UPGRADE_REQUIRED_STATUS`] instead of processing it.
    pub fn blocked(&self) -> bool {
        self.decision.block
    }

    /// Headers the caller attaches to the response of a passing client.
    ///
    /// The two annotations are independent: both, one or neither may be
    /// present.
    pub fn response_headers(&self) -> Vec<(&'static str, String)> {
        let mut headers = Vec::new();
        if !self.decision.block {
            if let Some(deadline) = self.decision.upgrade_deadline {
                headers.push((UPGRADE_DEADLINE_HEADER, deadline.to_rfc3339()));
            }
        }
        if let Some(latest) = &self.decision.latest_version {
            headers.push((LATEST_VERSION_HEADER, latest.to_string()));
        }
        headers
    }
}

/// The gate as seen from the request pipeline.
///
/// Holds the compiled platform matchers, the policy store and the shared
/// cache tier; per-request state lives in the caller-owned [`RequestScope`].
/// Evaluation is synchronous and takes no locks of its own; blocking
/// happens only inside the store read and the shared cache.
pub struct UpgradeGateway<S, C> {
    matchers: PlatformMatchers,
    store: S,
    cache: DecisionCache<C>,
}

impl<S: PolicyStore, C: SharedCache> UpgradeGateway<S, C> {
    /// Build a gateway, compiling every platform's user-agent pattern.
    pub fn new(store: S, shared: C, ttl: Duration) -> Result<Self, regex::Error> {
        Ok(Self {
            matchers: PlatformMatchers::new()?,
            store,
            cache: DecisionCache::new(shared, ttl),
        })
    }

    /// The policy store backing this gateway.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Evaluate one request.
    ///
    /// `None` means the user agent does not identify a recognized mobile
    /// client and no gating applies, the normal case for browser traffic.
    /// A store error aborts the decision and propagates; the caller chooses
    /// whether to fail open (recommended, the gate is not critical-path) or
    /// closed.
    pub fn evaluate(
        &self,
        user_agent: Option<&str>,
        now: DateTime<Utc>,
        scope: &mut RequestScope,
    ) -> Result<Option<GateOutcome>, StoreError> {
        let Some(client) = user_agent.and_then(|ua| self.matchers.detect(ua)) else {
            return Ok(None);
        };
        let ClientApp { platform, version } = client;

        let deadline = self.cached_deadline(scope, platform, &version)?;
        let latest = self.cached_latest(scope, platform)?;

        let decision = Decision::from_lookups(&version, latest, deadline, now);
        if decision.block {
            info!(
                "Blocking {} client {} past its upgrade deadline",
                platform.as_str(),
                version
            );
        }

        Ok(Some(GateOutcome {
            platform,
            client_version: version,
            decision,
        }))
    }

    fn cached_deadline(
        &self,
        scope: &mut RequestScope,
        platform: Platform,
        version: &AppVersion,
    ) -> Result<Option<DateTime<Utc>>, StoreError> {
        let key = deadline_key(platform, version);
        let value = self.cache.get_or_compute(scope, &key, || {
            let table = self.store.current_entries(platform)?;
            Ok(CachedLookup::Deadline(decision::upgrade_deadline(
                &table, version,
            )))
        })?;
        Ok(value.into_deadline())
    }

    fn cached_latest(
        &self,
        scope: &mut RequestScope,
        platform: Platform,
    ) -> Result<Option<AppVersion>, StoreError> {
        let key = latest_key(platform);
        let value = self.cache.get_or_compute(scope, &key, || {
            let table = self.store.current_entries(platform)?;
            Ok(CachedLookup::Latest(decision::latest_version(&table)))
        })?;
        Ok(value.into_latest())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    use crate::gate::cache::MemoryCache;
    use crate::policy::PolicyEntry;
    use crate::policy::store::MockPolicyStore;

    const ANDROID_UA: &str =
        "Dalvik/2.1.0 (Linux; U; Android 14; Pixel 8 Build/UQ1A.240105.004) AcmeLearn/com.acme.learn/1.5.0";

    fn entry(version: &str, enabled: bool, expire_at: Option<DateTime<Utc>>) -> PolicyEntry {
        PolicyEntry {
            platform: Platform::Android,
            version: version.parse().unwrap(),
            enabled,
            expire_at,
        }
    }

    fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap()
    }

    fn gateway(store: MockPolicyStore) -> UpgradeGateway<MockPolicyStore, MemoryCache> {
        UpgradeGateway::new(store, MemoryCache::new(), Duration::from_secs(3600)).unwrap()
    }

    #[test]
    fn non_mobile_traffic_is_not_gated_and_reads_no_policy() {
        let mut store = MockPolicyStore::new();
        store.expect_current_entries().times(0);
        let gateway = gateway(store);

        let outcome = gateway
            .evaluate(Some("Mozilla/5.0"), at(2026, 1, 1), &mut RequestScope::new())
            .unwrap();
        assert_eq!(outcome, None);

        let outcome = gateway
            .evaluate(None, at(2026, 1, 1), &mut RequestScope::new())
            .unwrap();
        assert_eq!(outcome, None);
    }

    #[test]
    fn cold_evaluation_reads_the_store_once_per_lookup() {
        let mut store = MockPolicyStore::new();
        store
            .expect_current_entries()
            .times(2)
            .returning(|_| Ok(vec![entry("2.0.0", true, Some(at(2026, 6, 1)))]));
        let gateway = gateway(store);

        let outcome = gateway
            .evaluate(Some(ANDROID_UA), at(2026, 1, 1), &mut RequestScope::new())
            .unwrap()
            .unwrap();

        assert!(!outcome.blocked());
        assert_eq!(outcome.decision.upgrade_deadline, Some(at(2026, 6, 1)));
        assert_eq!(
            outcome.decision.latest_version,
            Some("2.0.0".parse().unwrap())
        );
    }

    #[test]
    fn warm_evaluation_is_served_entirely_from_the_shared_tier() {
        let mut store = MockPolicyStore::new();
        store
            .expect_current_entries()
            .times(2)
            .returning(|_| Ok(vec![entry("2.0.0", true, None)]));
        let gateway = gateway(store);

        // Cold request populates the shared tier; the second request brings
        // a fresh scope and must not reach the store again.
        gateway
            .evaluate(Some(ANDROID_UA), at(2026, 1, 1), &mut RequestScope::new())
            .unwrap();
        let outcome = gateway
            .evaluate(Some(ANDROID_UA), at(2026, 1, 1), &mut RequestScope::new())
            .unwrap()
            .unwrap();

        assert_eq!(
            outcome.decision.latest_version,
            Some("2.0.0".parse().unwrap())
        );
    }

    #[test]
    fn store_failure_aborts_the_decision() {
        let mut store = MockPolicyStore::new();
        store
            .expect_current_entries()
            .returning(|_| Err(StoreError::LockPoisoned));
        let gateway = gateway(store);

        let result = gateway.evaluate(Some(ANDROID_UA), at(2026, 1, 1), &mut RequestScope::new());
        assert!(result.is_err());
    }

    #[test]
    fn expired_client_is_blocked() {
        let mut store = MockPolicyStore::new();
        store
            .expect_current_entries()
            .returning(|_| Ok(vec![entry("2.0.0", true, Some(at(2026, 1, 1)))]));
        let gateway = gateway(store);

        let outcome = gateway
            .evaluate(Some(ANDROID_UA), at(2026, 2, 1), &mut RequestScope::new())
            .unwrap()
            .unwrap();

        assert!(outcome.blocked());
    }

    #[test]
    fn headers_for_a_passing_client_behind_latest() {
        let mut store = MockPolicyStore::new();
        store
            .expect_current_entries()
            .returning(|_| Ok(vec![entry("2.0.0", true, Some(at(2026, 6, 1)))]));
        let gateway = gateway(store);

        let outcome = gateway
            .evaluate(Some(ANDROID_UA), at(2026, 1, 1), &mut RequestScope::new())
            .unwrap()
            .unwrap();
        let headers = outcome.response_headers();

        assert_eq!(headers.len(), 2);
        assert_eq!(headers[0].0, UPGRADE_DEADLINE_HEADER);
        assert_eq!(headers[0].1, at(2026, 6, 1).to_rfc3339());
        assert_eq!(headers[1], (LATEST_VERSION_HEADER, "2.0.0".to_string()));
    }

    #[test]
    fn no_headers_for_a_client_already_on_latest_with_no_deadline() {
        let mut store = MockPolicyStore::new();
        store
            .expect_current_entries()
            .returning(|_| Ok(vec![entry("1.5.0", true, None)]));
        let gateway = gateway(store);

        let outcome = gateway
            .evaluate(Some(ANDROID_UA), at(2026, 1, 1), &mut RequestScope::new())
            .unwrap()
            .unwrap();

        assert!(outcome.response_headers().is_empty());
    }
}
