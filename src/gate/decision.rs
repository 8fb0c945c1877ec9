//! Pure decision engine for version gating

use chrono::{DateTime, Utc};

use crate::policy::PolicyEntry;
use crate::version::AppVersion;

/// Outcome of gating one client against a platform's policy table.
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    /// The client is past its upgrade deadline and must be rejected.
    pub block: bool,
    /// Deadline applicable to the client's version, when one is configured.
    pub upgrade_deadline: Option<DateTime<Utc>>,
    /// Newest enabled version, surfaced only when the client is behind it.
    pub latest_version: Option<AppVersion>,
}

impl Decision {
    /// Assemble a decision from the two independently memoized lookups.
    ///
    /// Blocking is strict: a client whose deadline is exactly `now` still
    /// passes. The latest version is surfaced only when strictly newer than
    /// the client's.
    pub(crate) fn from_lookups(
        client_version: &AppVersion,
        latest: Option<AppVersion>,
        deadline: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            block: deadline.is_some_and(|deadline| now > deadline),
            upgrade_deadline: deadline,
            latest_version: latest.filter(|latest| *latest > *client_version),
        }
    }
}

/// Newest enabled version in `table`.
///
/// Relies on the store contract that `table` is ordered newest-first;
/// disabled entries are skipped.
pub fn latest_version(table: &[PolicyEntry]) -> Option<AppVersion> {
    table
        .iter()
        .find(|entry| entry.enabled)
        .map(|entry| entry.version.clone())
}

/// Deadline applicable to a client running `client_version`.
///
/// Walks the enabled, expiring entries from the lowest version upward and
/// returns the expiry of the first entry at or above the client's version
/// (inclusive on equality): the nearest configured deadline covering the
/// client. `None` when no expiring entry covers it.
pub fn upgrade_deadline(
    table: &[PolicyEntry],
    client_version: &AppVersion,
) -> Option<DateTime<Utc>> {
    table
        .iter()
        .rev()
        .filter(|entry| entry.enabled && entry.expire_at.is_some())
        .find(|entry| entry.version >= *client_version)
        .and_then(|entry| entry.expire_at)
}

/// Gate `client_version` against `table` as of `now`.
///
/// Deterministic and side-effect free; `table` is treated as a read-only
/// snapshot.
pub fn decide(client_version: &AppVersion, table: &[PolicyEntry], now: DateTime<Utc>) -> Decision {
    let latest = latest_version(table);
    let deadline = upgrade_deadline(table, client_version);
    Decision::from_lookups(client_version, latest, deadline, now)
}
