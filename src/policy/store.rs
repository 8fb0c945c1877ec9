//! Read boundary between the gate and policy storage

#[cfg(test)]
use mockall::automock;

use crate::platform::Platform;
use crate::policy::entry::PolicyEntry;
use crate::policy::error::StoreError;

/// Source of the currently-in-effect policy table for a platform.
///
/// Implementations own configuration versioning: `current_entries` returns
/// only rows in effect right now, ordered by version descending (newest
/// first) and unique per (platform, version). The gate treats the returned
/// table as a read-only snapshot valid for the duration of one decision.
#[cfg_attr(test, automock)]
pub trait PolicyStore: Send + Sync {
    /// Current policy rows for `platform`, newest version first.
    fn current_entries(&self, platform: Platform) -> Result<Vec<PolicyEntry>, StoreError>;
}
