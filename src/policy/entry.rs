//! Policy table rows

use chrono::{DateTime, Utc};

use crate::platform::Platform;
use crate::version::AppVersion;

/// One administrator-configured rule for a (platform, version) pair.
///
/// A platform's policy table holds at most one entry per version string and
/// is ordered newest-version-first; the gate's lookups rely on that order.
#[derive(Debug, Clone, PartialEq)]
pub struct PolicyEntry {
    pub platform: Platform,
    pub version: AppVersion,
    /// Disabled entries are kept in the table but ignored by the gate.
    pub enabled: bool,
    /// Moment after which clients running at or below this version are
    /// rejected. `None` means the version never expires.
    pub expire_at: Option<DateTime<Utc>>,
}
