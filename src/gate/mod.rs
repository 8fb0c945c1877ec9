//! Gating layer: decision engine, memoization and the request-facing seam
//!
//! ```text
//! ┌──────────────────┐     ┌────────────────┐     ┌─────────────┐
//! │ PlatformMatchers │────▶│ UpgradeGateway │◀────│ PolicyStore │
//! │    (detect)      │     │   (per req.)   │     │  (snapshot) │
//! └──────────────────┘     └────────────────┘     └─────────────┘
//!                                  │
//!                          ┌───────┴───────┐
//!                          ▼               ▼
//!                   ┌────────────┐  ┌───────────────┐
//!                   │  decision  │  │ DecisionCache │
//!                   │  (pure)    │  │  (two tiers)  │
//!                   └────────────┘  └───────────────┘
//! ```
//!
//! # Modules
//!
//! - [`decision`]: pure gating functions over a policy-table snapshot
//! - [`cache`]: request-scoped and shared TTL memoization tiers
//! - [`gateway`]: detection, cached lookups and response annotations

pub mod cache;
pub mod decision;
pub mod gateway;

pub use cache::{CachedLookup, DecisionCache, MemoryCache, RequestScope, SharedCache};
pub use decision::{Decision, decide, latest_version, upgrade_deadline};
pub use gateway::{
    GateOutcome, LATEST_VERSION_HEADER, UPGRADE_DEADLINE_HEADER, UPGRADE_REQUIRED_STATUS,
    UpgradeGateway,
};
