//! Policy layer: administrator-configured version rules and their storage
//!
//! - [`entry`]: one policy row tying a platform version to enabled/expiry status
//! - [`store`]: the read boundary the gate consumes
//! - [`sqlite`]: SQLite-backed store with the operator surface
//! - [`error`]: store error types

pub mod entry;
pub mod error;
pub mod sqlite;
pub mod store;

pub use entry::PolicyEntry;
pub use error::StoreError;
pub use sqlite::SqlitePolicyStore;
pub use store::PolicyStore;
