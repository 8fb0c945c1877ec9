//! Platform identification layer
//!
//! - [`types`]: the closed set of supported platforms and their user-agent patterns
//! - [`detector`]: compiled matcher registry and client detection

pub mod detector;
pub mod types;

pub use detector::{ClientApp, PlatformMatchers};
pub use types::Platform;
