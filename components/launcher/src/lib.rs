//! Pure bootstrap logic for the Launcher tier (spec §4.1).
//!
//! Split out of `main.rs` so it can be exercised by integration tests
//! without forking a real Watchdog chain.

pub mod bootstrap;

pub use bootstrap::{BootstrapError, BootstrapResult};
