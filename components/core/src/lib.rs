//! `daemond-core` — OS primitives and filesystem conventions shared by
//! every tier of the daemond supervision chain (Launcher, Watchdog,
//! Manager, and the Daemonise procedure they all ultimately invoke).
//!
//! Nothing in this crate knows about the chain's protocol or its tier
//! coordination logic; it is the layer every tier builds on, the way this
//! codebase's other components build on a shared low-level crate.

pub mod env;
pub mod error;
pub mod flags;
pub mod lifelock;
pub mod logging;
pub mod paths;
pub mod pidfile;
pub mod process;

pub use error::{CoreError, CoreResult};
