//! `daemond-protocol` — the wire contract between an external client, the
//! Launcher-created control queue, and the Manager that consumes it. No
//! process-management logic lives here; see `daemond-queue` for the
//! System-V transport and `daemond-manager` for dispatch.

pub mod queuekey;
pub mod request;
pub mod wire;

pub use request::{Request, RequestError};
pub use wire::{decode_argv, encode_argv, WireError};
