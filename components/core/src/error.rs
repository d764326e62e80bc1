use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors shared by every tier of the supervision chain.
///
/// Each tier wraps this in its own, smaller error type for the handful of
/// failures that are specific to it; `Core` covers everything that touches
/// the filesystem conventions and OS primitives in this crate.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("syscall {call} failed: {source}")]
    Syscall {
        call: &'static str,
        #[source]
        source: nix::Error,
    },

    #[error("the life-lock is already held by a running instance")]
    AlreadyRunning,

    #[error("queue-key file {path} is malformed: {reason}")]
    MalformedQueueKey { path: PathBuf, reason: String },

    #[error("PID file {path} is malformed: {reason}")]
    MalformedPidFile { path: PathBuf, reason: String },

    #[error("environment table {path} is malformed on line {line}: {reason}")]
    MalformedEnvTable {
        path: PathBuf,
        line: usize,
        reason: String,
    },
}

pub type CoreResult<T> = Result<T, CoreError>;

pub(crate) fn io_err(path: impl Into<PathBuf>, source: io::Error) -> CoreError {
    CoreError::Io {
        path: path.into(),
        source,
    }
}

pub(crate) fn syscall_err(call: &'static str, source: nix::Error) -> CoreError {
    CoreError::Syscall { call, source }
}
