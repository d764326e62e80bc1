//! The Launcher's one-shot bootstrap sequence (spec §4.1).

use std::fs::DirBuilder;
use std::os::unix::fs::DirBuilderExt;
use std::path::Path;

use nix::sys::signal::Signal;
use nix::unistd::{fork, ForkResult};
use thiserror::Error;

use daemond_core::{env, paths, process};
use daemond_protocol::queuekey;
use daemond_queue::{self, ControlQueue, QueueError};

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("could not create runtime directory {path}: {source}")]
    RuntimeDir {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("control queue setup failed: {0}")]
    Queue(#[from] QueueError),

    #[error("could not persist queue key: {0}")]
    QueueKey(#[from] queuekey::QueueKeyError),

    #[error(transparent)]
    Core(#[from] daemond_core::CoreError),

    #[error("fork failed: {0}")]
    Fork(#[source] nix::Error),

    #[error("exec of Watchdog failed: {0}")]
    Exec(#[source] std::io::Error),
}

pub type BootstrapResult<T> = Result<T, BootstrapError>;

/// Recursively create the runtime directory with mode 0750. An
/// already-existing directory is not an error (spec §4.1 step 2).
pub fn ensure_runtime_dir() -> BootstrapResult<()> {
    let dir = paths::runtime_dir();
    DirBuilder::new()
        .recursive(true)
        .mode(0o750)
        .create(&dir)
        .map_err(|source| BootstrapError::RuntimeDir { path: dir, source })
}

/// Ensure the control queue and its key file exist. Idempotent: if the
/// key file is already present, does nothing and reports no queue as
/// newly created (spec §8 idempotence law).
///
/// On any failure after the queue itself has been created, the queue is
/// destroyed so a half-finished bootstrap doesn't orphan it.
pub fn ensure_queue(key_path: &Path) -> BootstrapResult<bool> {
    if key_path.exists() {
        return Ok(false);
    }

    let (queue, key) = create_queue_with_retry()?;

    match queuekey::create_exclusive(key_path, key) {
        Ok(()) => Ok(true),
        Err(e) => {
            let _ = queue.destroy();
            Err(e.into())
        }
    }
}

/// Draw keys until one is free, creating the queue exclusively. Returns
/// the queue together with the key it was created under, since a
/// `ControlQueue` handle doesn't carry its own key.
fn create_queue_with_retry() -> BootstrapResult<(ControlQueue, i32)> {
    const MAX_ATTEMPTS: usize = 64;
    for _ in 0..MAX_ATTEMPTS {
        let key = daemond_queue::generate_key();
        match ControlQueue::create_exclusive(key, 0o750) {
            Ok(queue) => return Ok((queue, key)),
            Err(QueueError::AlreadyExists) => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Err(BootstrapError::Queue(QueueError::AlreadyExists))
}

/// Install the no-op `SIGCHLD` handler used purely to interrupt `pause()`.
pub fn install_chain_ack_handler() -> BootstrapResult<()> {
    process::install_noop_handler(Signal::SIGCHLD).map_err(Into::into)
}

/// Clear and repopulate the process environment from the environment
/// table (spec §4.1 step 5).
///
/// # Safety
/// Must run before any other thread exists; true at this point in `main`.
pub unsafe fn sanitise_environment() -> BootstrapResult<()> {
    let table = env::load_table(&paths::environtab_path())?;
    env::sanitise(&table);
    Ok(())
}

/// Fork and exec the Watchdog, waiting for the "chain is up" signal.
///
/// Returns `Ok(None)` once the chain is confirmed alive (the normal case)
/// or `Ok(Some(code))` if the Watchdog had already exited by the time we
/// checked, in which case the caller should propagate that exit code
/// instead of claiming success.
pub fn fork_exec_watchdog() -> BootstrapResult<Option<i32>> {
    install_chain_ack_handler()?;

    match unsafe { fork() }.map_err(BootstrapError::Fork)? {
        ForkResult::Child => {
            let err = process::reexec_self(&paths::watchdog_binary(), &[]);
            Err(BootstrapError::Exec(match err {
                daemond_core::CoreError::Io { source, .. } => source,
                other => std::io::Error::other(other.to_string()),
            }))
        }
        ForkResult::Parent { child } => Ok(process::await_child_ack(child)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn ensure_queue_is_idempotent_when_key_file_already_present() {
        let dir = tempdir().unwrap();
        let key_path = dir.path().join("mqueue.key");
        std::fs::write(&key_path, "1\n").unwrap();
        let created = ensure_queue(&key_path).unwrap();
        assert!(!created);
    }

    // `ensure_queue`'s not-yet-bootstrapped path creates a real System-V
    // queue via `create_queue_with_retry`, which may not be available
    // under a sandboxed or namespaced test runner; that path is exercised
    // manually/in integration rather than here. `ensure_queue_is_idempotent_
    // when_key_file_already_present` above covers the idempotence law
    // (spec §8) without touching a live queue at all.
}
