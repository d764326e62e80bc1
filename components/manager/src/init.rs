//! Manager's init sequence (spec §4.3, "Init (in order)").

use thiserror::Error;

use daemond_core::lifelock::LifeLock;
use daemond_core::{paths, process, CoreError};
use daemond_protocol::queuekey;
use daemond_queue::ControlQueue;

use crate::signals;

#[derive(Debug, Error)]
pub enum InitError {
    #[error("another Manager instance is already running")]
    AlreadyRunning,

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("queue-key file is malformed: {0}")]
    QueueKey(#[from] queuekey::QueueKeyError),

    #[error("could not attach to the control queue: {0}")]
    Queue(#[from] daemond_queue::QueueError),
}

pub struct Manager {
    pub life_lock: LifeLock,
    pub queue: ControlQueue,
}

/// Run the full init sequence. On `AlreadyRunning`, the caller is expected
/// to log "daemond is already running" and exit cleanly (spec §8 S2).
pub fn init() -> Result<Manager, InitError> {
    let life_lock = match LifeLock::acquire(&paths::lifelock_path()) {
        Ok(lock) => lock,
        Err(CoreError::AlreadyRunning) => return Err(InitError::AlreadyRunning),
        Err(e) => return Err(e.into()),
    };

    signals::install()?;
    signals::request_parent_death_notification()?;
    process::become_subreaper()?;

    let key = queuekey::read(&paths::queue_key_path())?;
    let queue = ControlQueue::attach(key)?;

    Ok(Manager { life_lock, queue })
}
