//! The life-lock: an append-mode file whose exclusive advisory flock is
//! held for as long as a Manager considers itself "the" running Manager.

use std::fs::{File, OpenOptions};
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};

use nix::fcntl::{flock, FlockArg};

use crate::error::{io_err, syscall_err, CoreError, CoreResult};

pub struct LifeLock {
    file: File,
    path: PathBuf,
    held: bool,
}

impl LifeLock {
    /// Open (creating if absent) the life-lock file and attempt to take an
    /// exclusive, non-blocking advisory lock on it.
    ///
    /// Returns [`CoreError::AlreadyRunning`] if another process already
    /// holds it — the caller is expected to treat that as "the system is
    /// already running" and exit cleanly, not as a fatal error.
    pub fn acquire(path: &Path) -> CoreResult<Self> {
        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(path)
            .map_err(|e| io_err(path, e))?;
        set_close_on_exec(&file)?;

        match flock(file.as_raw_fd(), FlockArg::LockExclusiveNonblock) {
            Ok(()) => Ok(LifeLock {
                file,
                path: path.to_path_buf(),
                held: true,
            }),
            Err(nix::Error::EWOULDBLOCK) => Err(CoreError::AlreadyRunning),
            Err(e) => Err(syscall_err("flock", e)),
        }
    }

    /// Drop the advisory lock while keeping the file descriptor open, so a
    /// resurrected tier can later re-acquire it through the same fd table
    /// entry (or a sibling process can take it during the hand-off
    /// window).
    pub fn release(&mut self) -> CoreResult<()> {
        if !self.held {
            return Ok(());
        }
        flock(self.file.as_raw_fd(), FlockArg::Unlock).map_err(|e| syscall_err("flock", e))?;
        self.held = false;
        Ok(())
    }

    /// Re-acquire the lock, blocking until it is available. Used after
    /// [`release`](Self::release) once the parent-resurrection procedure
    /// has confirmed the new Watchdog is up.
    pub fn reacquire_blocking(&mut self) -> CoreResult<()> {
        flock(self.file.as_raw_fd(), FlockArg::LockExclusive)
            .map_err(|e| syscall_err("flock", e))?;
        self.held = true;
        Ok(())
    }

    pub fn is_held(&self) -> bool {
        self.held
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn set_close_on_exec(file: &File) -> CoreResult<()> {
    use nix::fcntl::{fcntl, FcntlArg, FdFlag};
    let fd = file.as_raw_fd();
    let flags = fcntl(fd, FcntlArg::F_GETFD).map_err(|e| syscall_err("fcntl(F_GETFD)", e))?;
    let mut flags = FdFlag::from_bits_truncate(flags);
    flags.insert(FdFlag::FD_CLOEXEC);
    fcntl(fd, FcntlArg::F_SETFD(flags)).map_err(|e| syscall_err("fcntl(F_SETFD)", e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn first_acquire_succeeds_and_holds_the_lock() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("lifeline");
        let lock = LifeLock::acquire(&path).unwrap();
        assert!(lock.is_held());
    }

    #[test]
    fn second_acquire_on_same_file_reports_already_running() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("lifeline");
        let _first = LifeLock::acquire(&path).unwrap();
        let second = LifeLock::acquire(&path);
        assert!(matches!(second, Err(CoreError::AlreadyRunning)));
    }

    #[test]
    fn release_then_reacquire_round_trips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("lifeline");
        let mut lock = LifeLock::acquire(&path).unwrap();
        lock.release().unwrap();
        assert!(!lock.is_held());
        lock.reacquire_blocking().unwrap();
        assert!(lock.is_held());
    }

    #[test]
    fn releasing_frees_the_lock_for_another_holder() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("lifeline");
        let mut first = LifeLock::acquire(&path).unwrap();
        first.release().unwrap();
        let second = LifeLock::acquire(&path);
        assert!(second.is_ok());
    }
}
