//! Thin, safe-ish wrappers around the POSIX primitives the supervision
//! chain is built from: signal disposition, the Linux subreaper and
//! parent-death-signal `prctl`s, and `pause`. Where `nix` already covers a
//! primitive we use it; where it doesn't (the two `prctl` operations,
//! `pause`) we drop to `libc` directly, the same way this codebase's own
//! `os::process` layer does for the handful of syscalls not otherwise
//! wrapped.

use nix::sys::signal::{sigaction, SaFlags, SigAction, SigHandler, SigSet, Signal};
use nix::unistd::Pid;

use crate::error::{syscall_err, CoreError, CoreResult};

/// A signal handler that does nothing; installed purely so that a blocking
/// `pause()` is interrupted when the signal arrives.
pub extern "C" fn noop_handler(_signo: libc::c_int) {}

/// Install `noop_handler` for `signal`, restarting no syscalls (we want
/// `pause`, blocking reads, etc. to return `EINTR`).
pub fn install_noop_handler(signal: Signal) -> CoreResult<()> {
    let action = SigAction::new(
        SigHandler::Handler(noop_handler),
        SaFlags::empty(),
        SigSet::empty(),
    );
    unsafe { sigaction(signal, &action) }.map_err(|e| syscall_err("sigaction", e))?;
    Ok(())
}

/// Install `handler` for `signal`, restarting no syscalls. Shared by every
/// tier that needs more than the no-op handler above (Watchdog's
/// `SIGUSR1`/`SIGUSR2`, Manager's `SIGRTMIN`/`SIGUSR1`/`SIGUSR2`).
pub fn install_handler(signal: Signal, handler: extern "C" fn(libc::c_int)) -> CoreResult<()> {
    let action = SigAction::new(SigHandler::Handler(handler), SaFlags::empty(), SigSet::empty());
    unsafe { sigaction(signal, &action) }.map_err(|e| syscall_err("sigaction", e))?;
    Ok(())
}

/// Restore the default disposition for `signal`.
pub fn reset_to_default(signal: Signal) -> CoreResult<()> {
    let action = SigAction::new(SigHandler::SigDfl, SaFlags::empty(), SigSet::empty());
    unsafe { sigaction(signal, &action) }.map_err(|e| syscall_err("sigaction", e))?;
    Ok(())
}

/// Install `handler` for a raw signal number, for the real-time signals
/// (`SIGRTMIN`, used as Manager's parent-death signal) that `nix`'s
/// `Signal` enum has no variant for.
pub fn install_handler_raw(signum: libc::c_int, handler: extern "C" fn(libc::c_int)) -> CoreResult<()> {
    unsafe {
        let mut sa: libc::sigaction = std::mem::zeroed();
        sa.sa_sigaction = handler as usize;
        libc::sigemptyset(&mut sa.sa_mask);
        if libc::sigaction(signum, &sa, std::ptr::null_mut()) != 0 {
            return Err(syscall_err("sigaction", nix::Error::last()));
        }
    }
    Ok(())
}

/// `prctl(PR_SET_PDEATHSIG, signum)` for a raw signal number.
pub fn request_parent_death_signal_raw(signum: libc::c_int) -> CoreResult<()> {
    let rc = unsafe { libc::prctl(libc::PR_SET_PDEATHSIG, signum as libc::c_ulong) };
    if rc < 0 {
        return Err(syscall_err("prctl(PR_SET_PDEATHSIG)", nix::Error::last()));
    }
    Ok(())
}

/// Reset every signal disposition to default across the full numeric
/// range (spec §4.4 step 3), tolerating the handful of signal numbers the
/// kernel refuses to let us touch (`SIGKILL`, `SIGSTOP`).
pub fn reset_all_dispositions() {
    for signum in 1..=libc::SIGRTMAX() {
        unsafe {
            let mut sa: libc::sigaction = std::mem::zeroed();
            sa.sa_sigaction = libc::SIG_DFL;
            libc::sigemptyset(&mut sa.sa_mask);
            libc::sigaction(signum, &sa, std::ptr::null_mut());
        }
    }
}

/// Unblock every signal in the calling thread's signal mask (spec §4.4
/// step 4).
pub fn unblock_all_signals() -> CoreResult<()> {
    unsafe {
        let mut full: libc::sigset_t = std::mem::zeroed();
        libc::sigfillset(&mut full);
        if libc::pthread_sigmask(libc::SIG_UNBLOCK, &full, std::ptr::null_mut()) != 0 {
            return Err(syscall_err("pthread_sigmask", nix::Error::last()));
        }
    }
    Ok(())
}

/// Block the calling thread until a signal is delivered (and, if the
/// disposition is to catch it, the handler has run). Always returns
/// `EINTR`-shaped: `pause()` only returns once interrupted.
pub fn pause() {
    unsafe {
        libc::pause();
    }
}

/// `prctl(PR_SET_CHILD_SUBREAPER, 1)` — adopt orphaned descendants instead
/// of letting them be reparented past us to PID 1.
pub fn become_subreaper() -> CoreResult<()> {
    set_subreaper(1)
}

/// `prctl(PR_SET_CHILD_SUBREAPER, 0)` — give up subreaper status.
pub fn clear_subreaper() -> CoreResult<()> {
    set_subreaper(0)
}

fn set_subreaper(value: libc::c_int) -> CoreResult<()> {
    let rc = unsafe { libc::prctl(libc::PR_SET_CHILD_SUBREAPER, value as libc::c_ulong) };
    if rc < 0 {
        return Err(syscall_err("prctl(PR_SET_CHILD_SUBREAPER)", nix::Error::last()));
    }
    Ok(())
}

/// `prctl(PR_SET_PDEATHSIG, signal)` — ask the kernel to deliver `signal`
/// to us when our parent dies.
pub fn request_parent_death_signal(signal: Signal) -> CoreResult<()> {
    let rc = unsafe { libc::prctl(libc::PR_SET_PDEATHSIG, signal as libc::c_ulong) };
    if rc < 0 {
        return Err(syscall_err("prctl(PR_SET_PDEATHSIG)", nix::Error::last()));
    }
    Ok(())
}

/// Send `signal` to `pid`. A thin, errno-mapped wrapper over `kill(2)`.
pub fn send_signal(pid: Pid, signal: Signal) -> CoreResult<()> {
    nix::sys::signal::kill(pid, signal).map_err(|e| syscall_err("kill", e))
}

/// Ping the calling process's parent with `SIGCHLD` to interrupt its
/// `pause()`. Every tier that forks and execs the next tier down uses
/// this, once up, to wake the ancestor's "chain is up" wait — the same
/// handshake the Launcher relies on in reverse when it waits on Watchdog.
pub fn announce_ready_to_parent() -> CoreResult<()> {
    nix::sys::signal::kill(nix::unistd::getppid(), Signal::SIGCHLD)
        .map_err(|e| syscall_err("kill(getppid, SIGCHLD)", e))
}

/// Sleep for `duration`, returning early without error if a signal
/// interrupts the wait. Callers that need a true restartable sleep (e.g.
/// the Watchdog's crash cooldown) loop this against a deadline rather
/// than relying on libc's own EINTR retry, since the whole point is to
/// notice the interruption.
pub fn sleep_interruptible(duration: std::time::Duration) {
    let ts = libc::timespec {
        tv_sec: duration.as_secs() as libc::time_t,
        tv_nsec: duration.subsec_nanos() as libc::c_long,
    };
    unsafe {
        libc::nanosleep(&ts, std::ptr::null_mut());
    }
}

/// Non-blocking check of whether `pid` has exited, without reaping zombies
/// belonging to someone else. Returns `Ok(None)` if still running.
pub fn try_wait(pid: Pid) -> CoreResult<Option<nix::sys::wait::WaitStatus>> {
    use nix::sys::wait::{waitpid, WaitPidFlag};
    match waitpid(pid, Some(WaitPidFlag::WNOHANG)) {
        Ok(nix::sys::wait::WaitStatus::StillAlive) => Ok(None),
        Ok(status) => Ok(Some(status)),
        Err(nix::Error::ECHILD) => Ok(None),
        Err(e) => Err(syscall_err("waitpid", e)),
    }
}

/// Attempt to reap one exited descendant, any PID (used by a subreaper's
/// main loop after an `EINTR`, spec §4.3: "non-blocking reap of any
/// descendant"). `Ok(None)` covers both "no descendant has changed state"
/// and "no descendants exist" (`ECHILD`) — the main loop treats both the
/// same way, falling through to the interruption handler.
pub fn reap_any() -> CoreResult<Option<nix::sys::wait::WaitStatus>> {
    use nix::sys::wait::{waitpid, WaitPidFlag};
    match waitpid(Pid::from_raw(-1), Some(WaitPidFlag::WNOHANG)) {
        Ok(nix::sys::wait::WaitStatus::StillAlive) => Ok(None),
        Ok(status) => Ok(Some(status)),
        Err(nix::Error::ECHILD) => Ok(None),
        Err(e) => Err(syscall_err("waitpid", e)),
    }
}

/// Block until a signal wakes `pause()`, then check whether `child` has
/// already exited. Returns `Some(code)` if it has — the forked process
/// died before it could announce readiness — or `None` if it's presumed
/// to be up. Every tier that forks a child and waits for its "I'm up"
/// signal uses this same pattern (spec §4.1 step 6, reused verbatim by
/// §4.3.1 step 3's parent-resurrection handshake).
pub fn await_child_ack(child: Pid) -> Option<i32> {
    pause();
    match try_wait(child) {
        Ok(Some(status)) => Some(wait_status_to_exit_code(status)),
        _ => None,
    }
}

/// Translate a `WaitStatus` into the exit code the portable wait-status
/// macros would report: the exit status if the process exited normally,
/// otherwise the signal number that killed it.
pub fn wait_status_to_exit_code(status: nix::sys::wait::WaitStatus) -> i32 {
    use nix::sys::wait::WaitStatus::*;
    match status {
        Exited(_, code) => code,
        Signaled(_, signal, _) => signal as i32,
        _ => 0,
    }
}

/// Re-execute the current binary, replacing this process image.
///
/// On success this never returns. On failure it returns the `io::Error`
/// the kernel gave us, because `execvp` only returns on error.
pub fn reexec_self(program: &std::path::Path, args: &[String]) -> CoreError {
    use std::os::unix::process::CommandExt;
    let err = std::process::Command::new(program).args(args).exec();
    CoreError::Io {
        path: program.to_path_buf(),
        source: err,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wait_status_to_exit_code_prefers_exit_status() {
        let status = nix::sys::wait::WaitStatus::Exited(Pid::from_raw(1), 7);
        assert_eq!(wait_status_to_exit_code(status), 7);
    }

    #[test]
    fn wait_status_to_exit_code_falls_back_to_signal_number() {
        let status =
            nix::sys::wait::WaitStatus::Signaled(Pid::from_raw(1), Signal::SIGKILL, false);
        assert_eq!(wait_status_to_exit_code(status), Signal::SIGKILL as i32);
    }
}
