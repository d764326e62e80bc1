//! Watchdog's signal contract (spec §4.2): `SIGCHLD` just interrupts
//! `pause()`, `SIGUSR1` requests a re-exec, `SIGUSR2` disables immortality.

use daemond_core::flags::Flag;
use daemond_core::{process, CoreResult};
use nix::sys::signal::Signal;

static REEXEC_REQUESTED: Flag = Flag::new(false);
static IMMORTALITY_DISABLED: Flag = Flag::new(false);

extern "C" fn on_sigusr1(_: libc::c_int) {
    REEXEC_REQUESTED.raise();
}

extern "C" fn on_sigusr2(_: libc::c_int) {
    IMMORTALITY_DISABLED.raise();
}

/// Install the Watchdog's handlers. Idempotent; safe to call once at
/// startup and again after a re-exec.
pub fn install() -> CoreResult<()> {
    process::install_noop_handler(Signal::SIGCHLD)?;
    process::install_handler(Signal::SIGUSR1, on_sigusr1)?;
    process::install_handler(Signal::SIGUSR2, on_sigusr2)?;
    Ok(())
}

/// Consume the re-exec-requested edge exactly once.
pub fn take_reexec_requested() -> bool {
    REEXEC_REQUESTED.take()
}

/// `true` once `SIGUSR2` has ever arrived; sticky, never resets within
/// this process image (spec §3 invariant 4) — only a re-exec starts a
/// fresh one.
pub fn immortality_disabled() -> bool {
    IMMORTALITY_DISABLED.is_set()
}
