//! Manager's signal contract (spec §4.3): `SIGRTMIN` announces that the
//! parent (Watchdog) has died, `SIGUSR1` requests a re-exec, `SIGUSR2`
//! disables immortality, and a no-op `SIGCHLD` just interrupts `pause()`.

use daemond_core::flags::Flag;
use daemond_core::{process, CoreResult};
use nix::sys::signal::Signal;

static PARENT_DIED: Flag = Flag::new(false);
static REEXEC_REQUESTED: Flag = Flag::new(false);
static IMMORTALITY_DISABLED: Flag = Flag::new(false);

extern "C" fn on_parent_died(_: libc::c_int) {
    PARENT_DIED.raise();
}

extern "C" fn on_sigusr1(_: libc::c_int) {
    REEXEC_REQUESTED.raise();
}

extern "C" fn on_sigusr2(_: libc::c_int) {
    IMMORTALITY_DISABLED.raise();
}

pub fn install() -> CoreResult<()> {
    process::install_noop_handler(Signal::SIGCHLD)?;
    process::install_handler(Signal::SIGUSR1, on_sigusr1)?;
    process::install_handler(Signal::SIGUSR2, on_sigusr2)?;
    process::install_handler_raw(libc::SIGRTMIN(), on_parent_died)?;
    Ok(())
}

pub fn request_parent_death_notification() -> CoreResult<()> {
    process::request_parent_death_signal_raw(libc::SIGRTMIN())
}

pub fn take_parent_died() -> bool {
    PARENT_DIED.take()
}

pub fn take_reexec_requested() -> bool {
    REEXEC_REQUESTED.take()
}

pub fn immortality_disabled() -> bool {
    IMMORTALITY_DISABLED.is_set()
}
