//! Parent-resurrection: what Manager does when Watchdog has died and
//! immortality is still enabled (spec §4.3.1).

use nix::sys::signal::Signal;
use nix::unistd::{fork, ForkResult};

use daemond_core::lifelock::LifeLock;
use daemond_core::{paths, process};

/// Release the life-lock, fork a replacement Watchdog, and re-acquire the
/// lock once it's confirmed up. Every step is best-effort: a failure here
/// is logged and Manager carries on running, since losing a resurrected
/// Watchdog is non-fatal (Manager ends up re-parented to PID 1 instead).
pub fn resurrect_parent(life_lock: &mut LifeLock) {
    if let Err(e) = life_lock.release() {
        log::warn!("parent-resurrection: could not release the life-lock: {e}");
        return;
    }

    if let Err(e) = process::install_noop_handler(Signal::SIGCHLD) {
        log::warn!("parent-resurrection: could not install SIGCHLD handler: {e}");
    }

    match unsafe { fork() } {
        Ok(ForkResult::Child) => {
            let _ = process::clear_subreaper();
            let err = process::reexec_self(&paths::watchdog_binary(), &[]);
            log::error!("parent-resurrection: exec of Watchdog failed: {err}");
            std::process::exit(127);
        }
        Ok(ForkResult::Parent { child }) => {
            if let Some(code) = process::await_child_ack(child) {
                log::error!(
                    "parent-resurrection: replacement Watchdog exited immediately with status {code}"
                );
            } else {
                log::info!("parent-resurrection: replacement Watchdog is up");
            }
        }
        Err(e) => {
            log::error!("parent-resurrection: fork failed: {e}");
        }
    }

    if let Err(e) = life_lock.reacquire_blocking() {
        log::error!("parent-resurrection: could not re-acquire the life-lock: {e}");
    }
}
