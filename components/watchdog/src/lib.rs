//! The Watchdog tier (spec §4.2): re-spawns Manager on death, subject to
//! crash-rate limiting, and supports re-exec on `SIGUSR1`.

pub mod hooks;
pub mod ratelimit;
pub mod signals;

use std::time::Instant;

use nix::unistd::{fork, ForkResult, Pid};
use thiserror::Error;

use daemond_core::{paths, process};

#[derive(Debug, Error)]
pub enum WatchdogError {
    #[error("fork failed: {0}")]
    Fork(#[source] nix::Error),

    #[error(transparent)]
    Core(#[from] daemond_core::CoreError),
}

pub type WatchdogResult<T> = Result<T, WatchdogError>;

/// Run the Watchdog supervision loop. `resume_pid` is the one optional
/// resume argument (spec §9's replacement for "re-exec with PID on the
/// command line"): `Some` means an existing Manager is already running
/// and should be adopted rather than forked fresh.
///
/// Returns the exit code the process should use.
///
/// The "chain is up" signal to our own parent is withheld until Manager
/// has announced itself in turn — Launcher's single `pause()` must not
/// wake until the whole chain (Watchdog *and* Manager) is alive, not
/// just Watchdog (spec §2, §5's Watchdog-started-Manager-started order).
/// On a resume (re-exec carrying an existing Manager PID) there is no
/// fresh Manager startup to wait on, so this announces immediately.
pub fn run(resume_pid: Option<Pid>) -> WatchdogResult<i32> {
    signals::install()?;

    let mut manager_pid = match resume_pid {
        Some(pid) => pid,
        None => {
            let pid = spawn_manager()?;
            if let Some(code) = process::await_child_ack(pid) {
                log::error!("Manager exited immediately with status {code}");
                let _ = process::announce_ready_to_parent();
                return Ok(code);
            }
            pid
        }
    };
    process::announce_ready_to_parent()?;

    let mut birth = Instant::now();
    let mut usr2_forwarded = false;

    loop {
        process::pause();

        match process::try_wait(manager_pid) {
            Ok(Some(status)) => {
                let code = process::wait_status_to_exit_code(status);
                if code == 0 {
                    log::info!("Manager exited cleanly, Watchdog shutting down");
                    return Ok(0);
                }
                if signals::immortality_disabled() {
                    log::info!("Manager died (status {code}), immortality disabled, not respawning");
                    return Ok(0);
                }
                log::warn!("Manager died (status {code}), respawning");
                let death = Instant::now();
                if ratelimit::is_too_fast(birth, death) {
                    log::warn!("dying too fast, respawning in 5 minutes");
                    hooks::fire("resurrect-paused");
                    ratelimit::sleep_until(death + ratelimit::COOLDOWN);
                    hooks::fire("resurrect-resumed");
                }
                // Recorded as the death instant, not the moment the
                // replacement actually forks: in the fast-respawn case
                // the two are indistinguishable (no delay between them),
                // and in the cooldown case this deliberately measures
                // the next gap from this death, not from the delayed
                // respawn, so a crash loop that keeps tripping the
                // limiter keeps comparing consecutive deaths.
                birth = death;
                manager_pid = spawn_manager()?;
                usr2_forwarded = false;
            }
            Ok(None) => {
                // INTERRUPT: a signal arrived but Manager is still alive.
                // Priority order: re-exec first, then the immortality edge.
                if signals::take_reexec_requested() {
                    log::info!("re-exec requested, replacing Watchdog image");
                    return Err(reexec(manager_pid).into());
                }
                if signals::immortality_disabled() && !usr2_forwarded {
                    log::info!("forwarding immortality-disable to Manager");
                    process::send_signal(manager_pid, nix::sys::signal::Signal::SIGUSR2)?;
                    usr2_forwarded = true;
                }
            }
            Err(e) => {
                log::error!("waitpid failed: {e}");
            }
        }
    }
}

fn spawn_manager() -> WatchdogResult<Pid> {
    match unsafe { fork() }.map_err(WatchdogError::Fork)? {
        ForkResult::Child => {
            let err = process::reexec_self(&paths::manager_binary(), &[]);
            log::error!("exec of Manager failed: {err}");
            std::process::exit(127);
        }
        ForkResult::Parent { child } => Ok(child),
    }
}

/// Re-execute this program with the current Manager's PID as its one
/// resume argument.
fn reexec(manager_pid: Pid) -> daemond_core::CoreError {
    process::reexec_self(
        &paths::watchdog_binary(),
        &[manager_pid.as_raw().to_string()],
    )
}
