//! The Manager tier (spec §4.3): owns the life-lock and control queue,
//! reaps orphaned descendants, dispatches service requests, and
//! resurrects Watchdog when it dies.

pub mod daemonise;
pub mod dispatch;
pub mod init;
pub mod resurrection;
pub mod signals;

use daemond_core::{paths, process};
use init::{InitError, Manager};

/// Run Manager until a fatal error or a clean re-exec hand-off.
///
/// `resuming` is `true` when this process image was reached via the
/// `--reexecing` resume argument (spec §4.3's table entry for
/// `re-exec-requested`); it only affects the startup log line.
pub fn run(resuming: bool) -> i32 {
    let mut manager = match init::init() {
        Ok(m) => m,
        Err(InitError::AlreadyRunning) => {
            log::error!("daemond is already running");
            return 1;
        }
        Err(e) => {
            log::error!("init failed: {e}");
            return 1;
        }
    };

    if resuming {
        log::info!("Manager resumed after re-exec");
    }
    let _ = process::announce_ready_to_parent();

    loop {
        match manager.queue.recv_blocking() {
            Ok(payload) => dispatch::handle_message(&payload),
            Err(e) if daemond_queue::is_interrupted(&e) => {
                if let Err(fatal) = handle_interruption(&mut manager) {
                    log::error!("{fatal}");
                    return 1;
                }
            }
            Err(e) => {
                log::error!("fatal error receiving from the control queue: {e}");
                return 1;
            }
        }
    }
}

/// One pass through the INTERRUPTION handler table (spec §4.3, §5
/// priority order: re-exec first, then parent-died, then the
/// immortality-disabled edge).
fn handle_interruption(manager: &mut Manager) -> Result<(), daemond_core::CoreError> {
    match process::reap_any() {
        Ok(Some(status)) => {
            log::info!(
                "reaped an orphaned descendant (status {})",
                process::wait_status_to_exit_code(status)
            );
            return Ok(());
        }
        Ok(None) => {}
        Err(e) => return Err(e),
    }

    if signals::take_reexec_requested() {
        log::info!("re-exec requested");
        if signals::immortality_disabled() {
            log::info!("immortality will be re-enabled by the new image");
        }
        return Err(process::reexec_self(
            &paths::manager_binary(),
            &["--reexecing".to_string()],
        ));
    }

    if signals::take_parent_died() && !signals::immortality_disabled() {
        resurrection::resurrect_parent(&mut manager.life_lock);
        return Ok(());
    }

    static FORWARDED: daemond_core::flags::Flag = daemond_core::flags::Flag::new(false);
    if signals::immortality_disabled() && !FORWARDED.is_set() {
        FORWARDED.raise();
        log::info!("forwarding immortality-disable up to Watchdog");
        let _ = process::send_signal(nix::unistd::getppid(), nix::sys::signal::Signal::SIGUSR2);
    }

    Ok(())
}
