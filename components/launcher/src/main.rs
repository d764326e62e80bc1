//! `daemond-launch` — the Launcher tier. Run once at boot (or by hand) to
//! bring the control queue and Watchdog/Manager chain into existence, then
//! exit. See spec §4.1.

use std::process::ExitCode;

use nix::sys::stat::{umask, Mode};

use daemond_core::{logging, paths};
use daemond_launcher::bootstrap;

fn main() -> ExitCode {
    logging::init("daemond-launch");

    umask(Mode::from_bits_truncate(0o022));

    if let Err(e) = bootstrap::ensure_runtime_dir() {
        log::error!("{e}");
        return ExitCode::FAILURE;
    }

    let key_path = paths::queue_key_path();
    match bootstrap::ensure_queue(&key_path) {
        Ok(true) => log::info!("control queue created at key file {}", key_path.display()),
        Ok(false) => log::info!("control queue already present, nothing to do"),
        Err(e) => {
            log::error!("{e}");
            return ExitCode::FAILURE;
        }
    }

    if let Err(e) = unsafe { bootstrap::sanitise_environment() } {
        log::error!("{e}");
        return ExitCode::FAILURE;
    }

    match bootstrap::fork_exec_watchdog() {
        Ok(None) => {
            log::info!("Watchdog chain is up");
            ExitCode::SUCCESS
        }
        Ok(Some(code)) => {
            log::error!("Watchdog exited immediately with status {code}");
            ExitCode::from(code as u8)
        }
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
