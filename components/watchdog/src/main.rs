//! `daemond-resurrectd` — the Watchdog tier. Takes at most one argument:
//! the decimal PID of an already-running Manager to adopt instead of
//! forking a fresh one (spec §9's resume-argument contract).

use std::process::ExitCode;

use nix::unistd::Pid;

use daemond_core::logging;

fn main() -> ExitCode {
    logging::init("daemond-resurrectd");

    let resume_pid = match parse_resume_arg() {
        Ok(pid) => pid,
        Err(msg) => {
            log::error!("{msg}");
            return ExitCode::FAILURE;
        }
    };

    match daemond_watchdog::run(resume_pid) {
        Ok(code) => ExitCode::from(code as u8),
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn parse_resume_arg() -> Result<Option<Pid>, String> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.as_slice() {
        [] => Ok(None),
        [pid] => pid
            .parse::<i32>()
            .map(Pid::from_raw)
            .map(Some)
            .map_err(|_| format!("resume argument {pid:?} is not a decimal PID")),
        _ => Err("daemond-resurrectd takes at most one argument".to_string()),
    }
}
