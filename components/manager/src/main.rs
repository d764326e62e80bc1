//! `daemond` — the Manager tier: the bottom of the supervision chain.

use std::process::ExitCode;

use daemond_core::logging;

fn main() -> ExitCode {
    logging::init("daemond");

    let resuming = std::env::args().skip(1).any(|a| a == "--reexecing");

    let code = daemond_manager::run(resuming);
    ExitCode::from(code as u8)
}
