//! Dispatches a decoded control-queue message (spec §4.3 main loop).

use nix::unistd::{fork, ForkResult};

use daemond_protocol::{Request, RequestError};

use crate::daemonise;

/// Handle one message body. Malformed messages and unrecognised verbs are
/// logged and dropped (spec §7 taxonomy item 5) rather than propagated as
/// errors — a single bad client message must never take Manager down.
pub fn handle_message(buf: &[u8]) {
    match Request::decode(buf) {
        Ok(Request::Start { name, args }) => handle_start(&name, &args),
        Ok(Request::Other { verb, args }) => {
            log::info!("dropping unrecognised verb {verb:?} (args: {args:?})");
        }
        Err(RequestError::Wire(e)) => log::warn!("dropping malformed message: {e}"),
        Err(e) => log::warn!("dropping malformed request: {e}"),
    }
}

/// Fork off the Daemonise sequence and block for its result — the one
/// deliberately synchronous path through an otherwise asynchronous main
/// loop (spec §7 propagation policy).
fn handle_start(name: &str, args: &[String]) {
    match unsafe { fork() } {
        Ok(ForkResult::Child) => daemonise::run("start", name, args),
        Ok(ForkResult::Parent { child }) => {
            match nix::sys::wait::waitpid(child, None) {
                Ok(status) => log::info!(
                    "daemonise of {name:?} finished: {}",
                    daemond_core::process::wait_status_to_exit_code(status)
                ),
                Err(e) => log::error!("daemonise of {name:?}: waitpid failed: {e}"),
            }
        }
        Err(e) => log::error!("could not fork to daemonise {name:?}: {e}"),
    }
}
