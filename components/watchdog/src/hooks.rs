//! Fire-and-forget invocation of the operator notification scripts
//! (`resurrect-paused`, `resurrect-resumed`) around the too-fast-crash
//! cooldown (spec §4.2).

use std::os::unix::process::CommandExt;

use daemond_core::paths;
use nix::unistd::{fork, ForkResult};

/// Fork and exec `hook_path(name)`, not waiting for it to finish. A
/// missing script is not an error here — hooks are optional operator
/// collaborators, out of this design's scope (spec §1).
pub fn fire(name: &str) {
    let path = paths::hook_path(name);
    match unsafe { fork() } {
        Ok(ForkResult::Child) => {
            let _ = std::process::Command::new(&path).exec();
            std::process::exit(127);
        }
        Ok(ForkResult::Parent { .. }) => {}
        Err(e) => log::warn!("could not fork to invoke hook {name}: {e}"),
    }
}
