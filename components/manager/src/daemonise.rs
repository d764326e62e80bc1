//! The Daemonise procedure (spec §4.4): turns a "start" request into a
//! detached, session-leading daemon registered by PID file.
//!
//! Manager forks once to isolate this sequence from its own file
//! descriptors and signal state (closing "every fd but stdio" in
//! Manager's own process would be fatal to Manager itself); that forked
//! process is `L0` in the naming the procedure's steps use. `L0` then
//! performs the classic double-fork-with-`setsid` dance (`L0`→`L1`→`L2`)
//! so the final process (`L2`) is fully detached before it execs the
//! site's `daemon-base` script.
//!
//! `L2` writes the PID file and pings `L1` *before* `L1` wakes and exits;
//! `L1`'s exit delivers a real `SIGCHLD` to `L0` (its actual parent),
//! which is how `L0`'s second `pause()` wakes, and delivers the
//! parent-death `SIGCHLD` `L2` requested for itself, which is how `L2`
//! knows `L1` is gone before it resets its own signal disposition. This
//! ordering — write the PID file, then ping — is what makes the §9
//! design note ("removing a handshake silently breaks PID-file
//! availability") hold; a literal top-to-bottom reading of the step list
//! would let `L0` race `L2`'s write.

use std::os::unix::io::AsRawFd;
use std::os::unix::process::CommandExt;
use std::path::Path;

use nix::sys::signal::Signal;
use nix::sys::stat::{umask, Mode};
use nix::unistd::{chdir, fork, getpid, setsid, ForkResult, Pid};

use daemond_core::{paths, pidfile, process};

/// Run the full Daemonise sequence for `verb name args…`, in a process
/// already forked off of Manager for this purpose. Never returns: every
/// path ends in `std::process::exit` or a successful `exec`.
pub fn run(verb: &str, name: &str, args: &[String]) -> ! {
    let pid_path = paths::pid_file_path(name);

    close_foreign_fds();
    process::reset_all_dispositions();
    let _ = process::unblock_all_signals();
    std::env::set_var(paths::ENV_DAEMON_NAME_TAG, name);
    let _ = process::become_subreaper();
    let _ = process::install_noop_handler(Signal::SIGCHLD);

    match unsafe { fork() } {
        Ok(ForkResult::Child) => run_l1(&pid_path, verb, name, args),
        Ok(ForkResult::Parent { child }) => run_l0(&pid_path, child),
        Err(e) => {
            log::error!("daemonise: first fork failed: {e}");
            std::process::exit(1)
        }
    }
}

/// `L0`: waits for the "child up" and "grandchild up" handshakes, then
/// reports the grandchild's status as its own exit code.
///
/// `L0` never reaps `L1` itself — `L1`'s zombie is still attached when
/// `L0` exits a moment later, and is reparented to Manager (the nearest
/// surviving subreaper), whose main loop reaps it on its next wakeup.
fn run_l0(pid_path: &Path, _l1: Pid) -> ! {
    process::pause(); // L1 is up (announced right after setsid)
    process::pause(); // L1 has exited, which only happens after L2 is up

    let code = match pidfile::read_pid_file(pid_path) {
        Ok(grandchild) => match process::try_wait(grandchild) {
            Ok(Some(status)) => process::wait_status_to_exit_code(status),
            _ => 0,
        },
        Err(e) => {
            log::error!("daemonise: could not read PID file after handshake: {e}");
            1
        }
    };
    std::process::exit(code)
}

/// `L1`: becomes session leader, relinquishes subreaper status so `L2`
/// reparents to `L0` once `L1` exits, forks `L2`, then waits for its ping.
fn run_l1(pid_path: &Path, verb: &str, name: &str, args: &[String]) -> ! {
    if let Err(e) = setsid() {
        log::error!("daemonise: setsid failed: {e}");
        std::process::exit(1);
    }
    let _ = process::clear_subreaper();
    let _ = process::announce_ready_to_parent();

    match unsafe { fork() } {
        Ok(ForkResult::Child) => run_l2(pid_path, verb, name, args),
        Ok(ForkResult::Parent { .. }) => {
            process::pause();
            std::process::exit(1)
        }
        Err(e) => {
            log::error!("daemonise: second fork failed: {e}");
            std::process::exit(1)
        }
    }
}

/// `L2`: the process that ultimately execs `daemon-base`. Writes the PID
/// file and pings `L1` only once it is fully ready to be observed.
fn run_l2(pid_path: &Path, verb: &str, name: &str, args: &[String]) -> ! {
    let _ = process::install_noop_handler(Signal::SIGCHLD);
    let _ = process::request_parent_death_signal(Signal::SIGCHLD);

    if let Err(e) = redirect_stdio_to_devnull() {
        log::error!("daemonise: could not redirect stdio: {e}");
        std::process::exit(1);
    }
    umask(Mode::empty());

    if let Err(e) = pidfile::write_pid_file(pid_path, getpid()) {
        log::error!("daemonise: could not write PID file: {e}");
        std::process::exit(1);
    }

    if Path::new(paths::SYSCONFDIR).is_absolute() {
        let _ = chdir("/");
    }

    let _ = process::announce_ready_to_parent();
    process::pause(); // L1 exits right after waking from the ping above;
                       // our own requested parent-death signal (SIGCHLD)
                       // fires when it does.
    let _ = process::reset_to_default(Signal::SIGCHLD);

    let base = paths::daemon_base_path();
    let mut argv = vec![name.to_string()];
    argv.extend(args.iter().cloned());
    let err = std::process::Command::new(&base)
        .arg0(verb)
        .args(&argv)
        .exec();
    log::error!("daemonise: exec of {} failed: {err}", base.display());
    let _ = std::fs::remove_file(pid_path);
    std::process::exit(1)
}

fn close_foreign_fds() {
    let dir = match std::fs::read_dir(paths::SELF_FD) {
        Ok(d) => d,
        Err(_) => return,
    };
    let fds: Vec<i32> = dir
        .filter_map(|entry| entry.ok()?.file_name().to_str()?.parse().ok())
        .collect();
    for fd in fds {
        if fd > 2 {
            unsafe {
                libc::close(fd);
            }
        }
    }
}

fn redirect_stdio_to_devnull() -> std::io::Result<()> {
    let devnull = std::fs::OpenOptions::new()
        .read(true)
        .write(true)
        .open(paths::DEV_NULL)?;
    let fd = devnull.as_raw_fd();
    unsafe {
        libc::dup2(fd, 0);
        libc::dup2(fd, 1);
    }
    Ok(())
}
