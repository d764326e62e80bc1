//! Compile-time filesystem layout.
//!
//! Mirrors the `#ifndef`-guarded constants in the original C `config.h`:
//! every path has a sensible default and can be overridden at build time
//! (`DAEMOND_RUNDIR=/var/run cargo build`, etc.) without touching source.

use std::path::PathBuf;

/// The package name used to namespace our runtime directory and the
/// per-tier hook/script directory under `SYSCONFDIR`.
pub const PKGNAME: &str = "daemond";

/// The system directory for runtime data (PID files, the life-lock, the
/// queue-key file).
pub const RUNDIR: &str = match option_env!("DAEMOND_RUNDIR") {
    Some(dir) => dir,
    None => "/run",
};

/// The system directory for runtime-local configuration: the environment
/// table, the daemon-base script, and the resurrection hooks.
pub const SYSCONFDIR: &str = match option_env!("DAEMOND_SYSCONFDIR") {
    Some(dir) => dir,
    None => "/etc",
};

/// The directory where the tier binaries live, used to resolve the
/// re-exec and fork targets by name instead of by absolute argv[0].
pub const LIBEXECDIR: &str = match option_env!("DAEMOND_LIBEXECDIR") {
    Some(dir) => dir,
    None => "/usr/libexec/daemond",
};

/// Where the kernel publishes this process's open file descriptors.
pub const SELF_FD: &str = "/proc/self/fd";

pub const DEV_NULL: &str = "/dev/null";

/// Name of the environment variable exported into every daemonised
/// service, carrying the service's own name.
pub const ENV_DAEMON_NAME_TAG: &str = "DAEMOND_NAME";

/// `<rundir>/<pkg>`
pub fn runtime_dir() -> PathBuf {
    PathBuf::from(RUNDIR).join(PKGNAME)
}

/// `<rundir>/<pkg>/lifeline`
pub fn lifelock_path() -> PathBuf {
    runtime_dir().join("lifeline")
}

/// `<rundir>/<pkg>/mqueue.key`
pub fn queue_key_path() -> PathBuf {
    runtime_dir().join("mqueue.key")
}

/// `<rundir>/<name>.pid`
pub fn pid_file_path(name: &str) -> PathBuf {
    PathBuf::from(RUNDIR).join(format!("{name}.pid"))
}

/// `<sysconfdir>/<pkg>.d`
pub fn site_config_dir() -> PathBuf {
    PathBuf::from(SYSCONFDIR).join(format!("{PKGNAME}.d"))
}

/// `<sysconfdir>/<pkg>.d/environtab`
pub fn environtab_path() -> PathBuf {
    site_config_dir().join("environtab")
}

/// `<sysconfdir>/<pkg>.d/daemon-base`
pub fn daemon_base_path() -> PathBuf {
    site_config_dir().join("daemon-base")
}

/// `<sysconfdir>/<pkg>.d/resurrect-paused` / `resurrect-resumed`
pub fn hook_path(name: &str) -> PathBuf {
    site_config_dir().join(name)
}

pub fn launcher_binary() -> PathBuf {
    PathBuf::from(LIBEXECDIR).join("daemond-launch")
}

pub fn watchdog_binary() -> PathBuf {
    PathBuf::from(LIBEXECDIR).join("daemond-resurrectd")
}

pub fn manager_binary() -> PathBuf {
    PathBuf::from(LIBEXECDIR).join("daemond")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pid_file_path_is_under_rundir_not_the_package_subdir() {
        let p = pid_file_path("mydaemon");
        assert_eq!(p, PathBuf::from(RUNDIR).join("mydaemon.pid"));
    }

    #[test]
    fn lifelock_and_queue_key_live_under_the_package_runtime_dir() {
        assert_eq!(lifelock_path(), runtime_dir().join("lifeline"));
        assert_eq!(queue_key_path(), runtime_dir().join("mqueue.key"));
    }

    #[test]
    fn hook_paths_are_named_files_under_the_site_config_dir() {
        assert_eq!(
            hook_path("resurrect-paused"),
            site_config_dir().join("resurrect-paused")
        );
    }
}
