//! PID file handling shared by Daemonise (writer) and Manager (reader).
//!
//! Invariant (spec §3.3): a reader of a PID file never observes a partial
//! write. We get that by writing to a sibling temp file and renaming it
//! into place, which is atomic on the same filesystem, rather than relying
//! on truncate-then-write ordering.

use std::fs::{self, File};
use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use nix::unistd::Pid;

use crate::error::{io_err, CoreError, CoreResult};

/// Permission bits applied to a freshly written PID file.
///
/// The original C source opens the PID file with a literal mode of `644`
/// (decimal), which the kernel reads as octal `1204` — almost certainly a
/// bug, since `1204` sets the sticky bit and drops group/other write
/// protection in a way nobody intended. This port takes the evidently
/// intended value, octal `0644`, as the resolution of that open question
/// (recorded in DESIGN.md).
const PID_FILE_MODE: u32 = 0o644;

/// Atomically write `pid` (decimal, newline-terminated) to `path`.
pub fn write_pid_file(path: &Path, pid: Pid) -> CoreResult<()> {
    let tmp_path = sibling_tmp_path(path);
    let body = format!("{}\n", pid.as_raw());

    let write_result = (|| -> std::io::Result<()> {
        let mut file = File::create(&tmp_path)?;
        file.set_permissions(fs::Permissions::from_mode(PID_FILE_MODE))?;
        file.write_all(body.as_bytes())?;
        file.sync_all()?;
        Ok(())
    })();

    match write_result {
        Ok(()) => fs::rename(&tmp_path, path).map_err(|e| io_err(path, e)),
        Err(e) => {
            let _ = fs::remove_file(&tmp_path);
            Err(io_err(tmp_path, e))
        }
    }
}

fn sibling_tmp_path(path: &Path) -> std::path::PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    match path.parent() {
        Some(parent) => parent.join(name),
        None => std::path::PathBuf::from(name),
    }
}

/// Read back the PID written by [`write_pid_file`].
pub fn read_pid_file(path: &Path) -> CoreResult<Pid> {
    let contents = fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    let trimmed = contents.strip_suffix('\n').unwrap_or(&contents);
    let raw: i32 = trimmed
        .parse()
        .map_err(|_| CoreError::MalformedPidFile {
            path: path.to_path_buf(),
            reason: format!("{trimmed:?} is not a decimal integer"),
        })?;
    Ok(Pid::from_raw(raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn round_trips_through_write_and_read() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mydaemon.pid");
        write_pid_file(&path, Pid::from_raw(4242)).unwrap();
        assert_eq!(read_pid_file(&path).unwrap(), Pid::from_raw(4242));
    }

    #[test]
    fn written_file_has_no_partial_content_visible() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("svc.pid");
        write_pid_file(&path, Pid::from_raw(99)).unwrap();
        let raw = fs::read_to_string(&path).unwrap();
        assert_eq!(raw, "99\n");
    }

    #[test]
    fn leaves_no_temp_file_behind_after_success() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("svc.pid");
        write_pid_file(&path, Pid::from_raw(1)).unwrap();
        assert!(!sibling_tmp_path(&path).exists());
    }

    #[test]
    fn rejects_malformed_content() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.pid");
        fs::write(&path, b"not-a-pid\n").unwrap();
        assert!(read_pid_file(&path).is_err());
    }
}
