//! The queue-key file: a text file holding exactly one decimal integer
//! followed by exactly one newline, and nothing else (spec §8 property 4).

use std::fs::OpenOptions;
use std::io::Write;
use std::os::unix::fs::OpenOptionsExt;
use std::path::Path;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueueKeyError {
    #[error("I/O error reading/writing {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("queue-key file {path} is malformed: {reason}")]
    Malformed {
        path: std::path::PathBuf,
        reason: String,
    },
}

/// Create the queue-key file with `O_CREAT|O_EXCL` mode 0640, failing if it
/// already exists. `key` is written in decimal, newline-terminated.
pub fn create_exclusive(path: &Path, key: i32) -> Result<(), QueueKeyError> {
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .mode(0o640)
        .open(path)
        .map_err(|e| io_err(path, e))?;
    write!(file, "{key}\n").map_err(|e| io_err(path, e))?;
    Ok(())
}

/// Read and validate the queue-key file, returning the key. The file must
/// contain exactly one decimal integer terminated by exactly one newline
/// and no further content.
pub fn read(path: &Path) -> Result<i32, QueueKeyError> {
    let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    parse(path, &contents)
}

fn parse(path: &Path, contents: &str) -> Result<i32, QueueKeyError> {
    let body = contents.strip_suffix('\n').ok_or_else(|| QueueKeyError::Malformed {
        path: path.to_path_buf(),
        reason: "does not end with a newline".to_string(),
    })?;
    if body.is_empty() || body.contains('\n') {
        return Err(QueueKeyError::Malformed {
            path: path.to_path_buf(),
            reason: "must contain exactly one line".to_string(),
        });
    }
    body.parse::<i32>().map_err(|_| QueueKeyError::Malformed {
        path: path.to_path_buf(),
        reason: format!("{body:?} is not a decimal integer"),
    })
}

fn io_err(path: &Path, source: std::io::Error) -> QueueKeyError {
    QueueKeyError::Io {
        path: path.to_path_buf(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn round_trips_through_create_and_read() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mqueue.key");
        create_exclusive(&path, 123456).unwrap();
        assert_eq!(read(&path).unwrap(), 123456);
    }

    #[test]
    fn written_content_is_exactly_one_line() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mqueue.key");
        create_exclusive(&path, 7).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "7\n");
    }

    #[test]
    fn create_exclusive_fails_if_file_already_exists() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mqueue.key");
        create_exclusive(&path, 1).unwrap();
        assert!(create_exclusive(&path, 2).is_err());
    }

    #[test]
    fn rejects_missing_trailing_newline() {
        let path = Path::new("mqueue.key");
        assert!(parse(path, "123").is_err());
    }

    #[test]
    fn rejects_multiple_lines() {
        let path = Path::new("mqueue.key");
        assert!(parse(path, "123\n456\n").is_err());
    }

    #[test]
    fn rejects_non_numeric_content() {
        let path = Path::new("mqueue.key");
        assert!(parse(path, "abc\n").is_err());
    }
}
