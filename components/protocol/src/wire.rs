//! The control-queue wire format: a buffer of NUL-separated argument
//! strings whose final byte is NUL. There is no length prefix — the
//! kernel delivers exactly one `recv` per `send` on a System-V message
//! queue, so the whole buffer is always available at once.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WireError {
    #[error("message buffer is empty")]
    Empty,

    #[error("message buffer does not end in a NUL byte")]
    MissingTerminator,

    #[error("argument at index {index} is not valid UTF-8")]
    InvalidUtf8 { index: usize },
}

/// Encode an argument vector as NUL-separated bytes with a trailing NUL,
/// the inverse of [`decode_argv`].
pub fn encode_argv<S: AsRef<str>>(args: &[S]) -> Vec<u8> {
    let mut buf = Vec::new();
    for arg in args {
        buf.extend_from_slice(arg.as_ref().as_bytes());
        buf.push(0);
    }
    buf
}

/// Decode a message body into its argument vector.
///
/// Per spec §3 invariant 3 and §8 property 3: the buffer's final byte must
/// be NUL, and the resulting vector has exactly as many elements as there
/// are NUL bytes in the buffer.
pub fn decode_argv(buf: &[u8]) -> Result<Vec<String>, WireError> {
    if buf.is_empty() {
        return Err(WireError::Empty);
    }
    if *buf.last().unwrap() != 0 {
        return Err(WireError::MissingTerminator);
    }

    let mut args = Vec::new();
    for (index, chunk) in buf[..buf.len() - 1].split(|&b| b == 0).enumerate() {
        let s = std::str::from_utf8(chunk).map_err(|_| WireError::InvalidUtf8 { index })?;
        args.push(s.to_string());
    }
    Ok(args)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_multi_argument_message() {
        let args = vec!["start", "mydaemon", "--flag"];
        let encoded = encode_argv(&args);
        assert_eq!(encoded, b"start\0mydaemon\0--flag\0");
        assert_eq!(decode_argv(&encoded).unwrap(), args);
    }

    #[test]
    fn decoded_length_matches_nul_count() {
        let buf = b"\0start\0mydaemon\0".to_vec();
        let decoded = decode_argv(&buf).unwrap();
        assert_eq!(decoded.len(), buf.iter().filter(|&&b| b == 0).count());
        assert_eq!(decoded, vec!["", "start", "mydaemon"]);
    }

    #[test]
    fn rejects_empty_buffer() {
        assert_eq!(decode_argv(&[]), Err(WireError::Empty));
    }

    #[test]
    fn rejects_buffer_missing_trailing_nul() {
        assert_eq!(
            decode_argv(b"start"),
            Err(WireError::MissingTerminator)
        );
    }

    #[test]
    fn rejects_invalid_utf8_argument() {
        let mut buf = vec![0xff, 0xfe];
        buf.push(0);
        assert_eq!(decode_argv(&buf), Err(WireError::InvalidUtf8 { index: 0 }));
    }
}
