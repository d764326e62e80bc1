//! `daemond-queue` — the kernel-resident System-V message queue backing
//! the control queue described in spec §6.
//!
//! We keep the literal `msgget`/`msgsnd`/`msgrcv` facility rather than
//! substituting a UNIX socket (the spec's §9 design note allows either):
//! the host platform provides it, it matches the "one receive per send,
//! no length prefix" wire contract exactly, and the Launcher/Manager
//! split the spec describes (one creator, one consumer, many producers)
//! is precisely what System-V message queues are for.
//!
//! `libc` does not wrap these calls at a higher level than raw FFI, so —
//! the same way this codebase's own OS layer drops to raw `libc` calls for
//! the handful of primitives not covered by a safer crate — we wrap them
//! here once, behind a small safe API, instead of scattering `unsafe`
//! across the tiers that use a queue.

use std::io;
use std::mem::size_of;
use std::time::{SystemTime, UNIX_EPOCH};

use thiserror::Error;

/// Messages larger than this are rejected by [`ControlQueue::send`] before
/// they ever reach the kernel. The control protocol is a handful of
/// small argument vectors, not a bulk channel.
pub const MAX_MESSAGE_SIZE: usize = 8192;

/// Message type used for every control-queue message (spec §6: "messages
/// of type 1").
pub const MSG_TYPE: i64 = 1;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("msgget failed: {0}")]
    Create(#[source] io::Error),

    #[error("message queue already exists")]
    AlreadyExists,

    #[error("msgsnd failed: {0}")]
    Send(#[source] io::Error),

    #[error("msgrcv failed: {0}")]
    Recv(#[source] io::Error),

    #[error("msgctl(IPC_RMID) failed: {0}")]
    Destroy(#[source] io::Error),

    #[error("message of {len} bytes exceeds the {max} byte limit")]
    TooLarge { len: usize, max: usize },
}

pub type QueueResult<T> = Result<T, QueueError>;

/// A handle to a System-V message queue.
pub struct ControlQueue {
    id: libc::c_int,
}

impl ControlQueue {
    /// Create a new queue at `key` with `CREAT|EXCL` semantics, failing if
    /// one already exists there.
    pub fn create_exclusive(key: i32, mode: u32) -> QueueResult<Self> {
        let flags = libc::IPC_CREAT | libc::IPC_EXCL | (mode as libc::c_int & 0o777);
        let id = unsafe { libc::msgget(key, flags) };
        if id < 0 {
            let err = io::Error::last_os_error();
            return match err.raw_os_error() {
                Some(libc::EEXIST) => Err(QueueError::AlreadyExists),
                _ => Err(QueueError::Create(err)),
            };
        }
        Ok(ControlQueue { id })
    }

    /// Attach to an existing queue at `key`.
    pub fn attach(key: i32) -> QueueResult<Self> {
        let id = unsafe { libc::msgget(key, 0) };
        if id < 0 {
            return Err(QueueError::Create(io::Error::last_os_error()));
        }
        Ok(ControlQueue { id })
    }

    /// Send `payload` as a type-[`MSG_TYPE`] message.
    pub fn send(&self, payload: &[u8]) -> QueueResult<()> {
        check_message_size(payload.len())?;
        let buf = encode(MSG_TYPE, payload);
        let rc = unsafe {
            libc::msgsnd(
                self.id,
                buf.as_ptr() as *const libc::c_void,
                payload.len(),
                0,
            )
        };
        if rc < 0 {
            return Err(QueueError::Send(io::Error::last_os_error()));
        }
        Ok(())
    }

    /// Block until a type-[`MSG_TYPE`] message is available and return its
    /// body. Returns `Err` with `io::ErrorKind::Interrupted` wrapped
    /// inside [`QueueError::Recv`] if a signal interrupts the wait; the
    /// caller is expected to treat that as a normal wakeup, not a fatal
    /// error (spec §5).
    pub fn recv_blocking(&self) -> QueueResult<Vec<u8>> {
        let mut buf = vec![0u8; size_of::<libc::c_long>() + MAX_MESSAGE_SIZE];
        let rc = unsafe {
            libc::msgrcv(
                self.id,
                buf.as_mut_ptr() as *mut libc::c_void,
                MAX_MESSAGE_SIZE,
                MSG_TYPE,
                0,
            )
        };
        if rc < 0 {
            return Err(QueueError::Recv(io::Error::last_os_error()));
        }
        let n = rc as usize;
        let start = size_of::<libc::c_long>();
        Ok(buf[start..start + n].to_vec())
    }

    /// Destroy the queue. Only the Launcher, which created it, is
    /// expected to call this, and only during teardown or when bootstrap
    /// fails partway through (spec §4.1 failure semantics).
    pub fn destroy(self) -> QueueResult<()> {
        let rc = unsafe { libc::msgctl(self.id, libc::IPC_RMID, std::ptr::null_mut()) };
        if rc < 0 {
            return Err(QueueError::Destroy(io::Error::last_os_error()));
        }
        Ok(())
    }
}

/// Reject payloads over [`MAX_MESSAGE_SIZE`] before anything touches the
/// kernel. Split out of [`ControlQueue::send`] so this check is testable
/// without a live queue handle.
fn check_message_size(len: usize) -> QueueResult<()> {
    if len > MAX_MESSAGE_SIZE {
        return Err(QueueError::TooLarge {
            len,
            max: MAX_MESSAGE_SIZE,
        });
    }
    Ok(())
}

fn encode(msgtype: i64, payload: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(size_of::<libc::c_long>() + payload.len());
    buf.extend_from_slice(&(msgtype as libc::c_long).to_ne_bytes());
    buf.extend_from_slice(payload);
    buf
}

/// Returns `true` if `err` represents an interruption by a signal — the
/// normal, non-fatal way a blocking receive ends when a child has died.
pub fn is_interrupted(err: &QueueError) -> bool {
    matches!(err, QueueError::Recv(io_err) if io_err.kind() == io::ErrorKind::Interrupted)
}

/// Draw a "best effort non-repeating" positive key, mixing the current
/// time with the addresses of two short-lived heap allocations (spec
/// §4.1 step 3). This is explicitly not cryptographic; its only job is to
/// avoid clashing with a concurrent Launcher invocation racing to create
/// the same queue.
pub fn generate_key() -> i32 {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as i64;

    let a = Box::new(0u8);
    let addr_a = &*a as *const u8 as i64;
    let b = Box::new(0u8);
    let addr_b = &*b as *const u8 as i64;

    let mixed = now ^ addr_a ^ addr_b;
    let candidate = (mixed as i32) & i32::MAX;

    // Never hand back the reserved "private queue" sentinel or zero.
    if candidate == 0 || candidate == libc::IPC_PRIVATE {
        1
    } else {
        candidate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_keys_are_positive_and_never_the_private_sentinel() {
        for _ in 0..64 {
            let key = generate_key();
            assert!(key > 0);
            assert_ne!(key, libc::IPC_PRIVATE);
        }
    }

    #[test]
    fn generated_keys_vary_across_calls() {
        let keys: std::collections::HashSet<i32> = (0..16).map(|_| generate_key()).collect();
        assert!(keys.len() > 1, "generator produced the same key every time");
    }

    #[test]
    fn encode_prefixes_payload_with_the_message_type() {
        let buf = encode(1, b"start\0mydaemon\0");
        assert_eq!(&buf[size_of::<libc::c_long>()..], b"start\0mydaemon\0");
    }

    // Exercising `create_exclusive`/`attach`/`send`/`recv_blocking` against
    // a real kernel-resident queue is deliberately left to manual/
    // integration testing outside this suite: a System-V message queue may
    // not exist at all under a sandboxed or namespaced test runner, and
    // automated runs shouldn't depend on it being there. What's tested
    // here is the logic that doesn't need one.

    #[test]
    fn message_at_the_limit_is_accepted() {
        assert!(check_message_size(MAX_MESSAGE_SIZE).is_ok());
    }

    #[test]
    fn message_larger_than_the_limit_is_rejected_before_the_syscall() {
        assert!(matches!(
            check_message_size(MAX_MESSAGE_SIZE + 1),
            Err(QueueError::TooLarge { len, max }) if len == MAX_MESSAGE_SIZE + 1 && max == MAX_MESSAGE_SIZE
        ));
    }
}
