//! Signal-observable state flags.
//!
//! Each tier keeps a handful of booleans that are set from a signal handler
//! and polled from the main loop: `re-exec-requested`, `parent-died`,
//! `immortality-enabled`. A signal handler may run at any point, so the
//! flag must be a single atomic word with no intervening invariant; we
//! never share one of these across tiers or across address spaces, only
//! between a signal handler and the main loop of the same process.

use std::sync::atomic::{AtomicBool, Ordering};

/// A single atomic boolean flag, set from a signal handler and read (and
/// optionally cleared) from the main loop.
pub struct Flag(AtomicBool);

impl Flag {
    pub const fn new(initial: bool) -> Self {
        Flag(AtomicBool::new(initial))
    }

    /// Called from a signal handler. Must not allocate or block.
    pub fn raise(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Called from a signal handler.
    pub fn lower(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Atomically read the flag and clear it, returning the value it held.
    /// Used by main loops that want to consume an edge exactly once.
    pub fn take(&self) -> bool {
        self.0.swap(false, Ordering::SeqCst)
    }
}

impl Default for Flag {
    fn default() -> Self {
        Flag::new(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_requested_initial_value() {
        assert!(!Flag::new(false).is_set());
        assert!(Flag::new(true).is_set());
    }

    #[test]
    fn take_clears_and_returns_prior_value() {
        let f = Flag::new(false);
        assert!(!f.take());
        f.raise();
        assert!(f.take());
        assert!(!f.is_set());
    }
}
