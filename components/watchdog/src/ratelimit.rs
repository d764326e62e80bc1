//! The too-fast-crash detector (spec §4.2, §8 property 2): if Manager's
//! death follows its own birth by less than a second, resurrection is
//! delayed five minutes instead of happening immediately.

use std::time::{Duration, Instant};

pub const TOO_FAST_THRESHOLD: Duration = Duration::from_secs(1);
pub const COOLDOWN: Duration = Duration::from_secs(5 * 60);

pub fn is_too_fast(birth: Instant, death: Instant) -> bool {
    death.saturating_duration_since(birth) < TOO_FAST_THRESHOLD
}

/// Block until `deadline`, restarting the wait whenever a signal
/// interrupts it (spec: "sleep until 5 minutes past the death instant...
/// restarting the sleep on interruption").
pub fn sleep_until(deadline: Instant) {
    loop {
        let now = Instant::now();
        if now >= deadline {
            return;
        }
        daemond_core::process::sleep_interruptible(deadline - now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn death_within_a_second_of_birth_is_too_fast() {
        let birth = Instant::now();
        let death = birth + Duration::from_millis(500);
        assert!(is_too_fast(birth, death));
    }

    #[test]
    fn death_a_second_or_more_after_birth_is_not_too_fast() {
        let birth = Instant::now();
        let death = birth + Duration::from_secs(2);
        assert!(!is_too_fast(birth, death));
    }

    #[test]
    fn exactly_at_threshold_is_not_too_fast() {
        let birth = Instant::now();
        let death = birth + TOO_FAST_THRESHOLD;
        assert!(!is_too_fast(birth, death));
    }
}
