use std::time::{Duration, Instant};

use daemond_watchdog::ratelimit;

#[test]
fn sleep_until_a_past_deadline_returns_immediately() {
    let start = Instant::now();
    ratelimit::sleep_until(start - Duration::from_secs(1));
    assert!(start.elapsed() < Duration::from_millis(50));
}

#[test]
fn sleep_until_a_near_future_deadline_waits_roughly_that_long() {
    let deadline = Instant::now() + Duration::from_millis(50);
    ratelimit::sleep_until(deadline);
    assert!(Instant::now() >= deadline);
}
