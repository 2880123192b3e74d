use rand::Rng;
use std::time::{Duration, Instant};

fn as_millis_u64(duration: Duration) -> u64 {
    duration.as_millis().min(u64::MAX as u128) as u64
}

pub(super) fn exponential_jitter_delay(base: Duration, cap: Duration, attempt: u32) -> Duration {
    let base_ms = as_millis_u64(base);
    let cap_ms = as_millis_u64(cap);
    if base_ms == 0 || cap_ms == 0 {
        return Duration::from_millis(0);
    }
    let multiplier = 1_u64 << attempt.min(10);
    let max_delay_ms = base_ms.saturating_mul(multiplier).min(cap_ms).max(1);
    let jitter_ms = rand::thread_rng().gen_range(0..=max_delay_ms);
    Duration::from_millis(jitter_ms)
}

/// Blocks for `delay`, shortened to the deadline. Returns false when the
/// deadline has already passed and no further attempt should start.
pub(super) fn sleep_before_retry(delay: Duration, deadline: Option<Instant>) -> bool {
    let Some(delay) = super::deadline::cap_wait(delay, deadline) else {
        return false;
    };
    if !delay.is_zero() {
        std::thread::sleep(delay);
    }
    !super::deadline::is_expired(deadline)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jitter_delay_stays_within_cap() {
        let base = Duration::from_millis(80);
        let cap = Duration::from_millis(600);
        for _ in 0..32 {
            let delay = exponential_jitter_delay(base, cap, 4);
            assert!(delay <= cap);
        }
    }

    #[test]
    fn zero_base_means_no_wait() {
        assert_eq!(
            exponential_jitter_delay(Duration::ZERO, Duration::from_secs(1), 3),
            Duration::ZERO
        );
    }

    #[test]
    fn expired_deadline_skips_sleep() {
        let past = Instant::now() - Duration::from_millis(5);
        let started = Instant::now();
        assert!(!sleep_before_retry(Duration::from_secs(5), Some(past)));
        assert!(started.elapsed() < Duration::from_secs(1));
    }
}
