use std::time::{Duration, Instant};

pub(super) fn deadline_from(started_at: Instant, total: Option<Duration>) -> Option<Instant> {
    total.map(|total| started_at + total)
}

pub(super) fn remaining(deadline: Option<Instant>) -> Option<Duration> {
    deadline.map(|deadline| deadline.saturating_duration_since(Instant::now()))
}

pub(super) fn is_expired(deadline: Option<Instant>) -> bool {
    remaining(deadline).is_some_and(|remaining| remaining.is_zero())
}

pub(super) fn cap_wait(wait: Duration, deadline: Option<Instant>) -> Option<Duration> {
    match remaining(deadline) {
        Some(remaining) if remaining.is_zero() => None,
        Some(remaining) => Some(wait.min(remaining)),
        None => Some(wait),
    }
}

/// Per-attempt timeout; `None` leaves the client default in place.
pub(super) fn send_timeout(deadline: Option<Instant>) -> Option<Duration> {
    remaining(deadline).map(|remaining| remaining.max(Duration::from_millis(1)))
}
