use std::collections::BTreeSet;
use std::fmt;
use std::time::Duration;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Coarse class of a failed attempt, used to decide whether to try again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FailureKind {
    Tls,
    Connect,
    Timeout,
    Status,
    Decode,
    Other,
}

impl FailureKind {
    pub const ALL: [FailureKind; 6] = [
        FailureKind::Tls,
        FailureKind::Connect,
        FailureKind::Timeout,
        FailureKind::Status,
        FailureKind::Decode,
        FailureKind::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FailureKind::Tls => "tls",
            FailureKind::Connect => "connect",
            FailureKind::Timeout => "timeout",
            FailureKind::Status => "status",
            FailureKind::Decode => "decode",
            FailureKind::Other => "other",
        }
    }

    pub fn parse(raw: &str) -> Option<FailureKind> {
        let raw = raw.trim();
        FailureKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(raw))
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backoff {
    Fixed(Duration),
    ExponentialJitter { base: Duration, cap: Duration },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff: Backoff,
    retry_on: BTreeSet<FailureKind>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, Backoff::Fixed(DEFAULT_RETRY_DELAY))
    }
}

impl RetryPolicy {
    /// Retries every failure kind. A zero attempt count is treated as one.
    pub fn new(max_attempts: u32, backoff: Backoff) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
            retry_on: FailureKind::ALL.into_iter().collect(),
        }
    }

    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self::new(max_attempts, Backoff::Fixed(delay))
    }

    pub fn with_retry_on<I>(mut self, kinds: I) -> Self
    where
        I: IntoIterator<Item = FailureKind>,
    {
        self.retry_on = kinds.into_iter().collect();
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn backoff(&self) -> &Backoff {
        &self.backoff
    }

    pub fn retry_on(&self) -> &BTreeSet<FailureKind> {
        &self.retry_on
    }

    pub fn should_retry(&self, kind: FailureKind) -> bool {
        self.retry_on.contains(&kind)
    }

    /// Wait after `failed_attempt` (1-based) before starting the next one.
    pub fn delay_after(&self, failed_attempt: u32) -> Duration {
        match &self.backoff {
            Backoff::Fixed(delay) => *delay,
            Backoff::ExponentialJitter { base, cap } => {
                super::backoff::exponential_jitter_delay(
                    *base,
                    *cap,
                    failed_attempt.saturating_sub(1),
                )
            }
        }
    }
}

/// `all` or a comma list such as `connect,timeout,status`.
pub fn parse_retry_on(raw: &str) -> Result<BTreeSet<FailureKind>, String> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("all") {
        return Ok(FailureKind::ALL.into_iter().collect());
    }
    let mut kinds = BTreeSet::new();
    for item in raw.split(',').map(str::trim).filter(|item| !item.is_empty()) {
        let kind = FailureKind::parse(item).ok_or_else(|| format!("unknown failure kind `{item}`"))?;
        kinds.insert(kind);
    }
    Ok(kinds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_is_three_attempts_five_seconds_all_kinds() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts(), 3);
        assert_eq!(policy.delay_after(1), Duration::from_secs(5));
        assert_eq!(policy.delay_after(2), Duration::from_secs(5));
        for kind in FailureKind::ALL {
            assert!(policy.should_retry(kind));
        }
    }

    #[test]
    fn zero_attempts_still_tries_once() {
        assert_eq!(RetryPolicy::fixed(0, Duration::ZERO).max_attempts(), 1);
    }

    #[test]
    fn retry_on_restricts_kinds() {
        let policy = RetryPolicy::default().with_retry_on([FailureKind::Connect, FailureKind::Tls]);
        assert!(policy.should_retry(FailureKind::Tls));
        assert!(!policy.should_retry(FailureKind::Status));
    }

    #[test]
    fn exponential_delay_respects_cap() {
        let cap = Duration::from_millis(400);
        let policy = RetryPolicy::new(
            5,
            Backoff::ExponentialJitter {
                base: Duration::from_millis(100),
                cap,
            },
        );
        for attempt in 1..=5 {
            assert!(policy.delay_after(attempt) <= cap);
        }
    }

    #[test]
    fn parse_retry_on_accepts_all_and_lists() {
        assert_eq!(parse_retry_on("ALL").expect("all").len(), 6);
        let kinds = parse_retry_on(" connect , timeout,").expect("list");
        assert_eq!(
            kinds.into_iter().collect::<Vec<_>>(),
            vec![FailureKind::Connect, FailureKind::Timeout]
        );
        assert!(parse_retry_on("connect,flaky").is_err());
    }
}
