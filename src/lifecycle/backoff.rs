//! Reconnect backoff — attempt-proportional, capped.

use std::time::Duration;

/// Delay before reconnect attempt `attempt` (1-based): `min(attempt × step, cap)`.
///
/// Proportional growth keeps rapid-fire disconnects from hammering the
/// platform; the cap keeps long outages from stretching into hours.
pub fn backoff_delay(attempt: u32, step: Duration, cap: Duration) -> Duration {
    step.saturating_mul(attempt).min(cap)
}

#[cfg(test)]
mod tests {
    use super::*;

    const STEP: Duration = Duration::from_secs(5);
    const CAP: Duration = Duration::from_secs(60);

    #[test]
    fn test_backoff_is_non_decreasing() {
        let mut last = Duration::ZERO;
        for attempt in 1..=30 {
            let delay = backoff_delay(attempt, STEP, CAP);
            assert!(delay >= last, "delay must not shrink (attempt {attempt})");
            last = delay;
        }
    }

    #[test]
    fn test_backoff_grows_until_cap() {
        assert_eq!(backoff_delay(1, STEP, CAP), Duration::from_secs(5));
        assert_eq!(backoff_delay(2, STEP, CAP), Duration::from_secs(10));
        assert_eq!(backoff_delay(12, STEP, CAP), Duration::from_secs(60));
        assert_eq!(backoff_delay(13, STEP, CAP), Duration::from_secs(60));
        assert_eq!(backoff_delay(1_000, STEP, CAP), CAP);
    }
}
