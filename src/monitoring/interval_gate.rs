//! Per-device cadence on top of the shared tick

use chrono::{DateTime, Utc};

/// Whether a device is due for a check at `now`
///
/// A device never checked is always due. Otherwise it is due once at least
/// `interval_secs` have elapsed since the last successful check; devices are
/// skipped on ticks in between.
pub fn is_due(now: DateTime<Utc>, last_check: Option<DateTime<Utc>>, interval_secs: u32) -> bool {
    match last_check {
        None => true,
        Some(last) => {
            let elapsed_ms = (now - last).num_milliseconds();
            elapsed_ms >= i64::from(interval_secs) * 1000
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn should_be_due_when_never_checked() {
        assert!(is_due(Utc::now(), None, 3600));
    }

    #[test]
    fn should_not_be_due_before_interval_elapses() {
        let now = Utc::now();

        assert!(!is_due(now, Some(now - Duration::seconds(59)), 60));
        assert!(!is_due(now, Some(now - Duration::milliseconds(59_999)), 60));
    }

    #[test]
    fn should_be_due_exactly_at_interval() {
        let now = Utc::now();

        assert!(is_due(now, Some(now - Duration::seconds(60)), 60));
    }

    #[test]
    fn should_stay_due_as_time_passes() {
        let last = Utc::now();

        let first_due = (0..600)
            .map(|s| last + Duration::seconds(s))
            .position(|t| is_due(t, Some(last), 45))
            .expect("eventually due");

        assert_eq!(first_due, 45);
        for s in first_due as i64..600 {
            assert!(is_due(last + Duration::seconds(s), Some(last), 45));
        }
    }

    #[test]
    fn should_not_be_due_when_last_check_is_in_the_future() {
        let now = Utc::now();

        assert!(!is_due(now, Some(now + Duration::seconds(5)), 10));
    }
}
