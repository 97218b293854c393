use chrono::{DateTime, Days, Utc};

use crate::message::Timestamp;
use crate::{AppError, Result};

/// Oldest timestamp of an export reaching `days_ago` whole days back from
/// `now`. Sub-second precision is dropped.
pub fn floor_from_days_ago(now: DateTime<Utc>, days_ago: u32) -> Result<Timestamp> {
    let oldest = now
        .checked_sub_days(Days::new(u64::from(days_ago)))
        .ok_or_else(|| AppError::InvalidConfig(format!("{} days ago is out of range", days_ago)))?;
    Ok(Timestamp::from_secs(oldest.timestamp()))
}

/// The part of history still to be fetched: `floor..=ceiling`.
///
/// `floor` never moves. `ceiling` starts at "now" and only ever moves down,
/// to the oldest timestamp of the last page received.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    floor: Timestamp,
    ceiling: Timestamp,
}

impl TimeWindow {
    pub fn new(floor: Timestamp, ceiling: Timestamp) -> Self {
        Self { floor, ceiling }
    }

    pub fn ending_at(now: DateTime<Utc>, days_ago: u32) -> Result<Self> {
        Ok(Self::new(
            floor_from_days_ago(now, days_ago)?,
            Timestamp::from_datetime(now),
        ))
    }

    pub fn floor(&self) -> Timestamp {
        self.floor
    }

    pub fn ceiling(&self) -> Timestamp {
        self.ceiling
    }

    pub fn is_exhausted(&self) -> bool {
        self.ceiling <= self.floor
    }

    pub fn contains(&self, ts: Timestamp) -> bool {
        self.floor <= ts && ts <= self.ceiling
    }

    /// Move the ceiling down to `oldest_seen`. Returns false, leaving the
    /// window untouched, when that would not shrink it.
    pub fn advance_to(&mut self, oldest_seen: Timestamp) -> bool {
        if oldest_seen < self.ceiling {
            self.ceiling = oldest_seen;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).single().unwrap()
    }

    #[test]
    fn test_floor_whole_days() {
        let now = at(1_700_000_000);
        let floor = floor_from_days_ago(now, 3).unwrap();
        assert_eq!(floor, Timestamp::from_secs(1_700_000_000 - 3 * 86_400));
    }

    #[test]
    fn test_floor_zero_days_is_now() {
        let now = at(1_700_000_000);
        assert_eq!(floor_from_days_ago(now, 0).unwrap(), Timestamp::from_secs(1_700_000_000));
    }

    #[test]
    fn test_floor_drops_subsecond_precision() {
        let now = Utc.timestamp_opt(1_700_000_000, 999_000_000).single().unwrap();
        let floor = floor_from_days_ago(now, 1).unwrap();
        assert_eq!(floor.micros(), 0);
    }

    #[test]
    fn test_floor_out_of_range() {
        let err = floor_from_days_ago(at(0), u32::MAX).unwrap_err();
        assert!(matches!(err, AppError::InvalidConfig(_)));
    }

    #[test]
    fn test_window_ending_at() {
        let window = TimeWindow::ending_at(at(1_700_000_000), 90).unwrap();
        assert_eq!(window.ceiling(), Timestamp::from_secs(1_700_000_000));
        assert_eq!(window.floor(), Timestamp::from_secs(1_700_000_000 - 90 * 86_400));
        assert!(!window.is_exhausted());
    }

    #[test]
    fn test_zero_days_window_is_exhausted() {
        let window = TimeWindow::ending_at(at(1_700_000_000), 0).unwrap();
        assert!(window.is_exhausted());
    }

    #[test]
    fn test_contains_is_inclusive() {
        let window = TimeWindow::new(Timestamp::from_secs(10), Timestamp::from_secs(20));
        assert!(window.contains(Timestamp::from_secs(10)));
        assert!(window.contains(Timestamp::from_secs(20)));
        assert!(window.contains(Timestamp::new(15, 1)));
        assert!(!window.contains(Timestamp::new(9, 999_999)));
        assert!(!window.contains(Timestamp::new(20, 1)));
    }

    #[test]
    fn test_advance_only_moves_down() {
        let mut window = TimeWindow::new(Timestamp::from_secs(10), Timestamp::from_secs(20));

        assert!(!window.advance_to(Timestamp::from_secs(20)));
        assert!(!window.advance_to(Timestamp::from_secs(25)));
        assert_eq!(window.ceiling(), Timestamp::from_secs(20));

        assert!(window.advance_to(Timestamp::new(14, 500_000)));
        assert_eq!(window.ceiling(), Timestamp::new(14, 500_000));
        assert!(!window.is_exhausted());

        assert!(window.advance_to(Timestamp::from_secs(10)));
        assert!(window.is_exhausted());
    }
}
