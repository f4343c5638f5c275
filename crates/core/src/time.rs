//! Half-open acquisition windows

use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};

/// Date window `[start, end)` in UTC calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateWindow {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateWindow {
    /// Half-open window; `end` must be after `start`
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if end <= start {
            return Err(Error::invalid(
                "window",
                format!("{start}..{end}"),
                "end must be after start",
            ));
        }
        Ok(Self { start, end })
    }

    /// Window covering `first..=last_inclusive`
    pub fn inclusive(first: NaiveDate, last_inclusive: NaiveDate) -> Result<Self> {
        let end = last_inclusive
            .checked_add_days(Days::new(1))
            .ok_or_else(|| Error::invalid("window", last_inclusive, "date overflow"))?;
        Self::new(first, end)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    /// Exclusive end
    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, instant: &DateTime<Utc>) -> bool {
        let start = self.start.and_time(NaiveTime::MIN).and_utc();
        let end = self.end.and_time(NaiveTime::MIN).and_utc();
        *instant >= start && *instant < end
    }
}

impl fmt::Display for DateWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_inclusive_end_is_half_open() {
        let w = DateWindow::inclusive(ymd(2000, 8, 1), ymd(2001, 5, 31)).unwrap();
        assert_eq!(w.end(), ymd(2001, 6, 1));
        assert!(w.contains(&Utc.with_ymd_and_hms(2001, 5, 31, 23, 59, 59).unwrap()));
        assert!(!w.contains(&Utc.with_ymd_and_hms(2001, 6, 1, 0, 0, 0).unwrap()));
        assert!(w.contains(&Utc.with_ymd_and_hms(2000, 8, 1, 0, 0, 0).unwrap()));
    }

    #[test]
    fn test_rejects_empty_window() {
        assert!(DateWindow::new(ymd(2000, 1, 1), ymd(2000, 1, 1)).is_err());
    }
}
