//! Time model.
//!
//! All times are whole minutes since midnight of the operating day.
//! `ClockTime` is the `HH:MM` presentation of a minute value, used at
//! the input boundary and in error messages.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Minutes since midnight of the operating day.
pub type Minutes = i64;

/// A wall-clock time of day, stored as minutes since midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ClockTime(pub Minutes);

/// Error returned when a `HH:MM` string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid clock time '{0}': expected HH:MM")]
pub struct ParseClockError(pub String);

impl ClockTime {
    /// Creates a clock time from hours and minutes.
    pub fn hm(hours: i64, minutes: i64) -> Self {
        Self(hours * 60 + minutes)
    }

    /// Minutes since midnight.
    #[inline]
    pub fn minutes(self) -> Minutes {
        self.0
    }
}

impl From<Minutes> for ClockTime {
    fn from(minutes: Minutes) -> Self {
        Self(minutes)
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = self.0.max(0);
        write!(f, "{:02}:{:02}", m / 60, m % 60)
    }
}

impl FromStr for ClockTime {
    type Err = ParseClockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseClockError(s.to_string());
        let (h, m) = s.trim().split_once(':').ok_or_else(err)?;
        let hours: i64 = h.parse().map_err(|_| err())?;
        let minutes: i64 = m.parse().map_err(|_| err())?;
        // 24:00 is accepted as the end of the day.
        if !(0..=24).contains(&hours) || !(0..60).contains(&minutes) || (hours == 24 && minutes > 0)
        {
            return Err(err());
        }
        Ok(Self::hm(hours, minutes))
    }
}

/// A time interval [start, end).
///
/// Half-open interval: includes start, excludes end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    /// Interval start (inclusive).
    pub start: Minutes,
    /// Interval end (exclusive).
    pub end: Minutes,
}

impl TimeWindow {
    /// Creates a new time window.
    pub fn new(start: Minutes, end: Minutes) -> Self {
        Self { start, end }
    }

    /// Window starting at `start` lasting `length` minutes. The end
    /// saturates at `Minutes::MAX`.
    pub fn starting_at(start: Minutes, length: Minutes) -> Self {
        Self::new(start, start.saturating_add(length))
    }

    /// Length of this window.
    #[inline]
    pub fn duration(&self) -> Minutes {
        self.end - self.start
    }

    /// Whether a time falls within this window.
    #[inline]
    pub fn contains(&self, t: Minutes) -> bool {
        t >= self.start && t < self.end
    }

    /// Whether two windows overlap.
    #[inline]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Planning horizon for a solver run.
///
/// A surgery may only be placed if its surgical interval lies in
/// `[start, end)`. Turnover and break tails may extend past `end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Horizon {
    /// Earliest start.
    pub start: Minutes,
    /// Latest end.
    pub end: Minutes,
}

impl Horizon {
    /// Creates a new horizon.
    pub fn new(start: Minutes, end: Minutes) -> Self {
        Self { start, end }
    }

    /// Whether a surgical window fits.
    #[inline]
    pub fn fits(&self, window: &TimeWindow) -> bool {
        window.start >= self.start && window.end <= self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_parse_and_display() {
        let t: ClockTime = "10:30".parse().unwrap();
        assert_eq!(t.minutes(), 630);
        assert_eq!(t.to_string(), "10:30");
        assert_eq!(ClockTime(485).to_string(), "08:05");
        assert_eq!("24:00".parse::<ClockTime>().unwrap().minutes(), 1440);
    }

    #[test]
    fn test_clock_parse_rejects_garbage() {
        assert!("1030".parse::<ClockTime>().is_err());
        assert!("25:00".parse::<ClockTime>().is_err());
        assert!("10:60".parse::<ClockTime>().is_err());
        assert!("aa:bb".parse::<ClockTime>().is_err());
    }

    #[test]
    fn test_window_overlap_is_half_open() {
        let a = TimeWindow::new(480, 600);
        let b = TimeWindow::new(600, 700);
        let c = TimeWindow::new(599, 610);
        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&c));
        assert!(a.contains(480));
        assert!(!a.contains(600));
        assert_eq!(TimeWindow::starting_at(480, 90).end, 570);
    }

    #[test]
    fn test_horizon_fits() {
        let h = Horizon::new(480, 1440);
        assert!(h.fits(&TimeWindow::new(480, 1440)));
        assert!(!h.fits(&TimeWindow::new(470, 500)));
        assert!(!h.fits(&TimeWindow::new(1400, 1441)));
    }
}
