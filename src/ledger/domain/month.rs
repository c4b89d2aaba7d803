use std::{fmt, str::FromStr};

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// A calendar month, written as `YYYY-MM`.
///
/// Months are ordered chronologically.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Month(NaiveDate);

#[derive(Debug, Eq, Error, PartialEq)]
#[error("{0:?} is not a month in the YYYY-MM format")]
pub struct InvalidMonth(pub String);

impl Month {
    /// Create a month from its year and month number (1-12).
    ///
    /// Returns [`None`] if the month number is out of range or the year does
    /// not fit in four digits.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        if !(0..=9999).contains(&year) {
            return None;
        }

        NaiveDate::from_ymd_opt(year, month, 1).map(Self)
    }

    /// The month that an instant falls in, using UTC.
    pub fn containing(instant: DateTime<Utc>) -> Self {
        Self(instant.date_naive().with_day(1).unwrap_or_else(|| instant.date_naive()))
    }

    /// The current month in UTC.
    pub fn current() -> Self {
        Self::containing(Utc::now())
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    pub fn first_day(&self) -> NaiveDate {
        self.0
    }

    /// The month immediately following this one.
    pub fn succ(&self) -> Self {
        let (year, month) = match self.month() {
            12 => (self.year() + 1, 1),
            month => (self.year(), month + 1),
        };

        // Years are limited to four digits, so the following month always
        // exists in chrono's supported range.
        Self(NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(self.0))
    }

    /// The window of instants belonging to this month under the given
    /// policy.
    pub fn window(&self, policy: MonthEndPolicy) -> MonthWindow {
        let start = midnight_utc(self.0);

        match policy {
            MonthEndPolicy::Day31 => MonthWindow {
                start,
                end: start + Duration::days(30),
                end_inclusive: true,
            },
            MonthEndPolicy::Calendar => MonthWindow {
                start,
                end: midnight_utc(self.succ().0),
                end_inclusive: false,
            },
        }
    }
}

fn midnight_utc(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year(), self.month())
    }
}

impl FromStr for Month {
    type Err = InvalidMonth;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidMonth(s.to_owned());
        let bytes = s.as_bytes();

        let well_formed = bytes.len() == 7
            && bytes[4] == b'-'
            && bytes
                .iter()
                .enumerate()
                .all(|(index, byte)| index == 4 || byte.is_ascii_digit());
        if !well_formed {
            return Err(invalid());
        }

        let year = s[..4].parse().map_err(|_| invalid())?;
        let month = s[5..].parse().map_err(|_| invalid())?;

        Self::new(year, month).ok_or_else(invalid)
    }
}

impl Serialize for Month {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Month {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;

        raw.parse().map_err(de::Error::custom)
    }
}

/// Determines where a month ends when filtering records by month.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MonthEndPolicy {
    /// Every month ends at midnight at the start of its "31st" day. Shorter
    /// months roll over into the first days of the following month, and the
    /// last day of a 31-day month is cut off after midnight.
    Day31,
    /// Months end at the first instant of the following month.
    Calendar,
}

impl Default for MonthEndPolicy {
    fn default() -> Self {
        Self::Day31
    }
}

#[derive(Debug, Error)]
#[error("unknown month end policy {0:?}, expected 'day-31' or 'calendar'")]
pub struct UnknownMonthEndPolicy(String);

impl FromStr for MonthEndPolicy {
    type Err = UnknownMonthEndPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "day-31" => Ok(Self::Day31),
            "calendar" => Ok(Self::Calendar),
            other => Err(UnknownMonthEndPolicy(other.to_owned())),
        }
    }
}

/// A span of time covering one month.
///
/// The start is always inclusive. Whether the end is inclusive depends on the
/// [`MonthEndPolicy`] that produced the window.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct MonthWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    end_inclusive: bool,
}

impl MonthWindow {
    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn end_inclusive(&self) -> bool {
        self.end_inclusive
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        let before_end = if self.end_inclusive {
            instant <= self.end
        } else {
            instant < self.end
        };

        instant >= self.start && before_end
    }
}
