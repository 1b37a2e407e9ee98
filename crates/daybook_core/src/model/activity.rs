//! Activity domain model.
//!
//! # Responsibility
//! - Define the activity record (time, title, description) and its identity.
//! - Provide strict text codecs for `DateKey` (`YYYY-MM-DD`) and
//!   `ClockTime` (`HH:MM`).
//!
//! # Invariants
//! - `id` is generated when a record enters memory and is never persisted.
//! - `ClockTime` is not range-checked; any `u8` pair formats and re-parses.
//! - `DateKey` text is canonical: parsing rejects non zero-padded forms.

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use uuid::Uuid;

const DATE_KEY_FORMAT: &str = "%Y-%m-%d";

/// Stable identifier for an activity within one process lifetime.
pub type ActivityId = Uuid;

/// Text parse failure for date keys and clock times.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivityParseError {
    InvalidDateKey(String),
    InvalidClockTime(String),
}

impl Display for ActivityParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidDateKey(value) => {
                write!(f, "invalid date key `{value}`; expected YYYY-MM-DD")
            }
            Self::InvalidClockTime(value) => {
                write!(f, "invalid clock time `{value}`; expected HH:MM")
            }
        }
    }
}

impl Error for ActivityParseError {}

/// Calendar date under which activities are grouped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DateKey(NaiveDate);

impl DateKey {
    /// Builds a key from calendar components; `None` for impossible dates.
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    /// Today's date in the local calendar.
    pub fn today() -> Self {
        Self(Local::now().date_naive())
    }

    pub fn date(self) -> NaiveDate {
        self.0
    }
}

impl From<NaiveDate> for DateKey {
    fn from(value: NaiveDate) -> Self {
        Self(value)
    }
}

impl Display for DateKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format(DATE_KEY_FORMAT))
    }
}

impl FromStr for DateKey {
    type Err = ActivityParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let date = NaiveDate::parse_from_str(s, DATE_KEY_FORMAT)
            .map_err(|_| ActivityParseError::InvalidDateKey(s.to_string()))?;
        // chrono accepts `2024-1-5`; only the canonical spelling is a key.
        if date.format(DATE_KEY_FORMAT).to_string() != s {
            return Err(ActivityParseError::InvalidDateKey(s.to_string()));
        }
        Ok(Self(date))
    }
}

impl Serialize for DateKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for DateKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// Wall-clock time of an activity.
///
/// The store accepts any component values; `is_valid` is for input
/// boundaries that want to enforce a real time of day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClockTime {
    pub hour: u8,
    pub minute: u8,
}

impl ClockTime {
    pub fn new(hour: u8, minute: u8) -> Self {
        Self { hour, minute }
    }

    /// Returns whether this is a time of day (`00:00..=23:59`).
    pub fn is_valid(self) -> bool {
        self.hour < 24 && self.minute < 60
    }
}

impl Display for ClockTime {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl FromStr for ClockTime {
    type Err = ActivityParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ActivityParseError::InvalidClockTime(s.to_string());
        let (hour, minute) = s.split_once(':').ok_or_else(invalid)?;
        Ok(Self {
            hour: parse_component(hour).ok_or_else(invalid)?,
            minute: parse_component(minute).ok_or_else(invalid)?,
        })
    }
}

fn parse_component(value: &str) -> Option<u8> {
    let well_formed = (2..=3).contains(&value.len()) && value.bytes().all(|b| b.is_ascii_digit());
    if !well_formed {
        return None;
    }
    value.parse().ok()
}

impl Serialize for ClockTime {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ClockTime {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// One user-entered activity.
///
/// Persisted as `{"time", "title", "description"}`; unknown fields are
/// rejected on read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Activity {
    /// Runtime identity; regenerated on every load.
    #[serde(skip, default = "Uuid::new_v4")]
    pub id: ActivityId,
    pub time: ClockTime,
    pub title: String,
    /// Multi-line body, stored verbatim.
    pub description: String,
}

impl Activity {
    /// Creates a record with a freshly generated id.
    pub fn new(time: ClockTime, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            time,
            title: title.into(),
            description: description.into(),
        }
    }

    /// Compares user-visible fields, ignoring the runtime id.
    pub fn same_content(&self, other: &Activity) -> bool {
        self.time == other.time
            && self.title == other.title
            && self.description == other.description
    }
}

#[cfg(test)]
mod tests {
    use super::{Activity, ActivityParseError, ClockTime, DateKey};

    #[test]
    fn clock_time_is_zero_padded() {
        assert_eq!(ClockTime::new(9, 5).to_string(), "09:05");
        assert_eq!(ClockTime::new(23, 59).to_string(), "23:59");
    }

    #[test]
    fn out_of_range_clock_time_still_reparses() {
        let odd = ClockTime::new(130, 7);
        assert!(!odd.is_valid());
        assert_eq!(odd.to_string(), "130:07");
        assert_eq!("130:07".parse::<ClockTime>().unwrap(), odd);
    }

    #[test]
    fn clock_time_rejects_loose_text() {
        for text in ["9:15", "09-15", "09:1", " 09:15", "0x:15", "09:15:00", ""] {
            assert_eq!(
                text.parse::<ClockTime>().unwrap_err(),
                ActivityParseError::InvalidClockTime(text.to_string()),
                "accepted `{text}`"
            );
        }
    }

    #[test]
    fn date_key_requires_canonical_spelling() {
        let key: DateKey = "2024-01-05".parse().unwrap();
        assert_eq!(key, DateKey::from_ymd(2024, 1, 5).unwrap());
        assert!("2024-1-5".parse::<DateKey>().is_err());
        assert!("2024-02-30".parse::<DateKey>().is_err());
        assert!("05/01/2024".parse::<DateKey>().is_err());
    }

    #[test]
    fn same_content_ignores_id() {
        let a = Activity::new(ClockTime::new(9, 15), "Standup", "daily sync");
        let b = Activity::new(ClockTime::new(9, 15), "Standup", "daily sync");
        assert_ne!(a.id, b.id);
        assert!(a.same_content(&b));
        assert_ne!(a, b);
    }
}
