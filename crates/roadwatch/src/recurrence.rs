//! Recurrence rules attached to advisories.
//!
//! A rule has two independent parts: the weekdays it applies on and the
//! time-of-day window it applies in. Both are optional. The two shortcuts the
//! map front end offers are plain literals over the same fields:
//!
//! - `"Everyday"` is stored as that sentinel, never expanded to seven names.
//! - "Anytime" is the literal window `00:00`–`23:59`; there is no separate flag.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use chrono::{NaiveTime, Weekday};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Sentinel stored in the `days` field for "all seven weekdays".
pub const EVERYDAY: &str = "Everyday";

/// Start of the "Anytime" window.
pub const ANYTIME_FROM: &str = "00:00";

/// End of the "Anytime" window.
pub const ANYTIME_TO: &str = "23:59";

/// Canonical weekday order.
pub const WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

const TIME_FORMAT: &str = "%H:%M";

fn time_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(?:[01]\d|2[0-3]):[0-5]\d$").expect("time pattern is valid")
    })
}

/// Full English name of a weekday, as stored.
#[must_use]
pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Parse a canonical weekday name. Only the exact capitalized names match.
#[must_use]
pub fn parse_weekday(name: &str) -> Option<Weekday> {
    WEEKDAYS
        .iter()
        .copied()
        .find(|day| weekday_name(*day) == name)
}

/// The weekdays a rule applies on.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Days {
    /// No day restriction recorded.
    #[default]
    Unset,
    /// The `"Everyday"` sentinel.
    Everyday,
    /// An explicit, duplicate-free, non-empty list in submission order.
    Weekdays(Vec<Weekday>),
}

impl Days {
    /// Parse the stored/wire text form.
    ///
    /// Duplicate names are dropped, keeping the first occurrence.
    ///
    /// # Errors
    ///
    /// Returns a validation error for empty list items or names that are not
    /// one of the seven canonical weekdays.
    pub fn parse(text: &str) -> Result<Self> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(Self::Unset);
        }
        if text == EVERYDAY {
            return Ok(Self::Everyday);
        }

        let mut days = Vec::new();
        for item in text.split(',').map(str::trim) {
            if item.is_empty() {
                return Err(Error::validation("days", "empty weekday in list"));
            }
            let day = parse_weekday(item).ok_or_else(|| {
                Error::validation("days", format!("unknown weekday name '{item}'"))
            })?;
            if !days.contains(&day) {
                days.push(day);
            }
        }
        Ok(Self::Weekdays(days))
    }

    /// Build a day set from weekdays, dropping duplicates.
    ///
    /// An empty input yields [`Days::Unset`].
    #[must_use]
    pub fn from_weekdays(weekdays: impl IntoIterator<Item = Weekday>) -> Self {
        let mut days = Vec::new();
        for day in weekdays {
            if !days.contains(&day) {
                days.push(day);
            }
        }
        if days.is_empty() {
            Self::Unset
        } else {
            Self::Weekdays(days)
        }
    }

    /// Return the normalized form of this value.
    #[must_use]
    pub fn normalized(&self) -> Self {
        match self {
            Self::Weekdays(days) => Self::from_weekdays(days.iter().copied()),
            other => other.clone(),
        }
    }

    /// Check whether no day restriction is recorded.
    #[must_use]
    pub fn is_unset(&self) -> bool {
        matches!(self, Self::Unset)
    }

    /// Expand to concrete weekdays. `Everyday` expands to all seven.
    #[must_use]
    pub fn weekdays(&self) -> Vec<Weekday> {
        match self {
            Self::Unset => Vec::new(),
            Self::Everyday => WEEKDAYS.to_vec(),
            Self::Weekdays(days) => days.clone(),
        }
    }

    /// True for `Everyday` and for an explicit list naming all seven days.
    #[must_use]
    pub fn is_every_day(&self) -> bool {
        match self {
            Self::Unset => false,
            Self::Everyday => true,
            Self::Weekdays(days) => WEEKDAYS.iter().all(|day| days.contains(day)),
        }
    }

    /// Human-readable form, `"None"` when unset.
    #[must_use]
    pub fn describe(&self) -> String {
        if self.is_unset() {
            "None".to_string()
        } else {
            self.to_string()
        }
    }
}

/// Stored/wire text form: `""`, `"Everyday"` or comma-joined names.
impl fmt::Display for Days {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unset => Ok(()),
            Self::Everyday => f.write_str(EVERYDAY),
            Self::Weekdays(days) => {
                let names: Vec<&str> = days.iter().map(|day| weekday_name(*day)).collect();
                f.write_str(&names.join(","))
            }
        }
    }
}

impl FromStr for Days {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for Days {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Days {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::parse(&text).map_err(serde::de::Error::custom)
    }
}

/// A concrete time-of-day window in `HH:MM` form.
///
/// `from` may be later than `to` (a window that crosses midnight).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    /// Start of the window.
    pub from: NaiveTime,
    /// End of the window.
    pub to: NaiveTime,
}

impl TimeWindow {
    /// Parse a `from`/`to` pair from its text form.
    ///
    /// Returns `Ok(None)` when both ends are empty.
    ///
    /// # Errors
    ///
    /// Returns a validation error when exactly one end is empty or either end
    /// is not a strict `HH:MM` time.
    pub fn parse(from: &str, to: &str) -> Result<Option<Self>> {
        let (from, to) = (from.trim(), to.trim());
        match (from.is_empty(), to.is_empty()) {
            (true, true) => Ok(None),
            (false, true) => Err(Error::validation(
                "timeTo",
                "must be set when timeFrom is set",
            )),
            (true, false) => Err(Error::validation(
                "timeFrom",
                "must be set when timeTo is set",
            )),
            (false, false) => Ok(Some(Self {
                from: parse_time("timeFrom", from)?,
                to: parse_time("timeTo", to)?,
            })),
        }
    }

    /// The "Anytime" window, `00:00`–`23:59`.
    #[must_use]
    pub fn anytime() -> Self {
        Self {
            from: NaiveTime::MIN,
            to: NaiveTime::from_hms_opt(23, 59, 0).unwrap_or(NaiveTime::MIN),
        }
    }

    /// Check whether this is the literal "Anytime" window.
    #[must_use]
    pub fn is_anytime(&self) -> bool {
        self.start_text() == ANYTIME_FROM && self.end_text() == ANYTIME_TO
    }

    /// `from` in `HH:MM` form.
    #[must_use]
    pub fn start_text(&self) -> String {
        self.from.format(TIME_FORMAT).to_string()
    }

    /// `to` in `HH:MM` form.
    #[must_use]
    pub fn end_text(&self) -> String {
        self.to.format(TIME_FORMAT).to_string()
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.start_text(), self.end_text())
    }
}

fn parse_time(field: &'static str, text: &str) -> Result<NaiveTime> {
    if !time_pattern().is_match(text) {
        return Err(Error::validation(
            field,
            format!("'{text}' is not a HH:MM time"),
        ));
    }
    NaiveTime::parse_from_str(text, TIME_FORMAT)
        .map_err(|e| Error::validation(field, format!("'{text}': {e}")))
}

/// The full applicability rule of an advisory.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Recurrence {
    /// Weekdays the advisory applies on.
    pub days: Days,
    /// Time-of-day window, `None` when unset.
    pub time_window: Option<TimeWindow>,
}

impl Recurrence {
    /// Parse the three wire fields into a rule.
    ///
    /// # Errors
    ///
    /// Returns a validation error when any part is malformed.
    pub fn parse(days: &str, time_from: &str, time_to: &str) -> Result<Self> {
        Ok(Self {
            days: Days::parse(days)?,
            time_window: TimeWindow::parse(time_from, time_to)?,
        })
    }

    /// Return the normalized form of this rule.
    #[must_use]
    pub fn normalized(&self) -> Self {
        Self {
            days: self.days.normalized(),
            time_window: self.time_window,
        }
    }

    /// True when no schedule is recorded at all.
    #[must_use]
    pub fn is_cleared(&self) -> bool {
        self.days.is_unset() && self.time_window.is_none()
    }

    /// True when the rule places no effective restriction: days are unset or
    /// cover every day, and the window is unset or "Anytime".
    #[must_use]
    pub fn is_unrestricted(&self) -> bool {
        let any_day = self.days.is_unset() || self.days.is_every_day();
        let any_time = self.time_window.map_or(true, |window| window.is_anytime());
        any_day && any_time
    }

    /// Stored text of the window start, empty when unset.
    #[must_use]
    pub fn time_from_text(&self) -> String {
        self.time_window
            .map(|window| window.start_text())
            .unwrap_or_default()
    }

    /// Stored text of the window end, empty when unset.
    #[must_use]
    pub fn time_to_text(&self) -> String {
        self.time_window
            .map(|window| window.end_text())
            .unwrap_or_default()
    }

    /// Human-readable window, `"Not set"` when unset.
    #[must_use]
    pub fn describe_window(&self) -> String {
        self.time_window
            .map_or_else(|| "Not set".to_string(), |window| window.to_string())
    }
}
