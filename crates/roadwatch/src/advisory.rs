//! Core advisory types for roadwatch.
//!
//! An advisory is a point on the map carrying a speed limit and an optional
//! recurrence rule. [`Advisory`] is the validated domain record,
//! [`AdvisoryPayload`] is what callers submit and [`AdvisoryRecord`] is what
//! listing returns.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::recurrence::{Days, Recurrence, TimeWindow};

/// Kind of place an advisory marks.
///
/// The category only affects how the front end displays a marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Category {
    /// Accident site.
    Accident,
    /// Crowded area.
    Crowded,
    /// Hospital zone.
    Hospital,
    /// School zone.
    School,
}

impl Category {
    /// All categories, in display order.
    pub const ALL: [Self; 4] = [Self::Accident, Self::Crowded, Self::Hospital, Self::School];

    /// Canonical name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Accident => "Accident",
            Self::Crowded => "Crowded",
            Self::Hospital => "Hospital",
            Self::School => "School",
        }
    }

    /// Option value used by the map front end for marker icons.
    #[must_use]
    pub fn front_end_value(self) -> &'static str {
        match self {
            Self::Accident => "accidents",
            Self::Crowded => "crowded",
            Self::Hospital => "hospitals",
            Self::School => "schools",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = Error;

    /// Case-insensitive; also accepts the map front end's option values
    /// (`accidents`, `hospitals`, `schools`).
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "accident" | "accidents" => Ok(Self::Accident),
            "crowded" => Ok(Self::Crowded),
            "hospital" | "hospitals" => Ok(Self::Hospital),
            "school" | "schools" => Ok(Self::School),
            _ => Err(Error::validation(
                "category",
                format!("unknown category '{s}'"),
            )),
        }
    }
}

impl TryFrom<String> for Category {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Category> for String {
    fn from(category: Category) -> Self {
        category.as_str().to_string()
    }
}

/// Latitude/longitude pair.
///
/// No geographic bounds are enforced; only non-finite values are rejected.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lon: f64,
}

impl Position {
    /// Create a new position.
    #[must_use]
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// A speed advisory.
#[derive(Debug, Clone, PartialEq)]
pub struct Advisory {
    /// Identifier assigned by the store; `None` until persisted.
    pub id: Option<i64>,
    /// What the marked place is.
    pub category: Category,
    /// Where the advisory is pinned.
    pub position: Position,
    /// Speed limit in km/h.
    pub speed_limit: f64,
    /// Caller-supplied ISO 8601 creation timestamp, kept verbatim.
    pub created_at: String,
    /// When the advisory applies.
    pub recurrence: Recurrence,
}

impl Advisory {
    /// Create an unpersisted advisory with no schedule.
    #[must_use]
    pub fn new(
        category: Category,
        position: Position,
        speed_limit: f64,
        created_at: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            category,
            position,
            speed_limit,
            created_at: created_at.into(),
            recurrence: Recurrence::default(),
        }
    }

    /// Set the recurrence rule.
    #[must_use]
    pub fn with_recurrence(mut self, recurrence: Recurrence) -> Self {
        self.recurrence = recurrence;
        self
    }

    /// Check every field invariant and return the normalized copy that gets
    /// persisted.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the speed limit is negative or not
    /// finite, the position is not finite, or the creation timestamp is not
    /// an ISO 8601 date-time.
    pub fn normalized(&self) -> Result<Self> {
        check_speed_limit(self.speed_limit)?;
        check_coordinate("lat", self.position.lat)?;
        check_coordinate("lon", self.position.lon)?;
        check_created_at(&self.created_at)?;

        Ok(Self {
            recurrence: self.recurrence.normalized(),
            ..self.clone()
        })
    }

    /// Convert into the listing form. Returns `None` if unpersisted.
    #[must_use]
    pub fn to_record(&self) -> Option<AdvisoryRecord> {
        self.id.map(|id| AdvisoryRecord {
            id,
            category: self.category,
            lat: self.position.lat,
            lon: self.position.lon,
            speed_limit: self.speed_limit,
            created_at: self.created_at.clone(),
            days: self.recurrence.days.to_string(),
            time_from: self.recurrence.time_from_text(),
            time_to: self.recurrence.time_to_text(),
        })
    }

    /// Convert into the map front end's listing form. Returns `None` if
    /// unpersisted.
    #[must_use]
    pub fn to_location(&self) -> Option<LocationRecord> {
        self.id.map(|id| LocationRecord {
            id,
            category: self.category.front_end_value(),
            lat: self.position.lat,
            lon: self.position.lon,
            speed: self.speed_limit,
            timestamp: self.created_at.clone(),
            days: self.recurrence.days.to_string(),
            time_from: self.recurrence.time_from_text(),
            time_to: self.recurrence.time_to_text(),
        })
    }
}

fn check_speed_limit(speed_limit: f64) -> Result<()> {
    if !speed_limit.is_finite() {
        return Err(Error::validation("speedLimit", "must be a finite number"));
    }
    if speed_limit < 0.0 {
        return Err(Error::validation(
            "speedLimit",
            format!("must not be negative, got {speed_limit}"),
        ));
    }
    Ok(())
}

fn check_coordinate(field: &'static str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(Error::validation(field, "must be a finite number"))
    }
}

fn check_created_at(created_at: &str) -> Result<()> {
    if created_at.trim().is_empty() {
        return Err(Error::validation("createdAt", "is required"));
    }
    let parses = DateTime::parse_from_rfc3339(created_at).is_ok()
        || NaiveDateTime::parse_from_str(created_at, "%Y-%m-%dT%H:%M:%S%.f").is_ok();
    if parses {
        Ok(())
    } else {
        Err(Error::validation(
            "createdAt",
            format!("'{created_at}' is not an ISO 8601 timestamp"),
        ))
    }
}

/// A numeric field as submitted: either a JSON number or numeric text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NumericInput {
    /// A JSON number.
    Number(f64),
    /// A string such as `"30"` or `"12.5"`.
    Text(String),
}

impl NumericInput {
    fn parse(field: &'static str, input: Option<&Self>) -> Result<f64> {
        match input {
            None => Err(Error::validation(field, "is required")),
            Some(Self::Number(value)) => Ok(*value),
            Some(Self::Text(text)) => {
                let text = text.trim();
                if text.is_empty() {
                    return Err(Error::validation(field, "is required"));
                }
                text.parse::<f64>()
                    .map_err(|_| Error::validation(field, format!("'{text}' is not a number")))
            }
        }
    }
}

impl From<f64> for NumericInput {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

/// An advisory as submitted by a caller for create or update.
///
/// Every field is optional at the wire level so that missing values surface
/// as validation errors rather than decode failures. `days`, `timeFrom` and
/// `timeTo` default to empty, which clears the schedule.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AdvisoryPayload {
    /// Target id; used by update endpoints that carry it in the body.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Category name.
    #[serde(alias = "type")]
    pub category: Option<String>,
    /// Latitude.
    pub lat: Option<NumericInput>,
    /// Longitude.
    pub lon: Option<NumericInput>,
    /// Speed limit in km/h.
    #[serde(alias = "speed", alias = "speed_limit")]
    pub speed_limit: Option<NumericInput>,
    /// ISO 8601 creation timestamp.
    #[serde(alias = "timestamp", alias = "created_at")]
    pub created_at: Option<String>,
    /// `""`, `"Everyday"` or comma-separated weekday names.
    pub days: Option<String>,
    /// Window start, `HH:MM`.
    #[serde(alias = "time_from")]
    pub time_from: Option<String>,
    /// Window end, `HH:MM`.
    #[serde(alias = "time_to")]
    pub time_to: Option<String>,
}

impl AdvisoryPayload {
    /// Validate and convert into an unpersisted [`Advisory`].
    ///
    /// # Errors
    ///
    /// Returns a validation error naming the first offending field.
    pub fn into_advisory(self) -> Result<Advisory> {
        let category: Category = self
            .category
            .as_deref()
            .ok_or_else(|| Error::validation("category", "is required"))?
            .parse()?;
        let lat = NumericInput::parse("lat", self.lat.as_ref())?;
        let lon = NumericInput::parse("lon", self.lon.as_ref())?;
        let speed_limit = NumericInput::parse("speedLimit", self.speed_limit.as_ref())?;
        let created_at = self.created_at.unwrap_or_default();
        let recurrence = Recurrence {
            days: Days::parse(self.days.as_deref().unwrap_or_default())?,
            time_window: TimeWindow::parse(
                self.time_from.as_deref().unwrap_or_default(),
                self.time_to.as_deref().unwrap_or_default(),
            )?,
        };

        Advisory::new(category, Position::new(lat, lon), speed_limit, created_at)
            .with_recurrence(recurrence)
            .normalized()
    }
}

impl From<&Advisory> for AdvisoryPayload {
    fn from(advisory: &Advisory) -> Self {
        Self {
            id: advisory.id,
            category: Some(advisory.category.to_string()),
            lat: Some(advisory.position.lat.into()),
            lon: Some(advisory.position.lon.into()),
            speed_limit: Some(advisory.speed_limit.into()),
            created_at: Some(advisory.created_at.clone()),
            days: Some(advisory.recurrence.days.to_string()),
            time_from: Some(advisory.recurrence.time_from_text()),
            time_to: Some(advisory.recurrence.time_to_text()),
        }
    }
}

/// A persisted advisory in its flat listing form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvisoryRecord {
    /// Store-assigned id.
    pub id: i64,
    /// Category name.
    pub category: Category,
    /// Latitude.
    pub lat: f64,
    /// Longitude.
    pub lon: f64,
    /// Speed limit in km/h.
    pub speed_limit: f64,
    /// Creation timestamp, verbatim.
    pub created_at: String,
    /// Stored day text.
    pub days: String,
    /// Stored window start, empty when unset.
    pub time_from: String,
    /// Stored window end, empty when unset.
    pub time_to: String,
}

/// A persisted advisory as the map front end reads it from `/get_locations`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationRecord {
    /// Store-assigned id.
    pub id: i64,
    /// Icon key such as `hospitals`.
    #[serde(rename = "type")]
    pub category: &'static str,
    /// Latitude.
    pub lat: f64,
    /// Longitude.
    pub lon: f64,
    /// Speed limit in km/h.
    pub speed: f64,
    /// Creation timestamp, verbatim.
    pub timestamp: String,
    /// Stored day text.
    pub days: String,
    /// Stored window start, empty when unset.
    pub time_from: String,
    /// Stored window end, empty when unset.
    pub time_to: String,
}
