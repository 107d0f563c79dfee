//! CLI command definitions.

use std::path::PathBuf;

use chrono::{SecondsFormat, Utc};
use clap::{Args, Subcommand};

use crate::advisory::{AdvisoryPayload, NumericInput};

/// Serve command arguments.
#[derive(Debug, Args)]
pub struct ServeCommand {
    /// Address to listen on (overrides `server.bind_address`)
    #[arg(short, long, value_name = "ADDR")]
    pub bind: Option<String>,
}

/// Fields describing one advisory.
///
/// `update` takes the same fields as `add` since an update replaces the
/// whole record.
#[derive(Debug, Args)]
pub struct AdvisoryArgs {
    /// Category: Accident, Crowded, Hospital or School
    #[arg(short = 't', long)]
    pub category: String,

    /// Latitude in decimal degrees
    #[arg(long, allow_negative_numbers = true)]
    pub lat: f64,

    /// Longitude in decimal degrees
    #[arg(long, allow_negative_numbers = true)]
    pub lon: f64,

    /// Speed limit in km/h
    #[arg(short, long, allow_negative_numbers = true)]
    pub speed: f64,

    /// Creation time as ISO 8601 (defaults to now)
    #[arg(long, value_name = "TIMESTAMP")]
    pub created_at: Option<String>,

    /// "Everyday" or a comma-separated list such as "Monday,Friday"
    #[arg(short, long)]
    pub days: Option<String>,

    /// Start of the daily window (HH:MM)
    #[arg(long, value_name = "HH:MM", requires = "time_to")]
    pub time_from: Option<String>,

    /// End of the daily window (HH:MM)
    #[arg(long, value_name = "HH:MM", requires = "time_from")]
    pub time_to: Option<String>,
}

impl AdvisoryArgs {
    /// Convert into the payload accepted by the store's validation.
    #[must_use]
    pub fn into_payload(self) -> AdvisoryPayload {
        let created_at = self
            .created_at
            .unwrap_or_else(|| Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true));

        AdvisoryPayload {
            id: None,
            category: Some(self.category),
            lat: Some(NumericInput::from(self.lat)),
            lon: Some(NumericInput::from(self.lon)),
            speed_limit: Some(NumericInput::from(self.speed)),
            created_at: Some(created_at),
            days: self.days,
            time_from: self.time_from,
            time_to: self.time_to,
        }
    }
}

/// List command arguments.
#[derive(Debug, Args)]
pub struct ListCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Show command arguments.
#[derive(Debug, Args)]
pub struct ShowCommand {
    /// Advisory id
    pub id: i64,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Update command arguments.
#[derive(Debug, Args)]
pub struct UpdateCommand {
    /// Advisory id
    pub id: i64,

    /// Replacement contents
    #[command(flatten)]
    pub advisory: AdvisoryArgs,
}

/// Delete command arguments.
#[derive(Debug, Args)]
pub struct DeleteCommand {
    /// Advisory id
    pub id: i64,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> AdvisoryArgs {
        AdvisoryArgs {
            category: "School".to_string(),
            lat: -33.86,
            lon: 151.21,
            speed: 25.0,
            created_at: None,
            days: Some("Monday,Friday".to_string()),
            time_from: Some("08:00".to_string()),
            time_to: Some("09:30".to_string()),
        }
    }

    #[test]
    fn test_into_payload_defaults_created_at() {
        let payload = args().into_payload();
        let created_at = payload.created_at.clone().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(&created_at).is_ok());

        let advisory = payload.into_advisory().unwrap();
        assert_eq!(advisory.recurrence.days.to_string(), "Monday,Friday");
    }

    #[test]
    fn test_into_payload_keeps_created_at() {
        let mut args = args();
        args.created_at = Some("2024-02-02T10:00:00Z".to_string());

        let payload = args.into_payload();
        assert_eq!(payload.created_at.as_deref(), Some("2024-02-02T10:00:00Z"));
        assert!(payload.id.is_none());
    }

    #[test]
    fn test_into_payload_invalid_category_rejected_later() {
        let mut args = args();
        args.category = "Airport".to_string();

        let err = args.into_payload().into_advisory().unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_config_command_debug() {
        let cmd = ConfigCommand::Show { json: false };
        let debug_str = format!("{cmd:?}");
        assert!(debug_str.contains("Show"));
    }
}
