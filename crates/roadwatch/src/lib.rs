//! `roadwatch` - Speed advisories pinned to map locations
//!
//! This library provides the advisory model, weekly recurrence rules, the
//! `SQLite`-backed [`AdvisoryStore`] and an HTTP binding over it.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod advisory;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod recurrence;
pub mod server;
pub mod storage;

pub use advisory::{
    Advisory, AdvisoryPayload, AdvisoryRecord, Category, LocationRecord, Position,
};
pub use config::Config;
pub use error::{Error, ErrorKind, Result};
pub use logging::init_logging;
pub use recurrence::{Days, Recurrence, TimeWindow};
pub use storage::AdvisoryStore;
