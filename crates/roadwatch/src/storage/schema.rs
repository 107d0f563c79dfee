//! `SQLite` schema definitions for roadwatch.
//!
//! Every statement is `IF NOT EXISTS`: opening an existing database never
//! drops data.

/// SQL statement to create the advisories table.
///
/// `AUTOINCREMENT` keeps ids from being reused after deletion.
pub const CREATE_ADVISORIES_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS advisories (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    category TEXT NOT NULL,
    lat REAL NOT NULL,
    lon REAL NOT NULL,
    speed_limit REAL NOT NULL CHECK (speed_limit >= 0),
    created_at TEXT NOT NULL,
    days TEXT NOT NULL DEFAULT '',
    time_from TEXT NOT NULL DEFAULT '',
    time_to TEXT NOT NULL DEFAULT '',
    CHECK ((time_from = '') = (time_to = ''))
)
";

/// SQL statement to create an index on `category` for filtering.
pub const CREATE_CATEGORY_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_advisories_category ON advisories(category)
";

/// SQL statement to create the metadata table for storing key-value pairs.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// All schema creation statements in order.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    CREATE_ADVISORIES_TABLE,
    CREATE_CATEGORY_INDEX,
    CREATE_METADATA_TABLE,
];
