//! Database schema definitions using sea-query.
//!
//! These define the table and column identifiers for type-safe query building.

use sea_query::Iden;

/// Records table schema.
#[derive(Iden)]
pub enum Records {
    Table,
    #[iden = "id"]
    Id,
    #[iden = "user_id"]
    UserId,
    #[iden = "a"]
    A,
    #[iden = "b"]
    B,
    #[iden = "timestamp"]
    Timestamp,
}

/// Users table schema.
#[derive(Iden)]
pub enum Users {
    Table,
    #[iden = "id"]
    Id,
    #[iden = "username"]
    Username,
}

/// Check constraints guarding coordinate ranges on `records`.
///
/// A violation of any of these is the caller's fault.
pub const COORDINATE_CONSTRAINTS: [&str; 4] = [
    "records_a_longitude_valid",
    "records_a_latitude_valid",
    "records_b_longitude_valid",
    "records_b_latitude_valid",
];

/// SQL for creating the records table.
///
/// Points are stored as `"(lon,lat)"` text; the constraints parse each half
/// back to a number. Timestamps are Unix microseconds.
pub const CREATE_RECORDS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS records (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL,
    a TEXT NOT NULL,
    b TEXT NOT NULL,
    timestamp INTEGER NOT NULL,
    CONSTRAINT records_a_longitude_valid
        CHECK (CAST(substr(a, 2, instr(a, ',') - 2) AS REAL) BETWEEN -180 AND 180),
    CONSTRAINT records_a_latitude_valid
        CHECK (CAST(substr(a, instr(a, ',') + 1, length(a) - instr(a, ',') - 1) AS REAL) BETWEEN -90 AND 90),
    CONSTRAINT records_b_longitude_valid
        CHECK (CAST(substr(b, 2, instr(b, ',') - 2) AS REAL) BETWEEN -180 AND 180),
    CONSTRAINT records_b_latitude_valid
        CHECK (CAST(substr(b, instr(b, ',') + 1, length(b) - instr(b, ',') - 1) AS REAL) BETWEEN -90 AND 90)
);

CREATE INDEX IF NOT EXISTS idx_records_user_timestamp ON records(user_id, timestamp);
"#;

/// SQL for creating the users table.
pub const CREATE_USERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY,
    username TEXT NOT NULL UNIQUE
);
"#;
