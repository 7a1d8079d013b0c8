//! geotracker-record: send one movement record to the history service
//!
//! Goes through the same resilient client (circuit breaker + retrier) the
//! location service uses, so it doubles as a smoke test of that path.
//!
//! ## Configuration
//! - RECORD_USER_ID: user id (required)
//! - RECORD_A, RECORD_B: segment endpoints as "(lon,lat)" (required)
//! - RECORD_TIMESTAMP: RFC3339 time of the movement (default: now)
//! - GEOTRACKER__HISTORY_CLIENT__ADDRESS and friends: client settings
//! - GEOTRACKER_LOG: log filter (default: info)

use chrono::{DateTime, Utc};
use tracing::info;

use geotracker::clients::history_client_from_config;
use geotracker::config::Config;
use geotracker::geo::decode_point;
use geotracker::interfaces::{AddRecordRequest, HistoryClient};
use geotracker::utils::bootstrap::init_tracing;

fn required_env(name: &str) -> Result<String, Box<dyn std::error::Error>> {
    std::env::var(name).map_err(|_| format!("{} must be set", name).into())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let config = Config::load(None)?;

    let user_id: i32 = required_env("RECORD_USER_ID")?.trim().parse()?;
    let a = decode_point(required_env("RECORD_A")?.trim())?;
    let b = decode_point(required_env("RECORD_B")?.trim())?;
    let timestamp = match std::env::var("RECORD_TIMESTAMP") {
        Ok(raw) => DateTime::parse_from_rfc3339(raw.trim())?.with_timezone(&Utc),
        Err(_) => Utc::now(),
    };

    let client = history_client_from_config(&config.history_client)?;
    let record = client
        .add_record(AddRecordRequest::new(user_id, a, b, timestamp))
        .await?;

    info!(
        id = record.id,
        user_id = record.user_id,
        a = %record.a,
        b = %record.b,
        distance = record.distance(),
        "Record stored"
    );
    Ok(())
}
