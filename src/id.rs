//! Timestamp helpers for persisted records

use chrono::Utc;

/// Get current timestamp in milliseconds since Unix epoch
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}
