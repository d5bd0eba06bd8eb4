//! Record id generation and clock access

/// Generate a globally unique id: `{prefix}_{uuid-v7}`
///
/// v7 ids embed a millisecond timestamp, so ids created later sort later.
pub fn generate_id(prefix: &str) -> String {
    format!("{}_{}", prefix, uuid::Uuid::now_v7().simple())
}

/// Current wall-clock time as Unix milliseconds
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
