pub mod account;
pub mod log;
pub mod settings;
pub mod stats;

/// Current wall clock in epoch milliseconds.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
