//! Durable timer record encoding

use serde::{Deserialize, Serialize};

/// Store key for a booking's timer record
pub fn timer_key(booking_id: &str) -> String {
    format!("timer_booking_{}", booking_id)
}

/// Snapshot written whenever a timer is started
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedTimerRecord {
    /// Wall-clock start in milliseconds since the epoch
    pub start_time: i64,
    pub total_seconds: u64,
    pub is_running: bool,
}

impl PersistedTimerRecord {
    pub fn running(start_time: i64, total_seconds: u64) -> Self {
        Self {
            start_time,
            total_seconds,
            is_running: true,
        }
    }

    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn decode(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Seconds left at `now_millis`, truncating partial seconds of elapsed time
    pub fn remaining_at(&self, now_millis: i64) -> u64 {
        let elapsed_ms = now_millis.saturating_sub(self.start_time).max(0);
        let elapsed = u64::try_from(elapsed_ms / 1000).unwrap_or(u64::MAX);
        self.total_seconds.saturating_sub(elapsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_is_derived_from_booking_id() {
        assert_eq!(timer_key("B-42"), "timer_booking_B-42");
    }

    #[test]
    fn wire_format_uses_camel_case() {
        let record = PersistedTimerRecord::running(1_700_000_000_000, 5400);
        let value: serde_json::Value = serde_json::from_str(&record.encode().unwrap()).unwrap();
        assert_eq!(value["startTime"], 1_700_000_000_000i64);
        assert_eq!(value["totalSeconds"], 5400);
        assert_eq!(value["isRunning"], true);
    }

    #[test]
    fn decodes_record_written_by_the_app() {
        let raw = r#"{"startTime":1000,"totalSeconds":100,"isRunning":false}"#;
        let record = PersistedTimerRecord::decode(raw).unwrap();
        assert_eq!(record.start_time, 1000);
        assert_eq!(record.total_seconds, 100);
        assert!(!record.is_running);
    }

    #[test]
    fn remaining_truncates_partial_seconds() {
        let record = PersistedTimerRecord::running(0, 100);
        assert_eq!(record.remaining_at(40_999), 60);
        assert_eq!(record.remaining_at(500_000), 0);
    }

    #[test]
    fn clock_moving_backwards_counts_as_no_elapsed_time() {
        let record = PersistedTimerRecord::running(10_000, 100);
        assert_eq!(record.remaining_at(0), 100);
    }
}
