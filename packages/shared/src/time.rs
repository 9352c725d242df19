//! Time-related utilities with clock abstraction for testability.

use chrono::{DateTime, FixedOffset, Offset, Utc};

/// Clock trait for dependency injection and testing
pub trait Clock: Send + Sync {
    /// Get current Unix timestamp (milliseconds)
    fn now_millis(&self) -> i64;
}

/// System clock implementation (uses actual system time)
#[derive(Debug, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// Fixed clock implementation for testing (returns a fixed time)
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    fixed_time: i64,
}

impl FixedClock {
    /// Create a new fixed clock with the given timestamp
    pub fn new(fixed_time_millis: i64) -> Self {
        Self {
            fixed_time: fixed_time_millis,
        }
    }
}

impl Clock for FixedClock {
    fn now_millis(&self) -> i64 {
        self.fixed_time
    }
}

/// Calendar date and wall-clock time a transcript entry is stamped with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryStamp {
    /// `YYYY-MM-DD`
    pub date: String,
    /// `HH:MM:SS`
    pub time: String,
}

/// Split a Unix timestamp (milliseconds) into the date and time shown next to
/// transcript entries, in the given UTC offset.
///
/// Offsets outside of +-23 hours fall back to UTC.
pub fn entry_stamp(timestamp_millis: i64, utc_offset_hours: i32) -> EntryStamp {
    let offset = FixedOffset::east_opt(utc_offset_hours * 3600).unwrap_or(Utc.fix());
    let dt = DateTime::<Utc>::from_timestamp_millis(timestamp_millis)
        .unwrap_or_default()
        .with_timezone(&offset);

    EntryStamp {
        date: dt.format("%Y-%m-%d").to_string(),
        time: dt.format("%H:%M:%S").to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock_returns_non_zero_timestamp() {
        // テスト項目: SystemClock が 0 以外のタイムスタンプを返す
        // given (前提条件):
        let clock = SystemClock;

        // when (操作):
        let timestamp = clock.now_millis();

        // then (期待する結果):
        assert!(timestamp > 0);
    }

    #[test]
    fn test_fixed_clock_returns_consistent_timestamp() {
        // テスト項目: FixedClock が複数回呼び出しても同じタイムスタンプを返す
        // given (前提条件):
        let fixed_time = 9876543210987;
        let clock = FixedClock::new(fixed_time);

        // when (操作):
        let timestamp1 = clock.now_millis();
        let timestamp2 = clock.now_millis();

        // then (期待する結果):
        assert_eq!(timestamp1, fixed_time);
        assert_eq!(timestamp2, fixed_time);
    }

    #[test]
    fn test_entry_stamp_in_utc() {
        // テスト項目: UTC でタイムスタンプが日付と時刻に分割される
        // given (前提条件):
        // 2023-01-01 00:00:00 UTC
        let timestamp = 1672531200000;

        // when (操作):
        let stamp = entry_stamp(timestamp, 0);

        // then (期待する結果):
        assert_eq!(stamp.date, "2023-01-01");
        assert_eq!(stamp.time, "00:00:00");
    }

    #[test]
    fn test_entry_stamp_crosses_date_with_offset() {
        // テスト項目: オフセットにより日付が変わる場合、オフセット後の日付が使われる
        // given (前提条件):
        // 2022-12-31 20:30:15 UTC
        let timestamp = 1672518615000;

        // when (操作):
        let stamp = entry_stamp(timestamp, 9);

        // then (期待する結果):
        assert_eq!(stamp.date, "2023-01-01");
        assert_eq!(stamp.time, "05:30:15");
    }

    #[test]
    fn test_entry_stamp_with_out_of_range_offset_falls_back_to_utc() {
        // テスト項目: 範囲外のオフセットは UTC として扱われる
        // given (前提条件):
        let timestamp = 1672531200000;

        // when (操作):
        let stamp = entry_stamp(timestamp, 48);

        // then (期待する結果):
        assert_eq!(stamp.time, "00:00:00");
    }
}
