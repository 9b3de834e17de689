//! Timestamps stored as 100-nanosecond ticks since 1601-01-01 UTC.

use chrono::{DateTime, TimeZone, Utc};

const TICKS_PER_MILLISECOND: i64 = 10_000;
const TICKS_PER_SECOND: i64 = 10_000_000;

/// Ticks between 1601-01-01 and the Unix epoch.
const UNIX_EPOCH_TICKS: i64 = 116_444_736_000_000_000;

/// A persisted timestamp
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FileTime(i64);

impl FileTime {
    pub fn now() -> Self {
        Self::from_datetime(Utc::now())
    }

    pub fn from_ticks(ticks: i64) -> Self {
        FileTime(ticks)
    }

    pub fn ticks(self) -> i64 {
        self.0
    }

    /// Timestamps are written with millisecond resolution, the way they are read back.
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        FileTime(UNIX_EPOCH_TICKS + dt.timestamp_millis() * TICKS_PER_MILLISECOND)
    }

    pub fn to_datetime(self) -> DateTime<Utc> {
        let millis = (self.0 - UNIX_EPOCH_TICKS).div_euclid(TICKS_PER_MILLISECOND);
        Utc.timestamp_millis_opt(millis)
            .single()
            .unwrap_or_default()
    }

    /// Whole seconds since the Unix epoch.
    pub fn unix_seconds(self) -> i64 {
        (self.0 - UNIX_EPOCH_TICKS).div_euclid(TICKS_PER_SECOND)
    }
}

/// Readable UTC timestamp used in the info table, `YYYY-MM-DD HH:MM:SS`.
pub fn readable_utc(dt: DateTime<Utc>) -> String {
    dt.format("%Y-%m-%d %H:%M:%S").to_string()
}
