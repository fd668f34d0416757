use chrono::{DateTime, FixedOffset, NaiveDateTime, Offset, SecondsFormat, Utc};
use tracing::warn;

/// Western Indonesia Time, the zone the schools operate in.
pub const DEFAULT_UTC_OFFSET_HOURS: i32 = 7;

/// Fixed offset used when rendering timestamps to clients.
///
/// Timestamps are stored in UTC; every response goes through a `DisplayZone`
/// so the output never depends on the server's local timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayZone {
    offset: FixedOffset,
}

impl DisplayZone {
    pub fn from_hours(hours: i32) -> Option<Self> {
        if !(-23..=23).contains(&hours) {
            return None;
        }
        FixedOffset::east_opt(hours * 3600).map(|offset| Self { offset })
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    pub fn convert(&self, at: DateTime<Utc>) -> DateTime<FixedOffset> {
        at.with_timezone(&self.offset)
    }

    /// Parse a stored timestamp and shift it into the display zone.
    /// Corrupt values are logged and rendered as the Unix epoch.
    pub fn localize(&self, raw: &str) -> DateTime<FixedOffset> {
        match parse_stored(raw) {
            Ok(at) => self.convert(at),
            Err(e) => {
                warn!("Corrupt stored timestamp '{}': {}", raw, e);
                self.convert(DateTime::<Utc>::default())
            }
        }
    }
}

impl Default for DisplayZone {
    fn default() -> Self {
        Self::from_hours(DEFAULT_UTC_OFFSET_HOURS).unwrap_or(Self { offset: Utc.fix() })
    }
}

/// Storage representation: RFC 3339 UTC with microseconds, which sorts
/// lexicographically in insertion order.
pub fn storage_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn now_timestamp() -> String {
    storage_timestamp(Utc::now())
}

/// Accepts RFC 3339 as written by [`storage_timestamp`] and SQLite's
/// `datetime('now')` format (`YYYY-MM-DD HH:MM:SS`, implicitly UTC).
pub fn parse_stored(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc()))
}
