//! Timestamp encoding shared by storage and the JSON API.
//!
//! Stored and emitted as RFC 3339 UTC with millisecond precision, so
//! lexicographic order in SQLite equals chronological order. Input is
//! lenient: RFC 3339 with any offset, a naive date-time (read as UTC),
//! or a bare date (midnight UTC).

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serializer};

const NAIVE_FORMATS: [&str; 3] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
];

/// Canonical text form used in the database and on the wire.
pub fn format(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse any accepted timestamp form into UTC.
///
/// Years outside 0000..=9999 are rejected: the canonical form has no room
/// for a sign or a fifth digit.
pub fn parse(input: &str) -> Option<DateTime<Utc>> {
    parse_lenient(input.trim()).filter(|ts| (0..=9999).contains(&ts.year()))
}

fn parse_lenient(input: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Current time truncated to the stored precision.
pub fn now() -> DateTime<Utc> {
    let now = Utc::now();
    parse(&format(&now)).unwrap_or(now)
}

/// `#[serde(with = "timestamp::rfc3339")]`
pub mod rfc3339 {
    use super::*;

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&format(ts))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}")))
    }
}

/// `#[serde(with = "timestamp::rfc3339_option")]`
pub mod rfc3339_option {
    use super::*;

    pub fn serialize<S: Serializer>(ts: &Option<DateTime<Utc>>, s: S) -> Result<S::Ok, S::Error> {
        match ts {
            Some(ts) => s.serialize_str(&format(ts)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        d: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        match Option::<String>::deserialize(d)? {
            Some(raw) if raw.trim().is_empty() => Ok(None),
            Some(raw) => parse(&raw)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}"))),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parses_rfc3339_with_offset() {
        let ts = parse("2024-01-20T10:00:00+02:00").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2024, 1, 20, 8, 0, 0).unwrap());
    }

    #[test]
    fn parses_naive_iso_as_utc() {
        // Local-time clients send no offset
        let ts = parse("2024-01-20T10:15:30.123456").unwrap();
        assert_eq!(format(&ts), "2024-01-20T10:15:30.123Z");
    }

    #[test]
    fn parses_bare_date_as_midnight() {
        let ts = parse("2024-01-22").unwrap();
        assert_eq!(format(&ts), "2024-01-22T00:00:00.000Z");
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse("yesterday").is_none());
        assert!(parse("").is_none());
    }

    #[test]
    fn rejects_years_without_four_digit_form() {
        assert!(parse("+10000-01-01").is_none());
        assert!(parse("+10000-01-01T00:00:00").is_none());
        assert!(parse("-0001-12-31").is_none());
        // Shifting to UTC pushes this one into year -1
        assert!(parse("0000-01-01T00:30:00+01:00").is_none());
        assert!(parse("9999-12-31").is_some());
    }

    #[test]
    fn canonical_format_sorts_chronologically() {
        let early = format(&Utc.with_ymd_and_hms(2024, 1, 9, 0, 0, 0).unwrap());
        let late = format(&Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap());
        assert!(early < late);
    }
}
