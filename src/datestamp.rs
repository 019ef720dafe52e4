//! Datestamp codec: OAI-PMH textual timestamps to and from
//! [`DateTime<Utc>`].
//!
//! The protocol allows two granularities: day (`YYYY-MM-DD`) and second
//! (`YYYY-MM-DDThh:mm:ssZ`). Encoding always produces the second
//! granularity; decoding accepts both. The encoded form is fixed-width
//! and zero-padded, so chronological order equals lexicographic order.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;

use crate::error::{HarvestError, Result};

/// Second-granularity datestamp: YYYY-MM-DDThh:mm:ssZ.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static DATETIME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}Z$").expect("valid regex"));

/// Day-granularity datestamp: YYYY-MM-DD.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static DATE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid regex"));

/// Render a timestamp in canonical datestamp form.
///
/// # Examples
/// ```
/// use chrono::{TimeZone, Utc};
/// use oai_harvest::datestamp::encode;
///
/// let t = Utc.with_ymd_and_hms(2024, 3, 5, 9, 30, 0).unwrap();
/// assert_eq!(encode(&t), "2024-03-05T09:30:00Z");
/// ```
#[must_use]
pub fn encode(timestamp: &DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// Parse a datestamp in either granularity.
///
/// Day-granularity values decode to midnight UTC. Any other shape fails
/// with [`HarvestError::Datestamp`].
pub fn decode(text: &str) -> Result<DateTime<Utc>> {
    if DATETIME_PATTERN.is_match(text) {
        let naive = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%SZ")
            .map_err(|_| HarvestError::Datestamp(text.to_string()))?;
        return Ok(naive.and_utc());
    }

    if DATE_PATTERN.is_match(text) {
        let date = NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .map_err(|_| HarvestError::Datestamp(text.to_string()))?;
        let naive = date
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| HarvestError::Datestamp(text.to_string()))?;
        return Ok(naive.and_utc());
    }

    Err(HarvestError::Datestamp(text.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_encode() {
        let t = Utc.with_ymd_and_hms(2005, 12, 29, 23, 59, 59).unwrap();
        assert_eq!(encode(&t), "2005-12-29T23:59:59Z");
    }

    #[test]
    fn test_encode_zero_pads() {
        let t = Utc.with_ymd_and_hms(987, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(encode(&t), "0987-01-02T03:04:05Z");
    }

    #[test]
    fn test_round_trip() {
        let stamps = [
            Utc.with_ymd_and_hms(1970, 1, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2004, 2, 29, 12, 0, 1).unwrap(),
            Utc.with_ymd_and_hms(2024, 12, 31, 23, 59, 59).unwrap(),
        ];
        for t in stamps {
            assert_eq!(decode(&encode(&t)).unwrap(), t);
        }
    }

    #[test]
    fn test_decode_day_granularity() {
        let t = decode("2024-03-05").unwrap();
        assert_eq!(t, Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_decode_invalid() {
        assert!(decode("").is_err());
        assert!(decode("2024-3-5").is_err());
        assert!(decode("2024-03-05T09:30:00").is_err()); // missing Z
        assert!(decode("2024-13-01").is_err()); // no such month
        assert!(decode("2024-02-30T00:00:00Z").is_err()); // no such day
        assert!(decode("yesterday").is_err());
    }

    #[test]
    fn test_ordering_maps_to_lexicographic() {
        let a = Utc.with_ymd_and_hms(1999, 12, 31, 23, 59, 59).unwrap();
        let b = Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap();
        assert!(a < b);
        assert!(encode(&a) < encode(&b));
    }
}
