//! Out-of-band response metadata.
//!
//! A node answers a `HEAD` request with statistics about the document a
//! query would return, carried in `vamdc-*` headers:
//!
//! | Header | Meaning |
//! |--------|---------|
//! | `vamdc-count-species` | number of species |
//! | `vamdc-count-states` | number of states |
//! | `vamdc-truncated` | truncation percentage, `0` if complete |
//! | `vamdc-count-molecules` | number of molecules |
//! | `vamdc-count-sources` | number of bibliographic sources |
//! | `vamdc-approx-size` | approximate document size (MB) |
//! | `vamdc-count-radiative` | number of radiative transitions |
//! | `vamdc-count-atoms` | number of atoms |
//! | `last-modified` | HTTP date of the last data change |

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use thiserror::Error;

pub const COUNT_SPECIES: &str = "vamdc-count-species";
pub const COUNT_STATES: &str = "vamdc-count-states";
pub const TRUNCATED: &str = "vamdc-truncated";
pub const COUNT_MOLECULES: &str = "vamdc-count-molecules";
pub const COUNT_SOURCES: &str = "vamdc-count-sources";
pub const APPROX_SIZE: &str = "vamdc-approx-size";
pub const COUNT_RADIATIVE: &str = "vamdc-count-radiative";
pub const COUNT_ATOMS: &str = "vamdc-count-atoms";
pub const LAST_MODIFIED: &str = "last-modified";

/// The eight statistics headers every metadata mapping carries.
pub const METADATA_KEYS: [&str; 8] = [
    COUNT_SPECIES,
    COUNT_STATES,
    TRUNCATED,
    COUNT_MOLECULES,
    COUNT_SOURCES,
    APPROX_SIZE,
    COUNT_RADIATIVE,
    COUNT_ATOMS,
];

/// Header mapping extracted from a node response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseHeaders(BTreeMap<String, String>);

impl ResponseHeaders {
    /// All eight metadata keys set to `"0"`; no `last-modified`.
    pub fn zeroed() -> Self {
        Self(
            METADATA_KEYS
                .iter()
                .map(|k| (k.to_string(), "0".to_string()))
                .collect(),
        )
    }

    /// Store header pairs verbatim. Later duplicates replace earlier ones.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// An integer statistic. Nodes occasionally send values like `"12 "`,
    /// so surrounding whitespace is ignored; anything else non-numeric is
    /// `None`.
    pub fn count(&self, key: &str) -> Option<u64> {
        self.get(key)?.trim().parse().ok()
    }

    /// `true` when the node reports a non-zero truncation percentage.
    pub fn truncated(&self) -> bool {
        self.get(TRUNCATED)
            .and_then(|v| v.trim().trim_end_matches('%').trim().parse::<f64>().ok())
            .is_some_and(|pct| pct > 0.0)
    }

    pub fn last_modified(&self) -> Option<&str> {
        self.get(LAST_MODIFIED)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Error returned when a date header cannot be understood.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unrecognised date {0:?}")]
pub struct DateParseError(pub String);

/// Parse a date header value.
///
/// Tries the HTTP date formats first (IMF-fixdate, RFC 850, asctime), then
/// RFC 2822 with numeric offsets and RFC 3339, which some nodes emit.
pub fn parse_http_timestamp(value: &str) -> Result<DateTime<Utc>, DateParseError> {
    let value = value.trim();
    if let Ok(t) = httpdate::parse_http_date(value) {
        return Ok(DateTime::<Utc>::from(t));
    }
    if let Ok(t) = DateTime::parse_from_rfc2822(value) {
        return Ok(t.with_timezone(&Utc));
    }
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|_| DateParseError(value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn zeroed_has_all_eight_keys() {
        let h = ResponseHeaders::zeroed();
        assert_eq!(h.len(), 8);
        for key in METADATA_KEYS {
            assert_eq!(h.get(key), Some("0"), "{key}");
        }
        assert!(h.last_modified().is_none());
        assert!(!h.truncated());
    }

    #[test]
    fn pairs_are_kept_verbatim() {
        let h = ResponseHeaders::from_pairs([
            (COUNT_SPECIES, "12"),
            (TRUNCATED, "45.3 %"),
            ("content-type", "text/xml"),
        ]);
        assert_eq!(h.count(COUNT_SPECIES), Some(12));
        assert_eq!(h.get(TRUNCATED), Some("45.3 %"));
        assert!(h.truncated());
        assert_eq!(h.get("content-type"), Some("text/xml"));
        assert_eq!(h.count(COUNT_ATOMS), None);
    }

    #[test]
    fn imf_fixdate() {
        let t = parse_http_timestamp("Wed, 21 Oct 2015 07:28:00 GMT").unwrap();
        assert_eq!(t, Utc.with_ymd_and_hms(2015, 10, 21, 7, 28, 0).unwrap());
    }

    #[test]
    fn rfc3339_with_offset() {
        let t = parse_http_timestamp("2015-10-21T09:28:00+02:00").unwrap();
        assert_eq!(t, Utc.with_ymd_and_hms(2015, 10, 21, 7, 28, 0).unwrap());
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(parse_http_timestamp("yesterday-ish").is_err());
    }
}
