//! Core types for misp-ioc-export

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::config::ExportTarget;

/// 1-based index of a page in the server-paginated result set
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PageIndex(pub u32);

impl PageIndex {
    /// The first page of every result set
    pub const FIRST: PageIndex = PageIndex(1);

    /// Create a new PageIndex
    pub fn new(index: u32) -> Self {
        Self(index)
    }

    /// Get the inner u32 value
    pub fn get(&self) -> u32 {
        self.0
    }

    /// The page submitted after this one
    pub fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl From<u32> for PageIndex {
    fn from(index: u32) -> Self {
        Self(index)
    }
}

impl From<PageIndex> for u32 {
    fn from(page: PageIndex) -> Self {
        page.0
    }
}

impl PartialEq<u32> for PageIndex {
    fn eq(&self, other: &u32) -> bool {
        self.0 == *other
    }
}

impl std::fmt::Display for PageIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for PageIndex {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

/// One raw MISP attribute as returned by `attributes/restSearch`
///
/// Only the fields needed to build a CDB entry are kept; everything else in the
/// server's object is ignored during deserialization.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct Attribute {
    /// Indicator value (hash, IP address, domain, ...)
    #[serde(default)]
    pub value: Option<String>,

    /// Owning event identifier; MISP sends it as a string, older instances as a number
    #[serde(default)]
    pub event_id: Option<serde_json::Value>,
}

impl Attribute {
    /// Build an attribute with a value and numeric event id
    pub fn new(value: impl Into<String>, event_id: u64) -> Self {
        Self {
            value: Some(value.into()),
            event_id: Some(serde_json::Value::from(event_id)),
        }
    }
}

/// Counters collected by one pagination run
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Page fetches submitted
    pub pages_requested: u32,
    /// Page fetches that failed and contributed nothing
    pub pages_failed: u32,
    /// Raw records received across all successful pages
    pub records_received: u64,
    /// Records dropped because they had no value
    pub records_skipped: u64,
    /// Lines written to the sink
    pub total_entries: u64,
}

/// Result of exporting one target to its output file
#[derive(Clone, Debug)]
pub struct ExportSummary {
    /// What was exported
    pub target: ExportTarget,
    /// Where it was written
    pub output: PathBuf,
    /// Pagination counters
    pub stats: RunStats,
    /// Wall-clock duration of the run
    pub elapsed: Duration,
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_index_next_is_strictly_increasing() {
        let first = PageIndex::FIRST;
        assert_eq!(first, 1);
        assert_eq!(first.next(), 2);
        assert!(first.next() > first);
    }

    #[test]
    fn page_index_next_saturates_instead_of_wrapping() {
        assert_eq!(PageIndex::new(u32::MAX).next(), u32::MAX);
    }

    #[test]
    fn page_index_parses_and_displays() {
        let page: PageIndex = "42".parse().unwrap();
        assert_eq!(page.get(), 42);
        assert_eq!(page.to_string(), "42");
        assert!("page-3".parse::<PageIndex>().is_err());
    }

    #[test]
    fn attribute_ignores_unknown_fields() {
        let attr: Attribute = serde_json::from_str(
            r#"{"id":"991","event_id":"12","type":"sha256","category":"Payload delivery",
                "to_ids":true,"value":"e3b0c442","Tag":[{"name":"NCSA"}]}"#,
        )
        .unwrap();

        assert_eq!(attr.value.as_deref(), Some("e3b0c442"));
        assert_eq!(attr.event_id, Some(serde_json::Value::from("12")));
    }

    #[test]
    fn attribute_tolerates_missing_fields() {
        let attr: Attribute = serde_json::from_str(r#"{"type":"domain"}"#).unwrap();
        assert_eq!(attr, Attribute::default());
    }
}
