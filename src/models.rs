//! Core data structures shared by the scanner, scheduler and sinks

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::utils::normalize_whitespace;

/// An endpoint URL probed every cycle
pub type Endpoint = String;

/// Keyword searched for in fetched pages
///
/// The raw form is kept for messages; matching uses the normalized form
/// (lowercased, whitespace collapsed), computed once per cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanQuery {
    raw: String,
    normalized: String,
}

impl ScanQuery {
    /// Create a query, normalizing it for matching
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let normalized = normalize_whitespace(&raw).to_lowercase();
        Self { raw, normalized }
    }

    /// The query as configured
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The query as used for matching
    pub fn normalized(&self) -> &str {
        &self.normalized
    }

    /// True when nothing is left to search for
    pub fn is_empty(&self) -> bool {
        self.normalized.is_empty()
    }

    /// Case-insensitive substring match against already normalized text
    pub fn matches(&self, normalized_text: &str) -> bool {
        !self.is_empty() && normalized_text.contains(&self.normalized)
    }
}

impl fmt::Display for ScanQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// A single keyword match on one endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeResult {
    /// Endpoint the page was fetched from
    pub url: Endpoint,

    /// Leading part of the page text
    pub content: String,

    /// When the match was recorded
    pub timestamp: DateTime<Utc>,
}

impl ScrapeResult {
    /// Create a result stamped with the current time
    pub fn new(url: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

/// All matches produced by one cycle, in no particular order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScanOutcome {
    results: Vec<ScrapeResult>,
}

impl ScanOutcome {
    /// Create an empty outcome
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of matches
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// True when the cycle produced no match
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Iterate over matches
    pub fn iter(&self) -> std::slice::Iter<'_, ScrapeResult> {
        self.results.iter()
    }

    /// Borrow matches as a slice
    pub fn results(&self) -> &[ScrapeResult] {
        &self.results
    }

    /// Consume into the underlying vector
    pub fn into_results(self) -> Vec<ScrapeResult> {
        self.results
    }
}

impl FromIterator<ScrapeResult> for ScanOutcome {
    fn from_iter<I: IntoIterator<Item = ScrapeResult>>(iter: I) -> Self {
        Self {
            results: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a ScanOutcome {
    type Item = &'a ScrapeResult;
    type IntoIter = std::slice::Iter<'a, ScrapeResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.iter()
    }
}
