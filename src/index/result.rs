//! Search results and their ranking order.

use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::collections::BTreeSet;

/// Number of decimal places scores are compared and printed with
pub const SCORE_PRECISION: i32 = 8;

/// How query words are matched against indexed words
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchMode {
    /// Query word must equal an indexed word
    Exact,
    /// Query word may be a prefix of an indexed word
    #[default]
    Partial,
}

impl SearchMode {
    pub fn from_exact_flag(exact: bool) -> Self {
        if exact { Self::Exact } else { Self::Partial }
    }
}

/// A single ranked location for a query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    /// Location (file path or URL) the query matched in
    #[serde(rename = "where")]
    pub location: String,
    /// Number of matching positions at this location
    pub count: usize,
    /// `count` divided by the location's total word count
    #[serde(serialize_with = "serialize_score")]
    pub score: f64,
}

impl SearchResult {
    pub(crate) fn new(location: String) -> Self {
        Self {
            location,
            count: 0,
            score: 0.0,
        }
    }

    /// Recompute the score against a location's total word count
    pub(crate) fn finish(&mut self, word_count: usize) {
        self.score = if word_count == 0 {
            0.0
        } else {
            self.count as f64 / word_count as f64
        };
    }

    /// Score rounded to [`SCORE_PRECISION`] places, as an integer for exact comparison
    pub fn score_key(&self) -> i64 {
        (self.score * 10f64.powi(SCORE_PRECISION)).round() as i64
    }

    /// Ranking order: score descending, then count descending, then location ascending
    pub fn rank_cmp(&self, other: &Self) -> Ordering {
        other
            .score_key()
            .cmp(&self.score_key())
            .then_with(|| other.count.cmp(&self.count))
            .then_with(|| self.location.cmp(&other.location))
    }
}

fn serialize_score<S: Serializer>(score: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    let scale = 10f64.powi(SCORE_PRECISION);
    serializer.serialize_f64((score * scale).round() / scale)
}

/// Anything that can answer exact and partial word queries
pub trait Searcher {
    fn exact_search(&self, queries: &BTreeSet<String>) -> Vec<SearchResult>;

    fn partial_search(&self, queries: &BTreeSet<String>) -> Vec<SearchResult>;

    fn search(&self, queries: &BTreeSet<String>, mode: SearchMode) -> Vec<SearchResult> {
        match mode {
            SearchMode::Exact => self.exact_search(queries),
            SearchMode::Partial => self.partial_search(queries),
        }
    }
}
