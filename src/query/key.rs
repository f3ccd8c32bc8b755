use crate::utils::unique_stems;
use std::collections::BTreeSet;

/// One distinct query: its sorted stems and the canonical key built from them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    /// Sorted distinct stems joined by single spaces
    pub key: String,
    pub stems: BTreeSet<String>,
}

impl Query {
    /// Canonicalize a raw query line. Lines without any word yield `None`.
    pub fn parse(line: &str) -> Option<Self> {
        let stems = unique_stems(line);
        if stems.is_empty() {
            return None;
        }
        Some(Self {
            key: query_key(&stems),
            stems,
        })
    }
}

pub fn query_key(stems: &BTreeSet<String>) -> String {
    stems.iter().map(String::as_str).collect::<Vec<_>>().join(" ")
}
