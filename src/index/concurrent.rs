//! Thread-safe inverted index
//!
//! Wraps [`InvertedIndex`] behind a single index-wide reader/writer lock. Every
//! lookup, search and serialization takes the read lock; every mutation takes
//! the write lock. Lookups return owned snapshots because borrowed views cannot
//! outlive the guard.

use crate::index::inverted::{InvertedIndex, Positions};
use crate::index::result::{SearchResult, Searcher};
use parking_lot::RwLock;
use serde::{Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Default)]
pub struct ConcurrentIndex {
    inner: RwLock<InvertedIndex>,
}

impl ConcurrentIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, word: &str, location: &str, position: usize) -> bool {
        self.inner.write().add(word, location, position)
    }

    pub fn add_all<I, S>(&self, location: &str, words: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.inner.write().add_all(location, words);
    }

    /// Publish a locally built index. The union is applied under one write
    /// lock, so readers never observe a half-merged location.
    pub fn merge(&self, local: InvertedIndex) {
        self.inner.write().merge(local);
    }

    pub fn word_count(&self) -> BTreeMap<String, usize> {
        self.inner.read().word_count().clone()
    }

    pub fn total(&self, location: &str) -> usize {
        self.inner.read().total(location)
    }

    pub fn words(&self) -> Vec<String> {
        self.inner.read().words().map(str::to_string).collect()
    }

    pub fn locations(&self, word: &str) -> Vec<String> {
        self.inner.read().locations(word).map(str::to_string).collect()
    }

    pub fn positions(&self, word: &str, location: &str) -> Positions {
        self.inner
            .read()
            .positions(word, location)
            .cloned()
            .unwrap_or_default()
    }

    pub fn has_word(&self, word: &str) -> bool {
        self.inner.read().has_word(word)
    }

    pub fn has_location(&self, word: &str, location: &str) -> bool {
        self.inner.read().has_location(word, location)
    }

    pub fn has_position(&self, word: &str, location: &str, position: usize) -> bool {
        self.inner.read().has_position(word, location, position)
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    pub fn locations_len(&self, word: &str) -> usize {
        self.inner.read().locations_len(word)
    }

    pub fn positions_len(&self, word: &str, location: &str) -> usize {
        self.inner.read().positions_len(word, location)
    }

    /// Unwrap the underlying index once no other thread can reach it
    pub fn into_inner(self) -> InvertedIndex {
        self.inner.into_inner()
    }
}

impl From<InvertedIndex> for ConcurrentIndex {
    fn from(index: InvertedIndex) -> Self {
        Self {
            inner: RwLock::new(index),
        }
    }
}

impl Searcher for ConcurrentIndex {
    fn exact_search(&self, queries: &BTreeSet<String>) -> Vec<SearchResult> {
        self.inner.read().exact_search(queries)
    }

    fn partial_search(&self, queries: &BTreeSet<String>) -> Vec<SearchResult> {
        self.inner.read().partial_search(queries)
    }
}

impl Serialize for ConcurrentIndex {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.inner.read().serialize(serializer)
    }
}
