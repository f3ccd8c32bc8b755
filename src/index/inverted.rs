//! Single-threaded inverted index
//!
//! Maps each word to the locations it occurs in and, per location, the set of
//! 1-based positions it was seen at. A separate table tracks the total number of
//! distinct positions recorded per location, which is the denominator used when
//! scoring search results.

use crate::index::result::{SearchResult, Searcher};
use ahash::AHashMap;
use serde::{Serialize, Serializer};
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};
use std::ops::Bound;

/// Positions of one word within one location
pub type Positions = BTreeSet<usize>;

/// Locations of one word, each with its positions
pub type Postings = BTreeMap<String, Positions>;

/// Word -> location -> positions, plus per-location word counts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvertedIndex {
    words: BTreeMap<String, Postings>,
    word_count: BTreeMap<String, usize>,
}

impl InvertedIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `word` at `position` in `location`.
    ///
    /// Returns `true` if the triple was new. The location's word count only grows
    /// when it was, so re-adding a position never double counts.
    pub fn add(&mut self, word: &str, location: &str, position: usize) -> bool {
        let inserted = self
            .words
            .entry(word.to_string())
            .or_default()
            .entry(location.to_string())
            .or_default()
            .insert(position);
        if inserted {
            *self.word_count.entry(location.to_string()).or_insert(0) += 1;
        }
        inserted
    }

    /// Add a sequence of words found at `location`, numbering positions from 1
    pub fn add_all<I, S>(&mut self, location: &str, words: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for (i, word) in words.into_iter().enumerate() {
            self.add(word.as_ref(), location, i + 1);
        }
    }

    /// Union another index into this one.
    ///
    /// Position sets are unioned and word counts are summed. Producers own
    /// disjoint locations, so summing never double counts in practice.
    pub fn merge(&mut self, other: InvertedIndex) {
        for (word, their_postings) in other.words {
            match self.words.entry(word) {
                Entry::Vacant(slot) => {
                    slot.insert(their_postings);
                }
                Entry::Occupied(mut slot) => {
                    let ours = slot.get_mut();
                    for (location, positions) in their_postings {
                        match ours.entry(location) {
                            Entry::Vacant(p) => {
                                p.insert(positions);
                            }
                            Entry::Occupied(mut p) => p.get_mut().extend(positions),
                        }
                    }
                }
            }
        }

        for (location, count) in other.word_count {
            *self.word_count.entry(location).or_insert(0) += count;
        }
    }

    /// Total word count per location
    pub fn word_count(&self) -> &BTreeMap<String, usize> {
        &self.word_count
    }

    /// Total word count of one location, 0 if unknown
    pub fn total(&self, location: &str) -> usize {
        self.word_count.get(location).copied().unwrap_or(0)
    }

    /// All indexed words in sorted order
    pub fn words(&self) -> impl Iterator<Item = &str> + '_ {
        self.words.keys().map(String::as_str)
    }

    /// Locations a word occurs in, in sorted order
    pub fn locations<'a>(&'a self, word: &str) -> impl Iterator<Item = &'a str> + 'a {
        self.words
            .get(word)
            .into_iter()
            .flat_map(|postings| postings.keys().map(String::as_str))
    }

    /// Positions of a word within a location
    pub fn positions(&self, word: &str, location: &str) -> Option<&Positions> {
        self.words.get(word)?.get(location)
    }

    pub fn has_word(&self, word: &str) -> bool {
        self.words.contains_key(word)
    }

    pub fn has_location(&self, word: &str, location: &str) -> bool {
        self.positions(word, location).is_some()
    }

    pub fn has_position(&self, word: &str, location: &str, position: usize) -> bool {
        self.positions(word, location)
            .is_some_and(|positions| positions.contains(&position))
    }

    /// Number of distinct words
    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Number of locations a word occurs in
    pub fn locations_len(&self, word: &str) -> usize {
        self.words.get(word).map_or(0, BTreeMap::len)
    }

    /// Number of positions a word has within a location
    pub fn positions_len(&self, word: &str, location: &str) -> usize {
        self.positions(word, location).map_or(0, BTreeSet::len)
    }

    /// Fold one matching word's per-location position counts into the accumulator
    fn fold_word<'a>(&'a self, word: &str, lookup: &mut AHashMap<&'a str, SearchResult>) {
        let Some(postings) = self.words.get(word) else {
            return;
        };
        for (location, positions) in postings {
            lookup
                .entry(location.as_str())
                .or_insert_with(|| SearchResult::new(location.clone()))
                .count += positions.len();
        }
    }

    /// Score every accumulated result against the live word counts and rank them
    fn rank(&self, lookup: AHashMap<&str, SearchResult>) -> Vec<SearchResult> {
        let mut results: Vec<SearchResult> = lookup
            .into_iter()
            .map(|(location, mut result)| {
                result.finish(self.total(location));
                result
            })
            .collect();
        results.sort_by(SearchResult::rank_cmp);
        results
    }

    /// Whether `candidate` is matched by the partial query `query`
    fn partial_match(candidate: &str, query: &str) -> bool {
        candidate.starts_with(query) || candidate.to_lowercase() == query.to_lowercase()
    }
}

impl Searcher for InvertedIndex {
    fn exact_search(&self, queries: &BTreeSet<String>) -> Vec<SearchResult> {
        let mut lookup = AHashMap::new();
        for query in queries {
            self.fold_word(query, &mut lookup);
        }
        self.rank(lookup)
    }

    fn partial_search(&self, queries: &BTreeSet<String>) -> Vec<SearchResult> {
        let mut lookup = AHashMap::new();
        for query in queries {
            // Sorted keys: every prefix match sits in one run starting at `query`
            let from = (Bound::Included(query.as_str()), Bound::Unbounded);
            for word in self.words.range::<str, _>(from).map(|(w, _)| w) {
                if !Self::partial_match(word, query) {
                    break;
                }
                self.fold_word(word, &mut lookup);
            }
        }
        self.rank(lookup)
    }
}

impl Serialize for InvertedIndex {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.words.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn queries(words: &[&str]) -> BTreeSet<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    fn sample_index() -> InvertedIndex {
        let mut index = InvertedIndex::new();
        index.add_all("docA", ["the", "cat", "sat"]);
        index.add_all("docB", ["the", "dog", "sat"]);
        index
    }

    fn assert_ranked(results: &[SearchResult]) {
        for pair in results.windows(2) {
            assert_ne!(pair[0].rank_cmp(&pair[1]), std::cmp::Ordering::Greater);
        }
    }

    #[test]
    fn test_add_assigns_sequential_positions() {
        let index = sample_index();
        assert!(index.has_position("cat", "docA", 2));
        assert!(index.has_position("sat", "docB", 3));
        assert_eq!(index.total("docA"), 3);
        assert_eq!(index.len(), 4);
        assert_eq!(index.locations_len("the"), 2);
    }

    #[test]
    fn test_add_is_idempotent() {
        let mut index = InvertedIndex::new();
        assert!(index.add("x", "f1", 1));
        assert!(!index.add("x", "f1", 1));
        assert_eq!(index.positions_len("x", "f1"), 1);
        assert_eq!(index.total("f1"), 1);
    }

    #[test]
    fn test_duplicate_position_undercounts_total() {
        let mut index = InvertedIndex::new();
        index.add("a", "f", 1);
        index.add("b", "f", 1);
        index.add("a", "f", 1);
        // Distinct (word, position) pairs, not raw tokens
        assert_eq!(index.total("f"), 2);
    }

    #[test]
    fn test_lookups_on_missing_keys() {
        let index = sample_index();
        assert!(!index.has_word("bird"));
        assert!(!index.has_location("cat", "docB"));
        assert!(!index.has_position("cat", "docA", 1));
        assert_eq!(index.total("docC"), 0);
        assert_eq!(index.locations("bird").count(), 0);
        assert_eq!(index.positions_len("bird", "docA"), 0);
    }

    #[test]
    fn test_words_sorted() {
        let index = sample_index();
        let words: Vec<&str> = index.words().collect();
        assert_eq!(words, vec!["cat", "dog", "sat", "the"]);
    }

    #[test]
    fn test_merge_unions_positions() {
        let mut ours = InvertedIndex::new();
        ours.add("x", "f1", 1);
        ours.add("x", "f1", 2);

        let mut theirs = InvertedIndex::new();
        theirs.add("x", "f1", 1);

        ours.merge(theirs);
        let positions: Vec<usize> = ours.positions("x", "f1").unwrap().iter().copied().collect();
        assert_eq!(positions, vec![1, 2]);
    }

    #[test]
    fn test_merge_disjoint_is_commutative() {
        let mut a = InvertedIndex::new();
        a.add_all("a.txt", ["hello", "world"]);
        let mut b = InvertedIndex::new();
        b.add_all("b.txt", ["hello", "there", "world"]);

        let mut ab = a.clone();
        ab.merge(b.clone());
        let mut ba = b;
        ba.merge(a);

        assert_eq!(ab, ba);
        assert_eq!(ab.total("b.txt"), 3);
    }

    #[test]
    fn test_exact_search_ties_broken_by_location() {
        let index = sample_index();
        let results = index.exact_search(&queries(&["the", "sat"]));

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].location, "docA");
        assert_eq!(results[1].location, "docB");
        for r in &results {
            assert_eq!(r.count, 2);
            assert_eq!(r.score_key(), 66_666_667);
        }
    }

    #[test]
    fn test_exact_search_ignores_unknown_words() {
        let index = sample_index();
        assert!(index.exact_search(&queries(&["ca"])).is_empty());
        assert!(index.exact_search(&BTreeSet::new()).is_empty());
    }

    #[test]
    fn test_partial_search_prefix() {
        let index = sample_index();
        let results = index.partial_search(&queries(&["ca"]));

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].location, "docA");
        assert_eq!(results[0].count, 1);
        assert_eq!(results[0].score_key(), 33_333_333);
    }

    #[test]
    fn test_partial_search_case_insensitive_equal() {
        let mut index = InvertedIndex::new();
        index.add_all("doc", ["apple", "zebra"]);
        // "apple" sorts after "APPLE" and matches it ignoring case
        let results = index.partial_search(&queries(&["APPLE"]));
        assert_eq!(results.len(), 1);
        // "APP" is not a case-sensitive prefix of "apple"
        let results = index.partial_search(&queries(&["APP"]));
        assert!(results.is_empty());
    }

    #[test]
    fn test_partial_search_superset_of_exact() {
        let mut index = sample_index();
        index.add_all("docC", ["catalog", "cat", "dogma"]);

        for q in ["cat", "dog", "the", "sat", "c", "d", "zzz"] {
            let q = queries(&[q]);
            let exact: BTreeSet<String> =
                index.exact_search(&q).into_iter().map(|r| r.location).collect();
            let partial: BTreeSet<String> =
                index.partial_search(&q).into_iter().map(|r| r.location).collect();
            assert!(partial.is_superset(&exact));
        }
    }

    #[test]
    fn test_results_are_ranked() {
        let mut index = sample_index();
        index.add_all("docC", ["cat", "cat", "cat", "the"]);
        index.add_all("docD", ["the", "the", "sat", "dog", "cat", "bird"]);

        assert_ranked(&index.exact_search(&queries(&["the", "cat", "sat"])));
        assert_ranked(&index.partial_search(&queries(&["c", "s", "d"])));

        let top = &index.exact_search(&queries(&["cat"]))[0];
        assert_eq!(top.location, "docC");
        assert_eq!(top.count, 3);
    }

    #[test]
    fn test_serializes_as_nested_object() {
        let mut index = InvertedIndex::new();
        index.add_all("f", ["b", "a", "b"]);
        let json = serde_json::to_string(&index).unwrap();
        assert_eq!(json, r#"{"a":{"f":[2]},"b":{"f":[1,3]}}"#);
    }
}
