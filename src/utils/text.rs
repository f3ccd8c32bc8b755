use rust_stemmers::{Algorithm, Stemmer};
use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::Path;
use std::sync::LazyLock;

static STEMMER: LazyLock<Stemmer> = LazyLock::new(|| Stemmer::create(Algorithm::English));

/// Lowercase and keep only alphabetic characters and whitespace
pub fn clean(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_alphabetic() || c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Split text into cleaned words, in order
pub fn tokenize(text: &str) -> Vec<String> {
    clean(text).split_whitespace().map(str::to_string).collect()
}

/// Stem a single already-cleaned word
pub fn stem(word: &str) -> String {
    STEMMER.stem(word).into_owned()
}

/// Tokenize and stem, keeping order and duplicates
pub fn stem_words(text: &str) -> Vec<String> {
    tokenize(text).iter().map(|word| stem(word)).collect()
}

/// Distinct stems of a line in sorted order
pub fn unique_stems(text: &str) -> BTreeSet<String> {
    tokenize(text).iter().map(|word| stem(word)).collect()
}

/// Read a UTF-8 file and stem its words in order
pub fn stem_file(path: &Path) -> io::Result<Vec<String>> {
    let content = fs::read_to_string(path)?;
    Ok(stem_words(&content))
}
