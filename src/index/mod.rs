pub mod build;
pub mod concurrent;
pub mod inverted;
pub mod result;

pub use build::{BuildSummary, ThreadedBuilder, build_index};
pub use concurrent::ConcurrentIndex;
pub use inverted::InvertedIndex;
pub use result::{SearchMode, SearchResult, Searcher};
