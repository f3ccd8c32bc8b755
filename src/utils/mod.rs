//! Utility functions shared by the builders, crawler and query runner.
//!
//! ## Modules
//!
//! - [`text`] - Cleaning, tokenizing and Snowball stemming
//! - [`files`] - Text file discovery
//! - [`progress`] - Progress bars (no-op without the `progress` feature)
//!
//! ## Key Functions
//!
//! ```no_run
//! use crawldex::utils::{stem_words, unique_stems};
//!
//! // Words in order, as indexed
//! let words = stem_words("The cats were running");
//! // Returns: ["the", "cat", "were", "run"]
//!
//! // Distinct sorted stems, as queried
//! let stems = unique_stems("running cats run");
//! // Returns: {"cat", "run"}
//! ```

pub mod files;
pub mod progress;
pub mod text;

pub use files::*;
pub use text::*;
