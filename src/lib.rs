//! # crawldex - crawl, index, search
//!
//! crawldex builds an inverted word index from local text files or from a
//! bounded web crawl, then answers batches of ranked multi-word queries
//! against it. Indexing, crawling and querying all run on one shared
//! worker pool.
//!
//! ## Architecture
//!
//! - [`runner`] - Fixed worker pool whose tasks may submit more tasks, with a drain barrier
//! - [`index`] - Inverted index, its thread-safe wrapper, ranking and builders
//! - [`crawl`] - Breadth-first crawler feeding the shared index
//! - [`query`] - Query canonicalization and batch search with a result cache
//! - [`output`] - JSON and terminal output
//! - [`config`] - Persisted defaults and run validation
//! - [`utils`] - Stemming, file discovery, progress bars
//!
//! ## Quick Start
//!
//! ```no_run
//! use crawldex::index::{ConcurrentIndex, SearchMode, ThreadedBuilder};
//! use crawldex::query::QueryBatchRunner;
//! use crawldex::runner::TaskRunner;
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! let runner = TaskRunner::new(4).unwrap();
//! let index = Arc::new(ConcurrentIndex::new());
//!
//! ThreadedBuilder::new(Arc::clone(&index), runner.clone())
//!     .build(Path::new("corpus/"))
//!     .unwrap();
//!
//! let batch = QueryBatchRunner::new(index, runner, SearchMode::Partial);
//! batch.search_lines(vec!["running cats".to_string()]);
//!
//! for (query, results) in batch.results() {
//!     for result in results {
//!         println!("{}: {} {} {:.8}", query, result.location, result.count, result.score);
//!     }
//! }
//! ```
//!
//! ## Ranking
//!
//! A result's count is the number of matching positions at a location; its
//! score divides that by the location's word count. Results are ordered by
//! score, then count (both descending), then location.

pub mod config;
pub mod crawl;
pub mod index;
pub mod output;
pub mod query;
pub mod runner;
pub mod utils;
