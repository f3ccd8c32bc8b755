//! Web crawling: fetch pages, follow links, index page text.
//!
//! - [`crawler`] - Task-per-page crawler with a budgeted visited set
//! - [`fetch`] - Page fetcher contract and its HTTP implementation
//! - [`links`] - Anchor extraction and URL normalization
//! - [`html`] - Markup stripping

pub mod crawler;
pub mod fetch;
pub mod html;
pub mod links;

pub use crawler::{CrawlSummary, Crawler};
pub use fetch::{HttpFetcher, PageFetcher};
