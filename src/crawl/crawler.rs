//! Multi-threaded breadth-first web crawler
//!
//! Each page is one task on the [`TaskRunner`]: fetch, bound check, admit new
//! links into the visited set (submitting a task for each), then strip, stem
//! and index the page locally before publishing it to the shared index. The
//! crawl is complete when the runner drains.
//!
//! The visited set is guarded by its own mutex, separate from the index lock.
//! Admission checks the budget and inserts under that mutex, but the page-level
//! bound check is a separate step, so the budget is a soft cap.

use crate::crawl::fetch::PageFetcher;
use crate::crawl::html::{page_text, strip_block_elements};
use crate::crawl::links::{extract_links, normalize};
use crate::index::{ConcurrentIndex, InvertedIndex};
use crate::runner::TaskRunner;
use crate::utils::progress::{ProgressBar, counter};
use crate::utils::stem_words;
use ahash::AHashSet;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use url::Url;

/// Outcome of one crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CrawlSummary {
    /// Distinct URLs admitted to the visited set, including the seed
    pub visited: usize,
    /// Pages fetched and published to the index
    pub indexed: usize,
    /// Pages whose fetch returned nothing
    pub failed: usize,
}

/// State shared by every task of one crawl and dropped when it ends
struct CrawlRun {
    index: Arc<ConcurrentIndex>,
    fetcher: Arc<dyn PageFetcher>,
    max_urls: usize,
    visited: Mutex<AHashSet<Url>>,
    indexed: AtomicUsize,
    failed: AtomicUsize,
    progress: ProgressBar,
}

pub struct Crawler {
    index: Arc<ConcurrentIndex>,
    runner: TaskRunner,
    fetcher: Arc<dyn PageFetcher>,
    max_urls: usize,
    silent: bool,
}

impl Crawler {
    pub fn new(
        index: Arc<ConcurrentIndex>,
        runner: TaskRunner,
        fetcher: Arc<dyn PageFetcher>,
        max_urls: usize,
    ) -> Self {
        Self {
            index,
            runner,
            fetcher,
            max_urls,
            silent: false,
        }
    }

    /// Suppress the progress counter
    pub fn silent(mut self, silent: bool) -> Self {
        self.silent = silent;
        self
    }

    /// Crawl from `seed` until no page task or descendant remains
    pub fn crawl(&self, seed: Url) -> CrawlSummary {
        let seed = normalize(seed);
        tracing::info!(%seed, max_urls = self.max_urls, "crawl started");

        let run = Arc::new(CrawlRun {
            index: Arc::clone(&self.index),
            fetcher: Arc::clone(&self.fetcher),
            max_urls: self.max_urls,
            visited: Mutex::new(AHashSet::new()),
            indexed: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
            progress: counter("pages crawled", self.silent),
        });

        run.visited.lock().insert(seed.clone());
        submit_page(&self.runner, Arc::clone(&run), seed);
        self.runner.await_drain();

        let summary = CrawlSummary {
            visited: run.visited.lock().len(),
            indexed: run.indexed.load(Ordering::Relaxed),
            failed: run.failed.load(Ordering::Relaxed),
        };
        run.progress
            .finish_with_message(format!("{} pages indexed", summary.indexed));
        tracing::info!(
            visited = summary.visited,
            indexed = summary.indexed,
            failed = summary.failed,
            "crawl finished"
        );
        summary
    }
}

fn submit_page(runner: &TaskRunner, run: Arc<CrawlRun>, url: Url) {
    runner.submit(move |runner| crawl_page(runner, &run, url));
}

fn crawl_page(runner: &TaskRunner, run: &Arc<CrawlRun>, url: Url) {
    let Some(html) = run.fetcher.fetch(&url) else {
        run.failed.fetch_add(1, Ordering::Relaxed);
        return;
    };

    if run.max_urls == 0 || run.visited.lock().len() > run.max_urls {
        return;
    }

    let html = strip_block_elements(&html);

    for link in extract_links(&url, &html) {
        let admitted = {
            let mut visited = run.visited.lock();
            if visited.len() >= run.max_urls {
                break;
            }
            visited.insert(link.clone())
        };
        if admitted {
            tracing::trace!(%link, parent = %url, "link admitted");
            submit_page(runner, Arc::clone(run), link);
        }
    }

    let location = url.as_str();
    let mut local = InvertedIndex::new();
    local.add_all(location, stem_words(&page_text(&html)));
    run.index.merge(local);

    run.indexed.fetch_add(1, Ordering::Relaxed);
    run.progress.inc(1);
    tracing::debug!(%url, "page indexed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// Serves pages from memory
    struct SiteFetcher {
        pages: HashMap<String, String>,
        requests: AtomicUsize,
    }

    impl SiteFetcher {
        fn new(pages: &[(&str, String)]) -> Arc<Self> {
            Arc::new(Self {
                pages: pages
                    .iter()
                    .map(|(url, html)| (url.to_string(), html.clone()))
                    .collect(),
                requests: AtomicUsize::new(0),
            })
        }
    }

    impl PageFetcher for SiteFetcher {
        fn fetch(&self, url: &Url) -> Option<String> {
            self.requests.fetch_add(1, Ordering::SeqCst);
            self.pages.get(url.as_str()).cloned()
        }
    }

    fn page(body: &str, links: &[&str]) -> String {
        let anchors: String = links
            .iter()
            .map(|l| format!("<a href=\"{}\">link</a>", l))
            .collect();
        format!("<html><head><title>ignored</title></head><body><p>{}</p>{}</body></html>", body, anchors)
    }

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    fn new_crawler(fetcher: Arc<dyn PageFetcher>, max_urls: usize) -> (Crawler, Arc<ConcurrentIndex>) {
        let index = Arc::new(ConcurrentIndex::new());
        let runner = TaskRunner::new(4).unwrap();
        let crawler = Crawler::new(Arc::clone(&index), runner, fetcher, max_urls).silent(true);
        (crawler, index)
    }

    /// Seed linking to `width` children, each linking to `width` grandchildren
    fn wide_site(width: usize) -> Vec<(String, String)> {
        let mut pages = Vec::new();
        let children: Vec<String> = (0..width).map(|i| format!("http://site.test/c{}.html", i)).collect();
        let child_refs: Vec<&str> = children.iter().map(String::as_str).collect();
        pages.push(("http://site.test/".to_string(), page("root", &child_refs)));
        for (i, child) in children.iter().enumerate() {
            let grand: Vec<String> = (0..width)
                .map(|j| format!("http://site.test/g{}_{}.html", i, j))
                .collect();
            let grand_refs: Vec<&str> = grand.iter().map(String::as_str).collect();
            pages.push((child.clone(), page("child", &grand_refs)));
            for g in grand {
                pages.push((g, page("grandchild", &[])));
            }
        }
        pages
    }

    fn site_fetcher(pages: &[(String, String)]) -> Arc<SiteFetcher> {
        let refs: Vec<(&str, String)> = pages.iter().map(|(u, h)| (u.as_str(), h.clone())).collect();
        SiteFetcher::new(&refs)
    }

    #[test]
    fn test_single_page_indexed_by_url() {
        let fetcher = SiteFetcher::new(&[("http://site.test/", page("Cats running", &[]))]);
        let (crawler, index) = new_crawler(fetcher, 1);

        let summary = crawler.crawl(url("http://site.test/#top"));

        assert_eq!(summary, CrawlSummary { visited: 1, indexed: 1, failed: 0 });
        assert!(index.has_position("cat", "http://site.test/", 1));
        assert!(index.has_position("run", "http://site.test/", 2));
        // Title lives in <head>, which is dropped
        assert!(!index.has_word("ignor"));
    }

    #[test]
    fn test_follows_links_within_budget() {
        let site = wide_site(3);
        let (crawler, index) = new_crawler(site_fetcher(&site), 50);

        let summary = crawler.crawl(url("http://site.test/"));

        // 1 root + 3 children + 9 grandchildren
        assert_eq!(summary.visited, 13);
        assert_eq!(summary.indexed, 13);
        assert_eq!(index.locations_len("grandchild"), 9);
    }

    #[test]
    fn test_budget_caps_visited_set() {
        let site = wide_site(10);
        for max in [1, 2, 5, 11, 20] {
            let fetcher = site_fetcher(&site);
            let (crawler, index) = new_crawler(fetcher.clone(), max);

            let summary = crawler.crawl(url("http://site.test/"));

            // Bounded by one page's worth of links at worst
            assert!(summary.visited <= max + 10, "max {} visited {}", max, summary.visited);
            assert!(summary.indexed <= summary.visited);
            assert_eq!(index.word_count().len(), summary.indexed);
            assert_eq!(fetcher.requests.load(Ordering::SeqCst), summary.visited);
        }
    }

    #[test]
    fn test_zero_budget_indexes_nothing() {
        let site = wide_site(2);
        let (crawler, index) = new_crawler(site_fetcher(&site), 0);

        let summary = crawler.crawl(url("http://site.test/"));

        assert_eq!(summary.indexed, 0);
        assert!(index.is_empty());
    }

    #[test]
    fn test_failed_fetch_ends_branch_only() {
        let fetcher = SiteFetcher::new(&[
            (
                "http://site.test/",
                page("root", &["http://site.test/missing.html", "http://site.test/ok.html"]),
            ),
            ("http://site.test/ok.html", page("fine", &[])),
        ]);
        let (crawler, index) = new_crawler(fetcher, 10);

        let summary = crawler.crawl(url("http://site.test/"));

        assert_eq!(summary.visited, 3);
        assert_eq!(summary.indexed, 2);
        assert_eq!(summary.failed, 1);
        assert!(index.has_location("fine", "http://site.test/ok.html"));
    }

    #[test]
    fn test_cycles_visited_once() {
        let fetcher = SiteFetcher::new(&[
            ("http://site.test/a", page("alpha", &["/b", "/a#self"])),
            ("http://site.test/b", page("beta", &["/a", "/b"])),
        ]);
        let (crawler, index) = new_crawler(fetcher.clone(), 10);

        let summary = crawler.crawl(url("http://site.test/a"));

        assert_eq!(summary.visited, 2);
        assert_eq!(fetcher.requests.load(Ordering::SeqCst), 2);
        assert_eq!(index.total("http://site.test/a"), 3);
    }
}
