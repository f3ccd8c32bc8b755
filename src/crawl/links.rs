//! Anchor extraction and URL normalization

use regex::Regex;
use std::sync::LazyLock;
use url::Url;

static ANCHOR_HREF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<a\s[^>]*?\bhref\s*=\s*"([^"]*)""#).expect("valid anchor pattern")
});

/// Drop the fragment. `url` already percent-encodes the path and query.
pub fn normalize(mut url: Url) -> Url {
    url.set_fragment(None);
    url
}

/// Resolve every `<a href="...">` in `html` against `base`, in document order.
///
/// Links that do not parse or are not http(s) are skipped.
pub fn extract_links(base: &Url, html: &str) -> Vec<Url> {
    ANCHOR_HREF
        .captures_iter(html)
        .filter_map(|caps| {
            let href = caps.get(1)?.as_str().trim();
            match base.join(href) {
                Ok(url) if matches!(url.scheme(), "http" | "https") => Some(normalize(url)),
                Ok(url) => {
                    tracing::debug!(link = %url, "skipping non-http link");
                    None
                }
                Err(e) => {
                    tracing::debug!(href, error = %e, "skipping malformed link");
                    None
                }
            }
        })
        .collect()
}
