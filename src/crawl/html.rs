//! Regex-based HTML cleanup
//!
//! Good enough to turn a page into indexable text; not an HTML parser.

use regex::Regex;
use std::sync::LazyLock;

/// Elements whose whole content is dropped, not just their tags
const BLOCK_ELEMENTS: [&str; 5] = ["head", "style", "script", "noscript", "svg"];

static COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("valid comment pattern"));

static BLOCKS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    BLOCK_ELEMENTS
        .iter()
        .map(|name| {
            Regex::new(&format!(r"(?is)<{name}\b[^>]*>.*?</{name}\s*>"))
                .expect("valid block element pattern")
        })
        .collect()
});

static TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("valid tag pattern"));

static ENTITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&[^\s&;]+;").expect("valid entity pattern"));

/// Remove comments and elements that never carry visible text
pub fn strip_block_elements(html: &str) -> String {
    let mut text = COMMENT.replace_all(html, " ").into_owned();
    for block in BLOCKS.iter() {
        text = block.replace_all(&text, " ").into_owned();
    }
    text
}

/// Replace every remaining tag with a space
pub fn strip_tags(html: &str) -> String {
    TAG.replace_all(html, " ").into_owned()
}

/// Replace character entities such as `&amp;` with a space
pub fn strip_entities(html: &str) -> String {
    ENTITY.replace_all(html, " ").into_owned()
}

/// Full cleanup of a page whose block elements were already stripped
pub fn page_text(html: &str) -> String {
    strip_entities(&strip_tags(html))
}
