// src/ingest/mod.rs
pub mod providers;
pub mod scheduler;
pub mod types;

use once_cell::sync::OnceCell;
use regex::Regex;

/// Visible text of a markup fragment: tags stripped, entities decoded, trimmed.
///
/// Inner whitespace is kept as-is; titles are compared byte-for-byte, so
/// anything beyond the outer trim would change what counts as "the same".
pub fn visible_text(fragment: &str) -> String {
    static RE_TAGS: OnceCell<Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| Regex::new(r"(?is)</?[^>]+>").unwrap());
    let stripped = re_tags.replace_all(fragment, "");
    html_escape::decode_html_entities(&stripped).trim().to_string()
}
