// src/extract/text.rs
//! Free-text scan: finds profile URLs that appear as visible text (breadcrumbs,
//! snippets, plain-text responses).

use regex::Regex;

use super::{RawHit, Technique};
use crate::text::strip_tags;

/// `https?://(sub.)*{host}{marker}{slug}` with the host and marker escaped.
pub(crate) fn profile_url_regex(host: &str, marker: &str) -> Regex {
    let pattern = format!(
        r"(?i)https?://(?:[a-z0-9-]+\.)*{}{}[a-z0-9\-_%]+",
        regex::escape(host),
        regex::escape(marker)
    );
    // Both inputs are escaped, so the pattern is always valid.
    Regex::new(&pattern).expect("profile url regex")
}

pub(crate) fn scan(raw: &str, re: &Regex) -> Vec<RawHit> {
    let decoded = html_escape::decode_html_entities(raw);
    let visible = strip_tags(&decoded);
    re.find_iter(&visible)
        .map(|m| RawHit::bare(m.as_str(), Technique::Text))
        .collect()
}
