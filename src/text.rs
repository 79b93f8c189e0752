// src/text.rs
//! Small text helpers shared by the extractor, matcher and news providers.

use once_cell::sync::OnceCell;
use regex::Regex;

/// Decode HTML entities, strip tags, fold typographic quotes and collapse whitespace.
pub fn normalize_text(s: &str) -> String {
    // 1) HTML entity decode
    let mut out = html_escape::decode_html_entities(s).to_string();

    // 2) Strip HTML tags
    out = strip_tags(&out);

    // 3) Normalize “ ” ‘ ’ « » to ASCII quotes
    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    // 4) Collapse whitespace
    collapse_ws(&out)
}

/// Remove anything that looks like a markup tag. Script/style bodies are dropped too.
pub fn strip_tags(s: &str) -> String {
    static RE_BLOCKS: OnceCell<Regex> = OnceCell::new();
    static RE_TAGS: OnceCell<Regex> = OnceCell::new();
    let re_blocks = RE_BLOCKS.get_or_init(|| {
        Regex::new(r"(?is)<script\b.*?</script>|<style\b.*?</style>").expect("block regex")
    });
    let re_tags = RE_TAGS.get_or_init(|| Regex::new(r"(?is)</?[^>]+>").expect("tag regex"));
    let without_blocks = re_blocks.replace_all(s, " ");
    re_tags.replace_all(&without_blocks, " ").to_string()
}

pub fn collapse_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Lower-case + collapsed whitespace. Used for every name/organization comparison.
pub fn normalize_name(s: &str) -> String {
    collapse_ws(&s.to_lowercase())
}

/// Whitespace tokens of an already-normalized name.
pub fn tokens(normalized: &str) -> Vec<&str> {
    normalized.split_whitespace().collect()
}

/// Short, stable, non-reversible id for log lines. Never log raw names.
pub fn anon_hash(text: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_text_strips_markup_and_entities() {
        let s = "<h3>Jane&nbsp;Doe &amp; Co</h3>  <span>“CEO”</span>";
        assert_eq!(normalize_text(s), "Jane Doe & Co \"CEO\"");
    }

    #[test]
    fn strip_tags_drops_script_bodies() {
        let s = "a<script>var x = '<b>';</script>b";
        assert_eq!(collapse_ws(&strip_tags(s)), "a b");
    }

    #[test]
    fn normalize_name_folds_case_and_spaces() {
        assert_eq!(normalize_name("  Satya   NADELLA "), "satya nadella");
        assert_eq!(tokens("satya nadella"), vec!["satya", "nadella"]);
    }

    #[test]
    fn anon_hash_is_short_and_stable() {
        let a = anon_hash("Jane Doe");
        assert_eq!(a.len(), 12);
        assert_eq!(a, anon_hash("Jane Doe"));
        assert_ne!(a, anon_hash("John Doe"));
    }
}
