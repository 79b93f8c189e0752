// src/extract/links.rs
//! Anchor scanning. Each `<a href=...>` yields its (entity-decoded) target plus a
//! name/title/org hint parsed from the anchor text when it looks like a search result title.

use once_cell::sync::OnceCell;
use regex::Regex;

use super::{RawHit, Technique};
use crate::text::{collapse_ws, normalize_text};

fn anchor_re() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"(?is)<a\b([^>]*)>(.*?)</a\s*>").expect("anchor regex"))
}

fn href_re() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)(?:^|[\s"'])href\s*=\s*(?:"([^"]*)"|'([^']*)')"#).expect("href regex")
    })
}

pub(crate) fn scan(html: &str) -> Vec<RawHit> {
    let mut out = Vec::new();
    for cap in anchor_re().captures_iter(html) {
        let attrs = cap.get(1).map_or("", |m| m.as_str());
        let Some(href) = href_re()
            .captures(attrs)
            .and_then(|h| h.get(1).or_else(|| h.get(2)))
        else {
            continue;
        };
        let target = html_escape::decode_html_entities(href.as_str()).into_owned();
        if target.trim().is_empty() {
            continue;
        }
        let inner = cap.get(2).map_or("", |m| m.as_str());
        let hint = parse_result_title(&normalize_text(inner));
        out.push(RawHit {
            value: target,
            technique: Technique::Link,
            display_name: hint.name,
            organization: hint.organization,
            title: hint.title,
        });
    }
    out
}

/// Parts of a search result title.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultTitle {
    pub name: Option<String>,
    pub title: Option<String>,
    pub organization: Option<String>,
}

/// Split a result title like `"Jane Doe - CEO - Acme Corp | LinkedIn"` into name, job
/// title and organization. Titles with fewer than three dash-separated parts give
/// neither title nor organization; extra middle parts belong to the job title.
pub fn parse_result_title(title: &str) -> ResultTitle {
    let mut head = title;
    for stop in ["|", "›", "·", "http"] {
        if let Some(pos) = head.find(stop) {
            head = &head[..pos];
        }
    }
    let head = head.replace(['–', '—'], "-");
    let parts: Vec<String> = head
        .split(" - ")
        .map(collapse_ws)
        .filter(|p| !p.is_empty())
        .collect();

    let Some(name) = parts.first().filter(|n| looks_like_name(n)).cloned() else {
        return ResultTitle::default();
    };
    if parts.len() < 3 {
        return ResultTitle {
            name: Some(name),
            ..ResultTitle::default()
        };
    }
    ResultTitle {
        name: Some(name),
        title: Some(parts[1..parts.len() - 1].join(" - ")),
        organization: parts.last().cloned(),
    }
}

fn looks_like_name(s: &str) -> bool {
    let words = s.split_whitespace().count();
    (1..=6).contains(&words)
        && s.chars().any(char::is_alphabetic)
        && !s.chars().any(|c| c.is_ascii_digit())
}
