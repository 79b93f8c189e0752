// src/extract/mod.rs
//! Candidate extraction: pull profile identifiers out of arbitrary markup or text.
//!
//! Three independent techniques run over the same input and are unioned in this order
//! before de-duplication:
//! 1. `links`: anchor `href` targets, unwrapping one level of search redirectors;
//! 2. `text`: free-text scan for the profile URL shape;
//! 3. `selectors`: configured structural selectors (supplementary net).
//!
//! Every raw hit goes through the same [`canonicalize`] step. Hits that fail are dropped
//! silently.

pub mod links;
pub mod selectors;
pub mod text;

use regex::Regex;
use serde::Serialize;
use tracing::debug;
use url::Url;

pub use selectors::SelectorSet;

use crate::config::ProfileConfig;

/// Path marker that precedes the identifier in a profile URL.
pub const PROFILE_MARKER: &str = "/in/";

/// Query keys used by search engines to wrap outbound links.
const REDIRECT_KEYS: [&str; 3] = ["/url?q=", "/url?url=", "uddg="];

/// Delimiters that survived a first decode because they were double-encoded.
const RESIDUAL_ENCODED: [(&str, &str); 6] = [
    ("%3F", "?"),
    ("%3f", "?"),
    ("%3D", "="),
    ("%3d", "="),
    ("%26", "&"),
    ("%2F", "/"),
];

const JUNK: [&str; 3] = ["%22", "\"", "+"];

const SLUG_DELIMITERS: [char; 7] = ['/', '?', '&', '#', ' ', '"', '+'];

/// Strategy that produced a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    StaticTable,
    PrimarySearch,
    SecondarySearch,
    Constructed,
    DirectUrl,
}

impl Origin {
    pub fn as_str(&self) -> &'static str {
        match self {
            Origin::StaticTable => "static_table",
            Origin::PrimarySearch => "primary_search",
            Origin::SecondarySearch => "secondary_search",
            Origin::Constructed => "constructed",
            Origin::DirectUrl => "direct_url",
        }
    }
}

/// How the identifier was obtained from its source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Technique {
    Link,
    Text,
    Selector,
    Lookup,
    Synthesized,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CandidateIdentifier {
    pub raw: String,
    pub canonical: String,
    pub origin: Origin,
    pub technique: Technique,
    /// Independently known name (e.g. the search result title).
    pub display_name: Option<String>,
    /// Independently known organization.
    pub organization: Option<String>,
    /// Job title from the search result, when it carried one.
    pub title: Option<String>,
}

impl CandidateIdentifier {
    pub fn new(
        raw: impl Into<String>,
        canonical: impl Into<String>,
        origin: Origin,
        technique: Technique,
    ) -> Self {
        Self {
            raw: raw.into(),
            canonical: canonical.into(),
            origin,
            technique,
            display_name: None,
            organization: None,
            title: None,
        }
    }

    pub fn with_hint(mut self, display_name: Option<String>, organization: Option<String>) -> Self {
        self.display_name = display_name;
        self.organization = organization;
        self
    }

    pub fn with_title(mut self, title: Option<String>) -> Self {
        self.title = title;
        self
    }

    pub fn known_name(&self) -> Option<&str> {
        self.display_name.as_deref().filter(|n| !n.trim().is_empty())
    }
}

/// Percent-decode exactly once. Invalid UTF-8 is replaced lossily.
pub fn percent_decode(s: &str) -> String {
    match urlencoding::decode(s) {
        Ok(c) => c.into_owned(),
        Err(_) => String::from_utf8_lossy(&urlencoding::decode_binary(s.as_bytes())).into_owned(),
    }
}

/// Return the wrapped target of a search redirector link (still encoded), or the input.
pub fn unwrap_redirect(raw: &str) -> &str {
    for key in REDIRECT_KEYS {
        if let Some(pos) = raw.find(key) {
            let rest = &raw[pos + key.len()..];
            let end = rest.find('&').unwrap_or(rest.len());
            return &rest[..end];
        }
    }
    raw
}

/// Canonicalize with the default profile marker.
pub fn canonicalize(raw: &str) -> Option<String> {
    canonicalize_with_marker(raw, PROFILE_MARKER)
}

/// Reduce a raw link/text hit to a canonical identifier.
///
/// Unwrap one redirector level, decode once, strip junk, take the segment after the
/// marker (whole input when absent), cut at the first delimiter, keep `[A-Za-z0-9_-]`,
/// lower-case. `None` when fewer than 2 characters remain.
pub fn canonicalize_with_marker(raw: &str, marker: &str) -> Option<String> {
    let mut s = percent_decode(unwrap_redirect(raw.trim()));
    for (from, to) in RESIDUAL_ENCODED {
        if s.contains(from) {
            s = s.replace(from, to);
        }
    }
    for junk in JUNK {
        s = s.replace(junk, "");
    }

    let segment = match find_ignore_ascii_case(&s, marker) {
        Some(pos) => &s[pos + marker.len()..],
        None => s.as_str(),
    };
    let end = segment.find(SLUG_DELIMITERS).unwrap_or(segment.len());

    let slug: String = segment[..end]
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect::<String>()
        .to_ascii_lowercase();

    (slug.len() >= 2).then_some(slug)
}

/// Parse the unwrapped, decoded target of a hit. Scheme-less (`//host/...` or
/// `host/...`) targets are read as https; site-relative paths are not targets.
fn parse_target(raw: &str) -> Option<Url> {
    let target = percent_decode(unwrap_redirect(raw.trim()));
    let target = target.trim();
    match Url::parse(target) {
        Ok(url) => Some(url),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            if let Some(rest) = target.strip_prefix("//") {
                Url::parse(&format!("https://{rest}")).ok()
            } else if target.starts_with('/') {
                None
            } else {
                Url::parse(&format!("https://{target}")).ok()
            }
        }
        Err(_) => None,
    }
}

fn find_ignore_ascii_case(haystack: &str, needle: &str) -> Option<usize> {
    if needle.is_empty() {
        return None;
    }
    haystack
        .to_ascii_lowercase()
        .find(&needle.to_ascii_lowercase())
}

/// A raw hit from one technique, before canonicalization.
#[derive(Debug, Clone)]
pub(crate) struct RawHit {
    pub value: String,
    pub technique: Technique,
    pub display_name: Option<String>,
    pub organization: Option<String>,
    pub title: Option<String>,
}

impl RawHit {
    pub(crate) fn bare(value: impl Into<String>, technique: Technique) -> Self {
        Self {
            value: value.into(),
            technique,
            display_name: None,
            organization: None,
            title: None,
        }
    }
}

/// Runs all techniques for one profile host/marker pair.
#[derive(Debug, Clone)]
pub struct Extractor {
    host: String,
    marker: String,
    text_re: Regex,
    selectors: SelectorSet,
}

impl Extractor {
    pub fn new(host: &str, marker: &str, selectors: SelectorSet) -> Self {
        let host = host.trim().to_ascii_lowercase();
        let marker = if marker.is_empty() {
            PROFILE_MARKER.to_string()
        } else {
            marker.to_ascii_lowercase()
        };
        let text_re = text::profile_url_regex(&host, &marker);
        Self {
            host,
            marker,
            text_re,
            selectors,
        }
    }

    pub fn from_config(profile: &ProfileConfig, selectors: SelectorSet) -> Self {
        Self::new(&profile.host, &profile.marker, selectors)
    }

    pub fn selectors(&self) -> &SelectorSet {
        &self.selectors
    }

    pub fn canonicalize(&self, raw: &str) -> Option<String> {
        canonicalize_with_marker(raw, &self.marker)
    }

    /// Every distinct candidate in `raw_text`, in discovery order.
    pub fn extract(&self, raw_text: &str, origin: Origin) -> Vec<CandidateIdentifier> {
        let mut hits = links::scan(raw_text);
        hits.extend(text::scan(raw_text, &self.text_re));
        hits.extend(self.selectors.scan(raw_text));

        let mut out: Vec<CandidateIdentifier> = Vec::new();
        for hit in hits {
            if !self.points_at_profile(&hit.value) {
                continue;
            }
            let Some(canonical) = self.canonicalize(&hit.value) else {
                continue;
            };
            if let Some(existing) = out.iter_mut().find(|c| c.canonical == canonical) {
                if existing.display_name.is_none() && hit.display_name.is_some() {
                    existing.display_name = hit.display_name;
                    existing.organization = hit.organization;
                    existing.title = hit.title;
                }
                continue;
            }
            out.push(
                CandidateIdentifier::new(hit.value, canonical, origin, hit.technique)
                    .with_hint(hit.display_name, hit.organization)
                    .with_title(hit.title),
            );
        }

        debug!(target: "extract", origin = origin.as_str(), found = out.len(), "extracted candidates");
        out
    }

    /// The unwrapped, decoded target is an absolute URL on the profile host (or a
    /// subdomain) whose path starts with the marker. Search-engine links that merely
    /// mention the host in their query string do not qualify.
    fn points_at_profile(&self, value: &str) -> bool {
        let Some(url) = parse_target(value) else {
            return false;
        };
        let Some(host) = url.host_str().map(str::to_ascii_lowercase) else {
            return false;
        };
        let on_host = host == self.host
            || host
                .strip_suffix(self.host.as_str())
                .is_some_and(|sub| sub.ends_with('.'));
        on_host && url.path().to_ascii_lowercase().starts_with(&self.marker)
    }
}

impl Default for Extractor {
    fn default() -> Self {
        Self::from_config(&ProfileConfig::default(), SelectorSet::default_seed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redirect_wrapped_target_canonicalizes() {
        let raw = "/url?q=https%3A%2F%2Fexample.com%2Fin%2Fjdoe%26sa%3DU";
        assert_eq!(canonicalize(raw).as_deref(), Some("jdoe"));
    }

    #[test]
    fn raw_ampersand_ends_redirect_target() {
        let raw = "/url?q=https://www.linkedin.com/in/jane-doe-42/&sa=U&ved=2ah";
        assert_eq!(canonicalize(raw).as_deref(), Some("jane-doe-42"));
    }

    #[test]
    fn duckduckgo_wrapper_is_unwrapped() {
        let raw = "//duckduckgo.com/l/?uddg=https%3A%2F%2Fuk.linkedin.com%2Fin%2FJDoe%3ForiginalSubdomain%3Duk&rut=abc";
        assert_eq!(canonicalize(raw).as_deref(), Some("jdoe"));
    }

    #[test]
    fn truncates_at_first_delimiter() {
        for (raw, want) in [
            ("https://www.linkedin.com/in/jdoe/details", "jdoe"),
            ("https://www.linkedin.com/in/jdoe?trk=x", "jdoe"),
            ("https://www.linkedin.com/in/jdoe#about", "jdoe"),
            ("https://www.linkedin.com/in/jdoe more text", "jdoe"),
            ("https://www.linkedin.com/in/j.doe_1", "jdoe_1"),
        ] {
            assert_eq!(canonicalize(raw).as_deref(), Some(want), "{raw}");
        }
    }

    #[test]
    fn junk_is_stripped_before_cut() {
        assert_eq!(
            canonicalize("\"https://www.linkedin.com/in/jdoe\"").as_deref(),
            Some("jdoe")
        );
        assert_eq!(canonicalize("https://linkedin.com/in/%22jdoe%22").as_deref(), Some("jdoe"));
    }

    #[test]
    fn short_or_empty_is_rejected() {
        assert_eq!(canonicalize("https://www.linkedin.com/in/j"), None);
        assert_eq!(canonicalize("https://www.linkedin.com/in/"), None);
        assert_eq!(canonicalize("https://www.linkedin.com/in/?x=1"), None);
        assert_eq!(canonicalize(""), None);
    }

    #[test]
    fn canonicalize_is_idempotent() {
        for raw in [
            "/url?q=https%3A%2F%2Fexample.com%2Fin%2Fjdoe%26sa%3DU",
            "https://www.linkedin.com/in/Jane-Doe_7/",
            "https://www.linkedin.com/in/dave.ackley",
            "plain-slug",
            "%E2%9C%93 weird",
            "  spaced  ",
        ] {
            if let Some(once) = canonicalize(raw) {
                assert_eq!(canonicalize(&once).as_deref(), Some(once.as_str()), "{raw}");
            }
        }
    }

    #[test]
    fn extract_unions_and_dedups_in_order() {
        let html = r#"
            <div class="g"><a href="/url?q=https://www.linkedin.com/in/jdoe/&amp;sa=U"><h3>John Doe - CTO - Initech | LinkedIn</h3></a></div>
            <div class="g"><a href="https://www.linkedin.com/in/asmith">A Smith</a></div>
            <p>See also https://www.linkedin.com/in/jdoe and https://linkedin.com/in/zz-top</p>
            <div data-url="https://www.linkedin.com/in/late-one"></div>
            <a href="https://www.linkedin.com/company/initech">Initech</a>
        "#;
        let ex = Extractor::default();
        let got = ex.extract(html, Origin::PrimarySearch);
        let ids: Vec<&str> = got.iter().map(|c| c.canonical.as_str()).collect();
        assert_eq!(ids, vec!["jdoe", "asmith", "zz-top", "late-one"]);

        assert_eq!(got[0].technique, Technique::Link);
        assert_eq!(got[0].display_name.as_deref(), Some("John Doe"));
        assert_eq!(got[0].organization.as_deref(), Some("Initech"));
        assert_eq!(got[0].title.as_deref(), Some("CTO"));
        assert_eq!(got[1].title, None);
        assert_eq!(got[2].technique, Technique::Text);
        assert_eq!(got[3].technique, Technique::Selector);
        assert!(got.iter().all(|c| c.origin == Origin::PrimarySearch));
    }

    #[test]
    fn other_hosts_are_ignored() {
        let ex = Extractor::default();
        let got = ex.extract(
            r#"<a href="https://example.com/in/jdoe">x</a> https://example.org/in/abc"#,
            Origin::SecondarySearch,
        );
        assert!(got.is_empty());
    }

    #[test]
    fn search_links_mentioning_the_host_are_not_profiles() {
        let ex = Extractor::default();
        let html = r#"
            <a href="/search?q=%22Jane+Doe%22+site:linkedin.com/in/+%22Initech%22&amp;start=10">Next</a>
            <a href="https://www.google.com/search?q=linkedin.com/in/jdoe">Similar</a>
            <a href="https://linkedin.com.evil.test/in/jdoe">Lookalike</a>
            <a href="https://www.linkedin.com/pub/dir?trk=/in/jdoe">Directory</a>
        "#;
        assert!(ex.extract(html, Origin::PrimarySearch).is_empty());
    }

    #[test]
    fn scheme_less_and_subdomain_targets_still_count() {
        let ex = Extractor::default();
        let html = r#"<a href="//uk.linkedin.com/in/jdoe">a</a><a href="linkedin.com/in/asmith">b</a>"#;
        let ids: Vec<String> = ex
            .extract(html, Origin::SecondarySearch)
            .into_iter()
            .map(|c| c.canonical)
            .collect();
        assert_eq!(ids, vec!["jdoe", "asmith"]);
    }
}
