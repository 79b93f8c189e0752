// src/construct.rs
//! URL constructor: synthesizes profile identifiers from the query's own name tokens.
//!
//! For each first-name variant (the original token, then its nickname class) crossed
//! with the surname, every configured shape is rendered and sanitized. The sequence is
//! lazy, finite and consumed once; duplicates are skipped.

use std::collections::HashSet;
use std::sync::Arc;

use crate::extract::{CandidateIdentifier, Origin, Technique};
use crate::nicknames::EquivalenceTable;
use crate::query::IdentityQuery;

/// Shapes used when none are configured.
pub const DEFAULT_SHAPES: [&str; 7] = [
    "{first}{last}",
    "{first}-{last}",
    "{first0}{last}",
    "{first}.{last}",
    "{first}_{last}",
    "{last}{first}",
    "{last}-{first}",
];

/// Probe statuses that count as "the profile exists".
pub fn probe_succeeded(status: u16) -> bool {
    (200..300).contains(&status) || matches!(status, 301 | 302 | 303 | 307 | 308)
}

#[derive(Debug, Clone)]
pub struct UrlConstructor {
    shapes: Arc<[String]>,
    nicknames: Arc<EquivalenceTable>,
}

impl UrlConstructor {
    pub fn new(shapes: &[String], nicknames: Arc<EquivalenceTable>) -> Self {
        let shapes: Vec<String> = if shapes.is_empty() {
            DEFAULT_SHAPES.iter().map(|s| s.to_string()).collect()
        } else {
            shapes.to_vec()
        };
        Self {
            shapes: shapes.into(),
            nicknames,
        }
    }

    pub fn construct(&self, query: &IdentityQuery) -> CandidateSequence {
        let (first, last) = query.first_and_last();
        let firsts = if first.is_empty() {
            Vec::new()
        } else {
            self.nicknames.class_of(&first)
        };
        CandidateSequence {
            shapes: Arc::clone(&self.shapes),
            firsts,
            last,
            variant: 0,
            shape: 0,
            seen: HashSet::new(),
        }
    }
}

impl Default for UrlConstructor {
    fn default() -> Self {
        Self::new(&[], Arc::new(EquivalenceTable::default_seed()))
    }
}

/// Lazy candidate sequence produced by [`UrlConstructor::construct`].
#[derive(Debug)]
pub struct CandidateSequence {
    shapes: Arc<[String]>,
    firsts: Vec<String>,
    last: Option<String>,
    variant: usize,
    shape: usize,
    seen: HashSet<String>,
}

impl CandidateSequence {
    /// Next rendered (raw, sanitized) pair, advancing the cursor.
    fn step(&mut self) -> Option<(String, String)> {
        let first = self.firsts.get(self.variant)?.clone();

        let raw = match &self.last {
            Some(last) => {
                let shape = &self.shapes[self.shape];
                self.shape += 1;
                if self.shape >= self.shapes.len() {
                    self.shape = 0;
                    self.variant += 1;
                }
                render(shape, &first, last)
            }
            None => {
                self.variant += 1;
                first
            }
        };
        let slug = sanitize(&raw);
        Some((raw, slug))
    }
}

impl Iterator for CandidateSequence {
    type Item = CandidateIdentifier;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((raw, slug)) = self.step() {
            if slug.len() < 2 || !self.seen.insert(slug.clone()) {
                continue;
            }
            return Some(CandidateIdentifier::new(
                raw,
                slug,
                Origin::Constructed,
                Technique::Synthesized,
            ));
        }
        None
    }
}

fn render(shape: &str, first: &str, last: &str) -> String {
    let initial: String = first.chars().take(1).collect();
    shape
        .replace("{first0}", &initial)
        .replace("{first}", first)
        .replace("{last}", last)
}

/// Lower-case, keep `[a-z0-9._-]`, trim separators at the ends.
fn sanitize(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        .collect::<String>()
        .to_ascii_lowercase()
        .trim_matches(|c| matches!(c, '-' | '_' | '.'))
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slugs(name: &str) -> Vec<String> {
        let q = IdentityQuery::new(name, None).unwrap();
        UrlConstructor::default()
            .construct(&q)
            .map(|c| c.canonical)
            .collect()
    }

    #[test]
    fn shapes_in_order_for_plain_name() {
        assert_eq!(
            slugs("Jane Doe"),
            vec!["janedoe", "jane-doe", "jdoe", "jane.doe", "jane_doe", "doejane", "doe-jane"]
        );
    }

    #[test]
    fn nickname_variants_follow_original() {
        let got = slugs("David Ackley");
        assert_eq!(got[0], "davidackley");
        assert!(got.contains(&"dave-ackley".to_string()));
        // "dackley" comes from both variants but is yielded once.
        assert_eq!(got.iter().filter(|s| *s == "dackley").count(), 1);
        let first_dave = got.iter().position(|s| s.starts_with("dave")).unwrap();
        let last_david = got.iter().rposition(|s| s.contains("david")).unwrap();
        assert!(last_david < first_dave);
    }

    #[test]
    fn single_token_yields_variants_only() {
        assert_eq!(slugs("Dave"), vec!["dave", "david"]);
    }

    #[test]
    fn non_ascii_is_sanitized() {
        let got = slugs("José O'Neil");
        assert_eq!(got[0], "josoneil");
        assert!(got.iter().all(|s| s.chars().all(|c| c.is_ascii_alphanumeric() || "-_.".contains(c))));
    }

    #[test]
    fn sequence_is_finite_and_consumed_once() {
        let q = IdentityQuery::new("Jane Doe", None).unwrap();
        let mut seq = UrlConstructor::default().construct(&q);
        assert_eq!(seq.by_ref().count(), 7);
        assert!(seq.next().is_none());
    }

    #[test]
    fn probe_success_statuses() {
        for s in [200, 204, 301, 302, 303, 307, 308] {
            assert!(probe_succeeded(s), "{s}");
        }
        for s in [304, 404, 429, 500, 999] {
            assert!(!probe_succeeded(s), "{s}");
        }
    }
}
