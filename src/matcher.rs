// src/matcher.rs
//! Identity matcher: does a candidate plausibly denote the queried person?
//!
//! Ordered rules, first firing rule decides:
//! 1. exact normalized full name;
//! 2. token overlap (`min(2, query tokens)` query tokens longer than one char);
//! 3. first initial + surname;
//! 4. organization contradiction (the candidate is the organization itself) → reject;
//! 5. no match → reject.
//!
//! Candidates without a known name are matched on the identifier string, with every
//! query token expanded through its nickname class.

use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;

use crate::extract::CandidateIdentifier;
use crate::nicknames::EquivalenceTable;
use crate::query::IdentityQuery;
use crate::text::normalize_name;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchRule {
    ExactName,
    TokenOverlap,
    InitialAndSurname,
    OrganizationContradiction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonCode {
    ExactName,
    TokenOverlap,
    InitialAndSurname,
    OrganizationAccount,
    NoMatch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MatchVerdict {
    pub accepted: bool,
    pub reason: ReasonCode,
    /// Rule that fired; `None` when nothing did.
    pub rule: Option<MatchRule>,
}

impl MatchVerdict {
    fn accept(rule: MatchRule, reason: ReasonCode) -> Self {
        Self {
            accepted: true,
            reason,
            rule: Some(rule),
        }
    }

    fn organization_account() -> Self {
        Self {
            accepted: false,
            reason: ReasonCode::OrganizationAccount,
            rule: Some(MatchRule::OrganizationContradiction),
        }
    }

    fn no_match() -> Self {
        Self {
            accepted: false,
            reason: ReasonCode::NoMatch,
            rule: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Matcher {
    nicknames: Arc<EquivalenceTable>,
}

impl Matcher {
    pub fn new(nicknames: Arc<EquivalenceTable>) -> Self {
        Self { nicknames }
    }

    pub fn matches(&self, candidate: &CandidateIdentifier, query: &IdentityQuery) -> MatchVerdict {
        let q_tokens = query.name_tokens();
        let needed = q_tokens.len().min(2);
        let long_tokens: Vec<&str> = q_tokens
            .iter()
            .map(String::as_str)
            .filter(|t| t.chars().count() > 1)
            .collect();

        let cand_org = candidate
            .organization
            .as_deref()
            .map(normalize_name)
            .unwrap_or_default();

        match candidate.known_name() {
            Some(known) => {
                let known = normalize_name(known);
                if known == query.normalized_name() {
                    return MatchVerdict::accept(MatchRule::ExactName, ReasonCode::ExactName);
                }

                // Only a name that spells out the whole organization carries brand words;
                // a surname shared with the company ("Dell") is still personal.
                let known_words = name_words(&known);
                let org_words = name_words(&cand_org);
                let brand: HashSet<&str> = if contains_phrase(&known_words, &org_words) {
                    org_words.iter().map(String::as_str).collect()
                } else {
                    HashSet::new()
                };
                let personal: Vec<String> = known_words
                    .iter()
                    .filter(|w| !brand.contains(w.as_str()))
                    .cloned()
                    .collect();

                let overlap = long_tokens
                    .iter()
                    .filter(|t| personal.iter().any(|p| p == *t))
                    .count();
                if needed > 0 && overlap >= needed {
                    return MatchVerdict::accept(MatchRule::TokenOverlap, ReasonCode::TokenOverlap);
                }

                let personal_name = personal.join(" ");
                if initial_and_surname(&q_tokens, |needle| personal_name.contains(needle)) {
                    return MatchVerdict::accept(
                        MatchRule::InitialAndSurname,
                        ReasonCode::InitialAndSurname,
                    );
                }
            }
            None => {
                let ident = candidate.canonical.to_lowercase();
                let overlap = long_tokens
                    .iter()
                    .filter(|t| {
                        self.nicknames
                            .class_of(t)
                            .iter()
                            .any(|variant| ident.contains(variant.as_str()))
                    })
                    .count();
                if needed > 0 && overlap >= needed {
                    return MatchVerdict::accept(MatchRule::TokenOverlap, ReasonCode::TokenOverlap);
                }

                let first_variants: Vec<String> = q_tokens
                    .first()
                    .map(|f| self.nicknames.class_of(f))
                    .unwrap_or_default();
                let hit = |needle: &str| ident.contains(needle);
                let initial_hit = first_variants
                    .iter()
                    .filter_map(|v| v.chars().next())
                    .any(|c| ident.contains(c));
                let surname_hit = q_tokens.last().is_some_and(|s| hit(s.as_str()));
                if q_tokens.len() >= 2 && initial_hit && surname_hit {
                    return MatchVerdict::accept(
                        MatchRule::InitialAndSurname,
                        ReasonCode::InitialAndSurname,
                    );
                }
            }
        }

        let q_org = query.normalized_organization();
        if !q_org.is_empty() {
            let cand_org_text = if cand_org.is_empty() {
                candidate.known_name().map(normalize_name).unwrap_or_default()
            } else {
                cand_org
            };
            if !cand_org_text.is_empty()
                && (cand_org_text.contains(&q_org) || q_org.contains(&cand_org_text))
            {
                return MatchVerdict::organization_account();
            }
        }

        MatchVerdict::no_match()
    }
}

impl Default for Matcher {
    fn default() -> Self {
        Self::new(Arc::new(EquivalenceTable::default_seed()))
    }
}

/// Tokens with surrounding punctuation removed ("doe," -> "doe").
fn name_words(normalized: &str) -> Vec<String> {
    normalized
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_string())
        .filter(|w| !w.is_empty())
        .collect()
}

/// `phrase` occurs in `words` as a contiguous run. An empty phrase never does.
fn contains_phrase(words: &[String], phrase: &[String]) -> bool {
    !phrase.is_empty() && words.windows(phrase.len()).any(|w| w == phrase)
}

fn initial_and_surname(q_tokens: &[String], contains: impl Fn(&str) -> bool) -> bool {
    if q_tokens.len() < 2 {
        return false;
    }
    let (Some(first), Some(last)) = (q_tokens.first(), q_tokens.last()) else {
        return false;
    };
    let Some(initial) = first.chars().next() else {
        return false;
    };
    let mut buf = [0u8; 4];
    contains(initial.encode_utf8(&mut buf)) && contains(last.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{Origin, Technique};

    fn named(canonical: &str, name: &str, org: Option<&str>) -> CandidateIdentifier {
        CandidateIdentifier::new(canonical, canonical, Origin::PrimarySearch, Technique::Link)
            .with_hint(Some(name.to_string()), org.map(str::to_string))
    }

    fn bare(canonical: &str) -> CandidateIdentifier {
        CandidateIdentifier::new(canonical, canonical, Origin::PrimarySearch, Technique::Text)
    }

    fn q(name: &str, org: Option<&str>) -> IdentityQuery {
        IdentityQuery::new(name, org).unwrap()
    }

    #[test]
    fn exact_name_fires_first() {
        let m = Matcher::default();
        let v = m.matches(&named("x", "  JANE  doe", Some("Acme")), &q("Jane Doe", Some("Acme")));
        assert!(v.accepted);
        assert_eq!(v.rule, Some(MatchRule::ExactName));
    }

    #[test]
    fn token_overlap_needs_two_tokens() {
        let m = Matcher::default();
        let v = m.matches(&named("x", "Dr. Jane A. Doe,", None), &q("Jane Doe", None));
        assert_eq!(v.reason, ReasonCode::TokenOverlap);

        let v = m.matches(&named("x", "Jane Smith", None), &q("Jane Doe", None));
        assert!(!v.accepted);
        assert_eq!(v.reason, ReasonCode::NoMatch);
    }

    #[test]
    fn single_token_query_needs_one() {
        let m = Matcher::default();
        let v = m.matches(&named("x", "Madonna Louise", None), &q("Madonna", None));
        assert_eq!(v.reason, ReasonCode::TokenOverlap);
    }

    #[test]
    fn initial_and_surname_on_known_name() {
        let m = Matcher::default();
        let v = m.matches(&named("x", "J. Doe", None), &q("John Doe", None));
        assert_eq!(v.reason, ReasonCode::InitialAndSurname);
    }

    #[test]
    fn organization_account_is_rejected() {
        let m = Matcher::default();
        let v = m.matches(
            &named("acmecorp", "Acme Corp Official", Some("Acme Corp")),
            &q("Acme Corp", Some("Acme Corp")),
        );
        assert!(!v.accepted);
        assert_eq!(v.reason, ReasonCode::OrganizationAccount);
        assert_eq!(v.rule, Some(MatchRule::OrganizationContradiction));
    }

    #[test]
    fn identifier_only_uses_nickname_classes() {
        let m = Matcher::default();
        let v = m.matches(&bare("dave-ackley-42"), &q("David Ackley", None));
        assert_eq!(v.reason, ReasonCode::TokenOverlap);

        let v = m.matches(&bare("jdoe"), &q("John Doe", None));
        assert_eq!(v.reason, ReasonCode::InitialAndSurname);

        let v = m.matches(&bare("someoneelse"), &q("John Doe", None));
        assert!(!v.accepted);
    }
}
