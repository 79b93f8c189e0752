// src/query.rs
use serde::{Deserialize, Serialize};

use crate::error::ResolveError;
use crate::text::{normalize_name, tokens};

/// Who we are looking for. Immutable once built; use [`IdentityQuery::new`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityQuery {
    full_name: String,
    organization: Option<String>,
}

impl IdentityQuery {
    /// Build a query. Names must carry at least one alphabetic character and be
    /// two or more characters long once trimmed; empty organizations become `None`.
    pub fn new(full_name: &str, organization: Option<&str>) -> Result<Self, ResolveError> {
        let name = full_name.split_whitespace().collect::<Vec<_>>().join(" ");
        if name.is_empty() {
            return Err(ResolveError::invalid_query("name is empty"));
        }
        if name.chars().count() < 2 {
            return Err(ResolveError::invalid_query("name is shorter than 2 characters"));
        }
        if !name.chars().any(char::is_alphabetic) {
            return Err(ResolveError::invalid_query("name has no letters"));
        }

        let organization = organization
            .map(|o| o.split_whitespace().collect::<Vec<_>>().join(" "))
            .filter(|o| !o.is_empty());

        Ok(Self {
            full_name: name,
            organization,
        })
    }

    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    pub fn organization(&self) -> Option<&str> {
        self.organization.as_deref()
    }

    pub fn normalized_name(&self) -> String {
        normalize_name(&self.full_name)
    }

    /// Normalized organization, `""` when none was supplied.
    pub fn normalized_organization(&self) -> String {
        self.organization
            .as_deref()
            .map(normalize_name)
            .unwrap_or_default()
    }

    /// Lower-cased name tokens in order.
    pub fn name_tokens(&self) -> Vec<String> {
        let n = self.normalized_name();
        tokens(&n).into_iter().map(str::to_string).collect()
    }

    /// `(first, last)` tokens; `last` is `None` for single-token names.
    pub fn first_and_last(&self) -> (String, Option<String>) {
        let toks = self.name_tokens();
        let first = toks.first().cloned().unwrap_or_default();
        let last = if toks.len() > 1 { toks.last().cloned() } else { None };
        (first, last)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_and_collapses() {
        let q = IdentityQuery::new("  Satya   Nadella ", Some("  Microsoft ")).unwrap();
        assert_eq!(q.full_name(), "Satya Nadella");
        assert_eq!(q.organization(), Some("Microsoft"));
        assert_eq!(q.normalized_name(), "satya nadella");
        assert_eq!(q.normalized_organization(), "microsoft");
    }

    #[test]
    fn blank_organization_is_none() {
        let q = IdentityQuery::new("Jane Doe", Some("   ")).unwrap();
        assert_eq!(q.organization(), None);
        assert_eq!(q.normalized_organization(), "");
    }

    #[test]
    fn rejects_malformed_names() {
        for bad in ["", "   ", "x", "12 34", "--"] {
            let err = IdentityQuery::new(bad, None).unwrap_err();
            assert!(matches!(err, ResolveError::InvalidQuery { .. }), "{bad:?}");
        }
    }

    #[test]
    fn first_and_last_tokens() {
        let q = IdentityQuery::new("Mary Jane Watson", None).unwrap();
        assert_eq!(q.first_and_last(), ("mary".into(), Some("watson".into())));
        let single = IdentityQuery::new("Madonna", None).unwrap();
        assert_eq!(single.first_and_last(), ("madonna".into(), None));
    }
}
