// src/profile_url.rs
//! Pure validation of a caller-supplied profile URL. No network.

use url::Url;

use crate::config::ProfileConfig;
use crate::error::ResolveError;
use crate::extract::{canonicalize_with_marker, CandidateIdentifier, Origin, Technique};

/// Accept `http(s)` URLs whose host contains the profile host and whose path carries
/// the profile marker. Returns the trimmed input.
pub fn resolve_from_url(raw: &str) -> Result<String, ResolveError> {
    resolve_from_url_with(raw, &ProfileConfig::default())
}

pub fn resolve_from_url_with(raw: &str, profile: &ProfileConfig) -> Result<String, ResolveError> {
    let trimmed = raw.trim();
    let invalid = || ResolveError::InvalidProfileUrl {
        url: trimmed.to_string(),
    };

    let parsed = Url::parse(trimmed).map_err(|_| invalid())?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(invalid());
    }
    let host = parsed.host_str().unwrap_or_default().to_ascii_lowercase();
    if !host.contains(&profile.host) {
        return Err(invalid());
    }
    if !parsed.path().to_ascii_lowercase().contains(&profile.marker) {
        return Err(invalid());
    }
    Ok(trimmed.to_string())
}

/// Candidate for a validated profile URL, when its identifier segment is usable.
pub fn candidate_from_url(raw: &str, profile: &ProfileConfig) -> Result<CandidateIdentifier, ResolveError> {
    let url = resolve_from_url_with(raw, profile)?;
    let canonical = canonicalize_with_marker(&url, &profile.marker)
        .ok_or_else(|| ResolveError::InvalidProfileUrl { url: url.clone() })?;
    Ok(CandidateIdentifier::new(url, canonical, Origin::DirectUrl, Technique::Lookup))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_profile_urls() {
        for ok in [
            "https://www.linkedin.com/in/jdoe/",
            "  http://uk.linkedin.com/in/Jane-Doe?trk=x ",
            "https://linkedin.com/in/jdoe",
        ] {
            assert_eq!(resolve_from_url(ok).unwrap(), ok.trim());
        }
    }

    #[test]
    fn rejects_everything_else() {
        for bad in [
            "",
            "not a url",
            "ftp://www.linkedin.com/in/jdoe",
            "https://example.com/in/jdoe",
            "https://www.linkedin.com/company/acme",
        ] {
            assert!(
                matches!(resolve_from_url(bad), Err(ResolveError::InvalidProfileUrl { .. })),
                "{bad}"
            );
        }
    }

    #[test]
    fn candidate_carries_canonical_identifier() {
        let c = candidate_from_url("https://www.linkedin.com/in/Jane-Doe/", &ProfileConfig::default()).unwrap();
        assert_eq!(c.canonical, "jane-doe");
        assert_eq!(c.origin, Origin::DirectUrl);
        assert!(candidate_from_url("https://www.linkedin.com/in/", &ProfileConfig::default()).is_err());
    }

    #[test]
    fn candidate_follows_configured_profile_host() {
        let profile = ProfileConfig {
            host: "people.example.org".into(),
            marker: "/p/".into(),
            base_url: "https://people.example.org/p/".into(),
        };
        let c = candidate_from_url(" https://eu.people.example.org/p/Jane_Doe?ref=x ", &profile).unwrap();
        assert_eq!(c.raw, "https://eu.people.example.org/p/Jane_Doe?ref=x");
        assert_eq!(c.canonical, "jane_doe");
        assert_eq!(c.technique, Technique::Lookup);
        assert!(candidate_from_url("https://www.linkedin.com/in/jane-doe", &profile).is_err());
    }
}
