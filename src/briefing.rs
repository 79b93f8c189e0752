//! Meeting briefing: client abstraction, normalization of generated output, and the
//! deterministic fallback used whenever generation is unavailable.

use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::extract::CandidateIdentifier;
use crate::news::ScoredNewsItem;
use crate::text::anon_hash;

/// Confidence of the templated fallback. Generated briefings always score above it.
pub const FALLBACK_CONFIDENCE: u8 = 40;
const DEFAULT_GENERATED_CONFIDENCE: i64 = 75;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Briefing {
    pub executive_summary: String,
    pub key_insights: Vec<String>,
    pub conversation_starters: Vec<String>,
    pub recent_activity: String,
    pub meeting_preparation: Vec<String>,
    pub strategic_notes: Vec<String>,
    pub confidence_score: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileSummary {
    pub name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub location: Option<String>,
    /// Number of previous roles listed on the profile.
    #[serde(default)]
    pub experience_count: usize,
}

impl ProfileSummary {
    /// Summary for the queried person. Title and company come from the resolved
    /// candidate's search result when it carried them; the queried organization fills in
    /// otherwise.
    pub fn for_candidate(
        name: &str,
        organization: &str,
        candidate: Option<&CandidateIdentifier>,
    ) -> Self {
        let clean = |v: Option<&String>| {
            v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
        };
        Self {
            name: name.trim().to_string(),
            title: clean(candidate.and_then(|c| c.title.as_ref())).unwrap_or_default(),
            company: clean(candidate.and_then(|c| c.organization.as_ref()))
                .unwrap_or_else(|| organization.trim().to_string()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BriefingInput {
    pub profile: ProfileSummary,
    pub news: Vec<ScoredNewsItem>,
    pub meeting_context: String,
}

/// Remote briefing generator. `None` means "no usable briefing".
pub trait BriefingClient: Send + Sync {
    fn compose<'a>(
        &'a self,
        input: &'a BriefingInput,
    ) -> Pin<Box<dyn Future<Output = Option<Briefing>> + Send + 'a>>;
    fn provider_name(&self) -> &'static str;
}

/// Always declines; callers get the fallback.
pub struct DisabledClient;

impl BriefingClient for DisabledClient {
    fn compose<'a>(
        &'a self,
        _input: &'a BriefingInput,
    ) -> Pin<Box<dyn Future<Output = Option<Briefing>> + Send + 'a>> {
        Box::pin(async { None })
    }

    fn provider_name(&self) -> &'static str {
        "disabled"
    }
}

/// Returns a fixed briefing.
pub struct MockBriefing {
    pub fixed: Briefing,
}

impl BriefingClient for MockBriefing {
    fn compose<'a>(
        &'a self,
        _input: &'a BriefingInput,
    ) -> Pin<Box<dyn Future<Output = Option<Briefing>> + Send + 'a>> {
        let out = self.fixed.clone();
        Box::pin(async move { Some(out) })
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// Ask the client, fall back to the template on `None`. Generated confidence is clamped
/// into `FALLBACK_CONFIDENCE + 1 ..= 100`.
pub async fn compose_briefing(client: &dyn BriefingClient, input: &BriefingInput) -> Briefing {
    let who = anon_hash(&input.profile.name);
    match client.compose(input).await {
        Some(mut b) => {
            b.confidence_score = b.confidence_score.clamp(FALLBACK_CONFIDENCE + 1, 100);
            info!(target: "briefing", provider = client.provider_name(), profile = %who, confidence = b.confidence_score, "generated briefing");
            b
        }
        None => {
            info!(target: "briefing", provider = client.provider_name(), profile = %who, "using fallback briefing");
            fallback_briefing(input)
        }
    }
}

/// Coerce loosely-typed generator output (a JSON object) into a [`Briefing`].
/// Lists accept a single string; empty entries are dropped; a missing confidence
/// counts as 75.
pub fn briefing_from_json(value: &serde_json::Value) -> Option<Briefing> {
    let obj = value.as_object()?;
    let text = |k: &str| match obj.get(k) {
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(serde_json::Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    };
    let list = |k: &str| -> Vec<String> {
        match obj.get(k) {
            Some(serde_json::Value::Array(items)) => items
                .iter()
                .filter_map(|v| match v {
                    serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
                    serde_json::Value::String(_) | serde_json::Value::Null => None,
                    other => Some(other.to_string()),
                })
                .collect(),
            Some(serde_json::Value::String(s)) if !s.is_empty() => vec![s.clone()],
            _ => Vec::new(),
        }
    };
    let confidence = obj
        .get("confidence_score")
        .and_then(|v| v.as_i64().or_else(|| v.as_str().and_then(|s| s.trim().parse().ok())))
        .unwrap_or(DEFAULT_GENERATED_CONFIDENCE)
        .clamp(0, 100) as u8;

    Some(Briefing {
        executive_summary: text("executive_summary"),
        key_insights: list("key_insights"),
        conversation_starters: list("conversation_starters"),
        recent_activity: text("recent_activity"),
        meeting_preparation: list("meeting_preparation"),
        strategic_notes: list("strategic_notes"),
        confidence_score: confidence,
    })
}

/// Deterministic template built only from the profile summary and ranked news.
pub fn fallback_briefing(input: &BriefingInput) -> Briefing {
    let p = &input.profile;
    let or_unknown = |s: &str| {
        let t = s.trim();
        if t.is_empty() {
            "Unknown".to_string()
        } else {
            t.to_string()
        }
    };
    let name = or_unknown(&p.name);
    let title = p.title.trim();
    let company = p.company.trim();

    let mut executive_summary = format!("{} is {} at {}.", name, or_unknown(title), or_unknown(company));
    if let Some(loc) = p.location.as_deref().map(str::trim).filter(|l| !l.is_empty()) {
        executive_summary.push_str(&format!(" Based in {loc}."));
    }

    let mut key_insights = Vec::new();
    if !title.is_empty() {
        key_insights.push(format!("Currently serving as {title}"));
    }
    if !company.is_empty() {
        key_insights.push(format!("Working at {company}"));
    }
    if p.experience_count > 0 {
        key_insights.push(format!("Has {} previous roles listed", p.experience_count));
    }
    key_insights.truncate(3);

    let conversation_starters = vec![
        if title.is_empty() {
            "Tell me about your current role".to_string()
        } else {
            format!("Tell me about your role as {title}")
        },
        if company.is_empty() {
            "How is your company doing?".to_string()
        } else {
            format!("How is {company} adapting to current market conditions?")
        },
        "What are your biggest priorities this quarter?".to_string(),
    ];

    let recent_activity = match input.news.first() {
        None => "Recent news analysis not available.".to_string(),
        Some(first) => {
            let mut s = format!("Found {} recent news mentions. ", input.news.len());
            if !first.item.title.is_empty() {
                s.push_str(&format!("Latest: '{}'", first.item.title));
            }
            s.trim_end().to_string()
        }
    };

    let meeting_preparation = vec![
        if company.is_empty() {
            "Research their company".to_string()
        } else {
            format!("Research {company} current initiatives")
        },
        "Prepare questions about their industry challenges".to_string(),
        "Review recent market trends in their sector".to_string(),
    ];

    Briefing {
        executive_summary,
        key_insights,
        conversation_starters,
        recent_activity,
        meeting_preparation,
        strategic_notes: vec![
            "AI analysis not available - this is a basic profile summary".to_string(),
            "Consider researching additional background before meeting".to_string(),
        ],
        confidence_score: FALLBACK_CONFIDENCE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_coercion_handles_loose_types() {
        let b = briefing_from_json(&json!({
            "executive_summary": "Summary",
            "key_insights": ["a", "", null, 3],
            "conversation_starters": "only one",
            "strategic_notes": 12,
            "confidence_score": "88"
        }))
        .unwrap();
        assert_eq!(b.key_insights, vec!["a".to_string(), "3".to_string()]);
        assert_eq!(b.conversation_starters, vec!["only one".to_string()]);
        assert!(b.strategic_notes.is_empty());
        assert_eq!(b.recent_activity, "");
        assert_eq!(b.confidence_score, 88);

        let d = briefing_from_json(&json!({})).unwrap();
        assert_eq!(d.confidence_score, 75);
        assert!(briefing_from_json(&json!([1, 2])).is_none());
    }

    #[test]
    fn fallback_without_profile_data() {
        let b = fallback_briefing(&BriefingInput::default());
        assert_eq!(b.executive_summary, "Unknown is Unknown at Unknown.");
        assert!(b.key_insights.is_empty());
        assert_eq!(b.conversation_starters[0], "Tell me about your current role");
        assert_eq!(b.recent_activity, "Recent news analysis not available.");
        assert_eq!(b.confidence_score, FALLBACK_CONFIDENCE);
    }
}
