// tests/briefing_fallback.rs
// Briefing composition: fallback template and confidence handling of generated output.

use profile_resolver::briefing::{
    compose_briefing, fallback_briefing, Briefing, BriefingInput, DisabledClient, MockBriefing,
    ProfileSummary, FALLBACK_CONFIDENCE,
};
use profile_resolver::news::NewsItem;
use profile_resolver::{CandidateIdentifier, Origin, ScoredNewsItem, Technique};

fn input() -> BriefingInput {
    BriefingInput {
        profile: ProfileSummary {
            name: "Jane Doe".into(),
            title: "Chief Technology Officer".into(),
            company: "Initech".into(),
            location: Some("Austin, TX".into()),
            experience_count: 4,
        },
        news: vec![
            ScoredNewsItem {
                item: NewsItem {
                    title: "Initech appoints Jane Doe as CTO".into(),
                    url: "https://news.example/1".into(),
                    ..Default::default()
                },
                relevance_score: 62,
            },
            ScoredNewsItem {
                item: NewsItem {
                    title: "Initech results".into(),
                    url: "https://news.example/2".into(),
                    ..Default::default()
                },
                relevance_score: 30,
            },
        ],
        meeting_context: "Partnership intro".into(),
    }
}

#[test]
fn fallback_uses_profile_and_news() {
    let b = fallback_briefing(&input());
    assert_eq!(
        b.executive_summary,
        "Jane Doe is Chief Technology Officer at Initech. Based in Austin, TX."
    );
    assert_eq!(
        b.key_insights,
        vec![
            "Currently serving as Chief Technology Officer".to_string(),
            "Working at Initech".to_string(),
            "Has 4 previous roles listed".to_string(),
        ]
    );
    assert_eq!(
        b.conversation_starters[1],
        "How is Initech adapting to current market conditions?"
    );
    assert_eq!(
        b.recent_activity,
        "Found 2 recent news mentions. Latest: 'Initech appoints Jane Doe as CTO'"
    );
    assert_eq!(b.meeting_preparation[0], "Research Initech current initiatives");
    assert_eq!(b.strategic_notes.len(), 2);
    assert_eq!(b.confidence_score, FALLBACK_CONFIDENCE);
}

#[tokio::test]
async fn disabled_client_yields_fallback() {
    let i = input();
    let b = compose_briefing(&DisabledClient, &i).await;
    assert_eq!(b, fallback_briefing(&i));
}

#[tokio::test]
async fn generated_confidence_stays_above_fallback() {
    let low = MockBriefing {
        fixed: Briefing {
            executive_summary: "Generated".into(),
            confidence_score: 10,
            ..Default::default()
        },
    };
    let b = compose_briefing(&low, &input()).await;
    assert_eq!(b.executive_summary, "Generated");
    assert_eq!(b.confidence_score, FALLBACK_CONFIDENCE + 1);

    let high = MockBriefing {
        fixed: Briefing {
            confidence_score: 250,
            ..Default::default()
        },
    };
    assert_eq!(compose_briefing(&high, &input()).await.confidence_score, 100);
}

#[tokio::test]
async fn resolved_title_and_company_reach_the_fallback() {
    let candidate = CandidateIdentifier::new(
        "https://www.linkedin.com/in/jane-doe-42",
        "jane-doe-42",
        Origin::PrimarySearch,
        Technique::Link,
    )
    .with_hint(Some("Jane Doe".into()), Some("Acme Corp".into()))
    .with_title(Some("Chief Technology Officer".into()));

    let profile = ProfileSummary::for_candidate("Jane Doe", "Acme", Some(&candidate));
    assert_eq!(profile.title, "Chief Technology Officer");
    assert_eq!(profile.company, "Acme Corp");

    let input = BriefingInput {
        profile,
        ..Default::default()
    };
    let b = compose_briefing(&DisabledClient, &input).await;
    assert!(b
        .key_insights
        .contains(&"Currently serving as Chief Technology Officer".to_string()));
    assert!(b.executive_summary.starts_with("Jane Doe is Chief Technology Officer at Acme Corp."));

    // Without a resolved candidate the queried organization is used.
    let bare = ProfileSummary::for_candidate("Jane Doe", " Acme ", None);
    assert_eq!((bare.title.as_str(), bare.company.as_str()), ("", "Acme"));
}
