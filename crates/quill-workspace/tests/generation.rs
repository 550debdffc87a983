mod common;

use std::time::Duration;

use serde_json::json;
use tokio::time::Instant;

use common::{FakeBackend, user};
use quill_session::{Route, Session, SessionStore, WorkspaceView};
use quill_types::models::{GeneratedContent, Platform};
use quill_workspace::detail::{CampaignLookup, lookup_campaign};
use quill_workspace::generation::{DEMO_DELAY, GenerationError, GenerationWorkflow, credit_warning};

fn backend_with_content() -> FakeBackend {
    let backend = FakeBackend::new(user("ana@acme.io", true));
    backend.with_state(|s| {
        s.generated = GeneratedContent {
            twitter: Some(json!([{ "text": "Bottles, reimagined.", "image_url": "https://cdn/b.png" }])),
            instagram: Some(json!({ "caption": "Refill, repeat." })),
            email: Some(json!({ "subject": "Launch", "body": "It's here." })),
            ..GeneratedContent::default()
        };
    });
    backend
}

#[tokio::test]
async fn generated_content_is_normalized() {
    let backend = backend_with_content();
    let mut workflow = GenerationWorkflow::new(true);
    workflow.set_prompt("eco bottle");

    let preview = workflow.generate(&backend).await.unwrap();
    assert!(!preview.is_demo());
    assert_eq!(preview.bundle().twitter, "Bottles, reimagined.");
    assert_eq!(preview.bundle().instagram, "Refill, repeat.");
    assert_eq!(preview.bundle().email, "SUBJECT: Launch\n\nIt's here.");
    assert_eq!(preview.bundle().blog, "No content generated");
    assert_eq!(preview.image_url(), "https://cdn/b.png");
}

#[tokio::test(start_paused = true)]
async fn failure_shows_demo_after_delay() {
    let backend = backend_with_content();
    backend.fail("generate");
    let mut workflow = GenerationWorkflow::new(true);
    workflow.set_prompt("eco bottle");

    let started = Instant::now();
    let err = workflow.generate(&backend).await.unwrap_err();
    assert!(matches!(err, GenerationError::Client(_)));
    assert!(started.elapsed() >= DEMO_DELAY);

    let preview = workflow.preview().unwrap();
    assert!(preview.is_demo());
    assert!(preview.image_url().starts_with("https://loremflickr.com/1080/1080/eco"));

    let err = workflow.save(&backend, &[Platform::Twitter]).await.unwrap_err();
    assert!(matches!(err, GenerationError::DemoNotSavable));
    assert!(backend.with_state(|s| s.campaigns.is_empty()));
}

#[tokio::test(start_paused = true)]
async fn failure_without_demo_returns_at_once() {
    let backend = backend_with_content();
    backend.fail("generate");
    let mut workflow = GenerationWorkflow::new(false).with_demo_delay(Duration::from_secs(5));
    workflow.set_prompt("eco bottle");

    let started = Instant::now();
    assert!(workflow.generate(&backend).await.is_err());
    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(workflow.preview().is_none());
}

#[tokio::test]
async fn saved_campaign_can_be_looked_up() {
    let backend = backend_with_content();
    let mut workflow = GenerationWorkflow::new(true);
    workflow.set_prompt("  eco bottle ");
    let shown = workflow.generate(&backend).await.unwrap().bundle().clone();

    let saved = workflow
        .save(&backend, &[Platform::Instagram])
        .await
        .unwrap();
    assert_eq!(saved.prompt, "eco bottle");

    match lookup_campaign(&backend, &saved.id).await {
        CampaignLookup::Found(view) => {
            assert_eq!(view.campaign.platforms, vec![Platform::Instagram]);
            assert_eq!(view.bundle, shown);
            assert_eq!(view.bundle.linkedin, "No content generated");
            assert_eq!(view.bundle.email, "SUBJECT: Launch\n\nIt's here.");
            assert_eq!(view.campaign.image_url.as_deref(), Some("https://cdn/b.png"));
        }
        other => panic!("expected campaign, got {:?}", other),
    }
}

#[tokio::test]
async fn lookup_falls_back_to_history() {
    let backend = backend_with_content();
    backend.with_state(|s| {
        s.serve_by_id = false;
        s.campaigns.push(common::campaign("c9", "autumn sale"));
    });

    let CampaignLookup::Found(view) = lookup_campaign(&backend, "c9").await else {
        panic!("history fallback missed c9");
    };
    assert_eq!(view.campaign.display_title(), "autumn sale");

    assert_eq!(
        lookup_campaign(&backend, "nope").await,
        CampaignLookup::NotFound {
            back: Route::Workspace(WorkspaceView::Campaigns)
        }
    );
}

#[tokio::test]
async fn network_failure_reads_as_not_found() {
    let backend = backend_with_content();
    backend.fail("campaign");
    assert!(matches!(
        lookup_campaign(&backend, "c1").await,
        CampaignLookup::NotFound { .. }
    ));
}

#[tokio::test]
async fn empty_credits_only_warn() {
    let backend = backend_with_content();
    let store = SessionStore::in_memory().unwrap();
    let mut account = user("ana@acme.io", true);
    account.credits_used = 50;
    store.replace_user(&account).unwrap();

    assert!(credit_warning(&store).is_some());

    let mut workflow = GenerationWorkflow::new(false);
    workflow.set_prompt("eco bottle");
    assert!(workflow.generate(&backend).await.is_ok());
}
