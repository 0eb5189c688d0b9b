mod common;

use std::sync::Arc;

use common::{ChatCall, FakeChat, FakeGenerator, bot_message, message, orchestrator};
use memebot::chat::ResultDelivery;
use memebot::core::models::{Destination, MentionEvent, PostContent};
use memebot::orchestrator::prompt::{EMPTY_PROMPT_TEXT, FAILURE_TEXT, GENERIC_CAPTION, PLACEHOLDER_TEXT};
use memebot::orchestrator::{CycleOutcome, OrchestratorSettings, PostingOutcome};
use memebot::registry::{DestinationRegistry, InMemoryRegistry};

fn mention_event(text: &str) -> MentionEvent {
    MentionEvent {
        owner_id: "T1".to_string(),
        channel_id: "C1".to_string(),
        author_id: "U9".to_string(),
        text: text.to_string(),
    }
}

#[tokio::test]
async fn test_cycle_posts_meme_tagging_the_source_author() {
    let chat = Arc::new(FakeChat::new(ResultDelivery::DeleteThenPost).with_history(
        "C1",
        vec![message("1", "U1", "gm", 0), message("2", "U2", "haha nice", 5)],
    ));
    let generator = Arc::new(FakeGenerator::ok());
    let orch = orchestrator(
        chat.clone(),
        generator.clone(),
        Arc::new(InMemoryRegistry::new()),
        OrchestratorSettings::default(),
    );

    let report = orch.run_cycle_for(&[Destination::new("T1", "C1")]).await;

    assert_eq!(report.posted(), 1);
    assert_eq!(
        report.destinations[0].outcome,
        CycleOutcome::Posted {
            source_message_id: Some("2".to_string()),
            result_url: "https://img.example/1.png".to_string(),
        }
    );
    assert!(generator.prompts.lock().unwrap()[0].contains("haha nice"));

    let posts = chat.posts();
    assert_eq!(posts.len(), 1);
    assert!(posts[0].1.text.starts_with("<@U2>"));
    assert_eq!(posts[0].1.image_url.as_deref(), Some("https://img.example/1.png"));
}

#[tokio::test]
async fn test_cycle_over_registry_uses_enrolled_destinations() {
    let chat = Arc::new(
        FakeChat::new(ResultDelivery::DeleteThenPost)
            .with_history("C1", vec![message("1", "U1", "first channel", 1)])
            .with_history("C2", vec![message("2", "U2", "second channel", 1)]),
    );
    let registry = Arc::new(InMemoryRegistry::new());
    let orch = orchestrator(
        chat.clone(),
        Arc::new(FakeGenerator::ok()),
        registry.clone(),
        OrchestratorSettings::default(),
    );

    assert!(orch.enroll("T1", "C1").await.unwrap());
    assert!(orch.enroll("T2", "C2").await.unwrap());
    assert!(!orch.enroll("T1", "C1").await.unwrap());

    let report = orch.run_cycle().await;
    assert_eq!(report.destinations.len(), 2);
    assert_eq!(report.posted(), 2);
    assert_eq!(registry.list_channels("T1").await.unwrap(), vec!["C1".to_string()]);
}

#[tokio::test]
async fn test_generation_error_skips_post_and_cycle_continues() {
    let chat = Arc::new(
        FakeChat::new(ResultDelivery::DeleteThenPost)
            .with_history("C1", vec![message("1", "U1", "boom goes the dynamite", 3)])
            .with_history("C2", vec![message("2", "U2", "this one is fine", 3)]),
    );
    let generator = Arc::new(FakeGenerator::failing_on("boom"));
    let orch = orchestrator(
        chat.clone(),
        generator.clone(),
        Arc::new(InMemoryRegistry::new()),
        OrchestratorSettings::default(),
    );

    let report = orch
        .run_cycle_for(&[Destination::new("T1", "C1"), Destination::new("T1", "C2")])
        .await;

    assert!(matches!(
        report.destinations[0].outcome,
        CycleOutcome::GenerationFailed(_)
    ));
    assert!(matches!(report.destinations[1].outcome, CycleOutcome::Posted { .. }));
    assert_eq!(report.failed(), 1);
    assert_eq!(generator.call_count(), 2);

    let posts = chat.posts();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].0, "C2");
}

#[tokio::test]
async fn test_generation_call_failure_is_isolated() {
    let chat = Arc::new(
        FakeChat::new(ResultDelivery::DeleteThenPost)
            .with_history("C1", vec![message("1", "U1", "boom", 3)]),
    );
    let orch = orchestrator(
        chat.clone(),
        Arc::new(FakeGenerator::erroring_on("boom")),
        Arc::new(InMemoryRegistry::new()),
        OrchestratorSettings::default(),
    );

    let report = orch.run_cycle_for(&[Destination::new("T1", "C1")]).await;
    assert!(matches!(
        &report.destinations[0].outcome,
        CycleOutcome::GenerationFailed(reason) if reason.contains("HTTP 500")
    ));
    assert!(chat.posts().is_empty());
}

#[tokio::test]
async fn test_fetch_failure_does_not_stop_other_destinations() {
    let chat = Arc::new(
        FakeChat::new(ResultDelivery::DeleteThenPost)
            .failing_fetch("C1")
            .with_history("C2", vec![message("2", "U2", "still here", 2)]),
    );
    let orch = orchestrator(
        chat.clone(),
        Arc::new(FakeGenerator::ok()),
        Arc::new(InMemoryRegistry::new()),
        OrchestratorSettings::default(),
    );

    let report = orch
        .run_cycle_for(&[Destination::new("T1", "C1"), Destination::new("T1", "C2")])
        .await;

    assert!(matches!(report.destinations[0].outcome, CycleOutcome::FetchFailed(_)));
    assert!(matches!(report.destinations[1].outcome, CycleOutcome::Posted { .. }));
}

#[tokio::test]
async fn test_no_candidate_skips_without_generation() {
    let chat = Arc::new(
        FakeChat::new(ResultDelivery::DeleteThenPost)
            .with_history("C1", vec![bot_message("1", "beep", 100)]),
    );
    let generator = Arc::new(FakeGenerator::ok());
    let orch = orchestrator(
        chat.clone(),
        generator.clone(),
        Arc::new(InMemoryRegistry::new()),
        OrchestratorSettings::default(),
    );

    let report = orch.run_cycle_for(&[Destination::new("T1", "C1")]).await;
    assert_eq!(report.destinations[0].outcome, CycleOutcome::NoCandidate);
    assert_eq!(report.skipped(), 1);
    assert_eq!(generator.call_count(), 0);
    assert!(chat.posts().is_empty());
}

#[tokio::test]
async fn test_generic_fallback_prompt_posts_without_author_tag() {
    let chat = Arc::new(FakeChat::new(ResultDelivery::DeleteThenPost));
    let generator = Arc::new(FakeGenerator::ok());
    let settings = OrchestratorSettings {
        generic_fallback_prompt: Some("a cat reviewing code".to_string()),
        ..OrchestratorSettings::default()
    };
    let orch = orchestrator(
        chat.clone(),
        generator.clone(),
        Arc::new(InMemoryRegistry::new()),
        settings,
    );

    let report = orch.run_cycle_for(&[Destination::new("T1", "C1")]).await;
    assert!(matches!(
        report.destinations[0].outcome,
        CycleOutcome::Posted {
            source_message_id: None,
            ..
        }
    ));
    assert_eq!(generator.prompts.lock().unwrap()[0], "a cat reviewing code");
    assert_eq!(chat.posts()[0].1.text, GENERIC_CAPTION);
}

#[tokio::test]
async fn test_in_flight_destination_is_skipped() {
    let chat = Arc::new(
        FakeChat::new(ResultDelivery::DeleteThenPost)
            .with_history("C1", vec![message("1", "U1", "hello", 1)]),
    );
    let orch = orchestrator(
        chat.clone(),
        Arc::new(FakeGenerator::ok()),
        Arc::new(InMemoryRegistry::new()),
        OrchestratorSettings::default(),
    );
    let destination = Destination::new("T1", "C1");

    let guard = orch.in_flight().try_acquire(&destination.key()).unwrap();
    let report = orch.run_cycle_for(std::slice::from_ref(&destination)).await;
    assert_eq!(report.destinations[0].outcome, CycleOutcome::InFlight);
    assert!(chat.calls().is_empty());

    drop(guard);
    let report = orch.run_cycle_for(&[destination]).await;
    assert!(matches!(report.destinations[0].outcome, CycleOutcome::Posted { .. }));
    assert!(!orch.in_flight().is_active("T1/C1"));
}

#[tokio::test]
async fn test_empty_mention_is_rejected_without_generation() {
    let chat = Arc::new(FakeChat::new(ResultDelivery::DeleteThenPost));
    let generator = Arc::new(FakeGenerator::ok());
    let orch = orchestrator(
        chat.clone(),
        generator.clone(),
        Arc::new(InMemoryRegistry::new()),
        OrchestratorSettings::default(),
    );

    let prompt = memebot::chat::extract_prompt("<@UBOT>   ");
    let outcome = orch
        .handle_mention(&Destination::new("T1", "C1"), &mention_event("<@UBOT>"), &prompt)
        .await;

    assert_eq!(outcome, PostingOutcome::Rejected);
    assert_eq!(generator.call_count(), 0);
    assert_eq!(
        chat.posts(),
        vec![("C1".to_string(), PostContent::text(EMPTY_PROMPT_TEXT))]
    );
}

#[tokio::test]
async fn test_mention_deletes_placeholder_then_posts() {
    let chat = Arc::new(FakeChat::new(ResultDelivery::DeleteThenPost));
    let orch = orchestrator(
        chat.clone(),
        Arc::new(FakeGenerator::ok()),
        Arc::new(InMemoryRegistry::new()),
        OrchestratorSettings::default(),
    );

    let outcome = orch
        .handle_mention(&Destination::new("T1", "C1"), &mention_event("<@UBOT> cats"), "cats")
        .await;

    assert_eq!(
        outcome,
        PostingOutcome::Posted {
            result_url: "https://img.example/1.png".to_string()
        }
    );
    let calls = chat.calls();
    assert_eq!(calls.len(), 3);
    assert!(matches!(&calls[0], ChatCall::Post(_, c) if c.text == PLACEHOLDER_TEXT));
    assert!(matches!(&calls[1], ChatCall::Delete(_, r) if r.message_id == "m1"));
    assert!(matches!(
        &calls[2],
        ChatCall::Post(_, c) if c.image_url.as_deref() == Some("https://img.example/1.png")
            && c.text.starts_with("<@U9>")
    ));
}

#[tokio::test]
async fn test_mention_edits_placeholder_in_place() {
    let chat = Arc::new(FakeChat::new(ResultDelivery::EditInPlace));
    let orch = orchestrator(
        chat.clone(),
        Arc::new(FakeGenerator::ok()),
        Arc::new(InMemoryRegistry::new()),
        OrchestratorSettings::default(),
    );

    let outcome = orch
        .handle_mention(&Destination::new("G1", "C1"), &mention_event("dogs"), "dogs")
        .await;

    assert!(matches!(outcome, PostingOutcome::Posted { .. }));
    let calls = chat.calls();
    assert_eq!(calls.len(), 2);
    assert!(matches!(
        &calls[1],
        ChatCall::Update(_, r, c) if r.message_id == "m1" && c.image_url.is_some()
    ));
}

#[tokio::test]
async fn test_mention_generation_failure_updates_placeholder() {
    let chat = Arc::new(FakeChat::new(ResultDelivery::DeleteThenPost));
    let orch = orchestrator(
        chat.clone(),
        Arc::new(FakeGenerator::failing_on("boom")),
        Arc::new(InMemoryRegistry::new()),
        OrchestratorSettings::default(),
    );

    let outcome = orch
        .handle_mention(&Destination::new("T1", "C1"), &mention_event("boom"), "boom")
        .await;

    assert!(matches!(outcome, PostingOutcome::Failed(_)));
    let calls = chat.calls();
    assert_eq!(calls.len(), 2);
    assert!(matches!(&calls[1], ChatCall::Update(_, _, c) if c.text == FAILURE_TEXT));
}

#[tokio::test]
async fn test_undeletable_placeholder_is_updated_with_failure() {
    let chat = Arc::new(FakeChat::new(ResultDelivery::DeleteThenPost).failing_delete());
    let orch = orchestrator(
        chat.clone(),
        Arc::new(FakeGenerator::ok()),
        Arc::new(InMemoryRegistry::new()),
        OrchestratorSettings::default(),
    );

    let outcome = orch
        .handle_mention(&Destination::new("T1", "C1"), &mention_event("cats"), "cats")
        .await;

    assert!(matches!(&outcome, PostingOutcome::Failed(reason) if reason.contains("cant_delete_message")));
    let calls = chat.calls();
    assert_eq!(calls.len(), 3);
    assert!(matches!(
        &calls[2],
        ChatCall::Update(_, r, c) if r.message_id == "m1" && c.text == FAILURE_TEXT
    ));
}

#[tokio::test]
async fn test_failed_repost_after_delete_posts_failure_notice() {
    let chat = Arc::new(FakeChat::new(ResultDelivery::DeleteThenPost).failing_image_post());
    let orch = orchestrator(
        chat.clone(),
        Arc::new(FakeGenerator::ok()),
        Arc::new(InMemoryRegistry::new()),
        OrchestratorSettings::default(),
    );

    let outcome = orch
        .handle_mention(&Destination::new("T1", "C1"), &mention_event("cats"), "cats")
        .await;

    assert!(matches!(&outcome, PostingOutcome::Failed(reason) if reason.contains("upload_failed")));
    let posts = chat.posts();
    assert_eq!(posts.last(), Some(&("C1".to_string(), PostContent::text(FAILURE_TEXT))));
    assert!(matches!(chat.calls()[3], ChatCall::Update(..)));
}

#[tokio::test]
async fn test_cycle_prompt_keeps_long_message_text() {
    let long = format!("{}TAILMARKER", "x".repeat(1200));
    let chat = Arc::new(
        FakeChat::new(ResultDelivery::DeleteThenPost)
            .with_history("C1", vec![message("1", "U1", &long, 2)]),
    );
    let generator = Arc::new(FakeGenerator::ok());
    let orch = orchestrator(
        chat.clone(),
        generator.clone(),
        Arc::new(InMemoryRegistry::new()),
        OrchestratorSettings::default(),
    );

    let report = orch.run_cycle_for(&[Destination::new("T1", "C1")]).await;

    assert_eq!(report.posted(), 1);
    assert!(generator.prompts.lock().unwrap()[0].contains("TAILMARKER"));
    assert!(!chat.posts()[0].1.text.contains("TAILMARKER"));
}

#[tokio::test]
async fn test_enroll_rejects_blank_ids() {
    let orch = orchestrator(
        Arc::new(FakeChat::new(ResultDelivery::DeleteThenPost)),
        Arc::new(FakeGenerator::ok()),
        Arc::new(InMemoryRegistry::new()),
        OrchestratorSettings::default(),
    );
    assert!(matches!(
        orch.enroll("", "C1").await,
        Err(memebot::BotError::Configuration(_))
    ));
}
