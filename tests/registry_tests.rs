use chrono::Utc;
use memebot::core::models::{Destination, WorkspaceInstallation};
use memebot::registry::{DestinationRegistry, InMemoryRegistry, InstallationStore};
use std::sync::Arc;

fn installation(owner: &str, token: &str) -> WorkspaceInstallation {
    WorkspaceInstallation {
        owner_id: owner.to_string(),
        team_name: format!("team {owner}"),
        access_token: token.to_string(),
        bot_user_id: "UBOT".to_string(),
        installed_at: Utc::now(),
    }
}

#[tokio::test]
async fn test_enrollment_is_idempotent() {
    let registry = InMemoryRegistry::new();

    assert!(registry.enroll("T1", "C1").await.unwrap());
    assert!(!registry.enroll("T1", "C1").await.unwrap());
    assert!(!registry.enroll("T1", "C1").await.unwrap());

    assert_eq!(registry.list_channels("T1").await.unwrap(), vec!["C1"]);
}

#[tokio::test]
async fn test_channels_keep_enrollment_order() {
    let registry = InMemoryRegistry::new();
    for channel in ["C3", "C1", "C2", "C1"] {
        registry.enroll("T1", channel).await.unwrap();
    }
    registry.enroll("T2", "C9").await.unwrap();

    assert_eq!(
        registry.list_channels("T1").await.unwrap(),
        vec!["C3", "C1", "C2"]
    );
    assert!(registry.list_channels("T404").await.unwrap().is_empty());

    let all = registry.all_destinations().await.unwrap();
    let keys: Vec<String> = all.iter().map(Destination::key).collect();
    assert_eq!(keys, vec!["T1/C3", "T1/C1", "T1/C2", "T2/C9"]);
}

#[tokio::test]
async fn test_concurrent_enrollment_adds_once() {
    let registry = Arc::new(InMemoryRegistry::new());
    let handles: Vec<_> = (0..16)
        .map(|_| {
            let registry = Arc::clone(&registry);
            tokio::spawn(async move { registry.enroll("T1", "C1").await.unwrap() })
        })
        .collect();

    let mut added = 0;
    for handle in handles {
        if handle.await.unwrap() {
            added += 1;
        }
    }
    assert_eq!(added, 1);
    assert_eq!(registry.list_channels("T1").await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_installation_token_is_attached_to_destinations() {
    let registry = InMemoryRegistry::new();
    registry.enroll("T1", "C1").await.unwrap();
    registry.enroll("T2", "C2").await.unwrap();
    registry.upsert(&installation("T1", "xoxb-old")).await.unwrap();
    registry.upsert(&installation("T1", "xoxb-new")).await.unwrap();

    let all = registry.all_destinations().await.unwrap();
    assert_eq!(all[0].access_token.as_deref(), Some("xoxb-new"));
    assert_eq!(all[1].access_token, None);

    assert_eq!(registry.list_all().await.unwrap().len(), 1);
    assert!(registry.find("T2").await.unwrap().is_none());
}
