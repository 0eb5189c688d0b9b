//! Destination enrollment and workspace installation records.

pub mod ssm;

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::core::models::{Destination, WorkspaceInstallation};
use crate::errors::BotError;

pub use ssm::SsmStore;

/// Channels enrolled for scheduled auto-posts, grouped by owner (team/guild).
#[async_trait]
pub trait DestinationRegistry: Send + Sync {
    /// Enroll `channel_id` under `owner_id`. Returns `false` if it was already enrolled.
    async fn enroll(&self, owner_id: &str, channel_id: &str) -> Result<bool, BotError>;

    /// Enrolled channels for `owner_id`, each listed once.
    async fn list_channels(&self, owner_id: &str) -> Result<Vec<String>, BotError>;

    /// Every enrolled destination, with the owner's access token attached when known.
    async fn all_destinations(&self) -> Result<Vec<Destination>, BotError>;

    /// Drop an enrollment. Returns `false` if it did not exist.
    async fn remove(&self, owner_id: &str, channel_id: &str) -> Result<bool, BotError>;
}

/// Workspace records created by the OAuth install flow.
#[async_trait]
pub trait InstallationStore: Send + Sync {
    async fn upsert(&self, installation: &WorkspaceInstallation) -> Result<(), BotError>;

    async fn find(&self, owner_id: &str) -> Result<Option<WorkspaceInstallation>, BotError>;

    async fn list_all(&self) -> Result<Vec<WorkspaceInstallation>, BotError>;
}

pub(crate) fn require_ids(owner_id: &str, channel_id: &str) -> Result<(), BotError> {
    if owner_id.trim().is_empty() {
        return Err(BotError::Configuration(
            "enrollment requires a team/guild id".to_string(),
        ));
    }
    if channel_id.trim().is_empty() {
        return Err(BotError::Configuration(
            "enrollment requires a channel id".to_string(),
        ));
    }
    Ok(())
}

#[derive(Default)]
struct RegistryState {
    // Vec keeps enrollment order; owners are kept in first-enrolled order too.
    owners: Vec<String>,
    channels: HashMap<String, Vec<String>>,
    installations: HashMap<String, WorkspaceInstallation>,
}

/// Process-local registry. Enrollment is an append-if-absent under one write lock.
#[derive(Default)]
pub struct InMemoryRegistry {
    state: RwLock<RegistryState>,
}

impl InMemoryRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DestinationRegistry for InMemoryRegistry {
    async fn enroll(&self, owner_id: &str, channel_id: &str) -> Result<bool, BotError> {
        require_ids(owner_id, channel_id)?;

        let mut state = self.state.write().await;
        if !state.channels.contains_key(owner_id) {
            state.owners.push(owner_id.to_string());
        }
        let channels = state.channels.entry(owner_id.to_string()).or_default();
        if channels.iter().any(|c| c == channel_id) {
            return Ok(false);
        }
        channels.push(channel_id.to_string());
        Ok(true)
    }

    async fn list_channels(&self, owner_id: &str) -> Result<Vec<String>, BotError> {
        let state = self.state.read().await;
        Ok(state.channels.get(owner_id).cloned().unwrap_or_default())
    }

    async fn all_destinations(&self) -> Result<Vec<Destination>, BotError> {
        let state = self.state.read().await;
        let destinations = state
            .owners
            .iter()
            .flat_map(|owner| {
                let token = state
                    .installations
                    .get(owner)
                    .map(|i| i.access_token.clone());
                state
                    .channels
                    .get(owner)
                    .into_iter()
                    .flatten()
                    .map(move |channel| {
                        Destination::new(owner.clone(), channel.clone())
                            .with_access_token(token.clone())
                    })
            })
            .collect();
        Ok(destinations)
    }

    async fn remove(&self, owner_id: &str, channel_id: &str) -> Result<bool, BotError> {
        let mut state = self.state.write().await;
        let Some(channels) = state.channels.get_mut(owner_id) else {
            return Ok(false);
        };
        let before = channels.len();
        channels.retain(|c| c != channel_id);
        Ok(channels.len() != before)
    }
}

#[async_trait]
impl InstallationStore for InMemoryRegistry {
    async fn upsert(&self, installation: &WorkspaceInstallation) -> Result<(), BotError> {
        let mut state = self.state.write().await;
        state
            .installations
            .insert(installation.owner_id.clone(), installation.clone());
        Ok(())
    }

    async fn find(&self, owner_id: &str) -> Result<Option<WorkspaceInstallation>, BotError> {
        let state = self.state.read().await;
        Ok(state.installations.get(owner_id).cloned())
    }

    async fn list_all(&self) -> Result<Vec<WorkspaceInstallation>, BotError> {
        let state = self.state.read().await;
        let mut all: Vec<WorkspaceInstallation> = state.installations.values().cloned().collect();
        all.sort_by(|a, b| a.owner_id.cmp(&b.owner_id));
        Ok(all)
    }
}
