//! Builds the collaborators selected by [`AppConfig`].

use std::sync::Arc;
use tracing::info;

use super::config::{AppConfig, ChatPlatformKind, GenerationBackend, RegistryBackend};
use super::models::{Destination, MemeTask};
use crate::chat::ChatPlatform;
use crate::discord::DiscordClient;
use crate::errors::BotError;
use crate::generation::{GenerationClient, MemeJobClient, OpenAiImageClient};
use crate::orchestrator::{MemeOrchestrator, OrchestratorSettings};
use crate::registry::{DestinationRegistry, InMemoryRegistry, InstallationStore, SsmStore};
use crate::slack::SlackClient;

/// Long-lived handles shared by the Lambda handlers and the scheduler.
pub struct Services {
    pub orchestrator: MemeOrchestrator,
    pub registry: Arc<dyn DestinationRegistry>,
    pub installations: Arc<dyn InstallationStore>,
}

impl Services {
    /// Wire every collaborator from configuration.
    ///
    /// # Errors
    ///
    /// Returns `BotError::Configuration` if a credential the selection needs is absent.
    pub async fn from_config(config: &AppConfig) -> Result<Self, BotError> {
        let (registry, installations) = build_registry(config).await;
        let chat = build_chat(config)?;
        let generator = build_generator(config)?;

        info!(
            platform = ?config.chat_platform,
            generation = ?config.generation_backend,
            registry = ?config.registry_backend,
            "Services initialized"
        );

        Ok(Self::new(
            chat,
            generator,
            registry,
            installations,
            OrchestratorSettings::from_config(config),
        ))
    }

    #[must_use]
    pub fn new(
        chat: Arc<dyn ChatPlatform>,
        generator: Arc<dyn GenerationClient>,
        registry: Arc<dyn DestinationRegistry>,
        installations: Arc<dyn InstallationStore>,
        settings: OrchestratorSettings,
    ) -> Self {
        let orchestrator = MemeOrchestrator::new(chat, generator, Arc::clone(&registry), settings);
        Self {
            orchestrator,
            registry,
            installations,
        }
    }

    /// Destination for a queued task, carrying the workspace token if the
    /// workspace was installed through OAuth.
    ///
    /// # Errors
    ///
    /// Returns the installation store's error.
    pub async fn destination_for(&self, task: &MemeTask) -> Result<Destination, BotError> {
        let token = self
            .installations
            .find(&task.owner_id)
            .await?
            .map(|i| i.access_token);
        Ok(Destination::new(task.owner_id.clone(), task.channel_id.clone()).with_access_token(token))
    }
}

async fn build_registry(
    config: &AppConfig,
) -> (Arc<dyn DestinationRegistry>, Arc<dyn InstallationStore>) {
    match config.registry_backend {
        RegistryBackend::Memory => {
            let registry = Arc::new(InMemoryRegistry::new());
            let installations: Arc<dyn InstallationStore> = registry.clone();
            let registry: Arc<dyn DestinationRegistry> = registry;
            (registry, installations)
        }
        RegistryBackend::Ssm => {
            let store = Arc::new(SsmStore::from_env(&config.registry_param_prefix).await);
            let installations: Arc<dyn InstallationStore> = store.clone();
            let registry: Arc<dyn DestinationRegistry> = store;
            (registry, installations)
        }
    }
}

fn build_chat(config: &AppConfig) -> Result<Arc<dyn ChatPlatform>, BotError> {
    match config.chat_platform {
        ChatPlatformKind::Slack => Ok(Arc::new(SlackClient::new(
            config.slack_bot_token.clone(),
            config.result_delivery,
        ))),
        ChatPlatformKind::Discord => {
            let token = config.discord_bot_token.clone().ok_or_else(|| {
                BotError::Configuration("DISCORD_BOT_TOKEN is not set".to_string())
            })?;
            Ok(Arc::new(DiscordClient::new(token, config.result_delivery)))
        }
    }
}

fn build_generator(config: &AppConfig) -> Result<Arc<dyn GenerationClient>, BotError> {
    match config.generation_backend {
        GenerationBackend::OpenAi => {
            let key = config.openai_api_key.clone().ok_or_else(|| {
                BotError::Configuration("OPENAI_API_KEY is not set".to_string())
            })?;
            Ok(Arc::new(OpenAiImageClient::new(
                key,
                config.openai_org_id.clone(),
                config.openai_image_model.clone(),
            )))
        }
        GenerationBackend::MemeApi => {
            let url = config.meme_api_url.clone().ok_or_else(|| {
                BotError::Configuration("MEME_API_URL is not set".to_string())
            })?;
            Ok(Arc::new(MemeJobClient::new(
                url,
                config.meme_api_key.clone(),
                config.poll_policy,
            )))
        }
    }
}
