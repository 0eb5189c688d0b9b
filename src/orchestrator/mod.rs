//! Auto-post orchestration: scheduled cycles, mentions and enrollment.
//!
//! [`MemeOrchestrator`] owns nothing but its injected collaborators, so the
//! same instance serves the scheduled trigger, the mention handler and the
//! enrollment command.

pub mod cycle;
pub mod in_flight;
pub mod mention;
pub mod prompt;

use std::sync::Arc;
use tracing::{error, info};

use crate::chat::ChatPlatform;
use crate::core::config::AppConfig;
use crate::core::models::StyleOptions;
use crate::errors::BotError;
use crate::generation::GenerationClient;
use crate::registry::DestinationRegistry;

pub use cycle::{CycleOutcome, CycleReport, DestinationReport};
pub use in_flight::InFlight;
pub use mention::PostingOutcome;

/// Number of recent messages scanned per destination.
pub const HISTORY_LIMIT: usize = 50;

#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    pub style: StyleOptions,
    /// Prompt used when a channel has no candidate message at all. `None` skips.
    pub generic_fallback_prompt: Option<String>,
    pub history_limit: usize,
    pub cycle_concurrency: usize,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            style: StyleOptions::default(),
            generic_fallback_prompt: None,
            history_limit: HISTORY_LIMIT,
            cycle_concurrency: 4,
        }
    }
}

impl OrchestratorSettings {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            style: StyleOptions {
                style: config.meme_style.clone(),
                size: config.image_size.clone(),
            },
            generic_fallback_prompt: config.generic_fallback_prompt.clone(),
            history_limit: HISTORY_LIMIT,
            cycle_concurrency: config.cycle_concurrency.max(1),
        }
    }
}

pub struct MemeOrchestrator {
    chat: Arc<dyn ChatPlatform>,
    generator: Arc<dyn GenerationClient>,
    registry: Arc<dyn DestinationRegistry>,
    settings: OrchestratorSettings,
    in_flight: InFlight,
}

impl MemeOrchestrator {
    #[must_use]
    pub fn new(
        chat: Arc<dyn ChatPlatform>,
        generator: Arc<dyn GenerationClient>,
        registry: Arc<dyn DestinationRegistry>,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            chat,
            generator,
            registry,
            settings,
            in_flight: InFlight::new(),
        }
    }

    #[must_use]
    pub fn in_flight(&self) -> &InFlight {
        &self.in_flight
    }

    /// Enroll a channel for scheduled posts. Returns `false` if it already was.
    ///
    /// # Errors
    ///
    /// Returns `BotError::Configuration` for blank ids, or the registry's error.
    pub async fn enroll(&self, owner_id: &str, channel_id: &str) -> Result<bool, BotError> {
        let added = self.registry.enroll(owner_id, channel_id).await?;
        info!(owner_id, channel_id, added, "Processed enrollment");
        Ok(added)
    }

    /// Run the generation step and reduce its outcome to a usable image URL.
    async fn generate(&self, prompt: &str) -> Result<String, String> {
        match self.generator.generate(prompt, &self.settings.style).await {
            Ok(result) => match result.success_url() {
                Some(url) => Ok(url.to_string()),
                None => {
                    error!(status = ?result.status, "Generation finished without a result");
                    Err(format!("generation ended with status {:?}", result.status))
                }
            },
            Err(e) => {
                error!(external_call_failure = e.is_external_call_failure(), "Generation failed: {}", e);
                Err(e.to_string())
            }
        }
    }
}
