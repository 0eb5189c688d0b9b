use std::env;
use std::time::Duration;

use crate::chat::ResultDelivery;
use crate::errors::BotError;
use crate::generation::RetryPolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatPlatformKind {
    Slack,
    Discord,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationBackend {
    OpenAi,
    MemeApi,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryBackend {
    /// Process-local; only useful when one process both enrolls and runs cycles.
    Memory,
    Ssm,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub chat_platform: ChatPlatformKind,
    pub slack_bot_token: Option<String>,
    pub slack_client_id: Option<String>,
    pub slack_client_secret: Option<String>,
    pub slack_redirect_url: Option<String>,
    pub discord_bot_token: Option<String>,
    pub discord_application_id: Option<String>,
    pub generation_backend: GenerationBackend,
    pub openai_api_key: Option<String>,
    pub openai_org_id: Option<String>,
    pub openai_image_model: String,
    pub meme_api_url: Option<String>,
    pub meme_api_key: Option<String>,
    pub poll_policy: RetryPolicy,
    pub meme_style: Option<String>,
    pub image_size: Option<String>,
    pub processing_queue_url: Option<String>,
    pub registry_backend: RegistryBackend,
    pub registry_param_prefix: String,
    pub generic_fallback_prompt: Option<String>,
    pub result_delivery: ResultDelivery,
    pub cycle_concurrency: usize,
    pub schedule_interval: Duration,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_number<T: std::str::FromStr>(
    key: &str,
    value: Option<String>,
    default: T,
) -> Result<T, BotError> {
    match non_empty(value) {
        None => Ok(default),
        Some(raw) => raw
            .parse::<T>()
            .map_err(|_| BotError::Configuration(format!("{key}: invalid number '{raw}'"))),
    }
}

impl AppConfig {
    /// Load and validate configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `BotError::Configuration` when a value is malformed or a
    /// credential required by the selected platform or backend is missing.
    pub fn from_env() -> Result<Self, BotError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`AppConfig::from_env`] but reads values through `lookup`.
    ///
    /// # Errors
    ///
    /// See [`AppConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, BotError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| non_empty(lookup(key));

        let chat_platform = match get("CHAT_PLATFORM").as_deref() {
            None | Some("slack") => ChatPlatformKind::Slack,
            Some("discord") => ChatPlatformKind::Discord,
            Some(other) => {
                return Err(BotError::Configuration(format!(
                    "CHAT_PLATFORM: unknown platform '{other}'"
                )));
            }
        };

        let generation_backend = match get("GENERATION_BACKEND").as_deref() {
            None | Some("openai") => GenerationBackend::OpenAi,
            Some("meme_api") => GenerationBackend::MemeApi,
            Some(other) => {
                return Err(BotError::Configuration(format!(
                    "GENERATION_BACKEND: unknown backend '{other}'"
                )));
            }
        };

        let registry_backend = match get("REGISTRY_BACKEND").as_deref() {
            None | Some("ssm") => RegistryBackend::Ssm,
            Some("memory") => RegistryBackend::Memory,
            Some(other) => {
                return Err(BotError::Configuration(format!(
                    "REGISTRY_BACKEND: unknown backend '{other}'"
                )));
            }
        };

        let result_delivery = match get("RESULT_DELIVERY").as_deref() {
            None => match chat_platform {
                ChatPlatformKind::Slack => ResultDelivery::DeleteThenPost,
                ChatPlatformKind::Discord => ResultDelivery::EditInPlace,
            },
            Some("delete_then_post") => ResultDelivery::DeleteThenPost,
            Some("edit_in_place") => ResultDelivery::EditInPlace,
            Some(other) => {
                return Err(BotError::Configuration(format!(
                    "RESULT_DELIVERY: unknown mode '{other}'"
                )));
            }
        };

        let max_attempts = parse_number("MEME_POLL_MAX_ATTEMPTS", get("MEME_POLL_MAX_ATTEMPTS"), 20)?;
        let interval_secs = parse_number("MEME_POLL_INTERVAL_SECS", get("MEME_POLL_INTERVAL_SECS"), 3)?;

        let config = Self {
            chat_platform,
            slack_bot_token: get("SLACK_BOT_TOKEN"),
            slack_client_id: get("SLACK_CLIENT_ID"),
            slack_client_secret: get("SLACK_CLIENT_SECRET"),
            slack_redirect_url: get("SLACK_REDIRECT_URL"),
            discord_bot_token: get("DISCORD_BOT_TOKEN"),
            discord_application_id: get("DISCORD_APPLICATION_ID"),
            generation_backend,
            openai_api_key: get("OPENAI_API_KEY"),
            openai_org_id: get("OPENAI_ORG_ID"),
            openai_image_model: get("OPENAI_IMAGE_MODEL").unwrap_or_else(|| "dall-e-3".to_string()),
            meme_api_url: get("MEME_API_URL"),
            meme_api_key: get("MEME_API_KEY"),
            poll_policy: RetryPolicy::new(max_attempts, Duration::from_secs(interval_secs)),
            meme_style: get("MEME_STYLE"),
            image_size: get("IMAGE_SIZE"),
            processing_queue_url: get("PROCESSING_QUEUE_URL"),
            registry_backend,
            registry_param_prefix: get("REGISTRY_PARAM_PREFIX")
                .unwrap_or_else(|| "/memebot/".to_string()),
            generic_fallback_prompt: get("GENERIC_FALLBACK_PROMPT"),
            result_delivery,
            cycle_concurrency: parse_number("CYCLE_CONCURRENCY", get("CYCLE_CONCURRENCY"), 4)?,
            schedule_interval: Duration::from_secs(parse_number(
                "SCHEDULE_INTERVAL_SECS",
                get("SCHEDULE_INTERVAL_SECS"),
                7200,
            )?),
        };

        config.validate()?;
        Ok(config)
    }

    /// Check that every credential the selected platform and backends need is present.
    ///
    /// # Errors
    ///
    /// Returns `BotError::Configuration` naming the first missing or invalid setting.
    pub fn validate(&self) -> Result<(), BotError> {
        match self.chat_platform {
            ChatPlatformKind::Slack => {
                let multi_workspace = self.registry_backend == RegistryBackend::Ssm
                    && self.slack_oauth_configured();
                if self.slack_bot_token.is_none() && !multi_workspace {
                    return Err(BotError::Configuration(
                        "SLACK_BOT_TOKEN is required unless OAuth installs are stored in SSM"
                            .to_string(),
                    ));
                }
            }
            ChatPlatformKind::Discord => {
                if self.discord_bot_token.is_none() {
                    return Err(BotError::Configuration(
                        "DISCORD_BOT_TOKEN is required for the discord platform".to_string(),
                    ));
                }
            }
        }

        match self.generation_backend {
            GenerationBackend::OpenAi if self.openai_api_key.is_none() => {
                return Err(BotError::Configuration(
                    "OPENAI_API_KEY is required for the openai generation backend".to_string(),
                ));
            }
            GenerationBackend::MemeApi if self.meme_api_url.is_none() => {
                return Err(BotError::Configuration(
                    "MEME_API_URL is required for the meme_api generation backend".to_string(),
                ));
            }
            _ => {}
        }

        if self.poll_policy.max_attempts == 0 {
            return Err(BotError::Configuration(
                "MEME_POLL_MAX_ATTEMPTS must be at least 1".to_string(),
            ));
        }
        if self.cycle_concurrency == 0 {
            return Err(BotError::Configuration(
                "CYCLE_CONCURRENCY must be at least 1".to_string(),
            ));
        }
        if self.schedule_interval.is_zero() {
            return Err(BotError::Configuration(
                "SCHEDULE_INTERVAL_SECS must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    #[must_use]
    pub fn slack_oauth_configured(&self) -> bool {
        self.slack_client_id.is_some()
            && self.slack_client_secret.is_some()
            && self.slack_redirect_url.is_some()
    }

    /// Queue URL for mention tasks.
    ///
    /// # Errors
    ///
    /// Returns `BotError::Configuration` if `PROCESSING_QUEUE_URL` is unset.
    pub fn queue_url(&self) -> Result<&str, BotError> {
        self.processing_queue_url
            .as_deref()
            .ok_or_else(|| BotError::Configuration("PROCESSING_QUEUE_URL is not set".to_string()))
    }
}
