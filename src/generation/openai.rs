//! Single-call image generation through the `OpenAI` Images API.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{error, info};

use super::GenerationClient;
use crate::core::models::{GenerationResult, StyleOptions};
use crate::errors::BotError;

const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

/// Meme framing prepended to every prompt.
const MEME_PREAMBLE: &str = "Create a funny, shareable meme image. Use bold meme-style caption text.";

pub struct OpenAiImageClient {
    http: Client,
    api_key: String,
    org_id: Option<String>,
    model: String,
}

impl OpenAiImageClient {
    #[must_use]
    pub fn new(api_key: String, org_id: Option<String>, model: String) -> Self {
        // Image generation routinely takes longer than chat completions.
        let http = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            http,
            api_key,
            org_id,
            model,
        }
    }

    fn build_request(&self, prompt: &str, style: &StyleOptions) -> Value {
        let mut full_prompt = format!("{MEME_PREAMBLE} {prompt}");
        if let Some(s) = &style.style {
            full_prompt.push_str(&format!(" Style: {s}."));
        }

        json!({
            "model": self.model,
            "prompt": full_prompt,
            "n": 1,
            "size": style.size.as_deref().unwrap_or("1024x1024"),
        })
    }
}

#[async_trait]
impl GenerationClient for OpenAiImageClient {
    async fn generate(
        &self,
        prompt: &str,
        style: &StyleOptions,
    ) -> Result<GenerationResult, BotError> {
        let payload = self.build_request(prompt, style);

        let mut request = self
            .http
            .post(format!("{OPENAI_API_BASE}/images/generations"))
            .bearer_auth(&self.api_key)
            .json(&payload);
        if let Some(org) = &self.org_id {
            request = request.header("OpenAI-Organization", org);
        }

        #[cfg(feature = "debug-logs")]
        info!("Using image prompt:\n{}", payload);

        let resp = request.send().await?;
        let status = resp.status();
        let body: Value = resp
            .json()
            .await
            .map_err(|e| BotError::GenerationError(format!("images response parse: {e}")))?;

        if !status.is_success() {
            let message = body
                .get("error")
                .and_then(|e| e.get("message"))
                .and_then(Value::as_str)
                .unwrap_or("unknown");
            error!(%status, "OpenAI image generation failed: {}", message);
            return Ok(GenerationResult::failed());
        }

        match body
            .get("data")
            .and_then(Value::as_array)
            .and_then(|data| data.first())
            .and_then(|item| item.get("url"))
            .and_then(Value::as_str)
        {
            Some(url) => {
                info!("OpenAI image generated");
                Ok(GenerationResult::complete(url))
            }
            None => Ok(GenerationResult::failed()),
        }
    }
}
