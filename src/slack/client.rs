//! Slack API client module
//!
//! Encapsulates the Slack Web API calls the bot needs: reading channel history,
//! posting, editing and deleting messages.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use slack_morphism::hyper_tokio::{SlackClientHyperConnector, SlackHyperClient};
use slack_morphism::prelude::{SlackApiChatDeleteRequest, SlackApiChatPostMessageRequest};
use slack_morphism::{
    SlackApiToken, SlackApiTokenValue, SlackChannelId, SlackMessageContent, SlackTs,
};
use std::time::Duration;
use tracing::{debug, warn};

use crate::chat::{ChatPlatform, ResultDelivery};
use crate::core::models::{Destination, Message, MessageRef, PostContent, Reaction};
use crate::errors::BotError;

const SLACK_API_BASE: &str = "https://slack.com/api";

// Build the Slack client connector safely without panicking.
// If connector construction fails, store None and surface a BotError at call sites.
static SLACK_CLIENT: std::sync::LazyLock<Option<SlackHyperClient>> =
    std::sync::LazyLock::new(|| match SlackClientHyperConnector::new() {
        Ok(connector) => Some(SlackHyperClient::new(connector)),
        Err(e) => {
            warn!("Failed to create Slack HTTP connector: {}", e);
            None
        }
    });

static HTTP_CLIENT: std::sync::LazyLock<Client> = std::sync::LazyLock::new(|| {
    Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .unwrap_or_else(|_| Client::new())
});

fn slack_client() -> Result<&'static SlackHyperClient, BotError> {
    SLACK_CLIENT
        .as_ref()
        .ok_or_else(|| BotError::ApiError("Slack HTTP connector not initialized".to_string()))
}

/// Fail with the Slack error code unless the Web API body says `ok: true`.
fn ensure_ok(method: &str, body: &Value) -> Result<(), BotError> {
    if body.get("ok").and_then(Value::as_bool).unwrap_or(false) {
        return Ok(());
    }
    Err(BotError::ApiError(format!(
        "{method} error: {}",
        body.get("error")
            .and_then(Value::as_str)
            .unwrap_or("unknown")
    )))
}

/// Map a `conversations.history` response body to [`Message`]s, keeping Slack's
/// newest-first order.
///
/// # Errors
///
/// Returns an error if Slack reported a failure or the body has no `messages` array.
pub fn parse_history(body: &Value) -> Result<Vec<Message>, BotError> {
    ensure_ok("conversations.history", body)?;

    let raw = body
        .get("messages")
        .and_then(Value::as_array)
        .ok_or_else(|| BotError::ParseError("conversations.history: missing messages".to_string()))?;

    Ok(raw
        .iter()
        .filter_map(|m| {
            let ts = m.get("ts").and_then(Value::as_str)?;
            let bot_id = m.get("bot_id").and_then(Value::as_str);
            let subtype = m.get("subtype").and_then(Value::as_str);
            let author_id = m
                .get("user")
                .and_then(Value::as_str)
                .or(bot_id)
                .unwrap_or_default();
            let reactions = m
                .get("reactions")
                .and_then(Value::as_array)
                .map(|list| {
                    list.iter()
                        .map(|r| Reaction {
                            name: r
                                .get("name")
                                .and_then(Value::as_str)
                                .unwrap_or_default()
                                .to_string(),
                            count: r
                                .get("count")
                                .and_then(Value::as_u64)
                                .and_then(|c| u32::try_from(c).ok())
                                .unwrap_or(0),
                        })
                        .collect()
                })
                .unwrap_or_default();

            Some(Message {
                id: ts.to_string(),
                author_id: author_id.to_string(),
                is_from_bot: bot_id.is_some() || subtype == Some("bot_message"),
                text: m
                    .get("text")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                reactions,
            })
        })
        .collect())
}

/// Block Kit payload showing `text` above the generated image.
#[must_use]
pub fn build_image_blocks(text: &str, image_url: &str) -> Value {
    json!([
        {
            "type": "section",
            "text": { "type": "mrkdwn", "text": text }
        },
        {
            "type": "image",
            "image_url": image_url,
            "alt_text": "Generated meme"
        }
    ])
}

/// Slack Web API client. Calls use the destination's workspace token when the
/// destination came from an OAuth install, otherwise the configured bot token.
pub struct SlackClient {
    default_token: Option<String>,
    delivery: ResultDelivery,
}

impl SlackClient {
    #[must_use]
    pub fn new(default_token: Option<String>, delivery: ResultDelivery) -> Self {
        Self {
            default_token,
            delivery,
        }
    }

    fn token_value<'a>(&'a self, destination: &'a Destination) -> Result<&'a str, BotError> {
        destination
            .access_token
            .as_deref()
            .or(self.default_token.as_deref())
            .ok_or_else(|| {
                BotError::Configuration(format!(
                    "no Slack token for workspace {}",
                    destination.owner_id
                ))
            })
    }

    fn token_for(&self, destination: &Destination) -> Result<SlackApiToken, BotError> {
        let value = self.token_value(destination)?;
        Ok(SlackApiToken::new(SlackApiTokenValue::new(value.to_string())))
    }

    async fn post_json(&self, method: &str, token: &str, payload: &Value) -> Result<Value, BotError> {
        let resp = HTTP_CLIENT
            .post(format!("{SLACK_API_BASE}/{method}"))
            .bearer_auth(token)
            .json(payload)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(BotError::ApiError(format!("{method} HTTP {}", resp.status())));
        }

        let body: Value = resp
            .json()
            .await
            .map_err(|e| BotError::ParseError(format!("{method} JSON parse error: {e}")))?;
        ensure_ok(method, &body)?;
        Ok(body)
    }
}

#[async_trait]
impl ChatPlatform for SlackClient {
    async fn fetch_recent_messages(
        &self,
        destination: &Destination,
        limit: usize,
    ) -> Result<Vec<Message>, BotError> {
        let token = self.token_value(destination)?;
        let limit = limit.clamp(1, 1000).to_string();

        let resp = HTTP_CLIENT
            .get(format!("{SLACK_API_BASE}/conversations.history"))
            .bearer_auth(token)
            .query(&[
                ("channel", destination.channel_id.as_str()),
                ("limit", limit.as_str()),
            ])
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(BotError::ApiError(format!(
                "conversations.history HTTP {}",
                resp.status()
            )));
        }

        let body: Value = resp.json().await.map_err(|e| {
            BotError::ParseError(format!("conversations.history JSON parse error: {e}"))
        })?;
        let messages = parse_history(&body)?;
        debug!(
            channel_id = %destination.channel_id,
            count = messages.len(),
            "Fetched Slack history"
        );
        Ok(messages)
    }

    async fn post_message(
        &self,
        destination: &Destination,
        content: &PostContent,
    ) -> Result<MessageRef, BotError> {
        if let Some(image_url) = &content.image_url {
            let payload = json!({
                "channel": destination.channel_id,
                "text": content.text,
                "blocks": build_image_blocks(&content.text, image_url),
            });
            let body = self
                .post_json("chat.postMessage", self.token_value(destination)?, &payload)
                .await?;
            let ts = body
                .get("ts")
                .and_then(Value::as_str)
                .ok_or_else(|| BotError::ParseError("chat.postMessage: missing ts".to_string()))?;
            return Ok(MessageRef {
                channel_id: destination.channel_id.clone(),
                message_id: ts.to_string(),
            });
        }

        let token = self.token_for(destination)?;
        let session = slack_client()?.open_session(&token);
        let post_req = SlackApiChatPostMessageRequest::new(
            SlackChannelId(destination.channel_id.clone()),
            SlackMessageContent::new().with_text(content.text.clone()),
        );
        let resp = session.chat_post_message(&post_req).await?;

        Ok(MessageRef {
            channel_id: resp.channel.0,
            message_id: resp.ts.0,
        })
    }

    async fn update_message(
        &self,
        destination: &Destination,
        message: &MessageRef,
        content: &PostContent,
    ) -> Result<(), BotError> {
        let mut payload = json!({
            "channel": message.channel_id,
            "ts": message.message_id,
            "text": content.text,
        });
        payload["blocks"] = match &content.image_url {
            Some(url) => build_image_blocks(&content.text, url),
            None => json!([]),
        };

        self.post_json("chat.update", self.token_value(destination)?, &payload)
            .await?;
        Ok(())
    }

    async fn delete_message(
        &self,
        destination: &Destination,
        message: &MessageRef,
    ) -> Result<(), BotError> {
        let token = self.token_for(destination)?;
        let session = slack_client()?.open_session(&token);

        let delete_req = SlackApiChatDeleteRequest::new(
            SlackChannelId(message.channel_id.clone()),
            SlackTs(message.message_id.clone()),
        );

        session.chat_delete(&delete_req).await?;
        Ok(())
    }

    fn result_delivery(&self) -> ResultDelivery {
        self.delivery
    }
}
