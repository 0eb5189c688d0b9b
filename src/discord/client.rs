//! Discord REST client (API v10) for channel history and message delivery.

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, info};

use crate::chat::{ChatPlatform, ResultDelivery};
use crate::core::models::{Destination, Message, MessageRef, PostContent, Reaction};
use crate::errors::BotError;

pub const DISCORD_API_BASE: &str = "https://discord.com/api/v10";

/// Discord caps `limit` on message history at 100.
const DISCORD_HISTORY_MAX: usize = 100;

/// Option type ids used by application command definitions.
const OPTION_TYPE_STRING: u8 = 3;
const OPTION_TYPE_CHANNEL: u8 = 7;

/// Map a `GET /channels/{id}/messages` body to [`Message`]s (newest first).
///
/// # Errors
///
/// Returns an error if the body is not an array.
pub fn parse_messages(body: &Value) -> Result<Vec<Message>, BotError> {
    let raw = body
        .as_array()
        .ok_or_else(|| BotError::ParseError("discord messages: expected array".to_string()))?;

    Ok(raw
        .iter()
        .filter_map(|m| {
            let id = m.get("id").and_then(Value::as_str)?;
            let author = m.get("author");
            let author_id = author
                .and_then(|a| a.get("id"))
                .and_then(Value::as_str)
                .unwrap_or_default();
            let is_bot = author
                .and_then(|a| a.get("bot"))
                .and_then(Value::as_bool)
                .unwrap_or(false)
                || m.get("webhook_id").is_some();
            let reactions = m
                .get("reactions")
                .and_then(Value::as_array)
                .map(|list| {
                    list.iter()
                        .map(|r| Reaction {
                            name: r
                                .get("emoji")
                                .and_then(|e| e.get("name"))
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
                id: id.to_string(),
                author_id: author_id.to_string(),
                is_from_bot: is_bot,
                text: m
                    .get("content")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                reactions,
            })
        })
        .collect())
}

/// Message body for create/edit calls. Only user mentions ping.
#[must_use]
pub fn build_message_body(content: &PostContent) -> Value {
    let embeds = match &content.image_url {
        Some(url) => json!([{ "image": { "url": url } }]),
        None => json!([]),
    };
    json!({
        "content": content.text,
        "embeds": embeds,
        "allowed_mentions": { "parse": ["users"] },
    })
}

/// Application commands: `/memechannel channel:<channel>` and `/meme prompt:<text>`.
#[must_use]
pub fn command_definitions() -> Value {
    json!([
        {
            "name": "memechannel",
            "description": "Enroll a channel for scheduled memes",
            "type": 1,
            "options": [{
                "name": "channel",
                "description": "Channel that should receive memes",
                "type": OPTION_TYPE_CHANNEL,
                "required": true
            }]
        },
        {
            "name": "meme",
            "description": "Generate a meme from a prompt",
            "type": 1,
            "options": [{
                "name": "prompt",
                "description": "What the meme should be about",
                "type": OPTION_TYPE_STRING,
                "required": true
            }]
        }
    ])
}

pub struct DiscordClient {
    http: Client,
    api_base: String,
    bot_token: String,
    delivery: ResultDelivery,
}

impl DiscordClient {
    #[must_use]
    pub fn new(bot_token: String, delivery: ResultDelivery) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            http,
            api_base: DISCORD_API_BASE.to_string(),
            bot_token,
            delivery,
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}{path}", self.api_base.trim_end_matches('/')))
            .header("Authorization", format!("Bot {}", self.bot_token))
    }

    async fn send(&self, request: RequestBuilder, what: &str) -> Result<Option<Value>, BotError> {
        let resp = request.send().await?;
        let status = resp.status();

        if !status.is_success() {
            let detail = resp.text().await.unwrap_or_default();
            return Err(BotError::ApiError(format!("discord {what} HTTP {status}: {detail}")));
        }
        if status == reqwest::StatusCode::NO_CONTENT {
            return Ok(None);
        }

        let body = resp
            .json()
            .await
            .map_err(|e| BotError::ParseError(format!("discord {what} parse: {e}")))?;
        Ok(Some(body))
    }

    /// Overwrite the application's global commands with [`command_definitions`].
    ///
    /// # Errors
    ///
    /// Returns an error if Discord rejects the registration.
    pub async fn register_commands(&self, application_id: &str) -> Result<(), BotError> {
        let request = self
            .request(Method::PUT, &format!("/applications/{application_id}/commands"))
            .json(&command_definitions());
        self.send(request, "register commands").await?;
        info!(application_id, "Registered Discord application commands");
        Ok(())
    }
}

#[async_trait]
impl ChatPlatform for DiscordClient {
    async fn fetch_recent_messages(
        &self,
        destination: &Destination,
        limit: usize,
    ) -> Result<Vec<Message>, BotError> {
        let limit = limit.clamp(1, DISCORD_HISTORY_MAX).to_string();
        let request = self
            .request(Method::GET, &format!("/channels/{}/messages", destination.channel_id))
            .query(&[("limit", limit.as_str())]);

        let body = self.send(request, "get messages").await?.unwrap_or(Value::Null);
        let messages = parse_messages(&body)?;
        debug!(
            channel_id = %destination.channel_id,
            count = messages.len(),
            "Fetched Discord history"
        );
        Ok(messages)
    }

    async fn post_message(
        &self,
        destination: &Destination,
        content: &PostContent,
    ) -> Result<MessageRef, BotError> {
        let request = self
            .request(Method::POST, &format!("/channels/{}/messages", destination.channel_id))
            .json(&build_message_body(content));

        let body = self.send(request, "create message").await?.unwrap_or(Value::Null);
        let id = body
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| BotError::ParseError("discord create message: missing id".to_string()))?;

        Ok(MessageRef {
            channel_id: destination.channel_id.clone(),
            message_id: id.to_string(),
        })
    }

    async fn update_message(
        &self,
        _destination: &Destination,
        message: &MessageRef,
        content: &PostContent,
    ) -> Result<(), BotError> {
        let request = self
            .request(
                Method::PATCH,
                &format!("/channels/{}/messages/{}", message.channel_id, message.message_id),
            )
            .json(&build_message_body(content));
        self.send(request, "edit message").await?;
        Ok(())
    }

    async fn delete_message(
        &self,
        _destination: &Destination,
        message: &MessageRef,
    ) -> Result<(), BotError> {
        let request = self.request(
            Method::DELETE,
            &format!("/channels/{}/messages/{}", message.channel_id, message.message_id),
        );
        self.send(request, "delete message").await?;
        Ok(())
    }

    fn result_delivery(&self) -> ResultDelivery {
        self.delivery
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_map_author_bot_flag_and_reactions() {
        let body = json!([
            {"id": "2", "content": "haha nice", "author": {"id": "10"},
             "reactions": [{"count": 4, "emoji": {"name": "😂"}}]},
            {"id": "1", "content": "beep", "author": {"id": "99", "bot": true}},
            {"id": "0", "content": "hook", "author": {"id": "77"}, "webhook_id": "5"}
        ]);

        let messages = parse_messages(&body).unwrap();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].author_id, "10");
        assert_eq!(messages[0].reaction_total(), 4);
        assert_eq!(messages[0].reactions[0].name, "😂");
        assert!(messages[1].is_from_bot);
        assert!(messages[2].is_from_bot);
    }

    #[test]
    fn non_array_body_is_parse_error() {
        let err = parse_messages(&json!({"message": "Missing Access"})).unwrap_err();
        assert!(matches!(err, BotError::ParseError(_)));
    }

    #[test]
    fn image_content_becomes_embed() {
        let body = build_message_body(&PostContent::image("<@1> look", "https://img/x.png"));
        assert_eq!(body["embeds"][0]["image"]["url"], "https://img/x.png");
        assert_eq!(body["allowed_mentions"]["parse"][0], "users");

        let plain = build_message_body(&PostContent::text("working on it"));
        assert_eq!(plain["embeds"].as_array().map(Vec::len), Some(0));
    }

    #[test]
    fn channel_option_is_required() {
        let commands = command_definitions();
        let enroll = &commands[0];
        assert_eq!(enroll["name"], "memechannel");
        assert_eq!(enroll["options"][0]["name"], "channel");
        assert_eq!(enroll["options"][0]["type"], 7);
        assert_eq!(enroll["options"][0]["required"], true);
    }
}
