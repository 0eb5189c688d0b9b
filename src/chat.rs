//! Chat platform abstraction used by the orchestrator.

use async_trait::async_trait;
use regex::Regex;
use std::sync::LazyLock;

use crate::core::models::{Destination, Message, MessageRef, PostContent};
use crate::errors::BotError;

/// How a "generating…" placeholder gives way to the finished image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultDelivery {
    /// Delete the placeholder, then post the result as a new message.
    DeleteThenPost,
    /// Edit the placeholder so it carries the result as an attachment.
    EditInPlace,
}

#[async_trait]
pub trait ChatPlatform: Send + Sync {
    /// Fetch up to `limit` recent messages, most recent first.
    async fn fetch_recent_messages(
        &self,
        destination: &Destination,
        limit: usize,
    ) -> Result<Vec<Message>, BotError>;

    async fn post_message(
        &self,
        destination: &Destination,
        content: &PostContent,
    ) -> Result<MessageRef, BotError>;

    async fn update_message(
        &self,
        destination: &Destination,
        message: &MessageRef,
        content: &PostContent,
    ) -> Result<(), BotError>;

    async fn delete_message(
        &self,
        destination: &Destination,
        message: &MessageRef,
    ) -> Result<(), BotError>;

    fn result_delivery(&self) -> ResultDelivery;

    /// Swap a placeholder for the final content according to [`ResultDelivery`].
    async fn replace_placeholder(
        &self,
        destination: &Destination,
        placeholder: &MessageRef,
        content: &PostContent,
    ) -> Result<MessageRef, BotError> {
        match self.result_delivery() {
            ResultDelivery::DeleteThenPost => {
                self.delete_message(destination, placeholder).await?;
                self.post_message(destination, content).await
            }
            ResultDelivery::EditInPlace => {
                self.update_message(destination, placeholder, content)
                    .await?;
                Ok(placeholder.clone())
            }
        }
    }
}

// Slack: <@U123> or <@U123|name>. Discord: <@123>, <@!123>, <@&123>.
static MENTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<@[!&]?[A-Za-z0-9]+(\|[^>]*)?>").expect("static regex compile"));

/// Strip every user/role mention token from `text` and trim what is left.
#[must_use]
pub fn extract_prompt(text: &str) -> String {
    let stripped = MENTION_RE.replace_all(text, " ");
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Mention syntax understood by both Slack and Discord.
#[must_use]
pub fn mention(user_id: &str) -> String {
    format!("<@{user_id}>")
}
