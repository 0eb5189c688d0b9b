use tracing::{error, info, warn};

use super::{MemeOrchestrator, prompt};
use crate::core::models::{Destination, MentionEvent, MessageRef, PostContent};
use crate::errors::BotError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostingOutcome {
    Posted { result_url: String },
    /// The request carried no prompt text; the user was told so.
    Rejected,
    Failed(String),
}

impl MemeOrchestrator {
    /// Interactive path: turn `prompt` into a meme and post it where `event` came from.
    ///
    /// `destination` carries the workspace token for multi-workspace installs.
    #[tracing::instrument(
        level = "info",
        skip(self, destination, event, raw_prompt),
        fields(owner_id = %event.owner_id, channel_id = %event.channel_id)
    )]
    pub async fn handle_mention(
        &self,
        destination: &Destination,
        event: &MentionEvent,
        raw_prompt: &str,
    ) -> PostingOutcome {
        let user_prompt = prompt::sanitize_prompt(raw_prompt);
        if user_prompt.is_empty() {
            info!(author_id = %event.author_id, "Rejecting mention: {}", BotError::EmptyInput);
            if let Err(e) = self
                .chat
                .post_message(destination, &PostContent::text(prompt::EMPTY_PROMPT_TEXT))
                .await
            {
                warn!("Failed to post empty-prompt notice: {}", e);
            }
            return PostingOutcome::Rejected;
        }

        let placeholder = match self
            .chat
            .post_message(destination, &PostContent::text(prompt::PLACEHOLDER_TEXT))
            .await
        {
            Ok(placeholder) => placeholder,
            Err(e) => {
                error!("Failed to post placeholder: {}", e);
                return PostingOutcome::Failed(e.to_string());
            }
        };

        let result_url = match self.generate(&user_prompt).await {
            Ok(url) => url,
            Err(reason) => {
                self.show_failure(destination, &placeholder).await;
                return PostingOutcome::Failed(reason);
            }
        };

        let content = PostContent::image(
            prompt::mention_caption(&event.author_id, &user_prompt),
            result_url.clone(),
        );
        match self
            .chat
            .replace_placeholder(destination, &placeholder, &content)
            .await
        {
            Ok(_) => {
                info!("Posted requested meme");
                PostingOutcome::Posted { result_url }
            }
            Err(e) => {
                error!("Failed to deliver meme: {}", e);
                self.show_failure(destination, &placeholder).await;
                PostingOutcome::Failed(e.to_string())
            }
        }
    }

    /// Leave a visible failure notice: edit the placeholder, or post anew if it is gone.
    async fn show_failure(&self, destination: &Destination, placeholder: &MessageRef) {
        let notice = PostContent::text(prompt::FAILURE_TEXT);
        let Err(e) = self
            .chat
            .update_message(destination, placeholder, &notice)
            .await
        else {
            return;
        };
        warn!("Placeholder not editable, posting failure notice: {}", e);
        if let Err(e) = self.chat.post_message(destination, &notice).await {
            error!("Failed to post failure notice: {}", e);
        }
    }
}
