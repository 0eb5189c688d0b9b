use async_trait::async_trait;
use aws_sdk_sqs::Client as SqsClient;

use crate::core::models::MemeTask;
use crate::errors::BotError;

/// Hand-off from the API Lambda to the worker.
#[async_trait]
pub trait TaskQueue: Send + Sync {
    async fn send(&self, task: &MemeTask) -> Result<(), BotError>;
}

pub struct SqsQueue {
    client: SqsClient,
    queue_url: Option<String>,
}

impl SqsQueue {
    #[must_use]
    pub fn new(client: SqsClient, queue_url: Option<String>) -> Self {
        Self { client, queue_url }
    }

    pub async fn from_env(queue_url: Option<String>) -> Self {
        let shared_config = aws_config::from_env().load().await;
        Self::new(SqsClient::new(&shared_config), queue_url)
    }
}

#[async_trait]
impl TaskQueue for SqsQueue {
    /// # Errors
    ///
    /// Returns an error if no queue is configured, serialization fails, or the
    /// message cannot be sent to SQS.
    async fn send(&self, task: &MemeTask) -> Result<(), BotError> {
        let queue_url = self.queue_url.as_deref().ok_or_else(|| {
            BotError::Configuration("PROCESSING_QUEUE_URL is not set".to_string())
        })?;
        let message_body = serde_json::to_string(task)
            .map_err(|e| BotError::ParseError(format!("Failed to serialize task: {e}")))?;

        self.client
            .send_message()
            .queue_url(queue_url)
            .message_body(message_body)
            .send()
            .await
            .map_err(|e| BotError::AwsError(format!("Failed to send message to SQS: {e}")))?;
        Ok(())
    }
}
