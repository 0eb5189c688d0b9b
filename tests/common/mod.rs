#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use memebot::api::sqs::TaskQueue;
use memebot::chat::{ChatPlatform, ResultDelivery};
use memebot::core::models::{
    Destination, GenerationResult, MemeTask, Message, MessageRef, PostContent, Reaction,
    StyleOptions,
};
use memebot::errors::BotError;
use memebot::generation::GenerationClient;
use memebot::orchestrator::{MemeOrchestrator, OrchestratorSettings};
use memebot::registry::InMemoryRegistry;

pub fn message(id: &str, author: &str, text: &str, reactions: u32) -> Message {
    Message {
        id: id.to_string(),
        author_id: author.to_string(),
        is_from_bot: false,
        text: text.to_string(),
        reactions: if reactions == 0 {
            Vec::new()
        } else {
            vec![Reaction {
                name: "joy".to_string(),
                count: reactions,
            }]
        },
    }
}

pub fn bot_message(id: &str, text: &str, reactions: u32) -> Message {
    Message {
        is_from_bot: true,
        ..message(id, "B1", text, reactions)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCall {
    Fetch(String),
    Post(String, PostContent),
    Update(String, MessageRef, PostContent),
    Delete(String, MessageRef),
}

/// In-memory chat platform recording every call.
pub struct FakeChat {
    history: HashMap<String, Vec<Message>>,
    failing_channels: HashSet<String>,
    failing_delete: bool,
    failing_image_post: bool,
    deleted: Mutex<HashSet<String>>,
    delivery: ResultDelivery,
    calls: Mutex<Vec<ChatCall>>,
    next_id: AtomicU32,
}

impl FakeChat {
    pub fn new(delivery: ResultDelivery) -> Self {
        Self {
            history: HashMap::new(),
            failing_channels: HashSet::new(),
            failing_delete: false,
            failing_image_post: false,
            deleted: Mutex::new(HashSet::new()),
            delivery,
            calls: Mutex::new(Vec::new()),
            next_id: AtomicU32::new(1),
        }
    }

    pub fn with_history(mut self, channel_id: &str, messages: Vec<Message>) -> Self {
        self.history.insert(channel_id.to_string(), messages);
        self
    }

    pub fn failing_fetch(mut self, channel_id: &str) -> Self {
        self.failing_channels.insert(channel_id.to_string());
        self
    }

    pub fn failing_delete(mut self) -> Self {
        self.failing_delete = true;
        self
    }

    /// Posts carrying an image are rejected; plain text still goes through.
    pub fn failing_image_post(mut self) -> Self {
        self.failing_image_post = true;
        self
    }

    pub fn calls(&self) -> Vec<ChatCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn posts(&self) -> Vec<(String, PostContent)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                ChatCall::Post(channel, content) => Some((channel, content)),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: ChatCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl ChatPlatform for FakeChat {
    async fn fetch_recent_messages(
        &self,
        destination: &Destination,
        limit: usize,
    ) -> Result<Vec<Message>, BotError> {
        self.record(ChatCall::Fetch(destination.channel_id.clone()));
        if self.failing_channels.contains(&destination.channel_id) {
            return Err(BotError::ApiError("channel_not_found".to_string()));
        }
        Ok(self
            .history
            .get(&destination.channel_id)
            .map(|m| m.iter().take(limit).cloned().collect())
            .unwrap_or_default())
    }

    async fn post_message(
        &self,
        destination: &Destination,
        content: &PostContent,
    ) -> Result<MessageRef, BotError> {
        self.record(ChatCall::Post(
            destination.channel_id.clone(),
            content.clone(),
        ));
        if self.failing_image_post && content.image_url.is_some() {
            return Err(BotError::ApiError("upload_failed".to_string()));
        }
        Ok(MessageRef {
            channel_id: destination.channel_id.clone(),
            message_id: format!("m{}", self.next_id.fetch_add(1, Ordering::SeqCst)),
        })
    }

    async fn update_message(
        &self,
        destination: &Destination,
        message: &MessageRef,
        content: &PostContent,
    ) -> Result<(), BotError> {
        self.record(ChatCall::Update(
            destination.channel_id.clone(),
            message.clone(),
            content.clone(),
        ));
        if self.deleted.lock().unwrap().contains(&message.message_id) {
            return Err(BotError::ApiError("message_not_found".to_string()));
        }
        Ok(())
    }

    async fn delete_message(
        &self,
        destination: &Destination,
        message: &MessageRef,
    ) -> Result<(), BotError> {
        self.record(ChatCall::Delete(
            destination.channel_id.clone(),
            message.clone(),
        ));
        if self.failing_delete {
            return Err(BotError::ApiError("cant_delete_message".to_string()));
        }
        self.deleted.lock().unwrap().insert(message.message_id.clone());
        Ok(())
    }

    fn result_delivery(&self) -> ResultDelivery {
        self.delivery
    }
}

/// Generator that succeeds unless the prompt contains `fail_marker`.
pub struct FakeGenerator {
    fail_marker: Option<String>,
    // Fail with `Err` instead of an `Error` job status.
    hard_error: bool,
    pub prompts: Mutex<Vec<String>>,
}

impl FakeGenerator {
    pub fn ok() -> Self {
        Self {
            fail_marker: None,
            hard_error: false,
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Matching prompts finish with `{status: error}`.
    pub fn failing_on(marker: &str) -> Self {
        Self {
            fail_marker: Some(marker.to_string()),
            hard_error: false,
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Matching prompts fail the call itself.
    pub fn erroring_on(marker: &str) -> Self {
        Self {
            hard_error: true,
            ..Self::failing_on(marker)
        }
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl GenerationClient for FakeGenerator {
    async fn generate(
        &self,
        prompt: &str,
        _style: &StyleOptions,
    ) -> Result<GenerationResult, BotError> {
        let n = {
            let mut prompts = self.prompts.lock().unwrap();
            prompts.push(prompt.to_string());
            prompts.len()
        };
        match &self.fail_marker {
            Some(marker) if prompt.contains(marker.as_str()) => {
                if self.hard_error {
                    Err(BotError::GenerationError("HTTP 500".to_string()))
                } else {
                    Ok(GenerationResult::failed())
                }
            }
            _ => Ok(GenerationResult::complete(format!(
                "https://img.example/{n}.png"
            ))),
        }
    }
}

#[derive(Default)]
pub struct RecordingQueue {
    pub tasks: Mutex<Vec<MemeTask>>,
}

#[async_trait]
impl TaskQueue for RecordingQueue {
    async fn send(&self, task: &MemeTask) -> Result<(), BotError> {
        self.tasks.lock().unwrap().push(task.clone());
        Ok(())
    }
}

pub fn orchestrator(
    chat: Arc<FakeChat>,
    generator: Arc<FakeGenerator>,
    registry: Arc<InMemoryRegistry>,
    settings: OrchestratorSettings,
) -> MemeOrchestrator {
    MemeOrchestrator::new(chat, generator, registry, settings)
}
