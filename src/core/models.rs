use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single emoji reaction on a chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reaction {
    pub name: String,
    pub count: u32,
}

/// A chat message as seen by the engagement selector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub author_id: String,
    pub is_from_bot: bool,
    pub text: String,
    #[serde(default)]
    pub reactions: Vec<Reaction>,
}

impl Message {
    #[must_use]
    pub fn reaction_total(&self) -> u64 {
        self.reactions.iter().map(|r| u64::from(r.count)).sum()
    }
}

/// A channel enrolled for scheduled auto-posts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Destination {
    /// Slack team id or Discord guild id.
    pub owner_id: String,
    pub channel_id: String,
    /// Workspace-scoped bot token from an OAuth installation, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
}

impl Destination {
    #[must_use]
    pub fn new(owner_id: impl Into<String>, channel_id: impl Into<String>) -> Self {
        Self {
            owner_id: owner_id.into(),
            channel_id: channel_id.into(),
            access_token: None,
        }
    }

    #[must_use]
    pub fn with_access_token(mut self, token: Option<String>) -> Self {
        self.access_token = token;
        self
    }

    /// Key used for the per-destination in-flight flag.
    #[must_use]
    pub fn key(&self) -> String {
        format!("{}/{}", self.owner_id, self.channel_id)
    }
}

/// Durable record written when a workspace installs the app via OAuth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceInstallation {
    pub owner_id: String,
    pub team_name: String,
    pub access_token: String,
    pub bot_user_id: String,
    pub installed_at: DateTime<Utc>,
}

/// Handle to a message the bot posted, used for later edits or deletion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRef {
    pub channel_id: String,
    pub message_id: String,
}

/// Content of an outgoing chat message.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PostContent {
    pub text: String,
    pub image_url: Option<String>,
}

impl PostContent {
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            image_url: None,
        }
    }

    #[must_use]
    pub fn image(text: impl Into<String>, image_url: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            image_url: Some(image_url.into()),
        }
    }
}

/// Terminal or intermediate state of an external generation job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Complete,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationResult {
    pub status: JobStatus,
    pub result_url: Option<String>,
}

impl GenerationResult {
    #[must_use]
    pub fn complete(url: impl Into<String>) -> Self {
        Self {
            status: JobStatus::Complete,
            result_url: Some(url.into()),
        }
    }

    #[must_use]
    pub fn failed() -> Self {
        Self {
            status: JobStatus::Error,
            result_url: None,
        }
    }

    /// The result URL when the job completed with a usable image.
    #[must_use]
    pub fn success_url(&self) -> Option<&str> {
        match self.status {
            JobStatus::Complete => self
                .result_url
                .as_deref()
                .map(str::trim)
                .filter(|u| !u.is_empty()),
            JobStatus::Pending | JobStatus::Error => None,
        }
    }
}

/// Style hints forwarded to the generation service.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleOptions {
    pub style: Option<String>,
    pub size: Option<String>,
}

/// A mention or `/meme` command delivered by the chat platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MentionEvent {
    pub owner_id: String,
    pub channel_id: String,
    pub author_id: String,
    pub text: String,
}

/// Queue payload handed from the API Lambda to the worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemeTask {
    pub correlation_id: String,
    pub owner_id: String,
    pub channel_id: String,
    pub author_id: String,
    pub text: String,
}

impl MemeTask {
    #[must_use]
    pub fn mention_event(&self) -> MentionEvent {
        MentionEvent {
            owner_id: self.owner_id.clone(),
            channel_id: self.channel_id.clone(),
            author_id: self.author_id.clone(),
            text: self.text.clone(),
        }
    }
}
