//! Image/meme generation collaborators.

pub mod jobs;
pub mod openai;

use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use tokio_retry::RetryIf;
use tokio_retry::strategy::FixedInterval;

use crate::core::models::{GenerationResult, JobStatus, StyleOptions};
use crate::errors::BotError;

pub use jobs::MemeJobClient;
pub use openai::OpenAiImageClient;

#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Submit `prompt` and wait for a terminal status.
    async fn generate(
        &self,
        prompt: &str,
        style: &StyleOptions,
    ) -> Result<GenerationResult, BotError>;
}

/// Bounded status polling for job-based generation services.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl RetryPolicy {
    #[must_use]
    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts,
            interval,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(20, Duration::from_secs(3))
    }
}

enum PollError {
    Pending,
    Failed(BotError),
}

/// Call `check` until it reports a non-pending status or `policy` runs out.
///
/// The first check runs immediately; each further one waits `policy.interval`.
///
/// # Errors
///
/// Returns the error from `check`, or `BotError::GenerationError` if the job
/// is still pending after `policy.max_attempts` checks.
pub async fn poll_until_terminal<F, Fut>(
    policy: &RetryPolicy,
    mut check: F,
) -> Result<GenerationResult, BotError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<GenerationResult, BotError>>,
{
    let retries = usize::try_from(policy.max_attempts.saturating_sub(1)).unwrap_or(usize::MAX);
    let strategy = FixedInterval::new(policy.interval).take(retries);

    let outcome = RetryIf::spawn(
        strategy,
        || {
            let status = check();
            async move {
                match status.await {
                    Ok(result) if result.status == JobStatus::Pending => Err(PollError::Pending),
                    Ok(result) => Ok(result),
                    Err(e) => Err(PollError::Failed(e)),
                }
            }
        },
        |e: &PollError| matches!(e, PollError::Pending),
    )
    .await;

    match outcome {
        Ok(result) => Ok(result),
        Err(PollError::Pending) => Err(BotError::GenerationError(format!(
            "job still pending after {} attempts",
            policy.max_attempts
        ))),
        Err(PollError::Failed(e)) => Err(e),
    }
}
