//! One scheduled auto-post cycle across enrolled destinations.

use futures::StreamExt;
use futures::stream;
use tracing::{error, info, warn};

use super::{MemeOrchestrator, prompt};
use crate::core::models::{Destination, PostContent};
use crate::engagement::select_most_engaging;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    Posted {
        /// `None` when the generic fallback prompt was used.
        source_message_id: Option<String>,
        result_url: String,
    },
    NoCandidate,
    /// A previous cycle still holds this destination.
    InFlight,
    FetchFailed(String),
    GenerationFailed(String),
    PostFailed(String),
}

impl CycleOutcome {
    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            CycleOutcome::FetchFailed(_)
                | CycleOutcome::GenerationFailed(_)
                | CycleOutcome::PostFailed(_)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationReport {
    pub destination: Destination,
    pub outcome: CycleOutcome,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub destinations: Vec<DestinationReport>,
}

impl CycleReport {
    #[must_use]
    pub fn posted(&self) -> usize {
        self.count(|o| matches!(o, CycleOutcome::Posted { .. }))
    }

    #[must_use]
    pub fn failed(&self) -> usize {
        self.count(CycleOutcome::is_failure)
    }

    #[must_use]
    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, CycleOutcome::NoCandidate | CycleOutcome::InFlight))
    }

    fn count(&self, pred: impl Fn(&CycleOutcome) -> bool) -> usize {
        self.destinations.iter().filter(|r| pred(&r.outcome)).count()
    }
}

impl MemeOrchestrator {
    /// Run one cycle over every enrolled destination.
    ///
    /// A registry failure yields an empty report; it is logged, not raised.
    #[tracing::instrument(level = "info", skip(self))]
    pub async fn run_cycle(&self) -> CycleReport {
        match self.registry.all_destinations().await {
            Ok(destinations) => self.run_cycle_for(&destinations).await,
            Err(e) => {
                error!("Failed to load enrolled destinations: {}", e);
                CycleReport::default()
            }
        }
    }

    /// Run one cycle over `destinations`. Report order matches input order.
    pub async fn run_cycle_for(&self, destinations: &[Destination]) -> CycleReport {
        info!(count = destinations.len(), "Starting auto-post cycle");

        let reports = stream::iter(destinations.iter().cloned())
            .map(|destination| async move {
                let outcome = self.process_destination(&destination).await;
                DestinationReport {
                    destination,
                    outcome,
                }
            })
            .buffered(self.settings.cycle_concurrency.max(1))
            .collect::<Vec<_>>()
            .await;

        let report = CycleReport {
            destinations: reports,
        };
        info!(
            posted = report.posted(),
            failed = report.failed(),
            skipped = report.skipped(),
            "Auto-post cycle finished"
        );
        report
    }

    async fn process_destination(&self, destination: &Destination) -> CycleOutcome {
        let owner_id = destination.owner_id.as_str();
        let channel_id = destination.channel_id.as_str();

        let Some(_guard) = self.in_flight.try_acquire(&destination.key()) else {
            warn!(owner_id, channel_id, "Previous cycle still running, skipping");
            return CycleOutcome::InFlight;
        };

        let messages = match self
            .chat
            .fetch_recent_messages(destination, self.settings.history_limit)
            .await
        {
            Ok(messages) => messages,
            Err(e) => {
                error!(owner_id, channel_id, "Failed to fetch recent messages: {}", e);
                return CycleOutcome::FetchFailed(e.to_string());
            }
        };

        let selection = select_most_engaging(&messages);
        let (generation_prompt, caption, source_message_id) = match selection.message() {
            Some(message) => (
                prompt::cycle_prompt(message),
                prompt::cycle_caption(message),
                Some(message.id.clone()),
            ),
            None => match &self.settings.generic_fallback_prompt {
                Some(fallback) => (fallback.clone(), prompt::GENERIC_CAPTION.to_string(), None),
                None => {
                    info!(owner_id, channel_id, "No candidate message, skipping");
                    return CycleOutcome::NoCandidate;
                }
            },
        };

        let result_url = match self.generate(&generation_prompt).await {
            Ok(url) => url,
            Err(reason) => {
                error!(owner_id, channel_id, "Skipping destination after generation failure");
                return CycleOutcome::GenerationFailed(reason);
            }
        };

        match self
            .chat
            .post_message(destination, &PostContent::image(caption, result_url.clone()))
            .await
        {
            Ok(_) => {
                info!(owner_id, channel_id, source_message_id = ?source_message_id, "Posted meme");
                CycleOutcome::Posted {
                    source_message_id,
                    result_url,
                }
            }
            Err(e) => {
                error!(owner_id, channel_id, "Failed to post meme: {}", e);
                CycleOutcome::PostFailed(e.to_string())
            }
        }
    }
}
