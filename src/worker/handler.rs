use lambda_runtime::{Error, LambdaEvent};
use serde_json::Value;
use tracing::{error, info, warn};

use crate::chat::extract_prompt;
use crate::core::models::MemeTask;
use crate::core::services::Services;
use crate::orchestrator::PostingOutcome;

/// What a worker invocation carries.
#[derive(Debug)]
pub enum WorkerEvent {
    /// SQS batch; records whose body did not parse are dropped with a log line.
    Tasks(Vec<MemeTask>),
    /// `EventBridge` schedule tick.
    Scheduled,
    Unknown,
}

fn is_scheduled_event(payload: &Value) -> bool {
    payload.get("source").and_then(Value::as_str) == Some("aws.events")
        || payload.get("detail-type").and_then(Value::as_str) == Some("Scheduled Event")
}

#[must_use]
pub fn classify_event(payload: &Value) -> WorkerEvent {
    if is_scheduled_event(payload) {
        return WorkerEvent::Scheduled;
    }

    let Some(records) = payload.get("Records").and_then(Value::as_array) else {
        return WorkerEvent::Unknown;
    };

    let tasks = records
        .iter()
        .filter_map(|record| {
            let body = record.get("body").and_then(Value::as_str)?;
            match serde_json::from_str::<MemeTask>(body) {
                Ok(task) => Some(task),
                Err(e) => {
                    error!("Failed to parse SQS message body into MemeTask: {}", e);
                    None
                }
            }
        })
        .collect();
    WorkerEvent::Tasks(tasks)
}

/// Generate and post the meme a queued mention asked for.
#[tracing::instrument(level = "info", skip(services, task), fields(correlation_id = %task.correlation_id))]
pub async fn run_task(services: &Services, task: &MemeTask) -> PostingOutcome {
    let destination = match services.destination_for(task).await {
        Ok(d) => d,
        Err(e) => {
            error!(owner_id = %task.owner_id, "Failed to resolve destination: {}", e);
            return PostingOutcome::Failed(e.to_string());
        }
    };

    let prompt = extract_prompt(&task.text);
    services
        .orchestrator
        .handle_mention(&destination, &task.mention_event(), &prompt)
        .await
}

/// Dispatch one worker payload.
pub async fn process_event(services: &Services, payload: &Value) {
    match classify_event(payload) {
        WorkerEvent::Scheduled => {
            let report = services.orchestrator.run_cycle().await;
            info!(
                destinations = report.destinations.len(),
                posted = report.posted(),
                failed = report.failed(),
                "Scheduled cycle complete"
            );
        }
        WorkerEvent::Tasks(tasks) => {
            for task in &tasks {
                let outcome = run_task(services, task).await;
                info!(correlation_id = %task.correlation_id, outcome = ?outcome, "Processed mention");
            }
        }
        WorkerEvent::Unknown => warn!("Ignoring unrecognized worker payload"),
    }
}

/// Lambda handler for the Worker entrypoint.
///
/// # Errors
///
/// Never fails in practice: per-task failures are logged so the batch is not
/// redelivered.
pub async fn handler(services: &Services, event: LambdaEvent<Value>) -> Result<(), Error> {
    info!(request_id = %event.context.request_id, "Worker Lambda received event");
    process_event(services, &event.payload).await;
    Ok(())
}
