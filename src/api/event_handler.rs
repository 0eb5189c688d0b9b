//! Handler for Slack Events API callbacks.
//!
//! Answers the `url_verification` handshake and queues `app_mention` events
//! for the worker. Every other event is acknowledged and ignored.

use serde_json::{Value, json};
use tracing::{error, info};
use uuid::Uuid;

use super::handler::ApiContext;
use super::helpers::ok_empty;
use super::parsing::v_str;
use crate::core::models::MemeTask;

/// Build the queue payload for an `app_mention` event, or `None` when the
/// event should be ignored (bot authors, missing ids).
#[must_use]
pub fn mention_task(json_body: &Value) -> Option<MemeTask> {
    let event = json_body.get("event")?;
    if v_str(event, &["type"]) != Some("app_mention") {
        return None;
    }
    // Ignore bot messages to avoid loops
    if event.get("bot_id").is_some() {
        return None;
    }

    let owner_id = v_str(json_body, &["team_id"]).or_else(|| v_str(event, &["team"]))?;
    let channel_id = v_str(event, &["channel"])?;
    let author_id = v_str(event, &["user"])?;

    Some(MemeTask {
        correlation_id: Uuid::new_v4().to_string(),
        owner_id: owner_id.to_string(),
        channel_id: channel_id.to_string(),
        author_id: author_id.to_string(),
        text: v_str(event, &["text"]).unwrap_or_default().to_string(),
    })
}

/// Handle a JSON body whose `type` is `url_verification` or `event_callback`.
pub async fn handle_event_callback(ctx: &ApiContext, json_body: &Value) -> Value {
    if json_body
        .get("type")
        .and_then(|t| t.as_str())
        .is_some_and(|t| t == "url_verification")
    {
        let challenge = json_body
            .get("challenge")
            .and_then(|c| c.as_str())
            .unwrap_or("");
        return json!({
            "statusCode": 200,
            "body": challenge
        });
    }

    let Some(task) = mention_task(json_body) else {
        return ok_empty();
    };

    info!(
        correlation_id = %task.correlation_id,
        owner_id = %task.owner_id,
        channel_id = %task.channel_id,
        "Queueing mention"
    );
    if let Err(e) = ctx.queue.send(&task).await {
        error!(correlation_id = %task.correlation_id, "Failed to enqueue mention: {}", e);
    }

    // Slack retries non-2xx deliveries, so the ack is unconditional.
    ok_empty()
}
