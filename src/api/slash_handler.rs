//! Handler for the Slack `/memechannel` slash command.

use serde_json::Value;
use tracing::{error, info};

use super::handler::ApiContext;
use super::helpers::ok_ephemeral;
use super::parsing::parse_slack_event;
use crate::errors::BotError;
use crate::slack::command_parser::parse_channel_reference;

pub const ENROLL_COMMAND: &str = "/memechannel";

/// Handle a slash command from Slack.
///
/// `/memechannel` enrolls the referenced channel (`<#C123|name>`), or the
/// channel the command was typed in when no reference is given.
///
/// # Errors
///
/// Returns `BotError::ParseError` if the body cannot be parsed.
pub async fn handle_slash_command(ctx: &ApiContext, body: &str) -> Result<Value, BotError> {
    let slack_event = parse_slack_event(body)?;

    if slack_event.command != ENROLL_COMMAND {
        info!(command = %slack_event.command, "Ignoring unknown slash command");
        return Ok(ok_ephemeral(&format!(
            "Unknown command `{}`. Try `{ENROLL_COMMAND} #channel`.",
            slack_event.command
        )));
    }

    let channel_id = parse_channel_reference(&slack_event.text)
        .unwrap_or_else(|| slack_event.channel_id.clone());

    let reply = match ctx
        .services
        .orchestrator
        .enroll(&slack_event.team_id, &channel_id)
        .await
    {
        Ok(true) => format!("<#{channel_id}> will now get memes on a schedule."),
        Ok(false) => format!("<#{channel_id}> is already enrolled."),
        Err(e) => {
            error!(
                owner_id = %slack_event.team_id,
                channel_id = %channel_id,
                "Enrollment failed: {}",
                e
            );
            "Sorry, I couldn't enroll that channel. Please try again later.".to_string()
        }
    };

    Ok(ok_ephemeral(&reply))
}
