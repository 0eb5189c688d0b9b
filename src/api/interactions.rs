//! Handler for Discord HTTP interactions.

use serde_json::Value;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::handler::ApiContext;
use super::helpers::{err_response, ok_json};
use crate::core::models::MemeTask;
use crate::discord::interactions::{Interaction, ephemeral_reply, parse_interaction, pong};

pub async fn handle_interaction(ctx: &ApiContext, body: &Value) -> Value {
    let interaction = match parse_interaction(body) {
        Ok(i) => i,
        Err(e) => {
            error!("Failed to parse interaction: {}", e);
            return err_response(400, &format!("Parse Error: {e}"));
        }
    };

    match interaction {
        Interaction::Ping => ok_json(&pong()),
        Interaction::Enroll {
            guild_id,
            channel_id,
        } => {
            let reply = match ctx.services.orchestrator.enroll(&guild_id, &channel_id).await {
                Ok(true) => format!("<#{channel_id}> will now get memes on a schedule."),
                Ok(false) => format!("<#{channel_id}> is already enrolled."),
                Err(e) => {
                    error!(owner_id = %guild_id, channel_id = %channel_id, "Enrollment failed: {}", e);
                    "Sorry, I couldn't enroll that channel.".to_string()
                }
            };
            ok_json(&ephemeral_reply(&reply))
        }
        Interaction::Meme {
            guild_id,
            channel_id,
            user_id,
            prompt,
        } => {
            let task = MemeTask {
                correlation_id: Uuid::new_v4().to_string(),
                owner_id: guild_id,
                channel_id,
                author_id: user_id,
                text: prompt,
            };
            info!(correlation_id = %task.correlation_id, "Queueing /meme request");
            match ctx.queue.send(&task).await {
                Ok(()) => ok_json(&ephemeral_reply("On it! Your meme is being generated.")),
                Err(e) => {
                    error!(correlation_id = %task.correlation_id, "Failed to enqueue /meme: {}", e);
                    ok_json(&ephemeral_reply("Sorry, I couldn't start that meme."))
                }
            }
        }
        Interaction::Unsupported(name) => {
            warn!(command = %name, "Unsupported interaction");
            ok_json(&ephemeral_reply("That command isn't supported."))
        }
    }
}
