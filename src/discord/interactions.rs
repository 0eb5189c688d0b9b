//! Parsing and replies for Discord HTTP interactions.

use serde_json::{Value, json};

use crate::errors::BotError;

const INTERACTION_PING: u64 = 1;
const INTERACTION_APPLICATION_COMMAND: u64 = 2;

const RESPONSE_PONG: u8 = 1;
const RESPONSE_CHANNEL_MESSAGE: u8 = 4;
const FLAG_EPHEMERAL: u32 = 1 << 6;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interaction {
    Ping,
    /// `/memechannel channel:<channel>`
    Enroll { guild_id: String, channel_id: String },
    /// `/meme prompt:<text>`
    Meme {
        guild_id: String,
        channel_id: String,
        user_id: String,
        prompt: String,
    },
    Unsupported(String),
}

fn option_value<'a>(data: &'a Value, name: &str) -> Option<&'a str> {
    data.get("options")
        .and_then(Value::as_array)?
        .iter()
        .find(|o| o.get("name").and_then(Value::as_str) == Some(name))
        .and_then(|o| o.get("value"))
        .and_then(Value::as_str)
}

fn str_field(body: &Value, key: &str) -> String {
    body.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Classify an interaction payload.
///
/// # Errors
///
/// Returns `BotError::ParseError` if the payload has no numeric `type`.
pub fn parse_interaction(body: &Value) -> Result<Interaction, BotError> {
    let kind = body
        .get("type")
        .and_then(Value::as_u64)
        .ok_or_else(|| BotError::ParseError("interaction: missing type".to_string()))?;

    match kind {
        INTERACTION_PING => Ok(Interaction::Ping),
        INTERACTION_APPLICATION_COMMAND => {
            let data = body.get("data").cloned().unwrap_or(Value::Null);
            let name = data.get("name").and_then(Value::as_str).unwrap_or_default();
            let guild_id = str_field(body, "guild_id");

            match name {
                "memechannel" => Ok(Interaction::Enroll {
                    guild_id,
                    channel_id: option_value(&data, "channel")
                        .unwrap_or_default()
                        .to_string(),
                }),
                "meme" => {
                    let user_id = body
                        .get("member")
                        .and_then(|m| m.get("user"))
                        .or_else(|| body.get("user"))
                        .and_then(|u| u.get("id"))
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string();
                    Ok(Interaction::Meme {
                        guild_id,
                        channel_id: str_field(body, "channel_id"),
                        user_id,
                        prompt: option_value(&data, "prompt").unwrap_or_default().to_string(),
                    })
                }
                other => Ok(Interaction::Unsupported(other.to_string())),
            }
        }
        other => Ok(Interaction::Unsupported(format!("type {other}"))),
    }
}

#[must_use]
pub fn pong() -> Value {
    json!({ "type": RESPONSE_PONG })
}

/// Channel-message response visible only to the invoking user.
#[must_use]
pub fn ephemeral_reply(text: &str) -> Value {
    json!({
        "type": RESPONSE_CHANNEL_MESSAGE,
        "data": { "content": text, "flags": FLAG_EPHEMERAL }
    })
}
