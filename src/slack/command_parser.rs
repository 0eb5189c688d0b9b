use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Fields Slack sends with a slash command that the bot acts on.
#[derive(Debug, Deserialize, Serialize)]
pub struct SlackCommandEvent {
    pub team_id: String,
    pub team_domain: String,
    pub channel_id: String,
    pub channel_name: String,
    pub user_id: String,
    pub command: String,
    pub text: String,
    pub response_url: String,
}

/// Decodes URL encoded string using `percent_encoding` crate
///
/// # Errors
///
/// Returns an error message if the decoded bytes are not valid UTF-8.
///
/// # Examples
///
/// ```
/// use memebot::slack::command_parser::decode_url_component;
///
/// let decoded_plus = decode_url_component("hello+world").unwrap();
/// assert_eq!(decoded_plus, "hello world");
/// ```
pub fn decode_url_component(input: &str) -> Result<String, String> {
    // '+' means space in form encoding; convert before percent-decoding so an
    // encoded plus (%2B) survives.
    let spaced = input.replace('+', " ");
    percent_decode_str(&spaced)
        .decode_utf8()
        .map(|s| s.to_string())
        .map_err(|e| format!("Failed to decode URL component: {e}"))
}

/// Split a form-encoded body into decoded key/value pairs.
///
/// # Errors
///
/// Returns an error message if any key or value fails to decode.
pub fn parse_form_pairs(form_data: &str) -> Result<HashMap<String, String>, String> {
    let mut map: HashMap<String, String> = HashMap::new();

    for pair in form_data.split('&') {
        if let Some((raw_key, raw_value)) = pair.split_once('=') {
            let key = decode_url_component(raw_key)
                .map_err(|e| format!("Failed to decode key: {e}"))?;
            let value = decode_url_component(raw_value)
                .map_err(|e| format!("Failed to decode value: {e}"))?;
            map.insert(key, value);
        }
    }

    Ok(map)
}

/// Parses URL-encoded form data into a `SlackCommandEvent` structure.
///
/// # Errors
///
/// Returns an error message if decoding fails.
///
/// # Examples
///
/// ```
/// use memebot::slack::command_parser::parse_form_data;
///
/// let form_data = "team_id=T123&team_domain=example&\
///                  channel_id=C123&channel_name=general&user_id=U123&\
///                  command=%2Fmemechannel&text=&\
///                  response_url=https%3A%2F%2Fhooks.slack.com%2F";
///
/// let event = parse_form_data(form_data).unwrap();
/// assert_eq!(event.command, "/memechannel");
/// assert_eq!(event.channel_name, "general");
/// ```
pub fn parse_form_data(form_data: &str) -> Result<SlackCommandEvent, String> {
    let map = parse_form_pairs(form_data)?;
    let field = |name: &str| map.get(name).cloned().unwrap_or_default();

    Ok(SlackCommandEvent {
        team_id: field("team_id"),
        team_domain: field("team_domain"),
        channel_id: field("channel_id"),
        channel_name: field("channel_name"),
        user_id: field("user_id"),
        command: field("command"),
        text: field("text"),
        response_url: field("response_url"),
    })
}

/// Channel id from a Slack channel reference such as `<#C123|general>` or `<#C123>`.
#[must_use]
pub fn parse_channel_reference(text: &str) -> Option<String> {
    text.split_whitespace().find_map(|tok| {
        let inner = tok.strip_prefix("<#")?.strip_suffix('>')?;
        let id = inner.split('|').next()?;
        (!id.is_empty()).then(|| id.to_string())
    })
}
