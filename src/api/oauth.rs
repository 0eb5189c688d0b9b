use chrono::Utc;
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::Client as HttpClient;
use serde_json::Value;
use tracing::info;

use crate::core::config::AppConfig;
use crate::core::models::WorkspaceInstallation;
use crate::errors::BotError;

const BOT_SCOPES: [&str; 6] = [
    "app_mentions:read",
    "channels:history",
    "groups:history",
    "chat:write",
    "commands",
    "reactions:read",
];

fn required<'a>(value: Option<&'a String>, name: &str) -> Result<&'a str, BotError> {
    value
        .map(String::as_str)
        .ok_or_else(|| BotError::Configuration(format!("{name} is not set")))
}

/// Slack install URL requesting the bot scopes.
///
/// # Errors
///
/// Returns `BotError::Configuration` if the client id or redirect URL is unset.
pub fn build_authorize_url(config: &AppConfig, state: &str) -> Result<String, BotError> {
    let client_id = required(config.slack_client_id.as_ref(), "SLACK_CLIENT_ID")?;
    let redirect_url = required(config.slack_redirect_url.as_ref(), "SLACK_REDIRECT_URL")?;
    let scopes = BOT_SCOPES.join(",");
    let redirect_uri = utf8_percent_encode(redirect_url, NON_ALPHANUMERIC).to_string();
    Ok(format!(
        "https://slack.com/oauth/v2/authorize?client_id={client_id}&scope={scopes}&redirect_uri={redirect_uri}&state={state}"
    ))
}

/// Map an `oauth.v2.access` body to the installation it grants.
///
/// # Errors
///
/// `ApiError` when Slack answered `ok: false`, `ParseError` when a field is missing.
pub fn parse_oauth_access(body: &Value) -> Result<WorkspaceInstallation, BotError> {
    if !body.get("ok").and_then(Value::as_bool).unwrap_or(false) {
        let err = body
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("unknown");
        return Err(BotError::ApiError(format!("oauth error: {err}")));
    }

    let field = |path: &[&str]| -> Result<String, BotError> {
        super::parsing::v_str(body, path)
            .map(ToString::to_string)
            .ok_or_else(|| BotError::ParseError(format!("oauth: missing {}", path.join("."))))
    };

    Ok(WorkspaceInstallation {
        owner_id: field(&["team", "id"])?,
        team_name: super::parsing::v_str(body, &["team", "name"])
            .unwrap_or_default()
            .to_string(),
        access_token: field(&["access_token"])?,
        bot_user_id: field(&["bot_user_id"])?,
        installed_at: Utc::now(),
    })
}

/// Exchange the OAuth code for a bot token.
///
/// # Errors
///
/// Returns an error if configuration is incomplete, the HTTP call fails, or
/// Slack rejects the code.
pub async fn handle_callback(
    config: &AppConfig,
    http: &HttpClient,
    code: &str,
) -> Result<WorkspaceInstallation, BotError> {
    let payload = [
        ("code", code),
        (
            "client_id",
            required(config.slack_client_id.as_ref(), "SLACK_CLIENT_ID")?,
        ),
        (
            "client_secret",
            required(config.slack_client_secret.as_ref(), "SLACK_CLIENT_SECRET")?,
        ),
        (
            "redirect_uri",
            required(config.slack_redirect_url.as_ref(), "SLACK_REDIRECT_URL")?,
        ),
    ];

    let resp = http
        .post("https://slack.com/api/oauth.v2.access")
        .form(&payload)
        .send()
        .await?;

    let body: Value = resp
        .json()
        .await
        .map_err(|e| BotError::ParseError(format!("oauth.v2.access parse: {e}")))?;

    let installation = parse_oauth_access(&body)?;
    info!(owner_id = %installation.owner_id, "Exchanged OAuth code for workspace token");
    Ok(installation)
}
