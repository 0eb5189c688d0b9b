//! API Lambda handler - thin router that delegates to specialized handlers.
//!
//! This module handles:
//! - Health checks
//! - OAuth routes (delegated to `oauth` module)
//! - Discord interactions (delegated to `interactions` module)
//! - Slack event callbacks (delegated to `event_handler` module)
//! - Slack slash commands (delegated to `slash_handler` module)

use std::sync::Arc;

use lambda_runtime::{Error, LambdaEvent};
use reqwest::Client as HttpClient;
use serde_json::Value;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::sqs::{SqsQueue, TaskQueue};
use super::{event_handler, helpers, interactions, oauth, parsing, slash_handler};
use crate::core::config::AppConfig;
use crate::core::services::Services;
use crate::errors::BotError;

/// Everything a request needs, built once per Lambda container.
pub struct ApiContext {
    pub config: AppConfig,
    pub services: Services,
    pub queue: Arc<dyn TaskQueue>,
    pub http: HttpClient,
}

impl ApiContext {
    #[must_use]
    pub fn new(config: AppConfig, services: Services, queue: Arc<dyn TaskQueue>) -> Self {
        Self {
            config,
            services,
            queue,
            http: HttpClient::new(),
        }
    }

    /// Load configuration and wire the collaborators it selects.
    ///
    /// # Errors
    ///
    /// Returns `BotError::Configuration` when the environment is incomplete.
    pub async fn from_env() -> Result<Self, BotError> {
        let config = AppConfig::from_env()?;
        let services = Services::from_config(&config).await?;
        let queue = Arc::new(SqsQueue::from_env(config.processing_queue_url.clone()).await);
        Ok(Self::new(config, services, queue))
    }
}

/// Lambda handler for the API entrypoint.
///
/// # Errors
///
/// Never fails in practice: malformed requests become 4xx responses.
#[tracing::instrument(level = "info", skip(ctx, event))]
pub async fn handler(ctx: &ApiContext, event: LambdaEvent<Value>) -> Result<Value, Error> {
    info!(request_id = %event.context.request_id, "API Lambda received request");
    Ok(route(ctx, &event.payload).await)
}

/// Route an API Gateway proxy event to its handler and build the response.
pub async fn route(ctx: &ApiContext, payload: &Value) -> Value {
    if let Some(path) = parsing::request_path(payload) {
        info!(raw_path = %path, "Request path");

        if path.ends_with("/health") {
            return helpers::ok_text("OK");
        }

        if path.ends_with("/auth/slack/start") {
            return handle_oauth_start(&ctx.config);
        }

        if path.ends_with("/auth/slack/callback") {
            return handle_oauth_callback(ctx, payload).await;
        }
    }

    let body = match extract_body(payload) {
        Ok(b) => b,
        Err(response) => return response,
    };

    if parsing::request_path(payload).is_some_and(|p| p.ends_with("/discord/interactions")) {
        return match serde_json::from_str::<Value>(body) {
            Ok(json_body) => interactions::handle_interaction(ctx, &json_body).await,
            Err(e) => {
                error!("Invalid interaction body: {}", e);
                helpers::err_response(400, "Invalid JSON body")
            }
        };
    }

    // Events API payloads are JSON
    if let Ok(json_body) = serde_json::from_str::<Value>(body) {
        let body_type = json_body.get("type").and_then(|t| t.as_str()).unwrap_or("");

        if body_type == "url_verification" || body_type == "event_callback" {
            return event_handler::handle_event_callback(ctx, &json_body).await;
        }
    }

    // Slash command (form-encoded)
    match slash_handler::handle_slash_command(ctx, body).await {
        Ok(response) => response,
        Err(e) => {
            error!("Failed to parse Slack command: {}", e);
            helpers::err_response(400, &format!("Parse Error: {e}"))
        }
    }
}

// ============================================================================
// OAuth Handlers
// ============================================================================

const OAUTH_STATE_COOKIE: &str = "memebot_oauth_state";

fn handle_oauth_start(config: &AppConfig) -> Value {
    let state = Uuid::new_v4().to_string();
    match oauth::build_authorize_url(config, &state) {
        Ok(url) => helpers::redirect_with_cookie(
            &url,
            &format!("{OAUTH_STATE_COOKIE}={state}; Path=/; Max-Age=600; HttpOnly; Secure; SameSite=Lax"),
        ),
        Err(e) => {
            error!("OAuth start failed: {}", e);
            helpers::err_response(500, "OAuth is not configured for this deployment")
        }
    }
}

async fn handle_oauth_callback(ctx: &ApiContext, payload: &Value) -> Value {
    let Some(code) = parsing::query_param(payload, "code") else {
        return helpers::err_response(400, "missing code");
    };

    let expected_state = parsing::cookie_value(payload, OAUTH_STATE_COOKIE);
    if expected_state.is_none() || expected_state != parsing::query_param(payload, "state") {
        warn!("OAuth callback state does not match the issued state");
        return helpers::err_response(400, "invalid state");
    }

    let xray = payload
        .get("headers")
        .and_then(|h| parsing::get_header_value(h, "X-Amzn-Trace-Id"))
        .unwrap_or("");
    info!(xray_trace_id = %xray, "Handling OAuth callback");

    let installation = match oauth::handle_callback(&ctx.config, &ctx.http, &code).await {
        Ok(installation) => installation,
        Err(e) => {
            error!("OAuth callback failed: {}", e);
            let status = if matches!(e, BotError::ApiError(_)) {
                400
            } else {
                500
            };
            return helpers::err_response(status, &format!("{e}"));
        }
    };

    if let Err(e) = ctx.services.installations.upsert(&installation).await {
        error!(owner_id = %installation.owner_id, "Failed to store installation: {}", e);
        return helpers::err_response(500, "Failed to store installation");
    }

    let team = if installation.team_name.is_empty() {
        installation.owner_id.as_str()
    } else {
        installation.team_name.as_str()
    };
    helpers::ok_html(&format!(
        "<!doctype html><html><body><h1>Memebot installed</h1>\
         <p>Memebot was added to {}. You can close this window.</p></body></html>",
        helpers::escape_html(team)
    ))
}

fn extract_body(payload: &Value) -> Result<&str, Value> {
    let Some(body) = payload.get("body") else {
        error!("Request missing body");
        return Err(helpers::err_response(400, "Missing body"));
    };

    let Some(body_str) = body.as_str() else {
        error!("Request body is not a string");
        return Err(helpers::err_response(400, "Invalid body format"));
    };

    Ok(body_str)
}
