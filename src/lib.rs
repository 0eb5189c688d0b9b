/// Memebot - Slack and Discord bots that turn chat into memes.
///
/// The crate backs two Lambdas plus two helper binaries:
/// 1. An API Lambda that answers health checks, the Slack OAuth flow, Slack
///    events and slash commands, and Discord interactions, queueing meme
///    requests on SQS
/// 2. A Worker Lambda that generates requested memes and runs the scheduled
///    auto-post cycle across enrolled channels
///
/// # Architecture
///
/// The system uses:
/// - AWS Lambda for serverless execution
/// - SQS for task queuing between Lambdas
/// - SSM Parameter Store for enrolled channels and workspace installs
/// - slack-morphism and the Discord REST API for chat access
/// - an image generation API (`OpenAI` images or a job-based meme API)
/// - Tokio for async runtime
///
/// # Example
///
/// ```no_run
/// use memebot::core::config::AppConfig;
/// use memebot::core::services::Services;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     memebot::setup_logging();
///
///     let config = AppConfig::from_env()?;
///     let services = Services::from_config(&config).await?;
///
///     services.orchestrator.enroll("T123", "C123").await?;
///     let report = services.orchestrator.run_cycle().await;
///     println!("posted {} memes", report.posted());
///     Ok(())
/// }
/// ```
// Module declarations
pub mod api;
pub mod chat;
pub mod core;
pub mod discord;
pub mod engagement;
pub mod errors;
pub mod generation;
pub mod orchestrator;
pub mod registry;
pub mod slack;
pub mod worker;

pub use errors::BotError;
pub use orchestrator::MemeOrchestrator;

/// Configure structured logging with JSON format for AWS Lambda environments.
///
/// Sets up tracing-subscriber with a JSON formatter suitable for `CloudWatch`
/// Logs. The level comes from `RUST_LOG` and defaults to `info`. Calling it
/// more than once keeps the first subscriber.
///
/// # Example
///
/// ```
/// memebot::setup_logging();
/// memebot::setup_logging();
/// ```
pub fn setup_logging() {
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::prelude::*;

    let default_level = if cfg!(feature = "debug-logs") {
        "debug"
    } else {
        "info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let fmt_layer = tracing_subscriber::fmt::layer().json().with_target(true);

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}
