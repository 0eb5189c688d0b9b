use memebot::core::{config::AppConfig, services::Services};
use memebot::worker::run_schedule;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), memebot::BotError> {
    memebot::setup_logging();
    let config = AppConfig::from_env().inspect_err(|e| error!("Config error: {}", e))?;
    let services = Services::from_config(&config).await?;

    info!(
        interval_secs = config.schedule_interval.as_secs(),
        "Starting meme scheduler"
    );
    run_schedule(&services.orchestrator, config.schedule_interval, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for shutdown signal: {}", e);
        }
    })
    .await;
    Ok(())
}
