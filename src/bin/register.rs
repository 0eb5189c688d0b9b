//! Registers the `/memechannel` and `/meme` Discord application commands.

use anyhow::{Context, Result};
use memebot::chat::ResultDelivery;
use memebot::discord::DiscordClient;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    memebot::setup_logging();

    let token = std::env::var("DISCORD_BOT_TOKEN").context("DISCORD_BOT_TOKEN is not set")?;
    let application_id =
        std::env::var("DISCORD_APPLICATION_ID").context("DISCORD_APPLICATION_ID is not set")?;

    DiscordClient::new(token, ResultDelivery::EditInPlace)
        .register_commands(&application_id)
        .await
        .context("failed to register Discord commands")?;

    info!(application_id = %application_id, "Registered Discord commands");
    Ok(())
}
