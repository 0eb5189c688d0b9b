use std::sync::Arc;

use lambda_runtime::{Error, LambdaEvent, service_fn};
use memebot::core::{config::AppConfig, services::Services};
use memebot::worker::handler;
use serde_json::Value;
use tracing::error;

#[tokio::main]
async fn main() -> Result<(), Error> {
    memebot::setup_logging();
    let config = AppConfig::from_env().map_err(|e| {
        error!("Config error: {}", e);
        Error::from(e)
    })?;
    let services = Arc::new(Services::from_config(&config).await?);

    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| {
        let services = Arc::clone(&services);
        async move { handler(&services, event).await }
    }))
    .await
}
