use std::sync::Arc;

use lambda_runtime::{Error, LambdaEvent, service_fn};
use memebot::api::{ApiContext, handler};
use serde_json::Value;

#[tokio::main]
async fn main() -> Result<(), Error> {
    memebot::setup_logging();
    let ctx = Arc::new(ApiContext::from_env().await?);

    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| {
        let ctx = Arc::clone(&ctx);
        async move { handler(&ctx, event).await }
    }))
    .await
}
