//! Client for job-based meme APIs: submit a prompt, then poll the job.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, info};

use super::{GenerationClient, RetryPolicy, poll_until_terminal};
use crate::core::models::{GenerationResult, JobStatus, StyleOptions};
use crate::errors::BotError;

/// Job ids arrive as strings from some services and as integers from others.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum JobId {
    Text(String),
    Number(u64),
}

impl From<JobId> for String {
    fn from(id: JobId) -> Self {
        match id {
            JobId::Text(s) => s,
            JobId::Number(n) => n.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CreateJobResponse {
    #[serde(alias = "id")]
    job_id: JobId,
}

#[derive(Debug, Deserialize)]
struct JobStatusResponse {
    status: String,
    #[serde(default, alias = "url", alias = "image_url")]
    result_url: Option<String>,
}

fn map_status(raw: &str) -> JobStatus {
    match raw.to_ascii_lowercase().as_str() {
        "complete" | "completed" | "succeeded" | "done" => JobStatus::Complete,
        "error" | "failed" | "cancelled" => JobStatus::Error,
        _ => JobStatus::Pending,
    }
}

pub struct MemeJobClient {
    http: Client,
    base_url: String,
    api_key: Option<String>,
    policy: RetryPolicy,
}

impl MemeJobClient {
    #[must_use]
    pub fn new(base_url: String, api_key: Option<String>, policy: RetryPolicy) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            policy,
        }
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    /// Submit a generation job and return its id.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response carries no job id.
    pub async fn create(&self, prompt: &str, style: &StyleOptions) -> Result<String, BotError> {
        let mut payload = json!({ "prompt": prompt });
        if let Some(s) = &style.style {
            payload["style"] = Value::String(s.clone());
        }
        if let Some(size) = &style.size {
            payload["size"] = Value::String(size.clone());
        }

        let resp = self
            .authorized(self.http.post(format!("{}/jobs", self.base_url)))
            .json(&payload)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(BotError::GenerationError(format!(
                "create job HTTP {}",
                resp.status()
            )));
        }

        let body: CreateJobResponse = resp
            .json()
            .await
            .map_err(|e| BotError::GenerationError(format!("create job parse: {e}")))?;
        Ok(body.job_id.into())
    }

    /// Fetch the current status of a job.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body cannot be parsed.
    pub async fn get_status(&self, job_id: &str) -> Result<GenerationResult, BotError> {
        let resp = self
            .authorized(
                self.http
                    .get(format!("{}/jobs/{job_id}", self.base_url)),
            )
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(BotError::GenerationError(format!(
                "job status HTTP {}",
                resp.status()
            )));
        }

        let body: JobStatusResponse = resp
            .json()
            .await
            .map_err(|e| BotError::GenerationError(format!("job status parse: {e}")))?;

        Ok(GenerationResult {
            status: map_status(&body.status),
            result_url: body.result_url,
        })
    }
}

#[async_trait]
impl GenerationClient for MemeJobClient {
    async fn generate(
        &self,
        prompt: &str,
        style: &StyleOptions,
    ) -> Result<GenerationResult, BotError> {
        let job_id = self.create(prompt, style).await?;
        info!(job_id = %job_id, "Submitted meme generation job");

        let client = self;
        let id = job_id.as_str();
        let result = poll_until_terminal(&self.policy, move || {
            debug!(job_id = %id, "Polling meme job");
            client.get_status(id)
        })
        .await?;

        info!(job_id = %job_id, status = ?result.status, "Meme job finished");
        Ok(result)
    }
}
