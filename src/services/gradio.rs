// src/services/gradio.rs
// Two-step Gradio queue API: submit a job, then read its event stream.
use crate::errors::ApiError;
use crate::services::sse::SseScanner;
use futures_util::StreamExt;
use log::{debug, warn};
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            delay: Duration::from_millis(500),
        }
    }
}

#[derive(Debug, Deserialize)]
struct QueueResponse {
    event_id: Option<String>,
}

pub struct GradioClient {
    client: Client,
    retry: RetryPolicy,
}

impl GradioClient {
    pub fn new(client: Client, retry: RetryPolicy) -> Self {
        Self { client, retry }
    }

    /// Runs the job and returns the decoded `complete` payload. Only transport
    /// failures and 5xx queue answers are retried.
    pub async fn call(
        &self,
        base_url: &str,
        endpoint: &str,
        data: Value,
        token: Option<&str>,
    ) -> Result<Value, ApiError> {
        let attempts = self.retry.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.call_once(base_url, endpoint, &data, token).await {
                Err(err) if err.is_retryable() && attempt < attempts => {
                    warn!(
                        "Gradio call {}/{} failed (attempt {}/{}): {}",
                        base_url, endpoint, attempt, attempts, err
                    );
                    tokio::time::sleep(self.retry.delay).await;
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    fn with_auth(builder: RequestBuilder, token: Option<&str>) -> RequestBuilder {
        match token.map(str::trim).filter(|t| !t.is_empty()) {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn call_once(
        &self,
        base_url: &str,
        endpoint: &str,
        data: &Value,
        token: Option<&str>,
    ) -> Result<Value, ApiError> {
        let base = base_url.trim_end_matches('/');
        let queue_url = format!("{}/gradio_api/call/{}", base, endpoint);

        let queue = Self::with_auth(self.client.post(&queue_url), token)
            .json(&json!({ "data": data }))
            .send()
            .await?;

        let status = queue.status();
        if !status.is_success() {
            let message = format!("Queue request failed: {}", status.as_u16());
            return Err(if status.is_server_error() {
                ApiError::Transport(message)
            } else {
                ApiError::Provider(message)
            });
        }

        let queued: QueueResponse = queue.json().await?;
        let event_id = queued
            .event_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ApiError::Provider("No event_id returned".to_string()))?;
        debug!("Gradio job queued at {} with event {}", queue_url, event_id);

        let result = Self::with_auth(
            self.client.get(format!("{}/{}", queue_url, event_id)),
            token,
        )
        .send()
        .await?;

        let status = result.status();
        if !status.is_success() {
            let message = format!("Result request failed: {}", status.as_u16());
            return Err(if status.is_server_error() {
                ApiError::Transport(message)
            } else {
                ApiError::Provider(message)
            });
        }

        let mut scanner = SseScanner::new();
        let mut stream = result.bytes_stream();
        while let Some(chunk) = stream.next().await {
            if let Some(outcome) = scanner.feed(&chunk?) {
                return outcome;
            }
        }
        scanner.finish()
    }
}
