//! Outcome report client (worker -> api)

use std::time::Duration;

use lectern_core::dto::callback::{CallbackAck, OutcomeReport, SIGNATURE_HEADER};
use lectern_core::signature::CallbackSecret;
use reqwest::Client;
use tracing::{info, warn};

use crate::error::{ClientError, Result};
use crate::handle_response;

/// Retry schedule for outcome delivery
///
/// Duplicate deliveries are harmless: the receiver accepts a report for an
/// already-terminal job without changing it.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
        }
    }
}

/// Signs and delivers outcome reports to the api callback endpoint
#[derive(Debug, Clone)]
pub struct CallbackClient {
    url: String,
    secret: CallbackSecret,
    client: Client,
    policy: RetryPolicy,
}

impl CallbackClient {
    /// # Arguments
    /// * `url` - Full callback URL (e.g., "http://api:8080/callback")
    /// * `secret` - Secret shared with the api
    /// * `timeout` - Per-attempt request timeout
    pub fn new(url: impl Into<String>, secret: CallbackSecret, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::InternalError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            url: url.into(),
            secret,
            client,
            policy: RetryPolicy::default(),
        })
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Deliver a report, retrying transient failures with exponential backoff
    pub async fn report(&self, report: &OutcomeReport) -> Result<CallbackAck> {
        let payload = serde_json::to_vec(report)
            .map_err(|e| ClientError::InternalError(format!("Failed to encode report: {}", e)))?;
        let signature = self
            .secret
            .sign(&payload)
            .map_err(|e| ClientError::InternalError(e.to_string()))?;

        let mut attempt = 0;
        let mut delay = self.policy.initial_delay;

        loop {
            attempt += 1;

            match self.post_raw(payload.clone(), Some(&signature)).await {
                Ok(ack) => {
                    info!(
                        job_id = %report.job_id,
                        "Callback delivered after {} attempt(s)",
                        attempt
                    );
                    return Ok(ack);
                }
                Err(e) if !e.is_retryable() => {
                    warn!(job_id = %report.job_id, "Callback rejected: {}", e);
                    return Err(e);
                }
                Err(e) => {
                    if attempt >= self.policy.max_attempts {
                        warn!(
                            job_id = %report.job_id,
                            "Callback failed after {} attempts: {}",
                            attempt,
                            e
                        );
                        return Err(e);
                    }

                    warn!(
                        job_id = %report.job_id,
                        "Callback attempt {}/{} failed: {}; retrying in {:?}",
                        attempt,
                        self.policy.max_attempts,
                        e,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    delay = (delay * 2).min(self.policy.max_delay);
                }
            }
        }
    }

    /// Send an already-encoded body with an explicit signature, no retries
    pub async fn post_raw(&self, payload: Vec<u8>, signature: Option<&str>) -> Result<CallbackAck> {
        let mut request = self
            .client
            .post(&self.url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(payload);
        if let Some(signature) = signature {
            request = request.header(SIGNATURE_HEADER, signature);
        }

        let response = request.send().await?;
        handle_response(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Bytes;
    use axum::extract::State;
    use axum::http::{HeaderMap, StatusCode};
    use axum::response::IntoResponse;
    use axum::{Json, Router, routing::post};
    use lectern_core::domain::job::JobOutcome;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};
    use uuid::Uuid;

    #[derive(Clone)]
    struct Receiver {
        hits: Arc<AtomicU32>,
        fail_first: u32,
        fail_status: StatusCode,
        secret: CallbackSecret,
    }

    async fn receive(
        State(rx): State<Receiver>,
        headers: HeaderMap,
        body: Bytes,
    ) -> axum::response::Response {
        let hit = rx.hits.fetch_add(1, Ordering::SeqCst) + 1;
        let signature = headers
            .get(SIGNATURE_HEADER)
            .and_then(|v| v.to_str().ok());
        if rx.secret.verify(&body, signature).is_err() {
            return StatusCode::UNAUTHORIZED.into_response();
        }
        if hit <= rx.fail_first {
            return rx.fail_status.into_response();
        }
        Json(CallbackAck::accepted()).into_response()
    }

    async fn spawn(fail_first: u32, fail_status: StatusCode) -> (String, Arc<AtomicU32>) {
        let hits = Arc::new(AtomicU32::new(0));
        let state = Receiver {
            hits: hits.clone(),
            fail_first,
            fail_status,
            secret: CallbackSecret::new("s3cret").unwrap(),
        };
        let router = Router::new().route("/callback", post(receive)).with_state(state);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        (format!("http://{}/callback", addr), hits)
    }

    fn client(url: String, secret: &str) -> CallbackClient {
        CallbackClient::new(url, CallbackSecret::new(secret).unwrap(), Duration::from_secs(2))
            .unwrap()
            .with_retry_policy(RetryPolicy {
                max_attempts: 3,
                initial_delay: Duration::from_millis(10),
                max_delay: Duration::from_millis(40),
            })
    }

    fn report() -> OutcomeReport {
        OutcomeReport {
            job_id: Uuid::new_v4(),
            outcome: JobOutcome::failed("PROCESSING_ERROR", "vision API error"),
        }
    }

    #[tokio::test]
    async fn test_report_delivered_first_try() {
        let (url, hits) = spawn(0, StatusCode::OK).await;
        let ack = client(url, "s3cret").report(&report()).await.unwrap();
        assert!(ack.ok);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_transient_failures_are_retried() {
        let (url, hits) = spawn(2, StatusCode::SERVICE_UNAVAILABLE).await;
        let ack = client(url, "s3cret").report(&report()).await.unwrap();
        assert!(ack.ok);
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let (url, hits) = spawn(10, StatusCode::BAD_GATEWAY).await;
        let err = client(url, "s3cret").report(&report()).await.unwrap_err();
        assert!(err.is_server_error());
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_auth_rejection_is_not_retried() {
        let (url, hits) = spawn(0, StatusCode::OK).await;
        let err = client(url, "wrong-secret").report(&report()).await.unwrap_err();
        assert!(matches!(err, ClientError::ApiError { status: 401, .. }));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
