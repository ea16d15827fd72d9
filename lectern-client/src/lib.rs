//! Lectern HTTP Clients
//!
//! Type-safe HTTP clients for the three network hops of a job:
//! - [`ApiClient`]: client / CLI -> api (submit, poll, credits)
//! - [`WorkerClient`]: api -> worker dispatch
//! - [`CallbackClient`]: worker -> api signed outcome report
//!
//! # Example
//!
//! ```no_run
//! use lectern_client::ApiClient;
//! use lectern_core::dto::job::SubmitJob;
//!
//! #[tokio::main]
//! async fn main() -> lectern_client::Result<()> {
//!     let client = ApiClient::new("http://localhost:8080");
//!
//!     let submitted = client.submit_job(&SubmitJob {
//!         owner: "a@x.com".to_string(),
//!         input_reference: "uploads/f.pdf".to_string(),
//!         options: Default::default(),
//!     }).await?;
//!
//!     println!("Submitted job: {}", submitted.job_id);
//!     Ok(())
//! }
//! ```

mod accounts;
mod callback;
pub mod error;
mod jobs;
mod worker;

// Re-export commonly used types
pub use callback::{CallbackClient, RetryPolicy};
pub use error::{ClientError, Result};
pub use jobs::{MIN_POLL_INTERVAL, WaitOutcome};
pub use worker::WorkerClient;

use lectern_core::dto::error::ErrorBody;
use reqwest::Client;
use serde::de::DeserializeOwned;

/// HTTP client for the Lectern api
///
/// Methods are organized into logical groups:
/// - Job lifecycle (submit, poll, wait, redispatch)
/// - Accounts (credit grants, balance lookup)
#[derive(Debug, Clone)]
pub struct ApiClient {
    /// Base URL of the api (e.g., "http://localhost:8080")
    base_url: String,
    /// HTTP client instance
    client: Client,
}

impl ApiClient {
    /// Create a new api client
    ///
    /// # Example
    /// ```
    /// use lectern_client::ApiClient;
    ///
    /// let client = ApiClient::new("http://localhost:8080");
    /// ```
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a new api client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Get the base URL of the api
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

// =============================================================================
// Response Handlers
// =============================================================================

/// Check the status code and deserialize the JSON body
pub(crate) async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let response = check_status(response).await?;

    response
        .json()
        .await
        .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
}

/// Check the status code, discarding any body on success
pub(crate) async fn handle_empty_response(response: reqwest::Response) -> Result<()> {
    check_status(response).await.map(|_| ())
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let error_text = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());

    match serde_json::from_str::<ErrorBody>(&error_text) {
        Ok(body) => Err(ClientError::api_error(
            status.as_u16(),
            Some(body.code),
            body.error,
        )),
        Err(_) => Err(ClientError::api_error(status.as_u16(), None, error_text)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = ApiClient::new("http://localhost:8080");
        assert_eq!(client.base_url(), "http://localhost:8080");
    }

    #[test]
    fn test_client_trims_trailing_slash() {
        let client = ApiClient::new("http://localhost:8080/");
        assert_eq!(client.base_url(), "http://localhost:8080");
    }

    #[test]
    fn test_client_with_custom_client() {
        let http_client = Client::new();
        let client = ApiClient::with_client("http://localhost:8080", http_client);
        assert_eq!(client.base_url(), "http://localhost:8080");
    }
}
