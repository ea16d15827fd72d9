//! Account-related api endpoints

use lectern_core::domain::account::Account;
use lectern_core::dto::account::GrantCredits;
use reqwest::Url;

use crate::ApiClient;
use crate::error::{ClientError, Result};
use crate::handle_response;

impl ApiClient {
    /// Add credits to an account, creating it if needed
    ///
    /// This is the payment-confirmation hook; it never touches jobs.
    pub async fn grant_credits(&self, owner: &str, credits: i64) -> Result<Account> {
        let url = self.account_url(owner, Some("credits"))?;
        let response = self
            .client
            .post(url)
            .json(&GrantCredits { credits })
            .send()
            .await?;

        handle_response(response).await
    }

    /// Look up an account and its balance
    pub async fn get_account(&self, owner: &str) -> Result<Account> {
        let url = self.account_url(owner, None)?;
        let response = self.client.get(url).send().await?;

        handle_response(response).await
    }

    /// `/accounts/{owner}[/suffix]` with the owner percent-encoded as one segment
    fn account_url(&self, owner: &str, suffix: Option<&str>) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| ClientError::InvalidRequest(format!("Invalid base URL: {}", e)))?;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| ClientError::InvalidRequest("Base URL cannot have a path".into()))?;
            segments.pop_if_empty().push("accounts").push(owner);
            if let Some(suffix) = suffix {
                segments.push(suffix);
            }
        }
        Ok(url)
    }
}
