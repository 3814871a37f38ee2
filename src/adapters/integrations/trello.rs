//! Trello adapter. Implements TaskTrackerPort by creating cards via the
//! Trello REST API.
//!
//! Watch mode uses this to turn failed deliveries into follow-up cards.

use crate::domain::DomainError;
use crate::ports::TaskTrackerPort;
use reqwest::Client;

const TRELLO_CARDS_URL: &str = "https://api.trello.com/1/cards";

/// Trello API adapter for creating follow-up cards.
///
/// Requires an API key and token from https://trello.com/app-key. Cards are
/// created in the list specified by `list_id`.
pub struct TrelloAdapter {
    client: Client,
    api_key: String,
    token: String,
    list_id: String,
}

impl TrelloAdapter {
    /// Create a new Trello adapter.
    ///
    /// # Arguments
    /// * `api_key` - Trello API key (from app key page)
    /// * `token` - Trello API token (from OAuth or token generation)
    /// * `list_id` - ID of the list where cards will be created
    pub fn new(api_key: String, token: String, list_id: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            token,
            list_id,
        }
    }
}

#[async_trait::async_trait]
impl TaskTrackerPort for TrelloAdapter {
    async fn create_task(&self, title: &str, description: &str) -> Result<(), DomainError> {
        let url = format!(
            "{}?key={}&token={}",
            TRELLO_CARDS_URL, self.api_key, self.token
        );

        let body = serde_json::json!({
            "idList": self.list_id,
            "name": title,
            "desc": description,
        });

        let res = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| DomainError::TaskTracker(format!("request failed: {}", e)))?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_else(|_| "unknown".to_string());
            return Err(DomainError::TaskTracker(format!(
                "Trello API error {}: {}",
                status, text
            )));
        }

        Ok(())
    }
}
