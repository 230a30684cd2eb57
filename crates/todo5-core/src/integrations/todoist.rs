//! Todoist task source, via the REST v2 API.

use async_trait::async_trait;
use reqwest::Client;

use super::keyring_store;
use super::traits::TaskSource;
use crate::error::IntegrationError;
use crate::schedule::Task;
use crate::storage::TodoistConfig;

const SERVICE: &str = "todoist";
const API_KEY_ENTRY: &str = "todoist_api_key";

/// Environment override for the stored API key.
pub const API_KEY_ENV: &str = "TODOIST_API_KEY";

pub struct TodoistClient {
    http: Client,
    base_url: String,
    api_key: String,
    filter: String,
}

impl TodoistClient {
    pub fn new(api_key: impl Into<String>, config: &TodoistConfig) -> Self {
        Self {
            http: Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            filter: config.filter.clone(),
        }
    }

    /// Build a client from the stored API key.
    ///
    /// `TODOIST_API_KEY` takes precedence over the keyring entry.
    pub fn from_stored_credentials(config: &TodoistConfig) -> Result<Self, IntegrationError> {
        let api_key = Self::stored_api_key()
            .ok_or(IntegrationError::MissingCredentials { service: SERVICE })?;
        Ok(Self::new(api_key, config))
    }

    pub fn stored_api_key() -> Option<String> {
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.is_empty() {
                return Some(key);
            }
        }
        match keyring_store::get(API_KEY_ENTRY) {
            Ok(key) => key.filter(|k| !k.is_empty()),
            Err(e) => {
                tracing::warn!(error = %e, "could not read Todoist API key from keyring");
                None
            }
        }
    }

    /// Persist the API key to the OS keyring.
    pub fn set_api_key(api_key: &str) -> Result<(), keyring::Error> {
        keyring_store::set(API_KEY_ENTRY, api_key)
    }

    pub fn clear_api_key() -> Result<(), keyring::Error> {
        keyring_store::delete(API_KEY_ENTRY)
    }
}

#[async_trait]
impl TaskSource for TodoistClient {
    async fn fetch_tasks(&self) -> Result<Vec<Task>, IntegrationError> {
        let url = format!("{}/rest/v2/tasks", self.base_url);
        let resp = self
            .http
            .get(&url)
            .query(&[("filter", self.filter.as_str())])
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(IntegrationError::network(SERVICE))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(IntegrationError::Status {
                service: SERVICE,
                status: status.as_u16(),
            });
        }

        let body: serde_json::Value = resp
            .json()
            .await
            .map_err(IntegrationError::network(SERVICE))?;
        let items = body.as_array().ok_or_else(|| IntegrationError::Malformed {
            service: SERVICE,
            message: "expected a JSON array of tasks".into(),
        })?;

        Ok(parse_tasks(items))
    }
}

/// Parse task records, skipping (and logging) any that are malformed.
pub fn parse_tasks(items: &[serde_json::Value]) -> Vec<Task> {
    items
        .iter()
        .enumerate()
        .filter_map(|(index, item)| match serde_json::from_value::<Task>(item.clone()) {
            Ok(task) => Some(task),
            Err(e) => {
                tracing::warn!(index, error = %e, "skipping malformed task");
                None
            }
        })
        .collect()
}
