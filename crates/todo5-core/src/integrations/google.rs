//! Google Calendar integration.
//!
//! Reads upcoming events from a calendar and creates the events that hold
//! scheduled tasks. Uses OAuth2 against the Google Calendar API.

use async_trait::async_trait;
use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use reqwest::Client;
use serde_json::Value;

use super::keyring_store;
use super::oauth::{self, OAuthConfig};
use super::traits::{CalendarSink, CalendarSource};
use crate::error::{IntegrationError, OAuthError, ValidationError};
use crate::schedule::{CalendarEvent, EventStub};
use crate::storage::GoogleConfig;

const SERVICE: &str = "google";
const CLIENT_ID_ENTRY: &str = "google_client_id";
const CLIENT_SECRET_ENTRY: &str = "google_client_secret";

/// OAuth client credentials and token handling for Google.
pub struct GoogleAuth {
    client_id: String,
    client_secret: String,
}

impl GoogleAuth {
    /// Load credentials from keyring. Returns empty strings if not stored yet.
    pub fn new() -> Self {
        let load = |key: &str| keyring_store::get(key).ok().flatten().unwrap_or_default();
        Self {
            client_id: load(CLIENT_ID_ENTRY),
            client_secret: load(CLIENT_SECRET_ENTRY),
        }
    }

    /// Persist Google OAuth client credentials to the OS keyring.
    pub fn set_credentials(client_id: &str, client_secret: &str) -> Result<(), keyring::Error> {
        keyring_store::set(CLIENT_ID_ENTRY, client_id)?;
        keyring_store::set(CLIENT_SECRET_ENTRY, client_secret)?;
        Ok(())
    }

    fn oauth_config(&self) -> OAuthConfig {
        OAuthConfig {
            service_name: SERVICE.to_string(),
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            auth_url: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
            token_url: "https://oauth2.googleapis.com/token".to_string(),
            scopes: vec!["https://www.googleapis.com/auth/calendar.events".to_string()],
            redirect_port: 19821,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        oauth::load_tokens(SERVICE).is_some()
    }

    /// Run the interactive browser flow and store the resulting tokens.
    pub async fn authenticate(&self) -> Result<(), OAuthError> {
        if self.client_id.is_empty() || self.client_secret.is_empty() {
            return Err(OAuthError::CredentialsNotConfigured {
                service: SERVICE.to_string(),
            });
        }
        oauth::authorize(&self.oauth_config()).await?;
        Ok(())
    }

    /// Remove stored tokens and client credentials.
    pub fn disconnect(&self) -> Result<(), keyring::Error> {
        keyring_store::delete(SERVICE)?;
        keyring_store::delete(CLIENT_ID_ENTRY)?;
        keyring_store::delete(CLIENT_SECRET_ENTRY)?;
        Ok(())
    }

    /// Return a valid access token, refreshing if expired.
    pub async fn access_token(&self) -> Result<String, OAuthError> {
        let tokens = oauth::load_tokens(SERVICE).ok_or_else(|| OAuthError::NotAuthenticated {
            service: SERVICE.to_string(),
        })?;

        if !tokens.is_expired() {
            return Ok(tokens.access_token);
        }

        let refresh = tokens
            .refresh_token
            .as_deref()
            .ok_or_else(|| OAuthError::TokenRefreshFailed("no refresh token available".into()))?;

        tracing::debug!("refreshing Google access token");
        let refreshed = oauth::refresh_token(&self.oauth_config(), refresh).await?;
        Ok(refreshed.access_token)
    }
}

impl Default for GoogleAuth {
    fn default() -> Self {
        Self::new()
    }
}

/// Calendar source and sink backed by one Google calendar.
pub struct GoogleCalendarClient {
    http: Client,
    base_url: String,
    calendar_id: String,
    access_token: String,
}

impl GoogleCalendarClient {
    pub fn new(access_token: impl Into<String>, config: &GoogleConfig) -> Self {
        Self {
            http: Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            calendar_id: config.calendar_id.clone(),
            access_token: access_token.into(),
        }
    }

    /// Build a client with a fresh token from the stored OAuth credentials.
    pub async fn connect(config: &GoogleConfig) -> Result<Self, IntegrationError> {
        let token = GoogleAuth::new().access_token().await?;
        Ok(Self::new(token, config))
    }

    fn events_url(&self) -> String {
        format!(
            "{}/calendar/v3/calendars/{}/events",
            self.base_url,
            url::form_urlencoded::byte_serialize(self.calendar_id.as_bytes()).collect::<String>()
        )
    }

    /// Read a response body, turning API error payloads and bad statuses
    /// into errors.
    async fn read_json(resp: reqwest::Response) -> Result<Value, IntegrationError> {
        let status = resp.status();
        let body: Option<Value> = resp.json().await.ok();

        if let Some(err) = body.as_ref().and_then(|b| b.get("error")) {
            let message = err["message"]
                .as_str()
                .map(String::from)
                .unwrap_or_else(|| err.to_string());
            return Err(IntegrationError::Api {
                service: SERVICE,
                message,
            });
        }
        if !status.is_success() {
            return Err(IntegrationError::Status {
                service: SERVICE,
                status: status.as_u16(),
            });
        }
        body.ok_or_else(|| IntegrationError::Malformed {
            service: SERVICE,
            message: "response body is not JSON".into(),
        })
    }
}

#[async_trait]
impl CalendarSource for GoogleCalendarClient {
    async fn fetch_events(
        &self,
        time_min: DateTime<Utc>,
        time_max: DateTime<Utc>,
    ) -> Result<Vec<CalendarEvent>, IntegrationError> {
        let url = self.events_url();
        let time_min = time_min.to_rfc3339();
        let time_max = time_max.to_rfc3339();

        let mut events = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query = vec![
                ("singleEvents", "true"),
                ("orderBy", "startTime"),
                ("timeMin", time_min.as_str()),
                ("timeMax", time_max.as_str()),
            ];
            if let Some(token) = page_token.as_deref() {
                query.push(("pageToken", token));
            }

            let resp = self
                .http
                .get(&url)
                .query(&query)
                .bearer_auth(&self.access_token)
                .send()
                .await
                .map_err(IntegrationError::network(SERVICE))?;
            let body = Self::read_json(resp).await?;

            let items = body["items"]
                .as_array()
                .ok_or_else(|| IntegrationError::Malformed {
                    service: SERVICE,
                    message: "missing items in response".into(),
                })?;
            events.extend(parse_events(items));

            match body["nextPageToken"].as_str() {
                Some(next) => page_token = Some(next.to_string()),
                None => break,
            }
        }

        Ok(events)
    }
}

#[async_trait]
impl CalendarSink for GoogleCalendarClient {
    async fn create_event(&self, stub: &EventStub) -> Result<String, IntegrationError> {
        let resp = self
            .http
            .post(self.events_url())
            .bearer_auth(&self.access_token)
            .json(stub)
            .send()
            .await
            .map_err(IntegrationError::network(SERVICE))?;
        let body = Self::read_json(resp).await?;

        body["id"]
            .as_str()
            .map(String::from)
            .ok_or_else(|| IntegrationError::Malformed {
                service: SERVICE,
                message: "missing event id in response".into(),
            })
    }
}

/// Parse calendar items, skipping (and logging) any that are malformed.
pub fn parse_events(items: &[Value]) -> Vec<CalendarEvent> {
    items
        .iter()
        .enumerate()
        .filter_map(|(index, item)| match parse_event(item) {
            Ok(event) => Some(event),
            Err(e) => {
                tracing::warn!(
                    index,
                    id = item["id"].as_str().unwrap_or("?"),
                    error = %e,
                    "skipping malformed calendar event"
                );
                None
            }
        })
        .collect()
}

/// Parse one Google Calendar event resource.
///
/// Timed events use `dateTime`; all-day events use `date`, which is taken
/// as local midnight.
pub fn parse_event(item: &Value) -> Result<CalendarEvent, ValidationError> {
    let start = parse_time(&item["start"], "start")?;
    let end = parse_time(&item["end"], "end")?;
    if end < start {
        return Err(ValidationError::InvalidTimeRange { start, end });
    }

    let text = |key: &str| item[key].as_str().map(String::from);
    Ok(CalendarEvent {
        id: text("id"),
        summary: text("summary"),
        description: text("description"),
        start,
        end,
    })
}

fn parse_time(value: &Value, field: &'static str) -> Result<DateTime<Utc>, ValidationError> {
    let invalid = |message: String| ValidationError::InvalidValue {
        field: field.to_string(),
        message,
    };

    if let Some(date_time) = value["dateTime"].as_str() {
        return DateTime::parse_from_rfc3339(date_time)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| invalid(format!("{date_time}: {e}")));
    }

    if let Some(date) = value["date"].as_str() {
        let day = NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map_err(|e| invalid(format!("{date}: {e}")))?;
        return day
            .and_hms_opt(0, 0, 0)
            .and_then(|midnight| Local.from_local_datetime(&midnight).earliest())
            .map(|dt| dt.with_timezone(&Utc))
            .ok_or_else(|| invalid(format!("{date}: no local midnight")));
    }

    Err(ValidationError::MissingField(field))
}
