use chrono::{NaiveDate, NaiveDateTime};
use reqwest::{header::CONTENT_TYPE, StatusCode};
use serde::Deserialize;
use url::Url;

use super::types::{Contact, RawTicket};

/// Freshdesk ignores the password when authenticating with an API key.
const API_KEY_PASSWORD: &str = "X";

#[derive(Debug, thiserror::Error)]
pub enum FreshdeskError {
    #[error("Freshdesk request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Unexpected Freshdesk response: {0}")]
    MalformedResponse(String),
    #[error("Invalid Freshdesk url: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

pub type FreshdeskResult<T> = Result<T, FreshdeskError>;

#[derive(Clone)]
pub struct FreshdeskConfig {
    pub api_url: Url,
    pub group_id: String,
    pub api_token: String,
}

impl FreshdeskConfig {
    pub fn new(
        api_url: &str,
        group_id: impl Into<String>,
        api_token: impl Into<String>,
    ) -> FreshdeskResult<Self> {
        // Url::join drops the last path segment unless the base ends in '/'
        let api_url = if api_url.ends_with('/') {
            Url::parse(api_url)?
        } else {
            Url::parse(&format!("{api_url}/"))?
        };

        Ok(Self {
            api_url,
            group_id: group_id.into(),
            api_token: api_token.into(),
        })
    }
}

impl std::fmt::Debug for FreshdeskConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FreshdeskConfig")
            .field("api_url", &self.api_url.as_str())
            .field("group_id", &self.group_id)
            .field("api_token", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    results: Vec<RawTicket>,
}

#[derive(Debug, Clone)]
pub struct FreshdeskClient {
    http_client: reqwest::Client,
    config: FreshdeskConfig,
}

impl FreshdeskClient {
    pub fn new(http_client: reqwest::Client, config: FreshdeskConfig) -> Self {
        Self {
            http_client,
            config,
        }
    }

    pub fn config(&self) -> &FreshdeskConfig {
        &self.config
    }

    /// One page of tickets in the configured group created inside the window.
    /// An empty page means the window is exhausted.
    pub async fn search_tickets(
        &self,
        page: u32,
        window_start: NaiveDateTime,
        window_end: NaiveDateTime,
    ) -> FreshdeskResult<Vec<RawTicket>> {
        let url = self.config.api_url.join("search/tickets")?;
        let query = search_query(
            &self.config.group_id,
            window_start.date(),
            window_end.date(),
        );
        tracing::debug!("Searching tickets page {} with query {}", page, query);

        let resp = self
            .http_client
            .get(url)
            .query(&[("query", query), ("page", page.to_string())])
            .basic_auth(&self.config.api_token, Some(API_KEY_PASSWORD))
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await?
            .error_for_status()?;

        let body = resp.text().await?;
        parse_search_response(&body)
    }

    /// Looks up a requester. A non-success status is treated as "no contact"
    /// rather than an error so a single bad requester can't sink the run.
    pub async fn fetch_contact(&self, requester_id: u64) -> FreshdeskResult<Contact> {
        let url = self
            .config
            .api_url
            .join(&format!("contacts/{requester_id}"))?;

        let resp = self
            .http_client
            .get(url)
            .basic_auth(&self.config.api_token, Some(API_KEY_PASSWORD))
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await?;

        let status = resp.status();
        let body = if status.is_success() {
            resp.text().await?
        } else {
            tracing::debug!("Contact {} lookup returned {}", requester_id, status);
            String::new()
        };

        contact_from_response(status, &body)
    }
}

/// Freshdesk search query for a group's tickets created on or between the two
/// dates (`:>` and `:<` are inclusive). The whole query has to be wrapped in
/// double quotes.
pub fn search_query(group_id: &str, start: NaiveDate, end: NaiveDate) -> String {
    format!(
        "\"group_id:{} AND created_at:>'{}' AND created_at:<'{}'\"",
        group_id,
        start.format("%Y-%m-%d"),
        end.format("%Y-%m-%d")
    )
}

pub fn parse_search_response(body: &str) -> FreshdeskResult<Vec<RawTicket>> {
    serde_json::from_str::<SearchResponse>(body)
        .map(|resp| resp.results)
        .map_err(|e| FreshdeskError::MalformedResponse(format!("search response: {e}")))
}

pub fn contact_from_response(status: StatusCode, body: &str) -> FreshdeskResult<Contact> {
    if !status.is_success() {
        return Ok(Contact::null());
    }

    serde_json::from_str::<Contact>(body)
        .map_err(|e| FreshdeskError::MalformedResponse(format!("contact response: {e}")))
}
