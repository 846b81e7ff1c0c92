use chrono::NaiveDateTime;
use serde::Deserialize;

/// Format of `created_at` in Freshdesk ticket payloads.
pub const TICKET_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// A ticket as returned by the search endpoint. Only the fields the report
/// needs are decoded, everything else in the payload is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawTicket {
    pub id: u64,
    pub subject: String,
    pub created_at: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub requester_id: u64,
}

impl RawTicket {
    pub fn description(&self) -> &str {
        self.description.as_deref().unwrap_or_default()
    }

    pub fn created_at(&self) -> Result<NaiveDateTime, chrono::ParseError> {
        NaiveDateTime::parse_from_str(&self.created_at, TICKET_TIMESTAMP_FORMAT)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Contact {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl Contact {
    /// Stand-in for a requester whose contact record could not be read.
    pub fn null() -> Self {
        Self::default()
    }

    pub fn is_null(&self) -> bool {
        self.name.is_none() && self.email.is_none()
    }
}
