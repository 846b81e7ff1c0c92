use std::borrow::Cow;

use chrono::NaiveDateTime;
use indexmap::IndexMap;
use regex::Regex;

use crate::error::{AppError, AppResult};

use super::EnrichedTicket;

pub const COL_NAME: &str = "ft_name";
pub const COL_EMAIL: &str = "ft_email";
pub const COL_CREATED: &str = "ft_created";
pub const COL_TAGS: &str = "ft_tags";

pub const FIXED_COLUMNS: [&str; 4] = [COL_NAME, COL_EMAIL, COL_CREATED, COL_TAGS];

pub const CREATED_DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

lazy_static::lazy_static!(
    static ref RE_FIELD_HEADER: Regex = Regex::new(r"(?s)<h3>(.*?)</h3>").unwrap();
    static ref RE_FIELD_VALUE: Regex = Regex::new(r"(?s)\A\s*<div>(.*?)</div>").unwrap();
);

/// One report row: the fixed requester columns plus whatever form fields the
/// ticket body carried, in the order they appeared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedRecord {
    pub name: Option<String>,
    pub email: Option<String>,
    pub created: NaiveDateTime,
    pub tags: String,
    pub fields: IndexMap<String, String>,
}

impl NormalizedRecord {
    pub fn cell(&self, column: &str) -> Option<Cow<'_, str>> {
        match column {
            COL_NAME => self.name.as_deref().map(Cow::Borrowed),
            COL_EMAIL => self.email.as_deref().map(Cow::Borrowed),
            COL_CREATED => Some(Cow::Owned(
                self.created.format(CREATED_DISPLAY_FORMAT).to_string(),
            )),
            COL_TAGS => Some(Cow::Borrowed(self.tags.as_str())),
            other => self.fields.get(other).map(|v| Cow::Borrowed(v.as_str())),
        }
    }
}

pub fn normalize(enriched: &EnrichedTicket) -> AppResult<NormalizedRecord> {
    let ticket = &enriched.ticket;
    let created = ticket.created_at().map_err(|e| {
        AppError::Parse(format!(
            "ticket {} has created_at {:?}: {}",
            ticket.id, ticket.created_at, e
        ))
    })?;

    let mut fields = extract_fields(ticket.description());
    fields.retain(|key, _| {
        let fixed = FIXED_COLUMNS.contains(&key.as_str());
        if fixed {
            tracing::debug!("Ticket {} form field {:?} shadows a fixed column", ticket.id, key);
        }
        !fixed
    });

    Ok(NormalizedRecord {
        name: enriched.requester.name.clone(),
        email: enriched.requester.email.clone(),
        created,
        tags: ticket.tags.join(";"),
        fields,
    })
}

/// Pulls `<h3>key</h3><div>value</div>` pairs out of a ticket body. Only a
/// header directly followed by a div (whitespace aside) counts. Keys and
/// values are trimmed; a repeated key keeps its last value.
pub fn extract_fields(html: &str) -> IndexMap<String, String> {
    let mut fields = IndexMap::new();

    for header in RE_FIELD_HEADER.captures_iter(html) {
        let (Some(whole), Some(key)) = (header.get(0), header.get(1)) else {
            continue;
        };
        let Some(value) = RE_FIELD_VALUE
            .captures(&html[whole.end()..])
            .and_then(|c| c.get(1))
        else {
            continue;
        };

        fields.insert(
            key.as_str().trim().to_string(),
            value.as_str().trim().to_string(),
        );
    }

    fields
}
