mod client;
mod types;

pub use client::{
    contact_from_response, parse_search_response, search_query, FreshdeskClient, FreshdeskConfig,
    FreshdeskError, FreshdeskResult,
};
pub use types::{Contact, RawTicket, TICKET_TIMESTAMP_FORMAT};
