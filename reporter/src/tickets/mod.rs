mod collector;
mod normalizer;

use lib_ticket_clients::freshdesk::{Contact, RawTicket};

pub use collector::{dedup_by_requester_email, TicketCollector, TicketSource};
pub use normalizer::{extract_fields, normalize, NormalizedRecord, FIXED_COLUMNS};

/// A ticket with its requester's contact details attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichedTicket {
    pub ticket: RawTicket,
    pub requester: Contact,
}
