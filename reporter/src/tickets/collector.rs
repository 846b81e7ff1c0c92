//! Ticket Collector
//!
//! Pages through the ticket search for a date window and keeps the
//! account-creation tickets, one per requester.
//!
//! The search API stops serving results at a fixed page index no matter how
//! many tickets match. When that ceiling is reached the collector restarts at
//! page 1 with the window's end pulled back to the oldest ticket seen so far.
//! Tickets seen in the abandoned pass may be seen again; deduplication by
//! requester email is what keeps them from being counted twice.
//!
//! The search only filters by date. A single day with more tickets than fit
//! under the ceiling can't be narrowed, so the collector moves on to the
//! previous day and that day's overflow is lost.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use indexmap::IndexMap;
use lib_ticket_clients::freshdesk::{Contact, FreshdeskClient, RawTicket};

use crate::error::AppResult;

use super::EnrichedTicket;

#[async_trait]
pub trait TicketSource: Send + Sync {
    async fn search_tickets(
        &self,
        page: u32,
        window_start: NaiveDateTime,
        window_end: NaiveDateTime,
    ) -> AppResult<Vec<RawTicket>>;

    /// Resolves to `Contact::null()` when the requester can't be looked up.
    async fn fetch_contact(&self, requester_id: u64) -> AppResult<Contact>;
}

#[async_trait]
impl TicketSource for FreshdeskClient {
    async fn search_tickets(
        &self,
        page: u32,
        window_start: NaiveDateTime,
        window_end: NaiveDateTime,
    ) -> AppResult<Vec<RawTicket>> {
        let tickets = FreshdeskClient::search_tickets(self, page, window_start, window_end).await?;
        Ok(tickets)
    }

    async fn fetch_contact(&self, requester_id: u64) -> AppResult<Contact> {
        let contact = FreshdeskClient::fetch_contact(self, requester_id).await?;
        Ok(contact)
    }
}

pub struct TicketCollector<S> {
    source: S,
    subject: String,
    page_ceiling: u32,
}

impl<S: TicketSource> TicketCollector<S> {
    pub fn new(source: S, subject: impl Into<String>, page_ceiling: u32) -> Self {
        Self {
            source,
            subject: subject.into(),
            page_ceiling,
        }
    }

    /// Collects matching tickets created between the window's dates,
    /// deduplicated by requester email. The search only filters by date, so
    /// tickets from the edges of the boundary days come back too.
    pub async fn collect(
        &self,
        window_start: NaiveDateTime,
        window_end: NaiveDateTime,
    ) -> AppResult<Vec<EnrichedTicket>> {
        let mut page = 1;
        let mut current_end = window_end;
        let mut last_seen = window_start;
        let mut scanned = 0usize;
        let mut matched = Vec::new();

        loop {
            if page >= self.page_ceiling {
                // The query only carries dates, so a restart that doesn't move
                // the end date back would fetch the same pages forever.
                current_end = if last_seen.date() < current_end.date() {
                    last_seen
                } else {
                    let Some(previous_day) = current_end
                        .date()
                        .pred_opt()
                        .and_then(|day| day.and_hms_opt(23, 59, 59))
                        .filter(|end| end.date() >= window_start.date())
                    else {
                        tracing::warn!(
                            "Page ceiling {} reached on the first day of the window, tickets from {} may be incomplete",
                            self.page_ceiling,
                            current_end.date()
                        );
                        break;
                    };
                    tracing::warn!(
                        "Page ceiling {} reached within {}, tickets from that day may be incomplete",
                        self.page_ceiling,
                        current_end.date()
                    );
                    previous_day
                };

                tracing::info!(
                    "Page ceiling {} reached, restarting with window {} - {}",
                    self.page_ceiling,
                    window_start,
                    current_end
                );
                page = 1;
                continue;
            }

            let tickets = self
                .source
                .search_tickets(page, window_start, current_end)
                .await?;

            if tickets.is_empty() {
                tracing::debug!("Page {} is empty, window exhausted", page);
                break;
            }
            scanned += tickets.len();

            for ticket in tickets {
                match ticket.created_at() {
                    Ok(created) => last_seen = created,
                    Err(e) => tracing::warn!(
                        "Ticket {} has unreadable created_at {:?}: {}",
                        ticket.id,
                        ticket.created_at,
                        e
                    ),
                }

                if ticket.subject != self.subject {
                    continue;
                }

                let requester = self.source.fetch_contact(ticket.requester_id).await?;
                if requester.is_null() {
                    tracing::warn!(
                        "No contact found for requester {} of ticket {}",
                        ticket.requester_id,
                        ticket.id
                    );
                }
                matched.push(EnrichedTicket { ticket, requester });
            }

            page += 1;
        }

        let collected = dedup_by_requester_email(matched);
        tracing::info!(
            "Scanned {} tickets, collected {} unique requesters",
            scanned,
            collected.len()
        );

        Ok(collected)
    }
}

/// Keeps one ticket per requester email. A later ticket replaces an earlier
/// one but keeps the earlier one's position. Requesters without an email all
/// share a single slot.
pub fn dedup_by_requester_email(tickets: Vec<EnrichedTicket>) -> Vec<EnrichedTicket> {
    let mut by_email: IndexMap<Option<String>, EnrichedTicket> = IndexMap::new();
    for ticket in tickets {
        by_email.insert(ticket.requester.email.clone(), ticket);
    }

    by_email.into_values().collect()
}
