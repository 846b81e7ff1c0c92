use std::{
    collections::HashMap,
    path::Path,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use chrono::NaiveDateTime;
use lib_ticket_clients::freshdesk::{Contact, RawTicket};

use crate::{
    email::mailer::{Mailer, OutgoingEmail},
    error::{AppError, AppResult},
    report::table::{ReportTable, ReportWriter},
    reporter_config::ReportSettings,
    tickets::TicketSource,
};

pub const ACCOUNT_SUBJECT: &str = "OSPool User - Account Creation";

pub fn datetime(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
}

pub fn ticket(id: u64, subject: &str, created_at: &str, requester_id: u64) -> RawTicket {
    RawTicket {
        id,
        subject: subject.to_string(),
        created_at: created_at.to_string(),
        description: None,
        tags: vec![],
        requester_id,
    }
}

pub fn contact(name: &str, email: &str) -> Contact {
    Contact {
        name: Some(name.to_string()),
        email: Some(email.to_string()),
    }
}

pub fn report_settings() -> ReportSettings {
    ReportSettings {
        sender: "reports@example.edu".to_string(),
        recipients: vec![
            "reports@example.edu".to_string(),
            "desk@example.edu".to_string(),
        ],
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchCall {
    pub page: u32,
    pub window_start: NaiveDateTime,
    pub window_end: NaiveDateTime,
}

type Responder = dyn Fn(&SearchCall) -> AppResult<Vec<RawTicket>> + Send + Sync;

/// Ticket source driven by a closure. Requesters without a registered
/// contact behave like a 404 from the contacts endpoint.
#[derive(Clone)]
pub struct FakeTicketSource {
    responder: Arc<Responder>,
    contacts: HashMap<u64, Contact>,
    calls: Arc<Mutex<Vec<SearchCall>>>,
    contact_lookups: Arc<Mutex<Vec<u64>>>,
}

impl FakeTicketSource {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&SearchCall) -> AppResult<Vec<RawTicket>> + Send + Sync + 'static,
    {
        Self {
            responder: Arc::new(responder),
            contacts: HashMap::new(),
            calls: Arc::new(Mutex::new(vec![])),
            contact_lookups: Arc::new(Mutex::new(vec![])),
        }
    }

    /// Serves `pages[n - 1]` for page `n` whatever the window, then empty pages.
    pub fn with_pages(pages: Vec<Vec<RawTicket>>) -> Self {
        Self::new(move |call| {
            Ok(pages
                .get(call.page as usize - 1)
                .cloned()
                .unwrap_or_default())
        })
    }

    pub fn with_contact(mut self, requester_id: u64, contact: Contact) -> Self {
        self.contacts.insert(requester_id, contact);
        self
    }

    pub fn calls(&self) -> Vec<SearchCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn contact_lookups(&self) -> Vec<u64> {
        self.contact_lookups.lock().unwrap().clone()
    }
}

#[async_trait]
impl TicketSource for FakeTicketSource {
    async fn search_tickets(
        &self,
        page: u32,
        window_start: NaiveDateTime,
        window_end: NaiveDateTime,
    ) -> AppResult<Vec<RawTicket>> {
        let call = SearchCall {
            page,
            window_start,
            window_end,
        };
        self.calls.lock().unwrap().push(call.clone());
        (self.responder)(&call)
    }

    async fn fetch_contact(&self, requester_id: u64) -> AppResult<Contact> {
        self.contact_lookups.lock().unwrap().push(requester_id);
        Ok(self
            .contacts
            .get(&requester_id)
            .cloned()
            .unwrap_or_else(Contact::null))
    }
}

#[derive(Debug, Clone)]
pub struct SentEmail {
    pub email: OutgoingEmail,
    /// Attachment contents read at send time, the files are gone afterwards.
    pub attachments: Vec<String>,
}

/// Records every email instead of sending it. With `failing()` every send
/// errors, as an unreachable relay would.
#[derive(Clone, Default)]
pub struct RecordingMailer {
    sent: Arc<Mutex<Vec<SentEmail>>>,
    fail: bool,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<SentEmail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: &OutgoingEmail) -> AppResult<()> {
        if self.fail {
            return Err(AppError::Delivery("connection refused".to_string()));
        }

        let attachments = email
            .attachments
            .iter()
            .map(std::fs::read_to_string)
            .collect::<Result<Vec<_>, _>>()?;

        self.sent.lock().unwrap().push(SentEmail {
            email: email.clone(),
            attachments,
        });
        Ok(())
    }
}

pub struct FailingWriter;

impl ReportWriter for FailingWriter {
    fn write(&self, _table: &ReportTable, path: &Path) -> AppResult<()> {
        Err(AppError::Export(format!(
            "disk full writing {}",
            path.display()
        )))
    }
}
