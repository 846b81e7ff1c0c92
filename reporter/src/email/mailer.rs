use std::path::PathBuf;

use async_trait::async_trait;
use lettre::{
    message::{
        header::ContentType, Attachment as LettreAttachment, MultiPart as LettreMultiPart,
        SinglePart as LettreSinglePart,
    },
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use crate::{
    error::{AppError, AppResult},
    reporter_config::SmtpSettings,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub body: String,
    pub attachments: Vec<PathBuf>,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> AppResult<()>;
}

/// Sends through an unauthenticated SMTP relay.
#[derive(Clone)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    pub fn new(settings: &SmtpSettings) -> Self {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&settings.server)
            .port(settings.port)
            .build();

        Self { transport }
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: &OutgoingEmail) -> AppResult<()> {
        let message = build_message(email).await?;
        tracing::info!(
            "Sending {:?} to {} recipient(s)",
            email.subject,
            email.to.len()
        );
        self.transport.send(message).await?;
        Ok(())
    }
}

pub async fn build_message(email: &OutgoingEmail) -> AppResult<Message> {
    let mut builder = Message::builder()
        .from(email.from.parse()?)
        .subject(email.subject.clone());

    for recipient in &email.to {
        builder = builder.to(recipient.parse().map_err(|e| {
            AppError::Delivery(format!("Invalid recipient '{}': {}", recipient, e))
        })?);
    }

    if email.attachments.is_empty() {
        return Ok(builder
            .header(ContentType::TEXT_PLAIN)
            .body(email.body.clone())?);
    }

    let body_part = LettreSinglePart::builder()
        .header(ContentType::TEXT_PLAIN)
        .body(email.body.clone());
    let mut multipart = LettreMultiPart::mixed().singlepart(body_part);

    for path in &email.attachments {
        let content = tokio::fs::read(path).await.map_err(|e| {
            AppError::Delivery(format!("Could not read attachment {}: {}", path.display(), e))
        })?;
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| "report.csv".to_string());
        let content_type: ContentType = "text/csv".parse().unwrap_or(ContentType::TEXT_PLAIN);

        multipart = multipart.singlepart(LettreAttachment::new(filename).body(content, content_type));
    }

    Ok(builder.multipart(multipart)?)
}
