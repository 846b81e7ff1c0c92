//! Report Job
//!
//! One run of the monthly report: collect the period's tickets, build the
//! table, export it and mail it out. Whatever goes wrong along the way ends
//! in a failure email instead of a report.

use crate::{
    email::{
        mailer::{Mailer, OutgoingEmail},
        templates::{failure_body, report_subject, FAILURE_SUBJECT, REPORT_BODY},
    },
    error::{AppError, AppResult},
    reporter_config::ReportSettings,
    tickets::{normalize, TicketCollector, TicketSource},
};

use super::{
    period::ReportingPeriod,
    summary::summarize,
    table::{ReportTable, ReportWriter},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportOutcome {
    Delivered { rows: usize },
    FailureNotified,
}

pub struct ReportJob<S, M, W> {
    settings: ReportSettings,
    collector: TicketCollector<S>,
    mailer: M,
    writer: W,
}

impl<S, M, W> ReportJob<S, M, W>
where
    S: TicketSource,
    M: Mailer,
    W: ReportWriter,
{
    pub fn new(
        settings: ReportSettings,
        collector: TicketCollector<S>,
        mailer: M,
        writer: W,
    ) -> Self {
        Self {
            settings,
            collector,
            mailer,
            writer,
        }
    }

    /// Builds and sends the report, or the failure email if that fails.
    /// Only an error sending the failure email is returned.
    pub async fn run(&self, period: &ReportingPeriod) -> AppResult<ReportOutcome> {
        match self.build_report(period).await {
            Ok(rows) => Ok(ReportOutcome::Delivered { rows }),
            Err(e) => {
                tracing::error!("Report for {} failed: {}", period.label(), e);
                self.mailer.send(&self.failure_email(&e)).await?;
                tracing::info!("Failure notification sent");
                Ok(ReportOutcome::FailureNotified)
            }
        }
    }

    pub async fn build_report(&self, period: &ReportingPeriod) -> AppResult<usize> {
        tracing::info!(
            "Building report for {} - {}",
            period.start,
            period.end
        );

        let tickets = self.collector.collect(period.start, period.end).await?;
        let records = tickets.iter().map(normalize).collect::<AppResult<Vec<_>>>()?;

        let collected = records.len();
        let table = ReportTable::from_records(&records).filter_period(period);
        if table.len() < collected {
            tracing::info!(
                "Dropped {} record(s) created outside the period",
                collected - table.len()
            );
        }
        tracing::info!("\n{}", summarize(&table, period));

        // Removed when `tmp` drops, on every return path below.
        let tmp = tempfile::tempdir()?;
        let report_path = tmp.path().join(period.file_name());
        self.writer.write(&table, &report_path)?;

        let email = OutgoingEmail {
            from: self.settings.sender.clone(),
            to: self.settings.recipients.clone(),
            subject: report_subject(period),
            body: REPORT_BODY.to_string(),
            attachments: vec![report_path],
        };
        self.mailer.send(&email).await?;
        tracing::info!("Report {} sent with {} row(s)", period.file_name(), table.len());

        Ok(table.len())
    }

    fn failure_email(&self, error: &AppError) -> OutgoingEmail {
        OutgoingEmail {
            from: self.settings.sender.clone(),
            to: self.settings.recipients.clone(),
            subject: FAILURE_SUBJECT.to_string(),
            body: failure_body(error),
            attachments: vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::table::CsvReportWriter;
    use crate::testing::common::{
        contact, report_settings, ticket, FailingWriter, FakeTicketSource, RecordingMailer,
        ACCOUNT_SUBJECT,
    };

    fn august() -> ReportingPeriod {
        ReportingPeriod::for_month(8, 2024).unwrap()
    }

    fn august_source() -> FakeTicketSource {
        let mut in_period = ticket(1, ACCOUNT_SUBJECT, "2024-08-20T10:00:00Z", 100);
        in_period.description =
            Some("<h3>Institution</h3>\n<div> MIT </div>\n<h3>PI</h3>\n<div>Hopper</div>".into());
        in_period.tags = vec!["ospool".into()];

        FakeTicketSource::with_pages(vec![vec![
            in_period,
            ticket(2, ACCOUNT_SUBJECT, "2024-08-01T00:00:00Z", 101),
            // over-fetched, the table filter has to drop it
            ticket(3, ACCOUNT_SUBJECT, "2024-07-31T23:59:59Z", 102),
        ]])
        .with_contact(100, contact("Ada", "ada@example.edu"))
        .with_contact(101, contact("Grace", "grace@example.edu"))
        .with_contact(102, contact("Edsger", "edsger@example.edu"))
    }

    fn job<W: ReportWriter>(
        source: FakeTicketSource,
        mailer: RecordingMailer,
        writer: W,
    ) -> ReportJob<FakeTicketSource, RecordingMailer, W> {
        ReportJob::new(
            report_settings(),
            TicketCollector::new(source, ACCOUNT_SUBJECT, 10),
            mailer,
            writer,
        )
    }

    #[tokio::test]
    async fn test_report_sent() {
        let mailer = RecordingMailer::new();
        let job = job(august_source(), mailer.clone(), CsvReportWriter);

        let outcome = job.run(&august()).await.unwrap();

        assert_eq!(outcome, ReportOutcome::Delivered { rows: 2 });
        let sent = mailer.sent();
        assert_eq!(sent.len(), 1);

        let email = &sent[0].email;
        assert_eq!(email.subject, "Fresh Ticket Monthly Report (2024-08-01 - 2024-08-31)");
        assert_eq!(email.from, "reports@example.edu");
        assert_eq!(email.to, report_settings().recipients);
        assert_eq!(email.body, REPORT_BODY);
        assert_eq!(email.attachments.len(), 1);
        assert!(email.attachments[0].ends_with("osg-account-report-2024-08-01-2024-08-31.csv"));

        assert_eq!(
            sent[0].attachments[0],
            "ft_name,ft_email,ft_created,ft_tags,Institution,PI\n\
             Ada,ada@example.edu,2024-08-20 10:00:00,ospool,MIT,Hopper\n\
             Grace,grace@example.edu,2024-08-01 00:00:00,,,\n"
        );
    }

    #[tokio::test]
    async fn test_temp_dir_removed_after_run() {
        let mailer = RecordingMailer::new();
        let job = job(august_source(), mailer.clone(), CsvReportWriter);

        job.run(&august()).await.unwrap();

        let report_path = &mailer.sent()[0].email.attachments[0];
        assert!(!report_path.exists());
        assert!(!report_path.parent().unwrap().exists());
    }

    #[tokio::test]
    async fn test_export_failure_sends_only_failure_email() {
        let mailer = RecordingMailer::new();
        let job = job(august_source(), mailer.clone(), FailingWriter);

        let outcome = job.run(&august()).await.unwrap();

        assert_eq!(outcome, ReportOutcome::FailureNotified);
        let sent = mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].email.subject, FAILURE_SUBJECT);
        assert!(sent[0].email.attachments.is_empty());
        assert!(sent[0].email.body.contains("disk full"));
    }

    #[tokio::test]
    async fn test_collection_failure_is_reported() {
        let mailer = RecordingMailer::new();
        let source =
            FakeTicketSource::new(|_| Err(AppError::Transport("401 Unauthorized".into())));
        let job = job(source, mailer.clone(), CsvReportWriter);

        let outcome = job.run(&august()).await.unwrap();

        assert_eq!(outcome, ReportOutcome::FailureNotified);
        let sent = mailer.sent();
        assert_eq!(sent.len(), 1);
        assert!(sent[0]
            .email
            .body
            .ends_with("Errors Recorded: Could not reach Freshdesk: 401 Unauthorized"));
    }

    #[tokio::test]
    async fn test_bad_timestamp_is_reported() {
        let mailer = RecordingMailer::new();
        let source = FakeTicketSource::with_pages(vec![vec![ticket(
            5,
            ACCOUNT_SUBJECT,
            "last tuesday",
            100,
        )]]);
        let job = job(source, mailer.clone(), CsvReportWriter);

        let outcome = job.run(&august()).await.unwrap();

        assert_eq!(outcome, ReportOutcome::FailureNotified);
        assert!(mailer.sent()[0].email.body.contains("Could not parse ticket"));
    }

    #[tokio::test]
    async fn test_empty_period_still_sends_header_only_report() {
        let mailer = RecordingMailer::new();
        let job = job(FakeTicketSource::with_pages(vec![]), mailer.clone(), CsvReportWriter);

        let outcome = job.run(&august()).await.unwrap();

        assert_eq!(outcome, ReportOutcome::Delivered { rows: 0 });
        assert_eq!(
            mailer.sent()[0].attachments[0],
            "ft_name,ft_email,ft_created,ft_tags\n"
        );
    }

    #[tokio::test]
    async fn test_failure_email_error_is_returned() {
        let job = job(august_source(), RecordingMailer::failing(), CsvReportWriter);

        let err = job.run(&august()).await.unwrap_err();

        assert!(matches!(err, AppError::Delivery(_)));
    }
}
