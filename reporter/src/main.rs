#![allow(dead_code)]
mod email;
mod error;
mod report;
mod reporter_config;
#[cfg(test)]
mod testing;
mod tickets;

use chrono::Utc;
use clap::Parser;
use lib_ticket_clients::freshdesk::FreshdeskClient;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    email::mailer::SmtpMailer,
    report::{CsvReportWriter, ReportJob, ReportOutcome, ReportingPeriod},
    reporter_config::ReporterConfig,
    tickets::TicketCollector,
};

/// Emails the monthly report of Freshdesk account creation requests.
#[derive(Debug, Parser)]
#[command(name = "fresh-ticket-report", version)]
struct Args {
    /// Month to report on (1-12). Defaults to the previous calendar month.
    #[arg(long, requires = "year", value_parser = clap::value_parser!(u32).range(1..=12))]
    month: Option<u32>,
    /// Year of the month to report on.
    #[arg(long, requires = "month")]
    year: Option<i32>,
}

impl Args {
    fn period(&self) -> error::AppResult<ReportingPeriod> {
        match (self.month, self.year) {
            (Some(month), Some(year)) => ReportingPeriod::for_month(month, year),
            _ => ReportingPeriod::previous_month(Utc::now().date_naive()),
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::Layer::default().with_ansi(false))
        .init();

    let args = Args::parse();
    let config = ReporterConfig::load()?;
    tracing::info!("{}", config);

    let period = args.period()?;

    let http_client = reqwest::ClientBuilder::new().use_rustls_tls().build()?;
    let freshdesk = FreshdeskClient::new(http_client, config.freshdesk_config()?);
    let collector = TicketCollector::new(
        freshdesk,
        config.freshdesk.account_subject.clone(),
        config.freshdesk.page_ceiling,
    );

    let job = ReportJob::new(
        config.report.clone(),
        collector,
        SmtpMailer::new(&config.smtp),
        CsvReportWriter,
    );

    match job.run(&period).await? {
        ReportOutcome::Delivered { rows } => {
            tracing::info!("Report for {} delivered ({} rows)", period.label(), rows);
        }
        ReportOutcome::FailureNotified => {
            tracing::warn!("Report for {} failed, failure notice sent", period.label());
        }
    }

    Ok(())
}
