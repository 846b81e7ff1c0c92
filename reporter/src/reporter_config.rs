use config::{Config, Source};
use lib_ticket_clients::freshdesk::FreshdeskConfig;
use serde::Deserialize;
use std::{env, path::Path};

use crate::error::AppResult;

pub const DEFAULT_PAGE_CEILING: u32 = 10;
pub const DEFAULT_ACCOUNT_SUBJECT: &str = "OSPool User - Account Creation";

fn default_page_ceiling() -> u32 {
    DEFAULT_PAGE_CEILING
}

fn default_account_subject() -> String {
    DEFAULT_ACCOUNT_SUBJECT.to_string()
}

fn default_smtp_port() -> u16 {
    25
}

#[derive(Clone, Deserialize)]
pub struct FreshdeskSettings {
    pub api_url: String,
    pub group_id: String,
    pub api_token: String,
    #[serde(default = "default_account_subject")]
    pub account_subject: String,
    /// First page index the search API refuses to serve.
    #[serde(default = "default_page_ceiling")]
    pub page_ceiling: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SmtpSettings {
    pub server: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReportSettings {
    pub sender: String,
    pub recipients: Vec<String>,
}

#[derive(Clone, Deserialize)]
pub struct ReporterConfig {
    pub freshdesk: FreshdeskSettings,
    pub smtp: SmtpSettings,
    pub report: ReportSettings,
}

impl ReporterConfig {
    /// Reads `config.toml` from `$APP_DIR`, falling back to the workspace
    /// `config/` directory, then applies environment overrides.
    pub fn load() -> AppResult<Self> {
        let root = env::var("APP_DIR").unwrap_or_else(|_| {
            let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
            let dir = manifest_dir.parent().unwrap_or(manifest_dir);
            format!("{}/config", dir.display())
        });
        let path = format!("{root}/config.toml");
        tracing::debug!("Loading config from {}", path);

        Self::from_sources(config::File::with_name(&path), |key| env::var(key).ok())
    }

    pub fn from_sources<S>(file: S, env_var: impl Fn(&str) -> Option<String>) -> AppResult<Self>
    where
        S: Source + Send + Sync + 'static,
    {
        let cfg = Config::builder()
            .add_source(file)
            .set_override_option("freshdesk.api_url", env_var("FRESHDESK_API_URL"))?
            .set_override_option("freshdesk.group_id", env_var("FRESHDESK_GROUP"))?
            .set_override_option("freshdesk.api_token", env_var("FRESHDESK_API_TOKEN"))?
            .set_override_option("smtp.server", env_var("SMTP_SERVER"))?
            .set_override_option("smtp.port", env_var("SMTP_PORT"))?
            .build()?
            .try_deserialize()?;

        Ok(cfg)
    }

    pub fn freshdesk_config(&self) -> AppResult<FreshdeskConfig> {
        let config = FreshdeskConfig::new(
            &self.freshdesk.api_url,
            self.freshdesk.group_id.clone(),
            self.freshdesk.api_token.clone(),
        )?;
        Ok(config)
    }
}

impl std::fmt::Display for ReporterConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Reporter Config:\nFreshdesk: {} (group {}, subject {:?}, page ceiling {})\n\nSMTP: {}:{}\n\nReport: {} -> {}",
            self.freshdesk.api_url,
            self.freshdesk.group_id,
            self.freshdesk.account_subject,
            self.freshdesk.page_ceiling,
            self.smtp.server,
            self.smtp.port,
            self.report.sender,
            self.report.recipients.join(", "),
        )
    }
}
