use derive_more::derive::Display;
use lib_ticket_clients::freshdesk::FreshdeskError;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Display)]
pub enum AppError {
    #[display("Could not reach Freshdesk: {_0}")]
    Transport(String),
    #[display("Unexpected response from Freshdesk: {_0}")]
    MalformedResponse(String),
    #[display("Could not parse ticket: {_0}")]
    Parse(String),
    #[display("Could not export report: {_0}")]
    Export(String),
    #[display("Could not send email: {_0}")]
    Delivery(String),
    #[display("Invalid configuration: {_0}")]
    Config(String),
    #[display("Bad request: {_0}")]
    BadRequest(String),
}

impl std::error::Error for AppError {}

impl From<FreshdeskError> for AppError {
    fn from(error: FreshdeskError) -> Self {
        match error {
            FreshdeskError::Transport(e) => {
                tracing::error!("Freshdesk transport error: {:?}", e);
                AppError::Transport(e.to_string())
            }
            FreshdeskError::MalformedResponse(msg) => AppError::MalformedResponse(msg),
            FreshdeskError::InvalidUrl(e) => AppError::Config(format!("api_url: {e}")),
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        AppError::Export(error.to_string())
    }
}

impl From<config::ConfigError> for AppError {
    fn from(error: config::ConfigError) -> Self {
        AppError::Config(error.to_string())
    }
}

impl From<lettre::address::AddressError> for AppError {
    fn from(error: lettre::address::AddressError) -> Self {
        AppError::Delivery(format!("invalid address: {error}"))
    }
}

impl From<lettre::error::Error> for AppError {
    fn from(error: lettre::error::Error) -> Self {
        AppError::Delivery(format!("could not build message: {error}"))
    }
}

impl From<lettre::transport::smtp::Error> for AppError {
    fn from(error: lettre::transport::smtp::Error) -> Self {
        tracing::error!("SMTP error: {:?}", error);
        AppError::Delivery(error.to_string())
    }
}
