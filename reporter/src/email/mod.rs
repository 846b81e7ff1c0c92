pub mod mailer;
pub mod templates;
