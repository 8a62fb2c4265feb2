//! Outbound notifications
//!
//! Delivery is best effort: callers log failures and carry on.

mod email;
pub mod templates;

use async_trait::async_trait;
use thiserror::Error;

pub use email::HttpEmailNotifier;

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("Email request failed: {0}")]
    Transport(String),

    #[error("Email API rejected message with status {0}")]
    Rejected(u16),

    #[error("No delivery channel for {0}")]
    NoChannel(String),
}

/// An email ready to send
#[derive(Debug, Clone, PartialEq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
    pub text: String,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, message: EmailMessage) -> Result<(), NotifyError>;
}

/// Writes messages to the log instead of sending them
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, message: EmailMessage) -> Result<(), NotifyError> {
        tracing::info!(to = %message.to, subject = %message.subject, "Email delivery disabled, message logged");
        Ok(())
    }
}
