//! Transactional email over an HTTP JSON API

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use super::{EmailMessage, Notifier, NotifyError};

#[derive(Serialize)]
struct SendRequest<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    html: &'a str,
    text: &'a str,
}

/// Posts messages to an email provider's send endpoint
pub struct HttpEmailNotifier {
    client: Client,
    api_url: String,
    api_key: Option<String>,
    from: String,
}

impl HttpEmailNotifier {
    pub fn new(api_url: String, api_key: Option<String>, from: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_else(|_| Client::new()),
            api_url,
            api_key,
            from,
        }
    }
}

#[async_trait]
impl Notifier for HttpEmailNotifier {
    async fn send(&self, message: EmailMessage) -> Result<(), NotifyError> {
        let body = SendRequest {
            from: &self.from,
            to: &message.to,
            subject: &message.subject,
            html: &message.html,
            text: &message.text,
        };

        let mut request = self.client.post(&self.api_url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Rejected(status.as_u16()));
        }

        tracing::debug!(to = %message.to, subject = %message.subject, "Email sent");
        Ok(())
    }
}
