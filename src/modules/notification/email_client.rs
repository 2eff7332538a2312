use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, info};

use super::Notifier;
use crate::core::config::EmailConfig;
use crate::core::error::AppError;

/// Email delivery through an HTTP email API (Resend-compatible payload)
pub struct EmailClient {
    client: Client,
    api_url: String,
    api_key: String,
    from: String,
}

#[derive(Debug, Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: Vec<&'a str>,
    subject: &'a str,
    html: &'a str,
}

impl EmailClient {
    pub fn new(config: &EmailConfig, api_key: String) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            api_key,
            from: format!("{} <{}>", config.from_name, config.from_email),
        })
    }
}

#[async_trait]
impl Notifier for EmailClient {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), AppError> {
        let request = SendEmailRequest {
            from: &self.from,
            to: vec![to],
            subject,
            html: body,
        };

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::ExternalServiceError(format!("Email send failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalServiceError(format!(
                "Email API error: HTTP {} {}",
                status, body
            )));
        }

        debug!(to = %to, subject = %subject, "email sent");
        Ok(())
    }
}

/// Used when no email API key is configured
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, to: &str, subject: &str, _body: &str) -> Result<(), AppError> {
        info!(to = %to, subject = %subject, "email delivery disabled, notification logged");
        Ok(())
    }
}
