use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, Secret};
use std::time;

use crate::domain::subscriber_email::SubscriberEmail;

const REQUEST_TIMEOUT: time::Duration = time::Duration::from_secs(10);

/// Client for the transactional email provider's `/emails` endpoint.
pub struct EmailClient {
    http_client: Client,
    base_url: String,
    sender: SubscriberEmail,
    sender_name: Option<String>,
    api_key: Secret<String>,
}

#[derive(serde::Serialize)]
struct SendEmailBody<'a> {
    from: String,
    to: Vec<&'a str>,
    subject: &'a str,
    html: &'a str,
}

/// What the provider hands back for an accepted message.
#[derive(serde::Deserialize, serde::Serialize, Debug, Default, Clone)]
pub struct EmailReceipt {
    pub id: Option<String>,
}

#[derive(serde::Deserialize)]
struct ProviderErrorBody {
    message: Option<String>,
    name: Option<String>,
}

#[derive(thiserror::Error, Debug)]
pub enum EmailError {
    #[error("Email provider rejected the message ({status}): {message}")]
    Provider { status: StatusCode, message: String },
    #[error("Failed to reach the email provider: {0}")]
    Transport(#[from] reqwest::Error),
}

impl EmailClient {
    pub fn new(
        base_url: String,
        sender: SubscriberEmail,
        sender_name: Option<String>,
        api_key: Secret<String>,
        timeout: Option<time::Duration>,
    ) -> Result<EmailClient, reqwest::Error> {
        let http_client = Client::builder()
            .timeout(timeout.unwrap_or(REQUEST_TIMEOUT))
            .build()?;

        Ok(EmailClient {
            http_client,
            base_url,
            sender,
            sender_name,
            api_key,
        })
    }

    fn from_header(&self) -> String {
        match &self.sender_name {
            Some(name) => format!("{} <{}>", name, self.sender.as_ref()),
            None => self.sender.as_ref().to_string(),
        }
    }

    #[tracing::instrument(
        name = "Sending an email",
        skip(self, recipient, subject, html_content),
        fields(recipient = %recipient)
    )]
    pub async fn send_email(
        &self,
        recipient: &SubscriberEmail,
        subject: &str,
        html_content: &str,
    ) -> Result<EmailReceipt, EmailError> {
        let url = format!("{}/emails", self.base_url);
        let body = SendEmailBody {
            from: self.from_header(),
            to: vec![recipient.as_ref()],
            subject,
            html: html_content,
        };

        let response = self
            .http_client
            .post(&url)
            .header(
                "Authorization",
                format!("Bearer {}", self.api_key.expose_secret()),
            )
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ProviderErrorBody>(&text)
                .ok()
                .and_then(|error| error.message.or(error.name))
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown").to_string());

            return Err(EmailError::Provider { status, message });
        }

        Ok(serde_json::from_str(&text).unwrap_or_default())
    }
}
