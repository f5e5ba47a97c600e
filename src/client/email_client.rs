use std::time::Duration;

use anyhow::Context;

use reqwest::{Client, StatusCode};

use serde::{Deserialize, Serialize};

use secrecy::{ExposeSecret, Secret};

use url::Url;

use crate::domain::{CityName, EmailAddress};

const POSTMARK_TOKEN_HEADER: &str = "X-Postmark-Server-Token";
const POSTMARK_MESSAGE_STREAM: &str = "outbound";
const CONFIRMATION_TAG: &str = "subscription-confirmation";

#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    /// Postmark accepted the request but refused the message
    #[error("Email rejected ({code}): {message}")]
    Rejected { code: i64, message: String },
    #[error("Email API responded with {0}")]
    Status(StatusCode),
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

/// A confirmation link addressed to a new subscriber
#[derive(Debug)]
pub struct ConfirmationNotice<'a> {
    pub recipient: &'a EmailAddress,
    pub city: &'a CityName,
    pub confirmation_url: &'a Url,
}

impl ConfirmationNotice<'_> {
    fn subject(&self) -> String {
        format!("Confirm your weather updates for {}", self.city)
    }

    fn html_body(&self) -> String {
        format!(
            "<h1>Weather updates for {}</h1><p>Click <a href=\"{}\">here</a> to confirm your subscription.</p>",
            self.city, self.confirmation_url
        )
    }

    fn text_body(&self) -> String {
        format!(
            "Weather updates for {}\n\nTo confirm your subscription, visit this web page: {}",
            self.city, self.confirmation_url
        )
    }
}

/// Postmark `/email` payload
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct PostmarkMessage<'a> {
    from: &'a str,
    to: &'a str,
    subject: String,
    html_body: String,
    text_body: String,
    tag: &'static str,
    message_stream: &'static str,
}

/// Body Postmark sends back with a failed request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct PostmarkReply {
    error_code: i64,
    message: String,
}

/// Sends subscription mail through the Postmark REST API
#[derive(Debug)]
pub struct EmailClient {
    client: Client,
    sender: EmailAddress,

    api_send_email_url: Url,
    api_auth_token: Secret<String>,
}

impl EmailClient {
    pub fn new(
        sender: EmailAddress,
        api_timeout: Duration,
        api_base_url: Url,
        api_auth_token: Secret<String>,
    ) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(api_timeout)
            .build()
            .context("Failed to build http client")?;

        let api_send_email_url = api_base_url
            .join("email")
            .context("Failed to create send email endpoint URL")?;

        Ok(Self {
            client,
            sender,
            api_send_email_url,
            api_auth_token,
        })
    }

    #[tracing::instrument(
        name = "Send confirmation email",
        skip(self, notice),
        fields(recipient = %notice.recipient, city = %notice.city)
    )]
    pub async fn send_confirmation(
        &self,
        notice: &ConfirmationNotice<'_>,
    ) -> Result<(), EmailError> {
        let message = PostmarkMessage {
            from: self.sender.as_ref(),
            to: notice.recipient.as_ref(),
            subject: notice.subject(),
            html_body: notice.html_body(),
            text_body: notice.text_body(),
            tag: CONFIRMATION_TAG,
            message_stream: POSTMARK_MESSAGE_STREAM,
        };

        let response = self
            .client
            .post(self.api_send_email_url.clone())
            .header(POSTMARK_TOKEN_HEADER, self.api_auth_token.expose_secret())
            .json(&message)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        match response.json::<PostmarkReply>().await {
            Ok(reply) => Err(EmailError::Rejected {
                code: reply.error_code,
                message: reply.message,
            }),
            Err(_) => Err(EmailError::Status(status)),
        }
    }
}
