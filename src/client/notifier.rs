use url::Url;

use crate::domain::{CityName, EmailAddress};

use super::{ConfirmationNotice, EmailClient};

/// Delivery channel for confirmation links.
/// Delivery is best effort, callers log failures and move on.
#[async_trait::async_trait]
pub trait ConfirmationNotifier: Send + Sync {
    async fn send_confirmation(
        &self,
        recipient: &EmailAddress,
        city: &CityName,
        confirmation_url: &Url,
    ) -> anyhow::Result<()>;
}

/// Writes the confirmation link to the application log instead of sending mail
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait::async_trait]
impl ConfirmationNotifier for LogNotifier {
    async fn send_confirmation(
        &self,
        recipient: &EmailAddress,
        city: &CityName,
        confirmation_url: &Url,
    ) -> anyhow::Result<()> {
        tracing::info!(
            %recipient,
            %city,
            %confirmation_url,
            "Confirmation link issued"
        );
        Ok(())
    }
}

/// Sends the confirmation link by email
#[derive(Debug)]
pub struct EmailNotifier {
    email_client: EmailClient,
}

impl EmailNotifier {
    pub fn new(email_client: EmailClient) -> Self {
        Self { email_client }
    }
}

#[async_trait::async_trait]
impl ConfirmationNotifier for EmailNotifier {
    async fn send_confirmation(
        &self,
        recipient: &EmailAddress,
        city: &CityName,
        confirmation_url: &Url,
    ) -> anyhow::Result<()> {
        let notice = ConfirmationNotice {
            recipient,
            city,
            confirmation_url,
        };
        self.email_client.send_confirmation(&notice).await?;
        Ok(())
    }
}
