use std::sync::Arc;

use serde::Deserialize;

use url::Url;

use crate::client::ConfirmationNotifier;
use crate::crypto::SubscriptionToken;
use crate::domain::{CityName, EmailAddress, Frequency};
use crate::error::{Error, Result};
use crate::model::{NewSubscription, SubscriptionStatus};
use crate::repo::SubscriptionRepo;

/// Body of a subscribe call. Fields are optional so that missing values are
/// reported through the same validation path as malformed ones.
#[derive(Debug, Default, Deserialize)]
pub struct SubscribeRequest {
    pub email: Option<String>,
    pub city: Option<String>,
    pub frequency: Option<String>,
}

/// A subscribe request after normalization and validation
#[derive(Debug)]
struct ValidSubscribeRequest {
    email: EmailAddress,
    city: CityName,
    frequency: Frequency,
}

impl TryFrom<SubscribeRequest> for ValidSubscribeRequest {
    type Error = Error;

    fn try_from(request: SubscribeRequest) -> Result<Self> {
        let email: EmailAddress = required(request.email, "email")?.parse()?;
        let city: CityName = required(request.city, "city")?.parse()?;
        let frequency: Frequency = required(request.frequency, "frequency")?.parse()?;

        Ok(Self {
            email,
            city,
            frequency,
        })
    }
}

fn required(value: Option<String>, field: &str) -> Result<String> {
    match value {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(Error::Validation(format!("Missing required field: {}", field))),
    }
}

/// Owns the subscribe, confirm and unsubscribe rules.
///
/// Concurrency is left to storage. State changes are conditional writes, and a
/// unique-constraint violation is reported exactly like an already active subscription.
pub struct SubscriptionService {
    repo: Arc<dyn SubscriptionRepo>,
    notifier: Arc<dyn ConfirmationNotifier>,
    frontend_base_url: Url,
    frequencies: Vec<Frequency>,
}

impl SubscriptionService {
    pub fn new(
        repo: Arc<dyn SubscriptionRepo>,
        notifier: Arc<dyn ConfirmationNotifier>,
        frontend_base_url: Url,
        frequencies: Vec<Frequency>,
    ) -> Self {
        Self {
            repo,
            notifier,
            frontend_base_url,
            frequencies,
        }
    }

    /// Create a pending subscription, or recycle an inactive one, and send out
    /// its confirmation link
    #[tracing::instrument(name = "Subscribe to weather updates", skip(self))]
    pub async fn subscribe(&self, request: SubscribeRequest) -> Result<()> {
        let request: ValidSubscribeRequest = request.try_into()?;

        if !self.frequencies.contains(&request.frequency) {
            return Err(Error::Validation(format!(
                "{} is not a supported frequency",
                request.frequency
            )));
        }

        let existing = self
            .repo
            .find_by_email_and_city(&request.email, &request.city)
            .await?;

        let token = SubscriptionToken::issue();
        match existing {
            Some(subscription) if subscription.status() == SubscriptionStatus::Confirmed => {
                return Err(already_subscribed());
            }
            Some(subscription) => {
                // Confirmed by someone else since the lookup
                if !self.repo.renew(subscription.id, &token).await? {
                    return Err(already_subscribed());
                }
            }
            None => {
                let new_subscription = NewSubscription {
                    email: request.email.clone(),
                    city: request.city.clone(),
                    token: token.clone(),
                };
                self.repo.insert(&new_subscription).await?;
            }
        }

        // Frequency is validated but not persisted, no dispatcher reads it back
        tracing::debug!(frequency = %request.frequency, "Subscription pending confirmation");

        let confirmation_url = self.confirmation_url(&token)?;
        if let Err(error) = self
            .notifier
            .send_confirmation(&request.email, &request.city, &confirmation_url)
            .await
        {
            tracing::error!(
                error.cause_chain = ?error,
                "Failed to deliver confirmation link"
            );
        }

        Ok(())
    }

    /// Confirm a pending subscription. Confirming twice is a no-op.
    #[tracing::instrument(name = "Confirm a subscription by token", skip(self, token))]
    pub async fn confirm(&self, token: &str) -> Result<()> {
        let token: SubscriptionToken = token.parse()?;

        if self.repo.confirm_by_token(&token).await? {
            Ok(())
        } else {
            Err(not_found())
        }
    }

    /// Deactivate a subscription. A second call on the same token is not found.
    #[tracing::instrument(name = "Unsubscribe by token", skip(self, token))]
    pub async fn unsubscribe(&self, token: &str) -> Result<()> {
        let token: SubscriptionToken = token.parse()?;

        if self.repo.unsubscribe_by_token(&token).await? {
            Ok(())
        } else {
            Err(not_found())
        }
    }

    /// `<frontend-base>/confirm/<token>`
    fn confirmation_url(&self, token: &SubscriptionToken) -> Result<Url> {
        let mut url = self.frontend_base_url.clone();
        url.path_segments_mut()
            .map_err(|_| Error::Internal("Frontend base URL cannot be a base".into()))?
            .pop_if_empty()
            .push("confirm")
            .push(token.as_ref());
        Ok(url)
    }
}

fn not_found() -> Error {
    Error::NotFound("Subscription not found".into())
}

fn already_subscribed() -> Error {
    Error::Conflict("Already subscribed".into())
}
