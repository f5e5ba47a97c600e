use chrono::{DateTime, Utc};

use crate::crypto::SubscriptionToken;
use crate::domain::{CityName, EmailAddress};

/// New Subscription record, already normalized and holding a freshly issued token
#[derive(Debug)]
pub struct NewSubscription {
    pub email: EmailAddress,
    pub city: CityName,
    pub token: SubscriptionToken,
}

/// Stored Subscription record
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Subscription {
    pub id: i64,
    pub email: String,
    pub city: String,
    pub token: String,
    pub confirmed: bool,
    /// Set on insert and again on every re-subscribe
    pub created_at: DateTime<Utc>,
    /// Set once, on the first confirmation
    pub confirmed_at: Option<DateTime<Utc>>,
    /// Presence marks the record as inactive
    pub unsubscribed_at: Option<DateTime<Utc>>,
}

/// Where a subscription sits in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionStatus {
    Pending,
    Confirmed,
    Unsubscribed,
}

impl Subscription {
    pub fn status(&self) -> SubscriptionStatus {
        if self.unsubscribed_at.is_some() {
            SubscriptionStatus::Unsubscribed
        } else if self.confirmed {
            SubscriptionStatus::Confirmed
        } else {
            SubscriptionStatus::Pending
        }
    }
}
