use std::sync::Mutex;

use chrono::Utc;

use crate::crypto::SubscriptionToken;
use crate::domain::{CityName, EmailAddress};
use crate::model::{NewSubscription, Subscription};

use super::{RepoError, RepoResult, SubscriptionRepo};

/// In-process subscription store enforcing the same uniqueness rules as the
/// `subscriptions` table. Used to exercise the lifecycle service without a database.
#[derive(Debug, Default)]
pub struct InMemorySubscriptionRepo {
    rows: Mutex<Vec<Subscription>>,
}

impl InMemorySubscriptionRepo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every stored row, in insertion order
    pub fn all(&self) -> Vec<Subscription> {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Subscription>> {
        // A poisoned lock only means another test thread panicked mid-write
        self.rows.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Apply `f` to the first row matching `predicate`, reporting whether one matched
    fn update<P, F>(&self, predicate: P, f: F) -> bool
    where
        P: Fn(&Subscription) -> bool,
        F: FnOnce(&mut Subscription),
    {
        match self.lock().iter_mut().find(|row| predicate(row)) {
            Some(row) => {
                f(row);
                true
            }
            None => false,
        }
    }
}

#[async_trait::async_trait]
impl SubscriptionRepo for InMemorySubscriptionRepo {
    async fn find_by_email_and_city(
        &self,
        email: &EmailAddress,
        city: &CityName,
    ) -> RepoResult<Option<Subscription>> {
        Ok(self
            .lock()
            .iter()
            .find(|row| row.email == email.as_ref() && row.city == city.as_ref())
            .cloned())
    }

    async fn insert(&self, new_subscription: &NewSubscription) -> RepoResult<i64> {
        let mut rows = self.lock();

        let duplicate = rows.iter().any(|row| {
            (row.email == new_subscription.email.as_ref()
                && row.city == new_subscription.city.as_ref())
                || row.token == new_subscription.token.as_ref()
        });
        if duplicate {
            return Err(RepoError::UniqueViolation);
        }

        let id = rows.iter().map(|row| row.id).max().unwrap_or(0) + 1;
        rows.push(Subscription {
            id,
            email: new_subscription.email.to_string(),
            city: new_subscription.city.to_string(),
            token: new_subscription.token.to_string(),
            confirmed: false,
            created_at: Utc::now(),
            confirmed_at: None,
            unsubscribed_at: None,
        });

        Ok(id)
    }

    async fn renew(&self, id: i64, token: &SubscriptionToken) -> RepoResult<bool> {
        if self
            .lock()
            .iter()
            .any(|row| row.id != id && row.token == token.as_ref())
        {
            return Err(RepoError::UniqueViolation);
        }

        Ok(self.update(
            |row| row.id == id && (!row.confirmed || row.unsubscribed_at.is_some()),
            |row| {
                row.token = token.to_string();
                row.confirmed = false;
                row.confirmed_at = None;
                row.unsubscribed_at = None;
                row.created_at = Utc::now();
            },
        ))
    }

    async fn confirm_by_token(&self, token: &SubscriptionToken) -> RepoResult<bool> {
        Ok(self.update(
            |row| row.token == token.as_ref() && row.unsubscribed_at.is_none(),
            |row| {
                row.confirmed = true;
                row.confirmed_at.get_or_insert_with(Utc::now);
            },
        ))
    }

    async fn unsubscribe_by_token(&self, token: &SubscriptionToken) -> RepoResult<bool> {
        Ok(self.update(
            |row| row.token == token.as_ref() && row.unsubscribed_at.is_none(),
            |row| row.unsubscribed_at = Some(Utc::now()),
        ))
    }
}
