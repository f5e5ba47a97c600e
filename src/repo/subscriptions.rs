use chrono::Utc;

use sqlx::SqlitePool;

use crate::crypto::SubscriptionToken;
use crate::domain::{CityName, EmailAddress};
use crate::model::{NewSubscription, Subscription};

#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    /// A write collided with the (email, city) or token uniqueness constraint
    #[error("Unique constraint violated")]
    UniqueViolation,
    #[error(transparent)]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for RepoError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => Self::UniqueViolation,
            other => Self::Database(other),
        }
    }
}

pub type RepoResult<T> = Result<T, RepoError>;

/// Subscription repository trait, must be implemented for each storage backend.
/// NOTE: Object safe so the lifecycle service can be tested against a fake store.
/// State changes are conditional writes, they report `false` when the row was no
/// longer in a state the change applies to.
#[async_trait::async_trait]
pub trait SubscriptionRepo: Send + Sync {
    /// Fetch the subscription for an (email, city) pair, active or not
    async fn find_by_email_and_city(
        &self,
        email: &EmailAddress,
        city: &CityName,
    ) -> RepoResult<Option<Subscription>>;

    /// Insert a new, unconfirmed subscription
    async fn insert(&self, new_subscription: &NewSubscription) -> RepoResult<i64>;

    /// Reset a pending or unsubscribed record back to pending under a new token.
    /// An active (confirmed, not unsubscribed) record is left alone.
    async fn renew(&self, id: i64, token: &SubscriptionToken) -> RepoResult<bool>;

    /// Mark the record holding `token` confirmed unless it was unsubscribed.
    /// `confirmed_at` keeps its first value.
    async fn confirm_by_token(&self, token: &SubscriptionToken) -> RepoResult<bool>;

    /// Mark the record holding `token` unsubscribed, once
    async fn unsubscribe_by_token(&self, token: &SubscriptionToken) -> RepoResult<bool>;
}

/// SQLite Subscription Repository
#[derive(Debug, Clone)]
pub struct SqliteSubscriptionRepo {
    pool: SqlitePool,
}

impl SqliteSubscriptionRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl SubscriptionRepo for SqliteSubscriptionRepo {
    #[tracing::instrument(name = "Fetch subscription by email and city", skip(self))]
    async fn find_by_email_and_city(
        &self,
        email: &EmailAddress,
        city: &CityName,
    ) -> RepoResult<Option<Subscription>> {
        let subscription = sqlx::query_as::<_, Subscription>(
            "select * from subscriptions where email=?1 and city=?2",
        )
        .bind(email.as_ref())
        .bind(city.as_ref())
        .fetch_optional(&self.pool)
        .await?;

        Ok(subscription)
    }

    #[tracing::instrument(name = "Insert subscription", skip(self))]
    async fn insert(&self, new_subscription: &NewSubscription) -> RepoResult<i64> {
        let id = sqlx::query(
            "insert into subscriptions(email, city, token, confirmed, created_at) values (?1, ?2, ?3, false, ?4)",
        )
        .bind(new_subscription.email.as_ref())
        .bind(new_subscription.city.as_ref())
        .bind(new_subscription.token.as_ref())
        .bind(Utc::now())
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        Ok(id)
    }

    #[tracing::instrument(name = "Renew subscription", skip(self, token))]
    async fn renew(&self, id: i64, token: &SubscriptionToken) -> RepoResult<bool> {
        let result = sqlx::query(
            "update subscriptions \
             set token=?2, confirmed=false, confirmed_at=null, unsubscribed_at=null, created_at=?3 \
             where id=?1 and (confirmed=false or unsubscribed_at is not null)",
        )
        .bind(id)
        .bind(token.as_ref())
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    #[tracing::instrument(name = "Confirm subscription by token", skip(self, token))]
    async fn confirm_by_token(&self, token: &SubscriptionToken) -> RepoResult<bool> {
        let result = sqlx::query(
            "update subscriptions \
             set confirmed=true, confirmed_at=coalesce(confirmed_at, ?2) \
             where token=?1 and unsubscribed_at is null",
        )
        .bind(token.as_ref())
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    #[tracing::instrument(name = "Unsubscribe subscription by token", skip(self, token))]
    async fn unsubscribe_by_token(&self, token: &SubscriptionToken) -> RepoResult<bool> {
        let result = sqlx::query(
            "update subscriptions set unsubscribed_at=?2 where token=?1 and unsubscribed_at is null",
        )
        .bind(token.as_ref())
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}
