mod subscriptions;

pub use subscriptions::{NewSubscription, Subscription, SubscriptionStatus};
