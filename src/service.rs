mod subscriptions;

pub use subscriptions::{SubscribeRequest, SubscriptionService};
