mod memory;
mod subscriptions;

pub use memory::InMemorySubscriptionRepo;
pub use subscriptions::{RepoError, RepoResult, SqliteSubscriptionRepo, SubscriptionRepo};
