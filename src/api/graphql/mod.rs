pub mod context;
pub mod pubsub;
pub mod resolvers;
pub mod schema;
pub mod types;

pub use resolvers::{MutationRoot, QueryRoot, SubscriptionRoot};
pub use schema::{create_schema, ForumSchema};
pub use types::*;
