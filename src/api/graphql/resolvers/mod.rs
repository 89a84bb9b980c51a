mod category;
mod post;
mod thread;
mod user;

use async_graphql::{MergedObject, MergedSubscription};

use crate::api::graphql::schema::SchemaModule;

use category::{CategoryMutation, CategoryQuery};
use post::{PostMutation, PostQuery, PostSubscription};
use thread::{ThreadMutation, ThreadQuery, ThreadSubscription};
use user::{UserMutation, UserQuery};

/// Every module contributing to the schema, in registration order.
/// Keep in step with the root fragments below.
pub const MODULES: [SchemaModule; 4] = [user::MODULE, category::MODULE, thread::MODULE, post::MODULE];

#[derive(MergedObject, Default)]
#[graphql(name = "Query")]
pub struct QueryRoot(UserQuery, CategoryQuery, ThreadQuery, PostQuery);

#[derive(MergedObject, Default)]
#[graphql(name = "Mutation")]
pub struct MutationRoot(UserMutation, CategoryMutation, ThreadMutation, PostMutation);

#[derive(MergedSubscription, Default)]
#[graphql(name = "Subscription")]
pub struct SubscriptionRoot(ThreadSubscription, PostSubscription);
