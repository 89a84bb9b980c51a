use async_graphql::{Context, EmptySubscription, Object, Result};

use crate::api::graphql::{
    context::{require_role, ApiContext},
    schema::{fragment_fields, SchemaModule},
    types::{Category, CreateCategoryInput},
};
use crate::entity::{self, category::NewCategory, Role};
use crate::error::IntoGraphql;

pub const MODULE: SchemaModule = SchemaModule {
    name: "categories",
    types: &["Category", "CreateCategoryInput"],
    fields: fragment_fields::<CategoryQuery, CategoryMutation, EmptySubscription>,
};

#[derive(Default)]
pub struct CategoryQuery;

#[Object]
impl CategoryQuery {
    /// All categories ordered by name
    async fn categories(&self, ctx: &Context<'_>) -> Result<Vec<Category>> {
        let db = &ctx.data_unchecked::<ApiContext>().db;
        let categories = entity::category::list(db).await.gql()?;
        Ok(categories.into_iter().map(Category).collect())
    }

    async fn category(&self, ctx: &Context<'_>, id: i32) -> Result<Option<Category>> {
        let db = &ctx.data_unchecked::<ApiContext>().db;
        let category = entity::category::find_by_id(db, id).await.gql()?;
        Ok(category.map(Category))
    }

    async fn category_by_slug(&self, ctx: &Context<'_>, slug: String) -> Result<Option<Category>> {
        let db = &ctx.data_unchecked::<ApiContext>().db;
        let category = entity::category::find_by_slug(db, &slug).await.gql()?;
        Ok(category.map(Category))
    }
}

#[derive(Default)]
pub struct CategoryMutation;

#[Object]
impl CategoryMutation {
    /// Administrators only
    async fn create_category(&self, ctx: &Context<'_>, input: CreateCategoryInput) -> Result<Category> {
        let admin = require_role(ctx, Role::Admin).gql()?;
        let input = input.validate().gql()?;
        let db = &ctx.data_unchecked::<ApiContext>().db;

        let category = entity::category::insert(
            db,
            &NewCategory {
                name: input.name,
                slug: input.slug,
                description: input.description,
            },
        )
        .await
        .gql()?;

        tracing::info!("{} created category {}", admin.username, category.slug);
        Ok(Category(category))
    }
}
