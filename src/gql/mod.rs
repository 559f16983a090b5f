//! Dynamic GraphQL schema derived from the resolved entity model.

pub mod mutations;
pub mod scalars;
pub mod tables;

use crate::error::AppError;
use crate::introspect::ResolvedModel;
use async_graphql::dynamic::{Object, Schema};
use sqlx::PgPool;
use std::sync::Arc;

/// Rows fetched per connection when no `first` argument is given.
pub(crate) const DEFAULT_PAGE_SIZE: u32 = 100;

/// Assemble the executable schema for a resolved model: one object, connection,
/// edge, condition and input type set per entity, plus lookup/collection query
/// fields and CRUD mutation fields.
pub fn generate_schema(model: &Arc<ResolvedModel>, pool: &PgPool) -> Result<Schema, AppError> {
    let mut query = Object::new("Query");
    let mut mutation = Object::new("Mutation");
    let mut types = Vec::new();

    for entity in &model.entities {
        tracing::debug!(table = %entity.table_name, type_name = %entity.type_name, "deriving entity types");
        query = tables::register_entity(entity, model, pool, query, &mut types);
        mutation = mutations::register_entity(entity, pool, mutation, &mut types);
    }

    let mut schema = Schema::build("Query", Some("Mutation"), None)
        .register(query)
        .register(mutation)
        .register(tables::page_info_object());
    for ty in types {
        schema = schema.register(ty);
    }
    schema = scalars::register(schema);

    schema
        .finish()
        .map_err(|e| AppError::SchemaBuild(format!("{:?}", e)))
}
