//! Derived CRUD mutation fields: create, update by pk, delete by pk.

use crate::gql::scalars::gql_to_json;
use crate::gql::tables::{parse_pk, resolver_error};
use crate::introspect::{ColumnInfo, ResolvedEntity};
use crate::service::QueryExecutor;
use async_graphql::dynamic::{
    Field, FieldFuture, FieldValue, InputObject, InputValue, Object, Type, TypeRef,
};
use async_graphql::Value as GqlValue;
use serde_json::Value;
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::Arc;

fn input_type_ref(c: &ColumnInfo, required: bool) -> TypeRef {
    if required {
        TypeRef::named_nn(c.scalar.type_name())
    } else {
        TypeRef::named(c.scalar.type_name())
    }
}

/// Input for create: columns without a default and not nullable are required.
fn create_input(entity: &ResolvedEntity) -> InputObject {
    let mut input = InputObject::new(entity.input_type());
    for c in &entity.columns {
        let required = !c.nullable && !c.has_default;
        input = input.field(InputValue::new(&c.field_name, input_type_ref(c, required)));
    }
    input
}

/// Patch for update: every column optional; omitted columns are left untouched.
fn patch_input(entity: &ResolvedEntity) -> InputObject {
    let mut input = InputObject::new(entity.patch_type());
    for c in &entity.columns {
        if c.is_pk {
            continue;
        }
        input = input.field(InputValue::new(&c.field_name, input_type_ref(c, false)));
    }
    input
}

/// Map a GraphQL input object to (column -> JSON value) by field name.
fn object_to_columns(entity: &ResolvedEntity, obj: Option<&GqlValue>) -> HashMap<String, Value> {
    let mut out = HashMap::new();
    if let Some(GqlValue::Object(map)) = obj {
        for (name, v) in map {
            if let Some(col) = entity.column_by_field(name.as_str()) {
                out.insert(col.name.clone(), gql_to_json(v));
            }
        }
    }
    out
}

fn create_field(entity: &ResolvedEntity, pool: &PgPool) -> Field {
    let create_entity = Arc::new(entity.clone());
    let pool = pool.clone();
    Field::new(
        format!("create{}", entity.type_name),
        TypeRef::named(&entity.type_name),
        move |ctx| {
            let entity = create_entity.clone();
            let pool = pool.clone();
            FieldFuture::new(async move {
                let args = ctx.args.as_index_map();
                let input = object_to_columns(&entity, args.get("input"));
                let row = QueryExecutor::insert(&pool, &entity, &input)
                    .await
                    .map_err(resolver_error)?;
                Ok(Some(FieldValue::owned_any(row)))
            })
        },
    )
    .description(format!("Insert one `{}` row", entity.table_name))
    .argument(InputValue::new("input", TypeRef::named_nn(entity.input_type())))
}

fn update_field(entity: &ResolvedEntity, pool: &PgPool) -> Field {
    let update_entity = Arc::new(entity.clone());
    let pool = pool.clone();
    Field::new(
        format!("update{}ById", entity.type_name),
        TypeRef::named(&entity.type_name),
        move |ctx| {
            let entity = update_entity.clone();
            let pool = pool.clone();
            FieldFuture::new(async move {
                let args = ctx.args.as_index_map();
                let id = args.get("id").map(gql_to_json).unwrap_or(Value::Null);
                let id = parse_pk(&entity, &id)?;
                let patch = object_to_columns(&entity, args.get("patch"));
                let row = QueryExecutor::update_by_pk(&pool, &entity, &id, &patch)
                    .await
                    .map_err(resolver_error)?;
                Ok(row.map(FieldValue::owned_any))
            })
        },
    )
    .description(format!("Update one `{}` row; null when the id is absent", entity.table_name))
    .argument(InputValue::new(
        "id",
        TypeRef::named_nn(entity.pk_scalar().type_name()),
    ))
    .argument(InputValue::new("patch", TypeRef::named_nn(entity.patch_type())))
}

fn delete_field(entity: &ResolvedEntity, pool: &PgPool) -> Field {
    let delete_entity = Arc::new(entity.clone());
    let pool = pool.clone();
    Field::new(
        format!("delete{}ById", entity.type_name),
        TypeRef::named(&entity.type_name),
        move |ctx| {
            let entity = delete_entity.clone();
            let pool = pool.clone();
            FieldFuture::new(async move {
                let args = ctx.args.as_index_map();
                let id = args.get("id").map(gql_to_json).unwrap_or(Value::Null);
                let id = parse_pk(&entity, &id)?;
                let row = QueryExecutor::delete_by_pk(&pool, &entity, &id)
                    .await
                    .map_err(resolver_error)?;
                Ok(row.map(FieldValue::owned_any))
            })
        },
    )
    .description(format!("Delete one `{}` row; null when the id is absent", entity.table_name))
    .argument(InputValue::new(
        "id",
        TypeRef::named_nn(entity.pk_scalar().type_name()),
    ))
}

/// Register one entity's input types and mutation fields; returns the
/// extended Mutation object.
pub fn register_entity(
    entity: &ResolvedEntity,
    pool: &PgPool,
    mutation: Object,
    types: &mut Vec<Type>,
) -> Object {
    types.push(Type::InputObject(create_input(entity)));
    types.push(Type::InputObject(patch_input(entity)));

    mutation
        .field(create_field(entity, pool))
        .field(update_field(entity, pool))
        .field(delete_field(entity, pool))
}
