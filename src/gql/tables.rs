//! Per-entity dynamic types: objects, connections, conditions, and the
//! query fields that expose them.
//!
//! Rows are passed between resolvers as `serde_json::Value` objects keyed by
//! snake_case column names; field resolvers translate to the camelCase
//! schema names.

use crate::error::AppError;
use crate::gql::scalars::{gql_to_json, json_to_gql};
use crate::gql::DEFAULT_PAGE_SIZE;
use crate::introspect::{
    ColumnInfo, PkType, RelationDirection, RelationSpec, ResolvedEntity, ResolvedModel,
};
use crate::service::QueryExecutor;
use async_graphql::dynamic::indexmap::IndexMap;
use async_graphql::dynamic::{
    Field, FieldFuture, FieldValue, InputObject, InputValue, Object, Type, TypeRef,
};
use async_graphql::{Name, Value as GqlValue};
use base64::Engine;
use serde_json::Value;
use sqlx::PgPool;
use std::sync::Arc;

/// One fetched page plus the filters that produced it. Connection fields
/// resolve from this; `totalCount` re-runs the filters as a COUNT.
pub(crate) struct ConnectionPage {
    pub filters: Vec<(String, Value)>,
    pub rows: Vec<Value>,
    pub offset: u32,
    pub has_next: bool,
}

pub(crate) struct EdgeSeed {
    pub row: Value,
    pub cursor: String,
}

struct PageSeed {
    has_next: bool,
    has_prev: bool,
    start: Option<String>,
    end: Option<String>,
}

pub(crate) fn resolver_error(e: AppError) -> async_graphql::Error {
    async_graphql::Error::new(e.to_string())
}

/// Parse an id argument against the entity's primary key type before it
/// reaches the database.
pub(crate) fn parse_pk(entity: &ResolvedEntity, v: &Value) -> Result<Value, async_graphql::Error> {
    match entity.pk_type {
        PkType::Uuid => v
            .as_str()
            .and_then(|s| uuid::Uuid::parse_str(s).ok())
            .map(|u| Value::String(u.to_string()))
            .ok_or_else(|| async_graphql::Error::new("invalid uuid")),
        PkType::Int | PkType::BigInt => match v {
            Value::Number(n) if n.is_i64() => Ok(v.clone()),
            Value::String(s) => s
                .parse::<i64>()
                .map(|n| Value::Number(n.into()))
                .map_err(|_| async_graphql::Error::new("invalid id")),
            _ => Err(async_graphql::Error::new("invalid id")),
        },
        PkType::Text => Ok(v.clone()),
    }
}

fn encode_cursor(offset: u32) -> String {
    base64::engine::general_purpose::STANDARD.encode(format!("arrayconnection:{}", offset))
}

pub(crate) fn arg_u32(args: &IndexMap<Name, GqlValue>, key: &str, default: u32) -> u32 {
    match args.get(key) {
        Some(GqlValue::Number(n)) => n
            .as_i64()
            .map(|v| v.clamp(0, 1000) as u32)
            .unwrap_or(default),
        _ => default,
    }
}

/// Translate a `condition` argument into (column, value) equality filters.
/// Field names are validated by the schema, so unknown keys cannot occur;
/// the lookup guards against it anyway.
pub(crate) fn condition_filters(entity: &ResolvedEntity, cond: Option<&GqlValue>) -> Vec<(String, Value)> {
    let mut filters = Vec::new();
    if let Some(GqlValue::Object(map)) = cond {
        for (name, v) in map {
            if let Some(col) = entity.column_by_field(name.as_str()) {
                filters.push((col.name.clone(), gql_to_json(v)));
            }
        }
    }
    filters
}

async fn fetch_page(
    pool: &PgPool,
    entity: &ResolvedEntity,
    filters: Vec<(String, Value)>,
    first: u32,
    offset: u32,
) -> Result<ConnectionPage, AppError> {
    // One row beyond the page answers hasNextPage without a second query.
    let mut rows = QueryExecutor::fetch_connection(pool, entity, &filters, first + 1, offset).await?;
    let has_next = rows.len() as u32 > first;
    rows.truncate(first as usize);
    Ok(ConnectionPage {
        filters,
        rows,
        offset,
        has_next,
    })
}

fn column_type_ref(c: &ColumnInfo) -> TypeRef {
    if c.nullable {
        TypeRef::named(c.scalar.type_name())
    } else {
        TypeRef::named_nn(c.scalar.type_name())
    }
}

fn column_field(c: &ColumnInfo) -> Field {
    let column = c.name.clone();
    Field::new(c.field_name.clone(), column_type_ref(c), move |ctx| {
        let column = column.clone();
        FieldFuture::new(async move {
            let row = ctx.parent_value.try_downcast_ref::<Value>()?;
            let cell = row.get(&column).cloned().unwrap_or(Value::Null);
            if cell.is_null() {
                return Ok(None);
            }
            Ok(Some(FieldValue::value(json_to_gql(&cell))))
        })
    })
}

fn to_one_field(spec: &RelationSpec, related: &ResolvedEntity, pool: &PgPool) -> Field {
    let spec = spec.clone();
    let related = Arc::new(related.clone());
    let pool = pool.clone();
    Field::new(
        spec.field_name.clone(),
        TypeRef::named(&related.type_name),
        move |ctx| {
            let spec = spec.clone();
            let related = related.clone();
            let pool = pool.clone();
            FieldFuture::new(async move {
                let row = ctx.parent_value.try_downcast_ref::<Value>()?;
                let key = row.get(&spec.our_key_column).cloned().unwrap_or(Value::Null);
                if key.is_null() {
                    return Ok(None);
                }
                let filters = vec![(spec.their_key_column.clone(), key)];
                let rows = QueryExecutor::fetch_connection(&pool, &related, &filters, 1, 0)
                    .await
                    .map_err(resolver_error)?;
                Ok(rows.into_iter().next().map(FieldValue::owned_any))
            })
        },
    )
}

fn to_many_field(spec: &RelationSpec, related: &ResolvedEntity, pool: &PgPool) -> Field {
    let field_spec = spec.clone();
    let related_arc = Arc::new(related.clone());
    let pool = pool.clone();
    Field::new(
        spec.field_name.clone(),
        TypeRef::named_nn(related.connection_type()),
        move |ctx| {
            let spec = field_spec.clone();
            let related = related_arc.clone();
            let pool = pool.clone();
            FieldFuture::new(async move {
                let row = ctx.parent_value.try_downcast_ref::<Value>()?;
                let key = row.get(&spec.our_key_column).cloned().unwrap_or(Value::Null);
                let args = ctx.args.as_index_map();
                let first = arg_u32(args, "first", DEFAULT_PAGE_SIZE);
                let offset = arg_u32(args, "offset", 0);
                if key.is_null() {
                    return Ok(Some(FieldValue::owned_any(ConnectionPage {
                        filters: Vec::new(),
                        rows: Vec::new(),
                        offset,
                        has_next: false,
                    })));
                }
                let mut filters = vec![(spec.their_key_column.clone(), key)];
                filters.extend(condition_filters(&related, args.get("condition")));
                let page = fetch_page(&pool, &related, filters, first, offset)
                    .await
                    .map_err(resolver_error)?;
                Ok(Some(FieldValue::owned_any(page)))
            })
        },
    )
    .argument(InputValue::new("first", TypeRef::named(TypeRef::INT)))
    .argument(InputValue::new("offset", TypeRef::named(TypeRef::INT)))
    .argument(InputValue::new("condition", TypeRef::named(related.condition_type())))
}

fn entity_object(entity: &ResolvedEntity, model: &Arc<ResolvedModel>, pool: &PgPool) -> Object {
    let mut obj = Object::new(&entity.type_name).description(format!(
        "Derived from table `{}.{}`",
        entity.schema_name, entity.table_name
    ));
    for c in &entity.columns {
        obj = obj.field(column_field(c));
    }
    for spec in &entity.relations {
        let Some(related) = model.entity(&spec.related_table) else {
            continue;
        };
        obj = match spec.direction {
            RelationDirection::ToOne => obj.field(to_one_field(spec, related, pool)),
            RelationDirection::ToMany => obj.field(to_many_field(spec, related, pool)),
        };
    }
    obj
}

fn condition_input(entity: &ResolvedEntity) -> InputObject {
    let mut input = InputObject::new(entity.condition_type()).description(format!(
        "Equality conditions over `{}` columns; all supplied fields must match",
        entity.table_name
    ));
    for c in &entity.columns {
        input = input.field(InputValue::new(
            &c.field_name,
            TypeRef::named(c.scalar.type_name()),
        ));
    }
    input
}

fn edge_object(entity: &ResolvedEntity) -> Object {
    Object::new(entity.edge_type())
        .field(Field::new("cursor", TypeRef::named("Cursor"), move |ctx| {
            FieldFuture::new(async move {
                let edge = ctx.parent_value.try_downcast_ref::<EdgeSeed>()?;
                Ok(Some(FieldValue::value(GqlValue::String(edge.cursor.clone()))))
            })
        }))
        .field(Field::new(
            "node",
            TypeRef::named_nn(&entity.type_name),
            move |ctx| {
                FieldFuture::new(async move {
                    let edge = ctx.parent_value.try_downcast_ref::<EdgeSeed>()?;
                    Ok(Some(FieldValue::owned_any(edge.row.clone())))
                })
            },
        ))
}

fn connection_object(entity: &ResolvedEntity, pool: &PgPool) -> Object {
    let count_entity = Arc::new(entity.clone());
    let count_pool = pool.clone();
    Object::new(entity.connection_type())
        .description(format!("Paged collection of `{}` rows", entity.table_name))
        .field(Field::new(
            "totalCount",
            TypeRef::named_nn(TypeRef::INT),
            move |ctx| {
                let entity = count_entity.clone();
                let pool = count_pool.clone();
                FieldFuture::new(async move {
                    let page = ctx.parent_value.try_downcast_ref::<ConnectionPage>()?;
                    let n = QueryExecutor::count(&pool, &entity, &page.filters)
                        .await
                        .map_err(resolver_error)?;
                    Ok(Some(FieldValue::value(GqlValue::from(n))))
                })
            },
        ))
        .field(Field::new(
            "nodes",
            TypeRef::named_nn_list_nn(&entity.type_name),
            move |ctx| {
                FieldFuture::new(async move {
                    let page = ctx.parent_value.try_downcast_ref::<ConnectionPage>()?;
                    Ok(Some(FieldValue::list(
                        page.rows.iter().cloned().map(FieldValue::owned_any),
                    )))
                })
            },
        ))
        .field(Field::new(
            "edges",
            TypeRef::named_nn_list_nn(entity.edge_type()),
            move |ctx| {
                FieldFuture::new(async move {
                    let page = ctx.parent_value.try_downcast_ref::<ConnectionPage>()?;
                    Ok(Some(FieldValue::list(page.rows.iter().enumerate().map(
                        |(i, row)| {
                            FieldValue::owned_any(EdgeSeed {
                                row: row.clone(),
                                cursor: encode_cursor(page.offset + i as u32),
                            })
                        },
                    ))))
                })
            },
        ))
        .field(Field::new(
            "pageInfo",
            TypeRef::named_nn("PageInfo"),
            move |ctx| {
                FieldFuture::new(async move {
                    let page = ctx.parent_value.try_downcast_ref::<ConnectionPage>()?;
                    let last = page.rows.len().checked_sub(1);
                    Ok(Some(FieldValue::owned_any(PageSeed {
                        has_next: page.has_next,
                        has_prev: page.offset > 0,
                        start: (!page.rows.is_empty()).then(|| encode_cursor(page.offset)),
                        end: last.map(|i| encode_cursor(page.offset + i as u32)),
                    })))
                })
            },
        ))
}

/// The shared PageInfo object, registered once per schema.
pub fn page_info_object() -> Object {
    Object::new("PageInfo")
        .field(Field::new(
            "hasNextPage",
            TypeRef::named_nn(TypeRef::BOOLEAN),
            move |ctx| {
                FieldFuture::new(async move {
                    let info = ctx.parent_value.try_downcast_ref::<PageSeed>()?;
                    Ok(Some(FieldValue::value(GqlValue::from(info.has_next))))
                })
            },
        ))
        .field(Field::new(
            "hasPreviousPage",
            TypeRef::named_nn(TypeRef::BOOLEAN),
            move |ctx| {
                FieldFuture::new(async move {
                    let info = ctx.parent_value.try_downcast_ref::<PageSeed>()?;
                    Ok(Some(FieldValue::value(GqlValue::from(info.has_prev))))
                })
            },
        ))
        .field(Field::new("startCursor", TypeRef::named("Cursor"), move |ctx| {
            FieldFuture::new(async move {
                let info = ctx.parent_value.try_downcast_ref::<PageSeed>()?;
                Ok(info
                    .start
                    .clone()
                    .map(|c| FieldValue::value(GqlValue::String(c))))
            })
        }))
        .field(Field::new("endCursor", TypeRef::named("Cursor"), move |ctx| {
            FieldFuture::new(async move {
                let info = ctx.parent_value.try_downcast_ref::<PageSeed>()?;
                Ok(info
                    .end
                    .clone()
                    .map(|c| FieldValue::value(GqlValue::String(c))))
            })
        }))
}

fn row_lookup_field(entity: &ResolvedEntity, pool: &PgPool) -> Field {
    let lookup_entity = Arc::new(entity.clone());
    let pool = pool.clone();
    Field::new(
        entity.row_field.clone(),
        TypeRef::named(&entity.type_name),
        move |ctx| {
            let entity = lookup_entity.clone();
            let pool = pool.clone();
            FieldFuture::new(async move {
                let args = ctx.args.as_index_map();
                let id = args.get("id").map(gql_to_json).unwrap_or(Value::Null);
                if id.is_null() {
                    return Ok(None);
                }
                let id = parse_pk(&entity, &id)?;
                let row = QueryExecutor::fetch_by_pk(&pool, &entity, &id)
                    .await
                    .map_err(resolver_error)?;
                Ok(row.map(FieldValue::owned_any))
            })
        },
    )
    .description(format!(
        "Look up a single `{}` row by primary key",
        entity.table_name
    ))
    .argument(InputValue::new(
        "id",
        TypeRef::named_nn(entity.pk_scalar().type_name()),
    ))
}

fn all_rows_field(entity: &ResolvedEntity, pool: &PgPool) -> Field {
    let list_entity = Arc::new(entity.clone());
    let pool = pool.clone();
    Field::new(
        entity.all_field.clone(),
        TypeRef::named_nn(entity.connection_type()),
        move |ctx| {
            let entity = list_entity.clone();
            let pool = pool.clone();
            FieldFuture::new(async move {
                let args = ctx.args.as_index_map();
                let first = arg_u32(args, "first", DEFAULT_PAGE_SIZE);
                let offset = arg_u32(args, "offset", 0);
                let filters = condition_filters(&entity, args.get("condition"));
                let page = fetch_page(&pool, &entity, filters, first, offset)
                    .await
                    .map_err(resolver_error)?;
                Ok(Some(FieldValue::owned_any(page)))
            })
        },
    )
    .description(format!("Read all `{}` rows, paged", entity.table_name))
    .argument(InputValue::new("first", TypeRef::named(TypeRef::INT)))
    .argument(InputValue::new("offset", TypeRef::named(TypeRef::INT)))
    .argument(InputValue::new(
        "condition",
        TypeRef::named(entity.condition_type()),
    ))
}

/// Register one entity's types and query fields; returns the extended Query object.
pub fn register_entity(
    entity: &ResolvedEntity,
    model: &Arc<ResolvedModel>,
    pool: &PgPool,
    query: Object,
    types: &mut Vec<Type>,
) -> Object {
    types.push(Type::Object(entity_object(entity, model, pool)));
    types.push(Type::InputObject(condition_input(entity)));
    types.push(Type::Object(edge_object(entity)));
    types.push(Type::Object(connection_object(entity, pool)));

    query
        .field(row_lookup_field(entity, pool))
        .field(all_rows_field(entity, pool))
}
