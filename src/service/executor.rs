//! Generic query execution against PostgreSQL, rows surfaced as JSON objects.

use crate::error::AppError;
use crate::introspect::ResolvedEntity;
use crate::sql::{self, PgBindValue, QueryBuf};
use serde_json::Value;
use sqlx::PgPool;
use std::collections::HashMap;

pub struct QueryExecutor;

impl QueryExecutor {
    /// Fetch one row by primary key. Returns a JSON object or None.
    pub async fn fetch_by_pk(
        pool: &PgPool,
        entity: &ResolvedEntity,
        id: &Value,
    ) -> Result<Option<Value>, AppError> {
        let q = sql::select_by_pk(entity, id);
        Self::query_one(pool, &q).await
    }

    /// Fetch a page of rows with equality filters, ordered by primary key.
    pub async fn fetch_connection(
        pool: &PgPool,
        entity: &ResolvedEntity,
        filters: &[(String, Value)],
        limit: u32,
        offset: u32,
    ) -> Result<Vec<Value>, AppError> {
        let q = sql::select_connection(entity, filters, limit, offset);
        Self::query_many(pool, &q).await
    }

    /// Count rows matching the filters.
    pub async fn count(
        pool: &PgPool,
        entity: &ResolvedEntity,
        filters: &[(String, Value)],
    ) -> Result<i64, AppError> {
        use sqlx::Row;
        let q = sql::count(entity, filters);
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query(&q.sql);
        for p in &q.params {
            query = query.bind(PgBindValue::from_json(p));
        }
        let row = query.fetch_one(pool).await?;
        Ok(row.try_get::<i64, _>("count")?)
    }

    /// Insert one row; input may omit defaulted columns. Returns the created row.
    pub async fn insert(
        pool: &PgPool,
        entity: &ResolvedEntity,
        input: &HashMap<String, Value>,
    ) -> Result<Value, AppError> {
        let q = sql::insert(entity, input);
        Self::query_one(pool, &q)
            .await?
            .ok_or_else(|| AppError::Db(sqlx::Error::RowNotFound))
    }

    /// Update one row by pk. Returns the updated row or None when absent.
    pub async fn update_by_pk(
        pool: &PgPool,
        entity: &ResolvedEntity,
        id: &Value,
        patch: &HashMap<String, Value>,
    ) -> Result<Option<Value>, AppError> {
        let q = sql::update_by_pk(entity, id, patch);
        Self::query_one(pool, &q).await
    }

    /// Delete one row by pk. Returns the deleted row or None when absent.
    pub async fn delete_by_pk(
        pool: &PgPool,
        entity: &ResolvedEntity,
        id: &Value,
    ) -> Result<Option<Value>, AppError> {
        let q = sql::delete_by_pk(entity, id);
        Self::query_one(pool, &q).await
    }

    async fn query_one(pool: &PgPool, q: &QueryBuf) -> Result<Option<Value>, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query(&q.sql);
        for p in &q.params {
            query = query.bind(PgBindValue::from_json(p));
        }
        let row = query.fetch_optional(pool).await?;
        Ok(row.map(|r| row_to_json(&r)))
    }

    async fn query_many(pool: &PgPool, q: &QueryBuf) -> Result<Vec<Value>, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query(&q.sql);
        for p in &q.params {
            query = query.bind(PgBindValue::from_json(p));
        }
        let rows = query.fetch_all(pool).await?;
        Ok(rows.iter().map(row_to_json).collect())
    }
}

fn row_to_json(row: &sqlx::postgres::PgRow) -> Value {
    use sqlx::{Column, Row};
    let mut map = serde_json::Map::new();
    for col in row.columns() {
        let name = col.name();
        map.insert(name.to_string(), cell_to_value(row, name));
    }
    Value::Object(map)
}

fn cell_to_value(row: &sqlx::postgres::PgRow, name: &str) -> Value {
    use sqlx::Row;
    if let Ok(v) = row.try_get::<Option<i16>, _>(name) {
        return v.map(|n| Value::Number(n.into())).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<i32>, _>(name) {
        return v.map(|n| Value::Number(n.into())).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<i64>, _>(name) {
        return v.map(|n| Value::Number(n.into())).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<f32>, _>(name) {
        return v
            .and_then(|n| serde_json::Number::from_f64(n as f64))
            .map(Value::Number)
            .unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<f64>, _>(name) {
        return v
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<bool>, _>(name) {
        return v.map(Value::Bool).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<uuid::Uuid>, _>(name) {
        return v.map(|u| Value::String(u.to_string())).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(name) {
        return v.map(|t| Value::String(t.to_rfc3339())).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<chrono::NaiveDateTime>, _>(name) {
        return v
            .map(|t| Value::String(t.format("%Y-%m-%dT%H:%M:%S%.f").to_string()))
            .unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<chrono::NaiveDate>, _>(name) {
        return v
            .map(|d| Value::String(d.format("%Y-%m-%d").to_string()))
            .unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<Value>, _>(name) {
        return v.unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<String>, _>(name) {
        return v.map(Value::String).unwrap_or(Value::Null);
    }
    Value::Null
}
