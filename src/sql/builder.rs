//! Builds parameterized SELECT, COUNT, INSERT, UPDATE, DELETE from a resolved entity.

use crate::introspect::ResolvedEntity;
use serde_json::Value;
use std::collections::HashMap;

/// Quote identifier for PostgreSQL (safe: only from the introspected catalog).
fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

/// Fully qualified table name.
fn qualified_table(entity: &ResolvedEntity) -> String {
    format!("{}.{}", quoted(&entity.schema_name), quoted(&entity.table_name))
}

pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<Value>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    fn push_param(&mut self, v: Value) -> usize {
        self.params.push(v);
        self.params.len()
    }
}

/// SELECT list: each column as-is, except columns flagged for text casting
/// (enums, numeric, unmapped types) as col::text so rows decode uniformly.
fn select_column_list(entity: &ResolvedEntity) -> String {
    entity
        .columns
        .iter()
        .map(|c| {
            let q = quoted(&c.name);
            if c.cast_to_text {
                format!("{}::text AS {}", q, q)
            } else {
                q
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn cast_placeholder(entity: &ResolvedEntity, col: &str, param_num: usize) -> String {
    entity
        .column(col)
        .map(|c| format!("${}::{}", param_num, c.pg_type))
        .unwrap_or_else(|| format!("${}", param_num))
}

/// SELECT by primary key (single column PK only).
pub fn select_by_pk(entity: &ResolvedEntity, id: &Value) -> QueryBuf {
    let mut q = QueryBuf::new();
    let table = qualified_table(entity);
    let cols = select_column_list(entity);
    let n = q.push_param(id.clone());
    let ph = cast_placeholder(entity, &entity.pk_column, n);
    q.sql = format!(
        "SELECT {} FROM {} WHERE {} = {}",
        cols,
        table,
        quoted(&entity.pk_column),
        ph
    );
    q
}

/// SELECT list with equality filters, ORDER BY pk, LIMIT/OFFSET.
/// Callers bound `limit`; the schema only admits known condition fields, and
/// unknown filter columns are dropped rather than interpolated.
pub fn select_connection(
    entity: &ResolvedEntity,
    filters: &[(String, Value)],
    limit: u32,
    offset: u32,
) -> QueryBuf {
    let mut q = QueryBuf::new();
    let table = qualified_table(entity);
    let cols = select_column_list(entity);

    let mut where_parts = Vec::new();
    for (col, val) in filters {
        if entity.column(col).is_none() {
            continue;
        }
        if val.is_null() {
            where_parts.push(format!("{} IS NULL", quoted(col)));
            continue;
        }
        let n = q.push_param(val.clone());
        let ph = cast_placeholder(entity, col, n);
        where_parts.push(format!("{} = {}", quoted(col), ph));
    }
    let where_clause = if where_parts.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", where_parts.join(" AND "))
    };

    q.sql = format!(
        "SELECT {} FROM {}{} ORDER BY {} LIMIT {} OFFSET {}",
        cols,
        table,
        where_clause,
        quoted(&entity.pk_column),
        limit,
        offset
    );
    q
}

/// SELECT COUNT(*) with the same filter semantics as [`select_connection`].
pub fn count(entity: &ResolvedEntity, filters: &[(String, Value)]) -> QueryBuf {
    let mut q = QueryBuf::new();
    let table = qualified_table(entity);

    let mut where_parts = Vec::new();
    for (col, val) in filters {
        if entity.column(col).is_none() {
            continue;
        }
        if val.is_null() {
            where_parts.push(format!("{} IS NULL", quoted(col)));
            continue;
        }
        let n = q.push_param(val.clone());
        let ph = cast_placeholder(entity, col, n);
        where_parts.push(format!("{} = {}", quoted(col), ph));
    }
    let where_clause = if where_parts.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", where_parts.join(" AND "))
    };

    q.sql = format!("SELECT COUNT(*) AS count FROM {}{}", table, where_clause);
    q
}

/// INSERT: columns and placeholders from entity; values from input.
/// Omits columns with a DB default when the input does not provide a value.
pub fn insert(entity: &ResolvedEntity, input: &HashMap<String, Value>) -> QueryBuf {
    let mut q = QueryBuf::new();
    let table = qualified_table(entity);
    let mut cols = Vec::new();
    let mut placeholders = Vec::new();
    for c in &entity.columns {
        let val = input.get(&c.name).cloned();
        if val.is_none() && (c.has_default || c.nullable) {
            continue;
        }
        let val = val.unwrap_or(Value::Null);
        let n = q.push_param(val);
        cols.push(quoted(&c.name));
        placeholders.push(format!("${}::{}", n, c.pg_type));
    }
    let returning = select_column_list(entity);
    q.sql = if cols.is_empty() {
        format!("INSERT INTO {} DEFAULT VALUES RETURNING {}", table, returning)
    } else {
        format!(
            "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
            table,
            cols.join(", "),
            placeholders.join(", "),
            returning
        )
    };
    q
}

/// UPDATE by pk: SET only columns present in the patch (and in entity columns).
pub fn update_by_pk(entity: &ResolvedEntity, id: &Value, patch: &HashMap<String, Value>) -> QueryBuf {
    let mut q = QueryBuf::new();
    let table = qualified_table(entity);
    let mut sets = Vec::new();
    for c in &entity.columns {
        if c.is_pk {
            continue;
        }
        let Some(v) = patch.get(&c.name) else { continue };
        let n = q.push_param(v.clone());
        sets.push(format!("{} = ${}::{}", quoted(&c.name), n, c.pg_type));
    }
    if sets.is_empty() {
        return select_by_pk(entity, id);
    }
    if entity.column("updated_at").is_some() && !patch.contains_key("updated_at") {
        sets.push(format!("{} = NOW()", quoted("updated_at")));
    }
    let id_num = q.push_param(id.clone());
    let id_ph = cast_placeholder(entity, &entity.pk_column, id_num);
    let returning = select_column_list(entity);
    q.sql = format!(
        "UPDATE {} SET {} WHERE {} = {} RETURNING {}",
        table,
        sets.join(", "),
        quoted(&entity.pk_column),
        id_ph,
        returning
    );
    q
}

/// DELETE by pk, returning the deleted row.
pub fn delete_by_pk(entity: &ResolvedEntity, id: &Value) -> QueryBuf {
    let mut q = QueryBuf::new();
    let table = qualified_table(entity);
    let n = q.push_param(id.clone());
    let ph = cast_placeholder(entity, &entity.pk_column, n);
    let returning = select_column_list(entity);
    q.sql = format!(
        "DELETE FROM {} WHERE {} = {} RETURNING {}",
        table,
        quoted(&entity.pk_column),
        ph,
        returning
    );
    q
}
