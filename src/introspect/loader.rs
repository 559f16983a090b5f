//! Catalog queries against information_schema and pg_catalog.
//!
//! information_schema identifier columns are domains over `name`, so every
//! selected identifier is cast to text for uniform decoding.

use crate::error::IntrospectError;
use crate::introspect::types::{Catalog, ColumnRow, ForeignKeyRow, PrimaryKeyRow, TableRow};
use sqlx::PgPool;

const TABLES_SQL: &str = r#"
    SELECT table_name::text AS table_name
    FROM information_schema.tables
    WHERE table_schema = $1 AND table_type = 'BASE TABLE'
    ORDER BY table_name
"#;

const COLUMNS_SQL: &str = r#"
    SELECT
        table_name::text AS table_name,
        column_name::text AS column_name,
        udt_name::text AS udt_name,
        data_type::text AS data_type,
        (is_nullable = 'YES') AS nullable,
        (column_default IS NOT NULL) AS has_default,
        ordinal_position::int4 AS ordinal_position
    FROM information_schema.columns
    WHERE table_schema = $1
    ORDER BY table_name, ordinal_position
"#;

const PRIMARY_KEYS_SQL: &str = r#"
    SELECT
        tc.table_name::text AS table_name,
        kcu.column_name::text AS column_name,
        kcu.ordinal_position::int4 AS ordinal_position
    FROM information_schema.table_constraints tc
    JOIN information_schema.key_column_usage kcu
        ON kcu.constraint_name = tc.constraint_name
        AND kcu.table_schema = tc.table_schema
    WHERE tc.constraint_type = 'PRIMARY KEY' AND tc.table_schema = $1
    ORDER BY tc.table_name, kcu.ordinal_position
"#;

const FOREIGN_KEYS_SQL: &str = r#"
    SELECT
        con.conname::text AS constraint_name,
        child.relname::text AS child_table,
        att_child.attname::text AS child_column,
        parent.relname::text AS parent_table,
        att_parent.attname::text AS parent_column
    FROM pg_catalog.pg_constraint con
    JOIN pg_catalog.pg_class child ON child.oid = con.conrelid
    JOIN pg_catalog.pg_class parent ON parent.oid = con.confrelid
    JOIN pg_catalog.pg_namespace ns ON ns.oid = child.relnamespace
    JOIN LATERAL unnest(con.conkey) WITH ORDINALITY AS ck(attnum, ord) ON true
    JOIN LATERAL unnest(con.confkey) WITH ORDINALITY AS fk(attnum, ord) ON fk.ord = ck.ord
    JOIN pg_catalog.pg_attribute att_child
        ON att_child.attrelid = child.oid AND att_child.attnum = ck.attnum
    JOIN pg_catalog.pg_attribute att_parent
        ON att_parent.attrelid = parent.oid AND att_parent.attnum = fk.attnum
    WHERE con.contype = 'f' AND ns.nspname = $1
    ORDER BY con.conname, ck.ord
"#;

/// Read a full catalog snapshot for one schema.
pub async fn load_catalog(pool: &PgPool, schema: &str) -> Result<Catalog, IntrospectError> {
    let tables: Vec<TableRow> = sqlx::query_as(TABLES_SQL).bind(schema).fetch_all(pool).await?;
    let columns: Vec<ColumnRow> = sqlx::query_as(COLUMNS_SQL).bind(schema).fetch_all(pool).await?;
    let primary_keys: Vec<PrimaryKeyRow> = sqlx::query_as(PRIMARY_KEYS_SQL)
        .bind(schema)
        .fetch_all(pool)
        .await?;
    let foreign_keys: Vec<ForeignKeyRow> = sqlx::query_as(FOREIGN_KEYS_SQL)
        .bind(schema)
        .fetch_all(pool)
        .await?;

    tracing::debug!(
        schema,
        tables = tables.len(),
        columns = columns.len(),
        "catalog snapshot loaded"
    );

    Ok(Catalog {
        schema: schema.to_string(),
        tables,
        columns,
        primary_keys,
        foreign_keys,
    })
}
