//! Raw catalog rows as returned by the introspection queries.

/// One base table in the target schema.
#[derive(Clone, Debug, PartialEq, Eq, sqlx::FromRow)]
pub struct TableRow {
    pub table_name: String,
}

/// One column, in ordinal order within its table.
#[derive(Clone, Debug, PartialEq, Eq, sqlx::FromRow)]
pub struct ColumnRow {
    pub table_name: String,
    pub column_name: String,
    /// Underlying type name (e.g. "uuid", "varchar", "int4", "timestamptz").
    pub udt_name: String,
    /// "USER-DEFINED" marks enums and domains.
    pub data_type: String,
    pub nullable: bool,
    pub has_default: bool,
    pub ordinal_position: i32,
}

/// One primary-key member column.
#[derive(Clone, Debug, PartialEq, Eq, sqlx::FromRow)]
pub struct PrimaryKeyRow {
    pub table_name: String,
    pub column_name: String,
    pub ordinal_position: i32,
}

/// One foreign-key member column pair. Multi-column constraints produce one
/// row per member, ordered by position within the constraint.
#[derive(Clone, Debug, PartialEq, Eq, sqlx::FromRow)]
pub struct ForeignKeyRow {
    pub constraint_name: String,
    pub child_table: String,
    pub child_column: String,
    pub parent_table: String,
    pub parent_column: String,
}

/// Point-in-time snapshot of everything the derivation needs. Comparing two
/// snapshots for equality is how the watcher detects structural change.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Catalog {
    pub schema: String,
    pub tables: Vec<TableRow>,
    pub columns: Vec<ColumnRow>,
    pub primary_keys: Vec<PrimaryKeyRow>,
    pub foreign_keys: Vec<ForeignKeyRow>,
}
