//! Resolved entity model: catalog snapshot flattened into the names and
//! metadata the schema generator and SQL builder work from.

use crate::case::{pluralize, singularize, to_camel_case, to_pascal_case};
use crate::error::IntrospectError;
use crate::introspect::types::{Catalog, ColumnRow};
use std::collections::{HashMap, HashSet};

/// Primary key type for parsing id arguments.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PkType {
    Uuid,
    BigInt,
    Int,
    Text,
}

/// GraphQL scalar a column maps to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GqlScalar {
    Uuid,
    String,
    Int,
    BigInt,
    Float,
    Boolean,
    Datetime,
    Date,
    BigFloat,
    Json,
}

impl GqlScalar {
    pub fn type_name(&self) -> &'static str {
        match self {
            GqlScalar::Uuid => "UUID",
            GqlScalar::String => "String",
            GqlScalar::Int => "Int",
            GqlScalar::BigInt => "BigInt",
            GqlScalar::Float => "Float",
            GqlScalar::Boolean => "Boolean",
            GqlScalar::Datetime => "Datetime",
            GqlScalar::Date => "Date",
            GqlScalar::BigFloat => "BigFloat",
            GqlScalar::Json => "JSON",
        }
    }
}

fn scalar_for_udt(udt: &str) -> GqlScalar {
    match udt {
        "uuid" => GqlScalar::Uuid,
        "text" | "varchar" | "bpchar" | "name" | "citext" => GqlScalar::String,
        "int2" | "int4" => GqlScalar::Int,
        "int8" => GqlScalar::BigInt,
        "float4" | "float8" => GqlScalar::Float,
        "bool" => GqlScalar::Boolean,
        "timestamp" | "timestamptz" => GqlScalar::Datetime,
        "date" => GqlScalar::Date,
        "numeric" => GqlScalar::BigFloat,
        "json" | "jsonb" => GqlScalar::Json,
        _ => GqlScalar::String,
    }
}

/// Direction of a derived relation field: to_one (we hold the FK) or
/// to_many (they hold the FK to us).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RelationDirection {
    ToOne,
    ToMany,
}

/// One derived relation field, e.g. `facilityByFacilityId` (to_one) or
/// `locationsByFacilityId` (to_many).
#[derive(Clone, Debug)]
pub struct RelationSpec {
    pub field_name: String,
    pub direction: RelationDirection,
    /// Table name of the related entity (key into the model).
    pub related_table: String,
    /// Our column used in the join (our FK for to_one; our PK for to_many).
    pub our_key_column: String,
    /// Their column used in the join (their PK for to_one; their FK for to_many).
    pub their_key_column: String,
}

#[derive(Clone, Debug)]
pub struct ColumnInfo {
    /// snake_case column name, as in the database.
    pub name: String,
    /// camelCase field name, as exposed in the schema.
    pub field_name: String,
    pub scalar: GqlScalar,
    pub is_pk: bool,
    pub nullable: bool,
    pub has_default: bool,
    /// PostgreSQL type name for `$n::type` casts when binding values.
    pub pg_type: String,
    /// Select the column as `col::text` so rows decode uniformly
    /// (enums, numeric, and types without a native JSON mapping).
    pub cast_to_text: bool,
}

#[derive(Clone, Debug)]
pub struct ResolvedEntity {
    pub schema_name: String,
    pub table_name: String,
    /// PascalCase singular, e.g. "UserFacility".
    pub type_name: String,
    /// PascalCase plural, e.g. "UserFacilities"; prefixes Connection/Edge types.
    pub plural_type_name: String,
    /// Lookup query field, e.g. "userFacilityById".
    pub row_field: String,
    /// Collection query field, e.g. "allUserFacilities".
    pub all_field: String,
    pub pk_column: String,
    pub pk_type: PkType,
    pub columns: Vec<ColumnInfo>,
    pub relations: Vec<RelationSpec>,
}

impl ResolvedEntity {
    pub fn connection_type(&self) -> String {
        format!("{}Connection", self.plural_type_name)
    }

    pub fn edge_type(&self) -> String {
        format!("{}Edge", self.plural_type_name)
    }

    pub fn condition_type(&self) -> String {
        format!("{}Condition", self.type_name)
    }

    pub fn input_type(&self) -> String {
        format!("{}Input", self.type_name)
    }

    pub fn patch_type(&self) -> String {
        format!("{}Patch", self.type_name)
    }

    pub fn column(&self, name: &str) -> Option<&ColumnInfo> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_by_field(&self, field_name: &str) -> Option<&ColumnInfo> {
        self.columns.iter().find(|c| c.field_name == field_name)
    }

    pub fn pk_scalar(&self) -> GqlScalar {
        self.column(&self.pk_column)
            .map(|c| c.scalar)
            .unwrap_or(GqlScalar::String)
    }
}

#[derive(Clone, Debug, Default)]
pub struct ResolvedModel {
    pub schema: String,
    pub entities: Vec<ResolvedEntity>,
    pub entity_by_table: HashMap<String, ResolvedEntity>,
}

impl ResolvedModel {
    pub fn entity(&self, table: &str) -> Option<&ResolvedEntity> {
        self.entity_by_table.get(table)
    }
}

fn pk_type_for(col: &ColumnRow) -> PkType {
    match col.udt_name.as_str() {
        "uuid" => PkType::Uuid,
        "int8" => PkType::BigInt,
        "int2" | "int4" => PkType::Int,
        _ => PkType::Text,
    }
}

/// Build the resolved model from a catalog snapshot.
///
/// Tables without a single-column primary key are skipped (no stable lookup
/// field can be derived for them); foreign keys touching a skipped table are
/// dropped with the table.
pub fn resolve(catalog: &Catalog) -> Result<ResolvedModel, IntrospectError> {
    if catalog.tables.is_empty() {
        return Err(IntrospectError::EmptySchema(catalog.schema.clone()));
    }

    let mut columns_by_table: HashMap<&str, Vec<&ColumnRow>> = HashMap::new();
    for c in &catalog.columns {
        columns_by_table.entry(c.table_name.as_str()).or_default().push(c);
    }

    let mut pk_by_table: HashMap<&str, Vec<&str>> = HashMap::new();
    for pk in &catalog.primary_keys {
        pk_by_table
            .entry(pk.table_name.as_str())
            .or_default()
            .push(pk.column_name.as_str());
    }

    let mut entities = Vec::new();
    let mut seen_types: HashMap<String, String> = HashMap::new();

    for table in &catalog.tables {
        let name = table.table_name.as_str();
        let pk_cols = pk_by_table.get(name).map(Vec::as_slice).unwrap_or(&[]);
        let pk_column = match pk_cols {
            [single] => (*single).to_string(),
            [] => {
                tracing::warn!(table = name, "skipping table without a primary key");
                continue;
            }
            _ => {
                tracing::warn!(table = name, "skipping table with a composite primary key");
                continue;
            }
        };

        let table_cols = columns_by_table.get(name).map(Vec::as_slice).unwrap_or(&[]);
        let pk_row = table_cols.iter().find(|c| c.column_name == pk_column);
        let pk_type = match pk_row {
            Some(row) => pk_type_for(row),
            None => continue,
        };

        let columns: Vec<ColumnInfo> = table_cols
            .iter()
            .map(|c| {
                let scalar = scalar_for_udt(&c.udt_name);
                let user_defined = c.data_type == "USER-DEFINED";
                let unmapped = scalar == GqlScalar::String
                    && !matches!(c.udt_name.as_str(), "text" | "varchar" | "bpchar" | "name" | "citext");
                ColumnInfo {
                    name: c.column_name.clone(),
                    field_name: to_camel_case(&c.column_name),
                    scalar,
                    is_pk: c.column_name == pk_column,
                    nullable: c.nullable,
                    has_default: c.has_default,
                    pg_type: c.udt_name.clone(),
                    cast_to_text: user_defined || unmapped || scalar == GqlScalar::BigFloat,
                }
            })
            .collect();

        let singular = singularize(name);
        let type_name = to_pascal_case(&singular);
        if let Some(prior) = seen_types.insert(type_name.clone(), name.to_string()) {
            return Err(IntrospectError::DuplicateName {
                name: type_name,
                first: prior,
                second: name.to_string(),
            });
        }

        entities.push(ResolvedEntity {
            schema_name: catalog.schema.clone(),
            table_name: name.to_string(),
            plural_type_name: to_pascal_case(&pluralize(&singular)),
            row_field: format!("{}ById", to_camel_case(&singular)),
            all_field: format!("all{}", to_pascal_case(&pluralize(&singular))),
            type_name,
            pk_column,
            pk_type,
            columns,
            relations: Vec::new(),
        });
    }

    let entity_tables: HashSet<String> = entities.iter().map(|e| e.table_name.clone()).collect();

    // Single-column foreign keys only; each one derives a field in both directions.
    let mut fk_member_count: HashMap<&str, usize> = HashMap::new();
    for fk in &catalog.foreign_keys {
        *fk_member_count.entry(fk.constraint_name.as_str()).or_default() += 1;
    }
    let mut relations: HashMap<String, Vec<RelationSpec>> = HashMap::new();
    for fk in &catalog.foreign_keys {
        if fk_member_count[fk.constraint_name.as_str()] != 1 {
            continue;
        }
        if !entity_tables.contains(&fk.child_table) || !entity_tables.contains(&fk.parent_table) {
            continue;
        }
        let parent_singular = singularize(&fk.parent_table);
        relations.entry(fk.child_table.clone()).or_default().push(RelationSpec {
            field_name: format!(
                "{}By{}",
                to_camel_case(&parent_singular),
                to_pascal_case(&fk.child_column)
            ),
            direction: RelationDirection::ToOne,
            related_table: fk.parent_table.clone(),
            our_key_column: fk.child_column.clone(),
            their_key_column: fk.parent_column.clone(),
        });
        relations.entry(fk.parent_table.clone()).or_default().push(RelationSpec {
            field_name: format!(
                "{}By{}",
                to_camel_case(&fk.child_table),
                to_pascal_case(&fk.child_column)
            ),
            direction: RelationDirection::ToMany,
            related_table: fk.child_table.clone(),
            our_key_column: fk.parent_column.clone(),
            their_key_column: fk.child_column.clone(),
        });
    }
    for entity in &mut entities {
        if let Some(mut specs) = relations.remove(&entity.table_name) {
            specs.sort_by(|a, b| a.field_name.cmp(&b.field_name));
            entity.relations = specs;
        }
    }

    let entity_by_table = entities
        .iter()
        .map(|e| (e.table_name.clone(), e.clone()))
        .collect();

    Ok(ResolvedModel {
        schema: catalog.schema.clone(),
        entities,
        entity_by_table,
    })
}
