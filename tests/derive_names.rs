//! Derivation checks that need no database: inflection, resolved naming,
//! relation fields, and SQL construction.

use autograph::case::{pluralize, singularize, to_camel_case, to_pascal_case, to_snake_case};
use autograph::introspect::{
    resolve, Catalog, ColumnRow, ForeignKeyRow, PrimaryKeyRow, RelationDirection, TableRow,
};
use autograph::sql;
use serde_json::json;

fn column(table: &str, name: &str, udt: &str, position: i32) -> ColumnRow {
    ColumnRow {
        table_name: table.to_string(),
        column_name: name.to_string(),
        udt_name: udt.to_string(),
        data_type: "base".to_string(),
        nullable: false,
        has_default: false,
        ordinal_position: position,
    }
}

fn fixture_catalog() -> Catalog {
    Catalog {
        schema: "public".to_string(),
        tables: vec![
            TableRow { table_name: "facilities".to_string() },
            TableRow { table_name: "locations".to_string() },
            TableRow { table_name: "user_facilities".to_string() },
            TableRow { table_name: "users".to_string() },
        ],
        columns: vec![
            column("facilities", "id", "uuid", 1),
            column("facilities", "name", "text", 2),
            column("locations", "id", "uuid", 1),
            column("locations", "facility_id", "uuid", 2),
            column("locations", "state", "text", 3),
            column("user_facilities", "id", "uuid", 1),
            column("user_facilities", "user_id", "uuid", 2),
            column("user_facilities", "facility_id", "uuid", 3),
            column("users", "id", "uuid", 1),
            column("users", "first_name", "text", 2),
        ],
        primary_keys: vec![
            PrimaryKeyRow {
                table_name: "facilities".to_string(),
                column_name: "id".to_string(),
                ordinal_position: 1,
            },
            PrimaryKeyRow {
                table_name: "locations".to_string(),
                column_name: "id".to_string(),
                ordinal_position: 1,
            },
            PrimaryKeyRow {
                table_name: "user_facilities".to_string(),
                column_name: "id".to_string(),
                ordinal_position: 1,
            },
            PrimaryKeyRow {
                table_name: "users".to_string(),
                column_name: "id".to_string(),
                ordinal_position: 1,
            },
        ],
        foreign_keys: vec![
            ForeignKeyRow {
                constraint_name: "locations_facility_id_fkey".to_string(),
                child_table: "locations".to_string(),
                child_column: "facility_id".to_string(),
                parent_table: "facilities".to_string(),
                parent_column: "id".to_string(),
            },
            ForeignKeyRow {
                constraint_name: "user_facilities_user_id_fkey".to_string(),
                child_table: "user_facilities".to_string(),
                child_column: "user_id".to_string(),
                parent_table: "users".to_string(),
                parent_column: "id".to_string(),
            },
            ForeignKeyRow {
                constraint_name: "user_facilities_facility_id_fkey".to_string(),
                child_table: "user_facilities".to_string(),
                child_column: "facility_id".to_string(),
                parent_table: "facilities".to_string(),
                parent_column: "id".to_string(),
            },
        ],
    }
}

#[test]
fn inflection_round_trips() {
    assert_eq!(to_camel_case("first_name"), "firstName");
    assert_eq!(to_snake_case("firstName"), "first_name");
    assert_eq!(to_pascal_case("user_facilities"), "UserFacilities");
    assert_eq!(singularize("users"), "user");
    assert_eq!(singularize("facilities"), "facility");
    assert_eq!(singularize("user_facilities"), "user_facility");
    assert_eq!(singularize("addresses"), "address");
    assert_eq!(pluralize("facility"), "facilities");
    assert_eq!(pluralize("user"), "users");
}

#[test]
fn resolve_derives_lookup_and_collection_names() {
    let model = resolve(&fixture_catalog()).expect("fixture resolves");

    let users = model.entity("users").expect("users entity");
    assert_eq!(users.type_name, "User");
    assert_eq!(users.row_field, "userById");
    assert_eq!(users.all_field, "allUsers");
    assert_eq!(users.connection_type(), "UsersConnection");

    let junction = model.entity("user_facilities").expect("junction entity");
    assert_eq!(junction.type_name, "UserFacility");
    assert_eq!(junction.all_field, "allUserFacilities");
    assert_eq!(junction.connection_type(), "UserFacilitiesConnection");

    let first_name = users.column("first_name").expect("first_name column");
    assert_eq!(first_name.field_name, "firstName");
}

#[test]
fn resolve_derives_relation_fields_in_both_directions() {
    let model = resolve(&fixture_catalog()).expect("fixture resolves");

    let users = model.entity("users").expect("users entity");
    let to_many = users
        .relations
        .iter()
        .find(|r| r.field_name == "userFacilitiesByUserId")
        .expect("to_many relation on users");
    assert_eq!(to_many.direction, RelationDirection::ToMany);
    assert_eq!(to_many.related_table, "user_facilities");
    assert_eq!(to_many.our_key_column, "id");
    assert_eq!(to_many.their_key_column, "user_id");

    let junction = model.entity("user_facilities").expect("junction entity");
    let to_one = junction
        .relations
        .iter()
        .find(|r| r.field_name == "facilityByFacilityId")
        .expect("to_one relation on junction");
    assert_eq!(to_one.direction, RelationDirection::ToOne);
    assert_eq!(to_one.related_table, "facilities");

    let facilities = model.entity("facilities").expect("facilities entity");
    assert!(facilities
        .relations
        .iter()
        .any(|r| r.field_name == "locationsByFacilityId"));
}

#[test]
fn select_builders_quote_and_parameterize() {
    let model = resolve(&fixture_catalog()).expect("fixture resolves");
    let locations = model.entity("locations").expect("locations entity");

    let q = sql::select_by_pk(locations, &json!("9c7e3a52-1b6c-4d7a-8e0f-3b2a6c1d9e01"));
    assert_eq!(
        q.sql,
        "SELECT \"id\", \"facility_id\", \"state\" FROM \"public\".\"locations\" WHERE \"id\" = $1::uuid"
    );
    assert_eq!(q.params.len(), 1);

    let filters = vec![("state".to_string(), json!("CA"))];
    let q = sql::select_connection(locations, &filters, 10, 0);
    assert!(q.sql.contains("WHERE \"state\" = $1::text"), "sql: {}", q.sql);
    assert!(q.sql.ends_with("ORDER BY \"id\" LIMIT 10 OFFSET 0"), "sql: {}", q.sql);

    let q = sql::count(locations, &filters);
    assert_eq!(
        q.sql,
        "SELECT COUNT(*) AS count FROM \"public\".\"locations\" WHERE \"state\" = $1::text"
    );

    // Unknown filter columns are ignored rather than interpolated.
    let bogus = vec![("not_a_column".to_string(), json!("x"))];
    let q = sql::select_connection(locations, &bogus, 10, 0);
    assert!(!q.sql.contains("not_a_column"));
    assert!(q.params.is_empty());
}

#[test]
fn mutation_builders_respect_defaults_and_pk() {
    let model = resolve(&fixture_catalog()).expect("fixture resolves");
    let users = model.entity("users").expect("users entity");

    let mut input = std::collections::HashMap::new();
    input.insert("id".to_string(), json!("d6fbc5cf-8c87-442c-9bb9-cfaf4926fe01"));
    input.insert("first_name".to_string(), json!("John"));
    let q = sql::insert(users, &input);
    assert!(q.sql.starts_with("INSERT INTO \"public\".\"users\""), "sql: {}", q.sql);
    assert!(q.sql.contains("RETURNING"), "sql: {}", q.sql);
    assert_eq!(q.params.len(), 2);

    let mut patch = std::collections::HashMap::new();
    patch.insert("first_name".to_string(), json!("Johnny"));
    let q = sql::update_by_pk(users, &json!("d6fbc5cf-8c87-442c-9bb9-cfaf4926fe01"), &patch);
    assert!(q.sql.contains("SET \"first_name\" = $1::text"), "sql: {}", q.sql);
    assert!(q.sql.contains("WHERE \"id\" = $2::uuid"), "sql: {}", q.sql);

    let q = sql::delete_by_pk(users, &json!("d6fbc5cf-8c87-442c-9bb9-cfaf4926fe01"));
    assert!(q.sql.starts_with("DELETE FROM \"public\".\"users\""), "sql: {}", q.sql);
    assert_eq!(q.params.len(), 1);
}
