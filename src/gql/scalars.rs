//! Custom scalars and JSON <-> GraphQL value conversion.
//!
//! Rows travel through resolvers as `serde_json::Value`; these helpers move
//! individual cells across the GraphQL boundary.

use async_graphql::dynamic::{Scalar, SchemaBuilder};
use async_graphql::Value as GqlValue;
use serde_json::Value;

/// Scalars the derivation emits beyond the GraphQL built-ins.
const CUSTOM_SCALARS: &[(&str, &str)] = &[
    ("UUID", "String-encoded UUID"),
    ("Datetime", "ISO 8601 timestamp"),
    ("Date", "ISO 8601 calendar date"),
    ("BigInt", "64-bit integer"),
    ("BigFloat", "Arbitrary-precision decimal, transported as a string"),
    ("Cursor", "Opaque pagination cursor"),
    ("JSON", "Unstructured JSON value"),
];

pub fn register(mut schema: SchemaBuilder) -> SchemaBuilder {
    for (name, desc) in CUSTOM_SCALARS {
        schema = schema.register(Scalar::new(*name).description(*desc));
    }
    schema
}

/// Convert a JSON cell to a GraphQL value.
pub fn json_to_gql(v: &Value) -> GqlValue {
    GqlValue::from_json(v.clone()).unwrap_or(GqlValue::Null)
}

/// Convert a GraphQL input value to JSON.
pub fn gql_to_json(v: &GqlValue) -> Value {
    serde_json::to_value(v).unwrap_or(Value::Null)
}
