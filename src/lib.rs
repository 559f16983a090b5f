//! Autograph: introspection-driven GraphQL backend library for PostgreSQL.
//!
//! Point [`build_router`] at a connection pool and a schema name and it
//! introspects the tables, columns, primary keys and foreign keys, derives a
//! GraphQL schema (lookup and connection query fields, relationship
//! traversal, CRUD mutations), and returns an axum router serving it.

pub mod case;
pub mod error;
pub mod gql;
pub mod handlers;
pub mod introspect;
pub mod routes;
pub mod service;
pub mod sql;
pub mod state;
pub mod watch;

pub use error::{AppError, IntrospectError};
pub use gql::generate_schema;
pub use introspect::{load_catalog, resolve, Catalog, ResolvedEntity, ResolvedModel};
pub use routes::{common_routes, graphql_routes};
pub use service::QueryExecutor;
pub use state::AppState;

use axum::Router;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;

/// Options controlling the derived service.
#[derive(Clone, Debug)]
pub struct SchemaOptions {
    /// Target schema to introspect.
    pub schema: String,
    /// Re-derive the GraphQL schema when the database structure changes.
    pub watch: bool,
    /// Poll interval for `watch`.
    pub watch_interval: Duration,
    /// Serve the interactive console at /graphiql.
    pub graphiql: bool,
    /// Console extras (branding, richer defaults).
    pub enhance_graphiql: bool,
}

impl Default for SchemaOptions {
    fn default() -> Self {
        SchemaOptions {
            schema: "public".to_string(),
            watch: false,
            watch_interval: Duration::from_secs(5),
            graphiql: false,
            enhance_graphiql: false,
        }
    }
}

/// Introspect the database and build the serving router: POST /graphql,
/// the optional console, and the common operational routes. When `watch`
/// is set, a background task keeps the schema in step with the database.
pub async fn build_router(pool: PgPool, options: SchemaOptions) -> Result<Router, AppError> {
    let catalog = introspect::load_catalog(&pool, &options.schema).await?;
    let model = Arc::new(introspect::resolve(&catalog)?);
    let schema = gql::generate_schema(&model, &pool)?;
    tracing::info!(
        schema = %options.schema,
        entities = model.entities.len(),
        "derived GraphQL schema"
    );

    let state = AppState::new(pool, model, schema);
    if options.watch {
        // Detached; lives as long as the process.
        let _watcher = watch::spawn_watcher(state.clone(), catalog, options.watch_interval);
    }

    let router = routes::common_routes(state.clone()).merge(routes::graphql_routes(state, &options));
    Ok(router)
}
