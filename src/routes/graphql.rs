//! GraphQL routes: the execution endpoint and, when enabled, the console.

use crate::handlers::graphql::{execute, graphiql, graphiql_enhanced};
use crate::state::AppState;
use crate::SchemaOptions;
use axum::{
    routing::{get, post},
    Router,
};

pub fn graphql_routes(state: AppState, options: &SchemaOptions) -> Router {
    let mut router = Router::new().route("/graphql", post(execute));
    if options.graphiql {
        let console = if options.enhance_graphiql {
            get(graphiql_enhanced)
        } else {
            get(graphiql)
        };
        router = router.route("/graphiql", console);
    }
    router.with_state(state)
}
