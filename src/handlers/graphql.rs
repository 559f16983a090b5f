//! GraphQL execution handler and the interactive console.

use crate::state::AppState;
use async_graphql::http::GraphiQLSource;
use async_graphql::{Request as GqlRequest, Response as GqlResponse, Variables};
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse},
    Json,
};
use serde::Deserialize;

#[derive(Deserialize)]
pub struct GraphQLPayload {
    pub query: String,
    #[serde(default)]
    pub variables: Option<serde_json::Value>,
    #[serde(default, rename = "operationName")]
    pub operation_name: Option<String>,
}

pub async fn execute(
    State(state): State<AppState>,
    Json(payload): Json<GraphQLPayload>,
) -> impl IntoResponse {
    let mut request = GqlRequest::new(payload.query);
    if let Some(vars) = payload.variables {
        request = request.variables(Variables::from_json(vars));
    }
    if let Some(op) = payload.operation_name {
        request = request.operation_name(op);
    }
    let response = state.schema().execute(request).await;
    (response_status(&response), Json(response))
}

/// Requests rejected before execution starts (parse or validation failures,
/// e.g. a field absent from the derived schema) are client errors. Anything
/// that executed returns 200, including lookups that resolved to null;
/// errors raised inside resolvers carry a path and also map to 200.
fn response_status(response: &GqlResponse) -> StatusCode {
    if !response.errors.is_empty() && response.errors.iter().all(|e| e.path.is_empty()) {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::OK
    }
}

pub async fn graphiql() -> impl IntoResponse {
    Html(GraphiQLSource::build().endpoint("/graphql").finish())
}

/// Console with the extras switched on.
pub async fn graphiql_enhanced() -> impl IntoResponse {
    Html(
        GraphiQLSource::build()
            .endpoint("/graphql")
            .title("Autograph Explorer")
            .finish(),
    )
}
