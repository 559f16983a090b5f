use anyhow::Result;
use autograph::SchemaOptions;
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use sqlx::PgPool;
use tower::ServiceExt;

#[path = "harness.rs"]
mod harness;

use harness::{run_test, FIXTURE_SCHEMA, JOHN_ID, MISSING_ID};

async fn build_app(pool: &PgPool) -> Result<Router> {
    let options = SchemaOptions {
        schema: FIXTURE_SCHEMA.to_string(),
        ..SchemaOptions::default()
    };
    Ok(autograph::build_router(pool.clone(), options).await?)
}

async fn graphql_request(
    app: &Router,
    query: &str,
    variables: Value,
) -> Result<(StatusCode, Value)> {
    let payload = json!({ "query": query, "variables": variables });
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/graphql")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(payload.to_string()))?,
        )
        .await?;
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    let body: Value = serde_json::from_slice(&bytes)?;
    Ok((status, body))
}

const GET_USER_QUERY: &str = r#"
    query GetUser($id: UUID!) {
        userById(id: $id) {
            id
            firstName
            lastName
            email
            role
            userFacilitiesByUserId {
                edges {
                    node {
                        facilityByFacilityId {
                            id
                            name
                            createdAt
                            locationsByFacilityId {
                                nodes {
                                    address
                                    zip
                                    state
                                }
                            }
                        }
                    }
                }
            }
        }
    }
"#;

#[tokio::test]
async fn user_query_returns_user_and_associated_facilities() -> Result<()> {
    run_test(|pool| async move {
        let app = build_app(&pool).await?;
        let (status, body) =
            graphql_request(&app, GET_USER_QUERY, json!({ "id": JOHN_ID })).await?;

        assert_eq!(status, StatusCode::OK, "body: {body}");
        let user = &body["data"]["userById"];
        assert_eq!(user["firstName"], "John");
        let edges = user["userFacilitiesByUserId"]["edges"]
            .as_array()
            .expect("edges must be an array");
        assert!(!edges.is_empty(), "expected at least one associated facility");
        let locations =
            &edges[0]["node"]["facilityByFacilityId"]["locationsByFacilityId"]["nodes"];
        assert!(
            !locations.as_array().expect("nodes must be an array").is_empty(),
            "expected facility locations"
        );
        Ok(())
    })
    .await
}

#[tokio::test]
async fn locations_filtered_by_condition_return_associated_users() -> Result<()> {
    let query = r#"
        query UsersByLocation($state: String, $zip: String, $address: String) {
            allLocations(condition: { state: $state, zip: $zip, address: $address }) {
                edges {
                    node {
                        id
                        facilityByFacilityId {
                            createdAt
                            id
                            name
                            userFacilitiesByFacilityId {
                                edges {
                                    node {
                                        userByUserId {
                                            email
                                            firstName
                                            id
                                            lastName
                                            createdAt
                                            role
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    "#;

    run_test(|pool| async move {
        let app = build_app(&pool).await?;
        let (status, body) = graphql_request(
            &app,
            query,
            json!({ "state": "CA", "zip": "90001", "address": "Main St" }),
        )
        .await?;

        assert_eq!(status, StatusCode::OK, "body: {body}");
        let edges = body["data"]["allLocations"]["edges"]
            .as_array()
            .expect("edges must be an array");
        assert!(!edges.is_empty(), "expected at least one matching location");
        let users = &edges[0]["node"]["facilityByFacilityId"]["userFacilitiesByFacilityId"]["edges"];
        assert!(
            !users.as_array().expect("edges must be an array").is_empty(),
            "expected users associated through the facility"
        );
        Ok(())
    })
    .await
}

#[tokio::test]
async fn nonexistent_user_resolves_to_null_not_error() -> Result<()> {
    let query = r#"
        query GetUser($id: UUID!) {
            userById(id: $id) {
                id
                firstName
            }
        }
    "#;

    run_test(|pool| async move {
        let app = build_app(&pool).await?;
        let (status, body) =
            graphql_request(&app, query, json!({ "id": MISSING_ID })).await?;

        assert_eq!(status, StatusCode::OK, "body: {body}");
        assert!(body["data"]["userById"].is_null());
        assert!(body.get("errors").is_none(), "body: {body}");
        Ok(())
    })
    .await
}

#[tokio::test]
async fn unknown_field_is_rejected_with_client_error() -> Result<()> {
    let query = r#"
        query {
            queryThatCausesServerError
        }
    "#;

    run_test(|pool| async move {
        let app = build_app(&pool).await?;
        let (status, body) = graphql_request(&app, query, json!({})).await?;

        assert_eq!(status, StatusCode::BAD_REQUEST, "body: {body}");
        assert!(
            body["errors"].as_array().map(|e| !e.is_empty()).unwrap_or(false),
            "body: {body}"
        );
        Ok(())
    })
    .await
}

#[tokio::test]
async fn malformed_document_is_rejected_with_client_error() -> Result<()> {
    run_test(|pool| async move {
        let app = build_app(&pool).await?;
        let (status, _body) =
            graphql_request(&app, "query GetUser( {", json!({})).await?;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        Ok(())
    })
    .await
}

#[tokio::test]
async fn repeated_query_yields_identical_data() -> Result<()> {
    run_test(|pool| async move {
        let app = build_app(&pool).await?;
        let (_, first) =
            graphql_request(&app, GET_USER_QUERY, json!({ "id": JOHN_ID })).await?;
        let (_, second) =
            graphql_request(&app, GET_USER_QUERY, json!({ "id": JOHN_ID })).await?;

        assert_eq!(first["data"], second["data"]);
        Ok(())
    })
    .await
}

#[tokio::test]
async fn connection_reports_pagination_metadata() -> Result<()> {
    let query = r#"
        query FirstUser {
            allUsers(first: 1) {
                totalCount
                pageInfo {
                    hasNextPage
                    hasPreviousPage
                }
                nodes {
                    id
                }
            }
        }
    "#;

    run_test(|pool| async move {
        let app = build_app(&pool).await?;
        let (status, body) = graphql_request(&app, query, json!({})).await?;

        assert_eq!(status, StatusCode::OK, "body: {body}");
        let conn = &body["data"]["allUsers"];
        assert!(conn["totalCount"].as_i64().unwrap_or(0) >= 2);
        assert_eq!(conn["pageInfo"]["hasNextPage"], true);
        assert_eq!(conn["pageInfo"]["hasPreviousPage"], false);
        assert_eq!(conn["nodes"].as_array().map(Vec::len), Some(1));
        Ok(())
    })
    .await
}

#[tokio::test]
async fn create_and_delete_round_trip_through_mutations() -> Result<()> {
    let create = r#"
        mutation CreateUser($input: UserInput!) {
            createUser(input: $input) {
                id
                firstName
            }
        }
    "#;
    let delete = r#"
        mutation DeleteUser($id: UUID!) {
            deleteUserById(id: $id) {
                id
            }
        }
    "#;

    run_test(|pool| async move {
        let app = build_app(&pool).await?;
        let id = uuid::Uuid::new_v4().to_string();
        let input = json!({
            "input": {
                "id": id.clone(),
                "firstName": "Temp",
                "lastName": "User",
                "email": "temp.user@example.com",
                "role": "viewer"
            }
        });

        let (status, body) = graphql_request(&app, create, input).await?;
        assert_eq!(status, StatusCode::OK, "body: {body}");
        assert_eq!(body["data"]["createUser"]["firstName"], "Temp");

        let (status, body) = graphql_request(&app, delete, json!({ "id": id.clone() })).await?;
        assert_eq!(status, StatusCode::OK, "body: {body}");
        assert_eq!(body["data"]["deleteUserById"]["id"], Value::String(id));
        Ok(())
    })
    .await
}
