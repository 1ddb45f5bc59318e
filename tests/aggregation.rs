//! End-to-end aggregation tests against an in-process stub upstream.
//!
//! The stub is a plain axum router bound to an ephemeral port, playing the
//! role of the Dokploy API so the client and the dashboard routes can be
//! exercised over real HTTP.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use tower::ServiceExt;

use harborview::config::Config;
use harborview::upstream::{UpstreamClient, UpstreamError};
use harborview::AppState;

#[derive(Clone)]
struct StubState {
    openapi: Result<Value, u16>,
    projects: Result<Value, u16>,
    required_key: Option<String>,
}

async fn serve_leg(
    headers: &HeaderMap,
    state: &StubState,
    leg: &Result<Value, u16>,
) -> axum::response::Response {
    if let Some(required) = &state.required_key {
        let sent = headers.get("x-api-key").and_then(|v| v.to_str().ok());
        if sent != Some(required.as_str()) {
            return StatusCode::UNAUTHORIZED.into_response();
        }
    }
    match leg {
        Ok(body) => Json(body.clone()).into_response(),
        Err(code) => StatusCode::from_u16(*code).unwrap().into_response(),
    }
}

/// Bind a stub Dokploy API on an ephemeral port and return its base URL.
async fn spawn_stub(state: StubState) -> String {
    let app = Router::new()
        .route(
            "/api/settings.getOpenApiDocument",
            get(|State(s): State<StubState>, headers: HeaderMap| async move {
                serve_leg(&headers, &s, &s.openapi).await
            }),
        )
        .route(
            "/api/project.all",
            get(|State(s): State<StubState>, headers: HeaderMap| async move {
                serve_leg(&headers, &s, &s.projects).await
            }),
        )
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn sample_openapi() -> Value {
    json!({
        "openapi": "3.0.0",
        "info": {
            "title": "Dokploy API",
            "version": "1.4.0",
            "description": "Orchestration endpoints"
        },
        "servers": [{ "url": "https://panel.example/api" }]
    })
}

fn sample_projects() -> Value {
    json!([
        {
            "projectId": "prj_1",
            "name": "shop",
            "environments": [
                {
                    "name": "production",
                    "applications": [
                        {
                            "applicationId": "app_1",
                            "name": "storefront",
                            "domains": [
                                { "host": "shop.example", "https": true },
                                { "host": "" }
                            ]
                        }
                    ],
                    "redis": [
                        { "databaseId": "db_1", "name": "cache", "domains": [] }
                    ]
                }
            ]
        },
        {
            "name": "blog",
            "environments": [
                { "applications": [ { "appName": "ghost" } ] }
            ]
        }
    ])
}

fn stub_state() -> StubState {
    StubState {
        openapi: Ok(sample_openapi()),
        projects: Ok(sample_projects()),
        required_key: None,
    }
}

#[tokio::test]
async fn test_fetch_config_merges_both_legs() {
    let base = spawn_stub(stub_state()).await;
    let client = UpstreamClient::new(Some(&base), None);

    let config = client.fetch_config().await.unwrap();

    assert_eq!(config.projects.len(), 2);
    assert_eq!(config.meta.title.as_deref(), Some("Dokploy API"));
    assert_eq!(config.meta.version.as_deref(), Some("1.4.0"));
    assert_eq!(config.meta.servers, vec!["https://panel.example/api"]);
    assert!(chrono::DateTime::parse_from_rfc3339(&config.meta.fetched_at).is_ok());

    // Unknown upstream fields survive the round trip.
    let as_json = serde_json::to_value(&config).unwrap();
    assert_eq!(as_json["projects"][0]["projectId"], "prj_1");
}

#[tokio::test]
async fn test_openapi_failure_fails_the_whole_aggregation() {
    let base = spawn_stub(StubState {
        openapi: Err(503),
        ..stub_state()
    })
    .await;
    let client = UpstreamClient::new(Some(&base), None);

    let err = client.fetch_config().await.unwrap_err();
    match err {
        UpstreamError::Status { call, status } => {
            assert_eq!(call, "settings.getOpenApiDocument");
            assert_eq!(status.as_u16(), 503);
        }
        other => panic!("expected status error, got {other}"),
    }
}

#[tokio::test]
async fn test_invalid_projects_body_is_a_validation_error() {
    let base = spawn_stub(StubState {
        projects: Ok(json!([{ "environments": "nope" }])),
        ..stub_state()
    })
    .await;
    let client = UpstreamClient::new(Some(&base), None);

    let err = client.fetch_config().await.unwrap_err();
    match err {
        UpstreamError::Validation { call, .. } => assert_eq!(call, "project.all"),
        other => panic!("expected validation error, got {other}"),
    }
}

#[tokio::test]
async fn test_api_key_header_is_forwarded() {
    let base = spawn_stub(StubState {
        required_key: Some("sekret".into()),
        ..stub_state()
    })
    .await;

    let authed = UpstreamClient::new(Some(&base), Some("sekret".into()));
    assert!(authed.fetch_config().await.is_ok());

    let anonymous = UpstreamClient::new(Some(&base), None);
    let err = anonymous.fetch_config().await.unwrap_err();
    assert!(matches!(err, UpstreamError::Status { status, .. } if status.as_u16() == 401));
}

fn app_for(base_url: Option<String>) -> Router {
    let mut config = Config::default();
    config.upstream.base_url = base_url;
    harborview::api::create_router(Arc::new(AppState::new(config)))
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_config_route_serves_envelope_with_no_store() {
    let base = spawn_stub(stub_state()).await;
    let app = app_for(Some(base));

    let response = app
        .oneshot(Request::get("/api/config").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("cache-control").unwrap(),
        "no-store"
    );

    let body = body_json(response).await;
    assert_eq!(body["meta"]["title"], "Dokploy API");
    assert_eq!(body["projects"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_entries_route_serves_flattened_sorted_list() {
    let base = spawn_stub(stub_state()).await;
    let app = app_for(Some(base));

    let response = app
        .oneshot(Request::get("/api/entries").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let entries = body["entries"].as_array().unwrap();

    // Sorted by project name: blog before shop; within shop, cache before
    // storefront.
    let titles: Vec<&str> = entries
        .iter()
        .map(|e| e["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["ghost", "cache", "storefront"]);

    let storefront = &entries[2];
    assert_eq!(storefront["id"], "app_1");
    assert_eq!(storefront["urls"], json!(["https://shop.example"]));
    assert_eq!(storefront["environmentName"], "production");

    // Resources without domains are still listed.
    assert_eq!(entries[1]["urls"], json!([]));
    // The blog environment has no name, and none is invented.
    assert!(entries[0].get("environmentName").is_none());
}

#[tokio::test]
async fn test_missing_base_url_is_a_500_with_error_body() {
    let app = app_for(None);

    let response = app
        .oneshot(Request::get("/api/config").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("not configured"));
}

#[tokio::test]
async fn test_upstream_failure_is_a_500_with_error_body() {
    let base = spawn_stub(StubState {
        openapi: Err(503),
        ..stub_state()
    })
    .await;
    let app = app_for(Some(base));

    let response = app
        .oneshot(Request::get("/api/entries").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    let message = body["error"].as_str().unwrap();
    assert!(message.contains("settings.getOpenApiDocument"));
    assert!(message.contains("503"));
}
