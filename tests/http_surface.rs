//! The HTTP boundary: envelope shape, bearer auth and status mapping,
//! driven through the real router with the in-memory stores behind it.

mod common;

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::routing::get;
use axum::{Extension, Router};
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;
use uuid::Uuid;

use common::TestWorld;
use fitcoach_api::config::Config;
use fitcoach_api::middleware::auth::{issue_access_token, JwtSecret};
use fitcoach_api::models::identity::Role;
use fitcoach_api::routes;
use fitcoach_api::AppState;

const SECRET: &str = "testgeheim";

/// The routes under test, wired exactly as the binary wires them. The
/// pool is lazy and never connected; these paths only touch the stores.
fn test_app(world: &TestWorld) -> Router {
    let config = Config {
        database_url: "postgres://unused@localhost/unused".to_string(),
        jwt_secret: SECRET.to_string(),
        host: "127.0.0.1".to_string(),
        port: 0,
        store_timeout_ms: 5000,
    };
    let pool = PgPoolOptions::new()
        .connect_lazy(&config.database_url)
        .unwrap();
    let state = AppState {
        db: pool,
        config: Arc::new(config),
        stores: world.stores.clone(),
    };

    Router::new()
        .route("/coach/clients", get(routes::clients::list_coach_clients))
        .route("/dashboard/stats", get(routes::dashboard::stats))
        .layer(Extension(JwtSecret(SECRET.to_string())))
        .with_state(state)
}

fn bearer(role: Role) -> String {
    let token = issue_access_token(Uuid::new_v4(), role, SECRET, 1).unwrap();
    format!("Bearer {token}")
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn success_responses_are_enveloped() {
    let world = TestWorld::new();
    let app = test_app(&world);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/dashboard/stats")
                .header("Authorization", bearer(Role::Coach))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], Value::Bool(true));
    assert_eq!(body["data"]["active_clients"], 0);
    assert_eq!(body["data"]["checkins_this_week"], 0);
    assert_eq!(body["data"]["unread_messages"], 0);
    assert_eq!(body["data"]["sessions_this_week"], 0);
}

#[tokio::test]
async fn missing_token_maps_to_unauthorized() {
    let world = TestWorld::new();
    let app = test_app(&world);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/coach/clients")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["success"], Value::Bool(false));
    assert_eq!(body["error"], "Niet ingelogd");
}

#[tokio::test]
async fn garbage_token_maps_to_unauthorized() {
    let world = TestWorld::new();
    let app = test_app(&world);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/coach/clients")
                .header("Authorization", "Bearer niet.een.token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn wrong_role_maps_to_forbidden() {
    let world = TestWorld::new();
    let app = test_app(&world);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/coach/clients")
                .header("Authorization", bearer(Role::Client))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_json(response).await;
    assert_eq!(body["success"], Value::Bool(false));
    assert_eq!(body["error"], "Geen toegang");
}
