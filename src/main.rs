use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::{header, Method},
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fitcoach_api::config::Config;
use fitcoach_api::middleware::auth::JwtSecret;
use fitcoach_api::services::metrics;
use fitcoach_api::stores::postgres::postgres_stores;
use fitcoach_api::{db, routes, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let config = Arc::new(config);

    let pool = db::create_pool(&config.database_url).await?;
    db::run_migrations(&pool).await?;
    info!("Database connected and migrations applied");

    metrics::start(pool.clone());

    let stores = postgres_stores(&pool, Duration::from_millis(config.store_timeout_ms));

    let state = AppState {
        db: pool,
        config: config.clone(),
        stores,
    };

    // The dashboard talks to us with a bearer token, never cookies, so a
    // wide-open origin policy is safe here.
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .allow_origin(Any);

    let jwt_secret = JwtSecret(config.jwt_secret.clone());

    let app = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/metrics", get(routes::metrics::metrics_handler))
        // Roster
        .route("/clients", get(routes::clients::list_all_clients))
        .route("/clients/{id}/approve", post(routes::clients::approve_client))
        .route("/clients/{id}/reject", post(routes::clients::reject_client))
        .route(
            "/clients/{id}/coach",
            post(routes::clients::assign_coach).delete(routes::clients::unassign_coach),
        )
        .route("/coach/clients", get(routes::clients::list_coach_clients))
        // Dashboard
        .route("/dashboard/stats", get(routes::dashboard::stats))
        .route("/dashboard/checkins", get(routes::dashboard::recent_checkins))
        .route("/dashboard/sessions", get(routes::dashboard::upcoming_sessions))
        .route("/dashboard/progress", get(routes::dashboard::client_progress))
        .layer(axum::Extension(jwt_secret))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state);

    let addr = format!("{}:{}", config.host, config.port);
    info!("fitcoach API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
