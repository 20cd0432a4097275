mod business_logic;
mod config;
mod errors;
mod handlers;
mod models;
mod services;
mod state;

use anyhow::Context;
use axum::{
    routing::{delete, get, post},
    Router,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::ServerConfig;
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health::health,
        handlers::sessions::create_session,
        handlers::sessions::delete_session,
        handlers::sessions::get_change_till_expiry,
        handlers::sessions::get_peak,
        handlers::sessions::get_stop_loss,
        handlers::sessions::post_breakout
    ),
    components(schemas(
        models::health::HealthResponse,
        models::price_row::RawPriceRow,
        models::quote::QuoteSnapshot,
        models::quote::IntraDayHighLow,
        models::session::CreateSessionRequest,
        models::session::SessionResponse,
        models::session::TradesResponse,
        models::session::StopLossResponse,
        models::session::BreakoutResponse,
        models::trade::OptionTrade,
        models::trade::TradeOutcome,
        errors::ErrorResponse
    ))
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::from_env();
    init_tracing(&config);

    let app = router(AppState::default())
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    tracing::info!("Server running on http://{}", config.bind_addr);
    tracing::info!("Swagger UI: http://{}/swagger-ui", config.bind_addr);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}

fn init_tracing(config: &ServerConfig) {
    let file_layer = config.log_dir.as_ref().map(|dir| {
        tracing_subscriber::fmt::layer()
            .with_writer(tracing_appender::rolling::daily(dir, "breakout-screener.log"))
            .with_ansi(false)
    });

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "breakout_screener=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .init();
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/sessions", post(handlers::sessions::create_session))
        .route("/sessions/{id}", delete(handlers::sessions::delete_session))
        .route(
            "/sessions/{id}/trades/expiry",
            get(handlers::sessions::get_change_till_expiry),
        )
        .route(
            "/sessions/{id}/trades/peak",
            get(handlers::sessions::get_peak),
        )
        .route(
            "/sessions/{id}/stop-loss",
            get(handlers::sessions::get_stop_loss),
        )
        .route(
            "/sessions/{id}/breakout",
            post(handlers::sessions::post_breakout),
        )
        .with_state(state)
}
