use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::business_logic::breakout::{
    BreakoutTracker, ChangeTillExpiry, PeakTracking, TrackingPolicy,
};
use crate::errors::AppError;
use crate::models::quote::QuoteSnapshot;
use crate::models::session::{
    BreakoutResponse, CreateSessionRequest, SessionResponse, StopLossResponse, TradesResponse,
};
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/sessions",
    request_body = CreateSessionRequest,
    responses(
        (status = 200, description = "Tracker session created", body = SessionResponse),
        (status = 400, description = "Invalid request or configuration", body = crate::errors::ErrorResponse)
    )
)]
pub async fn create_session(
    State(state): State<AppState>,
    Json(request): Json<CreateSessionRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    request
        .validate()
        .map_err(|err| AppError::MalformedInput(err.to_string()))?;

    let config = request.config();
    let mut tracker = BreakoutTracker::new(request.symbol, config, request.rows)?;
    let rows = tracker.preprocess().len();
    let symbol = tracker.symbol().to_string();

    let session_id = state.sessions.create(tracker).await;

    Ok(Json(SessionResponse {
        session_id,
        symbol,
        rows,
    }))
}

#[utoipa::path(
    delete,
    path = "/sessions/{id}",
    params(("id" = u64, Path, description = "Session id")),
    responses(
        (status = 204, description = "Session closed"),
        (status = 404, description = "Unknown session", body = crate::errors::ErrorResponse)
    )
)]
pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<StatusCode, AppError> {
    state.sessions.remove(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/sessions/{id}/trades/expiry",
    params(("id" = u64, Path, description = "Session id")),
    responses(
        (status = 200, description = "Trades valued at expiry", body = TradesResponse),
        (status = 404, description = "Unknown session", body = crate::errors::ErrorResponse)
    )
)]
pub async fn get_change_till_expiry(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<TradesResponse>, AppError> {
    trades_for(&state, id, &ChangeTillExpiry).await.map(Json)
}

#[utoipa::path(
    get,
    path = "/sessions/{id}/trades/peak",
    params(("id" = u64, Path, description = "Session id")),
    responses(
        (status = 200, description = "Trades valued at their peak high", body = TradesResponse),
        (status = 404, description = "Unknown session", body = crate::errors::ErrorResponse)
    )
)]
pub async fn get_peak(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<TradesResponse>, AppError> {
    trades_for(&state, id, &PeakTracking).await.map(Json)
}

async fn trades_for<P: TrackingPolicy>(
    state: &AppState,
    id: u64,
    policy: &P,
) -> Result<TradesResponse, AppError> {
    let tracker = state.sessions.get(id).await?;
    let mut tracker = tracker.lock().await;

    let trades = tracker.track(policy);
    tracing::debug!(
        "[{}] {} trades for session {} ({})",
        tracker.symbol(),
        trades.len(),
        id,
        policy.name()
    );

    Ok(TradesResponse {
        session_id: id,
        symbol: tracker.symbol().to_string(),
        policy: policy.name().to_string(),
        trades,
    })
}

#[utoipa::path(
    get,
    path = "/sessions/{id}/stop-loss",
    params(("id" = u64, Path, description = "Session id")),
    responses(
        (status = 200, description = "Most recent 20-day low", body = StopLossResponse),
        (status = 404, description = "Unknown session", body = crate::errors::ErrorResponse),
        (status = 422, description = "Series is empty", body = crate::errors::ErrorResponse)
    )
)]
pub async fn get_stop_loss(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<StopLossResponse>, AppError> {
    let tracker = state.sessions.get(id).await?;
    let mut tracker = tracker.lock().await;
    let stop_loss = tracker.get_stop_loss()?;

    Ok(Json(StopLossResponse {
        session_id: id,
        symbol: tracker.symbol().to_string(),
        stop_loss,
    }))
}

#[utoipa::path(
    post,
    path = "/sessions/{id}/breakout",
    params(("id" = u64, Path, description = "Session id")),
    request_body = QuoteSnapshot,
    responses(
        (status = 200, description = "Whether today's quote is a new 40-day high", body = BreakoutResponse),
        (status = 400, description = "Malformed quote snapshot", body = crate::errors::ErrorResponse),
        (status = 404, description = "Unknown session", body = crate::errors::ErrorResponse)
    )
)]
pub async fn post_breakout(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(quote): Json<QuoteSnapshot>,
) -> Result<Json<BreakoutResponse>, AppError> {
    let tracker = state.sessions.get(id).await?;
    let mut tracker = tracker.lock().await;
    let breakout = tracker.breakout(&quote)?;
    let rows = tracker.preprocess().len();

    Ok(Json(BreakoutResponse {
        session_id: id,
        symbol: tracker.symbol().to_string(),
        breakout,
        rows,
    }))
}
