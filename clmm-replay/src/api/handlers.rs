//! Query/fork API request handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;

use clmm_core::PoolSnapshot;

use super::responses::*;
use super::ApiState;

fn core_error_response(err: clmm_core::Error) -> (StatusCode, Json<ErrorResponse>) {
    let status = match err {
        clmm_core::Error::PoolNotFound => StatusCode::NOT_FOUND,
        clmm_core::Error::ResolveSwapInputFailed => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::BAD_REQUEST,
    };
    (status, Json(ErrorResponse { error: err.to_string() }))
}

fn not_found(address: &str) -> (StatusCode, Json<ErrorResponse>) {
    (StatusCode::NOT_FOUND, Json(ErrorResponse { error: format!("no synced pool at {address}") }))
}

/// `GET /pools/:address` — current snapshot of a synced pool.
pub async fn get_pool(
    State(state): State<ApiState>,
    Path(address): Path<String>,
) -> Result<Json<PoolSnapshot>, (StatusCode, Json<ErrorResponse>)> {
    let simulator = state.simulator.read().await;
    let pool = simulator.pool(&address).ok_or_else(|| not_found(&address))?;
    Ok(Json(PoolSnapshot::from(pool)))
}

/// `GET /pools/:address/fork` — a deep-copied clone; the source pool is
/// left untouched.
pub async fn fork_pool(
    State(state): State<ApiState>,
    Path(address): Path<String>,
) -> Result<Json<PoolSnapshot>, (StatusCode, Json<ErrorResponse>)> {
    let simulator = state.simulator.read().await;
    let forked = simulator.fork(&address).map_err(core_error_response)?;
    Ok(Json(PoolSnapshot::from(&forked)))
}

/// `POST /pools/:address/simulate-swap` — a hypothetical what-if swap,
/// executed against a forked clone so the synced pool is never touched.
pub async fn simulate_swap(
    State(state): State<ApiState>,
    Path(address): Path<String>,
    Json(req): Json<SimulateSwapRequest>,
) -> Result<Json<SwapResultResponse>, (StatusCode, Json<ErrorResponse>)> {
    let mut forked = {
        let simulator = state.simulator.read().await;
        simulator.fork(&address).map_err(core_error_response)?
    };

    let (amount0, amount1, sqrt_price_x96) = forked
        .swap(req.zero_for_one, req.amount_specified, req.sqrt_price_limit_x96, true)
        .map_err(core_error_response)?;

    Ok(Json(SwapResultResponse { amount0, amount1, sqrt_price_x96 }))
}

/// `POST /pools/:address/resolve-swap` — recovers the original
/// `(amountSpecified, sqrtPriceLimit)` behind an observed on-chain Swap
/// result. Failure here is a decoder bug, not a retryable condition, so it
/// surfaces as a 500.
pub async fn resolve_swap(
    State(state): State<ApiState>,
    Path(address): Path<String>,
    Json(req): Json<ResolveSwapRequest>,
) -> Result<Json<ResolveSwapResponse>, (StatusCode, Json<ErrorResponse>)> {
    let simulator = state.simulator.read().await;
    let pool = simulator.pool(&address).ok_or_else(|| not_found(&address))?;

    let (zero_for_one, amount_specified, sqrt_price_limit_x96) = pool
        .resolve_swap_input(req.amount0, req.amount1, req.sqrt_price_x96, req.liquidity)
        .map_err(core_error_response)?;

    Ok(Json(ResolveSwapResponse { zero_for_one, amount_specified, sqrt_price_limit_x96 }))
}

pub async fn health(State(state): State<ApiState>) -> Json<HealthResponse> {
    let simulator = state.simulator.read().await;
    Json(HealthResponse {
        status: "healthy",
        pools_tracked: simulator.pool_count(),
        current_block: simulator.current_block(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

pub async fn metrics(State(state): State<ApiState>) -> String {
    let simulator = state.simulator.read().await;
    crate::metrics::observe(simulator.current_block(), simulator.dirty_set().len(), simulator.pool_count());
    crate::metrics::encode()
}
