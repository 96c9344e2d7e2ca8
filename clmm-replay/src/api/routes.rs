//! API route definitions, grouped per-resource and merged into one router
//! under `with_state`.

use axum::routing::{get, post};
use axum::Router;

use super::{handlers::*, ApiState};

pub fn create_pool_routes() -> Router<ApiState> {
    Router::new()
        .route("/pools/:address", get(get_pool))
        .route("/pools/:address/fork", get(fork_pool))
        .route("/pools/:address/simulate-swap", post(simulate_swap))
        .route("/pools/:address/resolve-swap", post(resolve_swap))
}
