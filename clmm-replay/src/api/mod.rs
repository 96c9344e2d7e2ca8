//! Read-only HTTP query/fork surface over a running `Simulator`: a router
//! built from per-resource route groups, a shared `Clone`-able state struct,
//! and a `start_server`/`start_metrics_server` split so liveness checks stay
//! reachable even if the main app router wedges.

mod handlers;
mod responses;
mod routes;

pub use responses::*;
pub use routes::*;

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use clmm_core::Simulator;
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::ApiConfig;
use crate::error::{ReplayError, Result};
use crate::metadata::StaticMetadataProvider;

pub type SharedSimulator = Arc<RwLock<Simulator<StaticMetadataProvider>>>;

#[derive(Clone)]
pub struct ApiState {
    pub simulator: SharedSimulator,
}

impl ApiState {
    pub fn new(simulator: SharedSimulator) -> Self {
        ApiState { simulator }
    }
}

fn create_app(state: ApiState, enable_cors: bool) -> Router {
    let app = Router::new()
        .merge(create_pool_routes())
        .route("/health", get(handlers::health))
        .with_state(state)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()));

    if enable_cors {
        app.layer(CorsLayer::permissive())
    } else {
        app
    }
}

pub async fn start_server(simulator: SharedSimulator, config: &ApiConfig) -> Result<tokio::task::JoinHandle<()>> {
    let state = ApiState::new(simulator);
    let app = create_app(state, config.enable_cors);

    let listener = TcpListener::bind(&config.bind_address)
        .await
        .map_err(|e| ReplayError::Configuration(format!("binding {}: {e}", config.bind_address)))?;
    tracing::info!(address = %config.bind_address, "api server listening");

    Ok(tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!(error = %e, "api server error");
        }
    }))
}

pub async fn start_metrics_server(simulator: SharedSimulator, port: u16) -> Result<tokio::task::JoinHandle<()>> {
    let state = ApiState::new(simulator);
    let app = Router::new()
        .route("/metrics", get(handlers::metrics))
        .route("/health", get(handlers::health))
        .with_state(state);

    let address = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|e| ReplayError::Configuration(format!("binding {address}: {e}")))?;
    tracing::info!(address, "metrics server listening");

    Ok(tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!(error = %e, "metrics server error");
        }
    }))
}
