//! Wire-format request/response bodies for the query/fork API.

use clmm_core::math::I256;
use primitive_types::U256;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Deserialize)]
pub struct SimulateSwapRequest {
    pub zero_for_one: bool,
    pub amount_specified: I256,
    pub sqrt_price_limit_x96: Option<U256>,
}

#[derive(Debug, Serialize)]
pub struct SwapResultResponse {
    pub amount0: I256,
    pub amount1: I256,
    pub sqrt_price_x96: U256,
}

/// Mirrors the on-chain Swap event schema — the body a caller posts to
/// `/resolve-swap` is exactly what was decoded off-chain.
#[derive(Debug, Deserialize)]
pub struct ResolveSwapRequest {
    pub amount0: I256,
    pub amount1: I256,
    pub sqrt_price_x96: U256,
    pub liquidity: u128,
}

#[derive(Debug, Serialize)]
pub struct ResolveSwapResponse {
    pub zero_for_one: bool,
    pub amount_specified: I256,
    pub sqrt_price_limit_x96: Option<U256>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub pools_tracked: usize,
    pub current_block: u64,
    pub timestamp: String,
}
