//! On-chain event input schema. These are pure data — parsing raw
//! logs into these shapes and ordering them by `(block_number, log_index)`
//! is the ingestion layer's job, not the core's.

use primitive_types::U256;
use serde::{Deserialize, Serialize};

use crate::math::I256;
use crate::types::Address;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitializeEvent {
    pub pool_address: Address,
    pub sqrt_price_x96: U256,
    pub block_number: u64,
    pub log_index: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MintEvent {
    pub pool_address: Address,
    pub owner: Address,
    pub tick_lower: i32,
    pub tick_upper: i32,
    pub amount: u128,
    /// Informational — the pool recomputes both deltas itself.
    pub amount0: U256,
    pub amount1: U256,
    pub block_number: u64,
    pub log_index: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BurnEvent {
    pub pool_address: Address,
    pub owner: Address,
    pub tick_lower: i32,
    pub tick_upper: i32,
    pub amount: u128,
    pub amount0: U256,
    pub amount1: U256,
    pub block_number: u64,
    pub log_index: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwapEvent {
    pub pool_address: Address,
    pub amount0: I256,
    pub amount1: I256,
    pub sqrt_price_x96: U256,
    pub liquidity: u128,
    pub block_number: u64,
    pub log_index: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum PoolEvent {
    Initialize(InitializeEvent),
    Mint(MintEvent),
    Burn(BurnEvent),
    Swap(SwapEvent),
}

impl PoolEvent {
    pub fn pool_address(&self) -> &str {
        match self {
            PoolEvent::Initialize(e) => &e.pool_address,
            PoolEvent::Mint(e) => &e.pool_address,
            PoolEvent::Burn(e) => &e.pool_address,
            PoolEvent::Swap(e) => &e.pool_address,
        }
    }

    pub fn block_number(&self) -> u64 {
        match self {
            PoolEvent::Initialize(e) => e.block_number,
            PoolEvent::Mint(e) => e.block_number,
            PoolEvent::Burn(e) => e.block_number,
            PoolEvent::Swap(e) => e.block_number,
        }
    }

    pub fn log_index(&self) -> u64 {
        match self {
            PoolEvent::Initialize(e) => e.log_index,
            PoolEvent::Mint(e) => e.log_index,
            PoolEvent::Burn(e) => e.log_index,
            PoolEvent::Swap(e) => e.log_index,
        }
    }

    /// Sort key enforcing (block, logIndex) order: ingest order within a block.
    pub fn order_key(&self) -> (u64, u64) {
        (self.block_number(), self.log_index())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_sort_by_block_then_log_index() {
        let mut events = vec![
            PoolEvent::Swap(SwapEvent {
                pool_address: "pool".into(),
                amount0: I256::ZERO,
                amount1: I256::ZERO,
                sqrt_price_x96: U256::zero(),
                liquidity: 0,
                block_number: 10,
                log_index: 1,
            }),
            PoolEvent::Swap(SwapEvent {
                pool_address: "pool".into(),
                amount0: I256::ZERO,
                amount1: I256::ZERO,
                sqrt_price_x96: U256::zero(),
                liquidity: 0,
                block_number: 10,
                log_index: 0,
            }),
            PoolEvent::Swap(SwapEvent {
                pool_address: "pool".into(),
                amount0: I256::ZERO,
                amount1: I256::ZERO,
                sqrt_price_x96: U256::zero(),
                liquidity: 0,
                block_number: 9,
                log_index: 5,
            }),
        ];
        events.sort_by_key(|e| e.order_key());
        let keys: Vec<_> = events.iter().map(|e| e.order_key()).collect();
        assert_eq!(keys, vec![(9, 5), (10, 0), (10, 1)]);
    }
}
