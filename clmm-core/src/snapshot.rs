//! Persistence format for a pool. Self-describing and
//! version-tagged so the storage layer can detect format drift across
//! deploys; every integer field round-trips through `primitive_types`'s own
//! lossless serde representation rather than a hand-rolled decimal codec.

use primitive_types::U256;
use serde::{Deserialize, Serialize};

use crate::pool::Pool;
use crate::position::{Position, PositionKey};
use crate::tick::Tick;
use crate::types::{Address, FeeTier};

pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickEntry {
    pub index: i32,
    pub liquidity_gross: u128,
    pub liquidity_net: i128,
    pub fee_growth_outside_0_x128: U256,
    pub fee_growth_outside_1_x128: U256,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionEntry {
    pub key: PositionKey,
    pub liquidity: u128,
    pub fee_growth_inside_0_last_x128: U256,
    pub fee_growth_inside_1_last_x128: U256,
    pub tokens_owed_0: u128,
    pub tokens_owed_1: u128,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolSnapshot {
    pub version: u32,
    pub pool_address: Address,
    pub token0: Address,
    pub token1: Address,
    pub fee: FeeTier,
    pub tick_spacing: i32,
    pub current_block: u64,
    pub deploy_block: u64,
    pub sqrt_price_x96: U256,
    pub tick_current: i32,
    pub liquidity: u128,
    pub fee_growth_global_0_x128: U256,
    pub fee_growth_global_1_x128: U256,
    pub token0_balance: U256,
    pub token1_balance: U256,
    pub ticks: Vec<TickEntry>,
    pub positions: Vec<PositionEntry>,
}

impl From<&Pool> for PoolSnapshot {
    fn from(pool: &Pool) -> Self {
        let ticks = pool
            .tick_store
            .iter()
            .map(|(index, tick): (&i32, &Tick)| TickEntry {
                index: *index,
                liquidity_gross: tick.liquidity_gross,
                liquidity_net: tick.liquidity_net,
                fee_growth_outside_0_x128: tick.fee_growth_outside_0_x128,
                fee_growth_outside_1_x128: tick.fee_growth_outside_1_x128,
            })
            .collect();

        let positions = pool
            .position_store
            .iter()
            .map(|(key, position): (&PositionKey, &Position)| PositionEntry {
                key: key.clone(),
                liquidity: position.liquidity,
                fee_growth_inside_0_last_x128: position.fee_growth_inside_0_last_x128,
                fee_growth_inside_1_last_x128: position.fee_growth_inside_1_last_x128,
                tokens_owed_0: position.tokens_owed_0,
                tokens_owed_1: position.tokens_owed_1,
            })
            .collect();

        PoolSnapshot {
            version: SNAPSHOT_FORMAT_VERSION,
            pool_address: pool.address.clone(),
            token0: pool.token0.clone(),
            token1: pool.token1.clone(),
            fee: pool.fee_tier,
            tick_spacing: pool.tick_spacing,
            current_block: pool.current_block,
            deploy_block: pool.deploy_block,
            sqrt_price_x96: pool.sqrt_price_x96,
            tick_current: pool.tick_current,
            liquidity: pool.liquidity,
            fee_growth_global_0_x128: pool.fee_growth_global_0_x128,
            fee_growth_global_1_x128: pool.fee_growth_global_1_x128,
            token0_balance: pool.token0_balance,
            token1_balance: pool.token1_balance,
            ticks,
            positions,
        }
    }
}

impl PoolSnapshot {
    /// Rehydrates a `Pool` from a snapshot, bypassing `initialize` (the
    /// snapshot already carries a settled, consistent state).
    pub fn restore(self) -> Pool {
        let mut pool = Pool::new(self.pool_address, self.token0, self.token1, self.fee, self.deploy_block);
        pool.tick_spacing = self.tick_spacing;
        pool.current_block = self.current_block;
        pool.sqrt_price_x96 = self.sqrt_price_x96;
        pool.tick_current = self.tick_current;
        pool.liquidity = self.liquidity;
        pool.fee_growth_global_0_x128 = self.fee_growth_global_0_x128;
        pool.fee_growth_global_1_x128 = self.fee_growth_global_1_x128;
        pool.token0_balance = self.token0_balance;
        pool.token1_balance = self.token1_balance;

        for entry in self.ticks {
            let tick = Tick {
                liquidity_gross: entry.liquidity_gross,
                liquidity_net: entry.liquidity_net,
                fee_growth_outside_0_x128: entry.fee_growth_outside_0_x128,
                fee_growth_outside_1_x128: entry.fee_growth_outside_1_x128,
            };
            *pool.tick_store.get_or_init(entry.index) = tick;
        }

        for entry in self.positions {
            let position = Position {
                liquidity: entry.liquidity,
                fee_growth_inside_0_last_x128: entry.fee_growth_inside_0_last_x128,
                fee_growth_inside_1_last_x128: entry.fee_growth_inside_1_last_x128,
                tokens_owed_0: entry.tokens_owed_0,
                tokens_owed_1: entry.tokens_owed_1,
            };
            pool.position_store.set(entry.key, position);
        }

        pool
    }
}
