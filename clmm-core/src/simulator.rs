//! Owns every live pool and dispatches ordered events onto them.
//!
//! `handle_events` trusts its precondition: callers hand it events already
//! ordered by `(block_number, log_index)` — the ingestion layer, not the
//! simulator, is responsible for establishing that order.

use std::collections::{HashMap, HashSet};

use primitive_types::U256;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::events::PoolEvent;
use crate::pool::Pool;
use crate::types::{Address, FeeTier};

/// Resolved pool configuration the simulator needs to construct a `Pool` on
/// `Initialize`. Fetched through `MetadataProvider`, which is the one
/// suspension point in the whole state machine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolMetadata {
    pub token0: Address,
    pub token1: Address,
    pub fee_pips: u32,
}

/// External collaborator resolving a pool's immutable configuration.
/// Implementations classify transient RPC failures internally (retrying as
/// they see fit) and only ever surface `Error::MetadataReverted` to the
/// simulator — any other `Err` is treated as fatal. `MetadataReverted` is
/// the only named, skippable metadata failure.
pub trait MetadataProvider {
    fn fetch_pool_config(&mut self, pool_address: &str) -> Result<PoolMetadata>;
}

#[derive(Debug)]
pub struct Simulator<M: MetadataProvider> {
    pools: HashMap<Address, Pool>,
    dirty_pools: HashSet<Address>,
    current_block: u64,
    metadata_provider: M,
    skip_list: HashSet<Address>,
}

impl<M: MetadataProvider> Simulator<M> {
    pub fn new(metadata_provider: M) -> Self {
        Simulator {
            pools: HashMap::new(),
            dirty_pools: HashSet::new(),
            current_block: 0,
            metadata_provider,
            skip_list: HashSet::new(),
        }
    }

    pub fn with_skip_list(mut self, skip_list: HashSet<Address>) -> Self {
        self.skip_list = skip_list;
        self
    }

    pub fn pool(&self, address: &str) -> Option<&Pool> {
        self.pools.get(address)
    }

    pub fn pool_count(&self) -> usize {
        self.pools.len()
    }

    pub fn current_block(&self) -> u64 {
        self.current_block
    }

    pub fn dirty_set(&self) -> &HashSet<Address> {
        &self.dirty_pools
    }

    pub fn clear_dirty(&mut self) {
        self.dirty_pools.clear();
    }

    pub fn fork(&self, address: &str) -> Result<Pool> {
        self.pools.get(address).map(Pool::fork).ok_or(Error::PoolNotFound)
    }

    /// Restores a previously-forked or persisted pool under its address,
    /// used by the storage layer to rehydrate from a snapshot.
    pub fn insert_pool(&mut self, pool: Pool) {
        self.pools.insert(pool.address.clone(), pool);
    }

    pub fn handle_events(&mut self, events: &[PoolEvent]) -> Result<()> {
        for event in events {
            self.handle_one(event)?;
        }
        Ok(())
    }

    fn handle_one(&mut self, event: &PoolEvent) -> Result<()> {
        let address = event.pool_address();

        match event {
            PoolEvent::Initialize(e) => {
                if self.pools.contains_key(address) {
                    return Err(Error::PoolExists);
                }
                match self.metadata_provider.fetch_pool_config(address) {
                    Ok(meta) => {
                        let fee_tier = FeeTier::from_fee_pips(meta.fee_pips)?;
                        let mut pool = Pool::new(
                            address.to_string(),
                            meta.token0,
                            meta.token1,
                            fee_tier,
                            e.block_number,
                        );
                        pool.initialize(e.sqrt_price_x96)?;
                        self.pools.insert(address.to_string(), pool);
                    }
                    Err(Error::MetadataReverted) => {
                        tracing::warn!(pool = address, "metadata provider reverted, skipping Initialize");
                        return Ok(());
                    }
                    Err(other) => return Err(other),
                }
            }

            PoolEvent::Mint(e) => {
                if self.skip_list.contains(address) {
                    tracing::warn!(pool = address, "pool on skip-list, dropping Mint");
                    return Ok(());
                }
                let Some(pool) = self.pools.get_mut(address) else {
                    tracing::warn!(pool = address, "no pool for Mint, dropping");
                    return Ok(());
                };
                pool.mint(&e.owner, e.tick_lower, e.tick_upper, e.amount)?;
            }

            PoolEvent::Burn(e) => {
                if self.skip_list.contains(address) {
                    tracing::warn!(pool = address, "pool on skip-list, dropping Burn");
                    return Ok(());
                }
                let Some(pool) = self.pools.get_mut(address) else {
                    tracing::warn!(pool = address, "no pool for Burn, dropping");
                    return Ok(());
                };
                pool.burn(&e.owner, e.tick_lower, e.tick_upper, e.amount)?;
            }

            PoolEvent::Swap(e) => {
                if self.skip_list.contains(address) {
                    tracing::warn!(pool = address, "pool on skip-list, dropping Swap");
                    return Ok(());
                }
                let Some(pool) = self.pools.get_mut(address) else {
                    tracing::warn!(pool = address, "no pool for Swap, dropping");
                    return Ok(());
                };
                let (zero_for_one, amount_specified, limit) =
                    pool.resolve_swap_input(e.amount0, e.amount1, e.sqrt_price_x96, e.liquidity)?;
                pool.swap(zero_for_one, amount_specified, limit, false)?;
            }
        }

        if let Some(pool) = self.pools.get_mut(address) {
            pool.current_block = event.block_number();
        }
        self.current_block = self.current_block.max(event.block_number());
        self.dirty_pools.insert(address.to_string());

        Ok(())
    }
}

/// Conservative fallback provider: resolves nothing and reverts every pool.
/// Useful as a stand-in when wiring `Simulator` in isolation (tests, REPL
/// experiments); `clmm-replay` supplies a real RPC-backed implementation.
#[derive(Debug, Default)]
pub struct NullMetadataProvider;

impl MetadataProvider for NullMetadataProvider {
    fn fetch_pool_config(&mut self, _pool_address: &str) -> Result<PoolMetadata> {
        Err(Error::MetadataReverted)
    }
}
