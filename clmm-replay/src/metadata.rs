//! `MetadataProvider` implementations.

use std::collections::HashMap;

use clmm_core::error::{Error, Result};
use clmm_core::{MetadataProvider, PoolMetadata};

use crate::config::PoolConfigEntry;

/// Resolves pool configuration from a config-supplied map — exactly how a
/// real deployment seeds well-known pools before a full metadata-indexing
/// service exists. Unknown pools are classified `MetadataReverted`: the
/// simulator skips their Initialize event with a warning rather than
/// treating it as fatal.
#[derive(Debug, Default)]
pub struct StaticMetadataProvider {
    pools: HashMap<String, PoolConfigEntry>,
}

impl StaticMetadataProvider {
    pub fn new(pools: HashMap<String, PoolConfigEntry>) -> Self {
        StaticMetadataProvider { pools }
    }
}

impl MetadataProvider for StaticMetadataProvider {
    fn fetch_pool_config(&mut self, pool_address: &str) -> Result<PoolMetadata> {
        let entry = self.pools.get(pool_address).ok_or(Error::MetadataReverted)?;
        Ok(PoolMetadata {
            token0: entry.token0.clone(),
            token1: entry.token1.clone(),
            fee_pips: entry.fee_pips,
        })
    }
}
