//! In-process snapshot store backing tests and dry runs — no disk I/O.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use clmm_core::PoolSnapshot;

use super::SnapshotStore;
use crate::error::Result;

#[derive(Default)]
pub struct InMemorySnapshotStore {
    snapshots: RwLock<HashMap<String, PoolSnapshot>>,
}

impl InMemorySnapshotStore {
    pub fn new() -> Self {
        InMemorySnapshotStore { snapshots: RwLock::new(HashMap::new()) }
    }
}

#[async_trait]
impl SnapshotStore for InMemorySnapshotStore {
    async fn put_snapshot(&self, snapshot: PoolSnapshot) -> Result<()> {
        self.snapshots
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(snapshot.pool_address.clone(), snapshot);
        Ok(())
    }

    async fn get_snapshot(&self, pool_address: &str) -> Result<Option<PoolSnapshot>> {
        Ok(self
            .snapshots
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(pool_address)
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn round_trips_a_snapshot() {
        let mut pool = clmm_core::Pool::new("pool".into(), "t0".into(), "t1".into(), clmm_core::FeeTier::Medium, 0);
        pool.initialize(primitive_types::U256::from(1u128) << 96).unwrap();
        let snapshot = PoolSnapshot::from(&pool);

        let store = InMemorySnapshotStore::new();
        store.put_snapshot(snapshot.clone()).await.unwrap();
        let got = store.get_snapshot("pool").await.unwrap().unwrap();
        assert_eq!(got.sqrt_price_x96, snapshot.sqrt_price_x96);
        assert!(store.get_snapshot("missing").await.unwrap().is_none());
    }
}
