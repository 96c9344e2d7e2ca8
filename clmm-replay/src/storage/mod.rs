//! Push-only persistence of the simulator's dirty set: the dirty pools are
//! read under an exclusive guard and written out, never read back into a
//! running simulator.

mod memory;
mod rocks;

pub use memory::InMemorySnapshotStore;
pub use rocks::RocksSnapshotStore;

use async_trait::async_trait;
use clmm_core::PoolSnapshot;

use crate::error::Result;

#[async_trait]
pub trait SnapshotStore: Send + Sync {
    async fn put_snapshot(&self, snapshot: PoolSnapshot) -> Result<()>;
    async fn get_snapshot(&self, pool_address: &str) -> Result<Option<PoolSnapshot>>;
}
