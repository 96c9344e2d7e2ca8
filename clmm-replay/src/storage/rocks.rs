//! Embedded RocksDB snapshot store, narrowed to the single column family
//! this system needs: one serialized `PoolSnapshot` per pool address, keyed
//! by address.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use clmm_core::PoolSnapshot;
use rocksdb::{ColumnFamilyDescriptor, DBWithThreadMode, MultiThreaded, Options};

use super::SnapshotStore;
use crate::error::{ReplayError, Result};

type Db = DBWithThreadMode<MultiThreaded>;

const CF_SNAPSHOTS: &str = "snapshots";

#[derive(Clone)]
pub struct RocksSnapshotStore {
    db: Arc<Db>,
}

impl RocksSnapshotStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);

        let cf = ColumnFamilyDescriptor::new(CF_SNAPSHOTS, Options::default());
        let db = Db::open_cf_descriptors(&db_opts, path, vec![cf])
            .map_err(|e| ReplayError::Storage(format!("opening rocksdb: {e}")))?;

        Ok(RocksSnapshotStore { db: Arc::new(db) })
    }

    fn cf(&self) -> Result<Arc<rocksdb::BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(CF_SNAPSHOTS)
            .ok_or_else(|| ReplayError::Storage(format!("column family '{CF_SNAPSHOTS}' not found")))
    }
}

#[async_trait]
impl SnapshotStore for RocksSnapshotStore {
    async fn put_snapshot(&self, snapshot: PoolSnapshot) -> Result<()> {
        let cf = self.cf()?;
        let bytes = serde_json::to_vec(&snapshot).map_err(|e| ReplayError::Storage(e.to_string()))?;
        self.db
            .put_cf(&cf, snapshot.pool_address.as_bytes(), bytes)
            .map_err(|e| ReplayError::Storage(format!("writing snapshot: {e}")))
    }

    async fn get_snapshot(&self, pool_address: &str) -> Result<Option<PoolSnapshot>> {
        let cf = self.cf()?;
        match self.db.get_cf(&cf, pool_address.as_bytes()) {
            Ok(Some(bytes)) => {
                let snapshot = serde_json::from_slice(&bytes).map_err(|e| ReplayError::Storage(e.to_string()))?;
                Ok(Some(snapshot))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(ReplayError::Storage(format!("reading snapshot: {e}"))),
        }
    }
}
