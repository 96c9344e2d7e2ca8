//! The ingestion loop: pulls events from an `EventSource`, replays them
//! through `Simulator::handle_events` in order, and periodically flushes the
//! dirty set to a `SnapshotStore`.

pub mod source;

use std::sync::Arc;
use std::time::Duration;

use clmm_core::{MetadataProvider, Simulator};
use tokio::sync::RwLock;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::{ReplayError, Result};
use crate::storage::SnapshotStore;
use source::EventSource;

/// Runs until the source is exhausted, a fatal execution error surfaces, or
/// `cancel` is triggered. Cancellation is only ever observed *between*
/// events, never while `handle_events` is running — the state machine is not
/// re-entrant.
pub async fn run_ingest_loop<S, M, T>(
    mut source: S,
    simulator: &mut Simulator<M>,
    store: &T,
    flush_interval: Duration,
    cancel: CancellationToken,
) -> Result<()>
where
    S: EventSource,
    M: MetadataProvider,
    T: SnapshotStore,
{
    let mut last_flush = Instant::now();

    loop {
        if cancel.is_cancelled() {
            tracing::info!("ingest loop cancelled, flushing before exit");
            break;
        }

        let Some(event) = source.next_event().await? else {
            tracing::info!("event source exhausted");
            break;
        };

        let pool = event.pool_address().to_string();
        let block = event.block_number();

        if let Err(err) = simulator.handle_events(std::slice::from_ref(&event)) {
            tracing::error!(pool, block, error = %err, "fatal execution error, stopping ingest");
            flush_dirty(simulator, store).await?;
            return Err(ReplayError::Core(err));
        }

        if last_flush.elapsed() >= flush_interval {
            flush_dirty(simulator, store).await?;
            last_flush = Instant::now();
        }
    }

    flush_dirty(simulator, store).await
}

/// Pushes every pool in the dirty set to the store and clears it — the
/// persistence layer's only write path.
pub async fn flush_dirty<M, T>(simulator: &mut Simulator<M>, store: &T) -> Result<()>
where
    M: MetadataProvider,
    T: SnapshotStore,
{
    let dirty: Vec<String> = simulator.dirty_set().iter().cloned().collect();
    for address in &dirty {
        let Some(pool) = simulator.pool(address) else { continue };
        let snapshot = clmm_core::PoolSnapshot::from(pool);
        store.put_snapshot(snapshot).await?;
    }
    if !dirty.is_empty() {
        tracing::debug!(count = dirty.len(), "flushed dirty pools to snapshot store");
    }
    simulator.clear_dirty();
    Ok(())
}

/// Same loop as `run_ingest_loop`, but for a `Simulator` shared with a live
/// query API: the write lock is acquired only around each single event and
/// each flush, never held across `source.next_event().await`, so `ApiState`
/// handlers can interleave reads between events instead of being starved for
/// the ingest loop's entire lifetime.
pub async fn run_ingest_loop_shared<S, M, T>(
    mut source: S,
    simulator: Arc<RwLock<Simulator<M>>>,
    store: &T,
    flush_interval: Duration,
    cancel: CancellationToken,
) -> Result<()>
where
    S: EventSource,
    M: MetadataProvider,
    T: SnapshotStore,
{
    let mut last_flush = Instant::now();

    loop {
        if cancel.is_cancelled() {
            tracing::info!("ingest loop cancelled, flushing before exit");
            break;
        }

        let Some(event) = source.next_event().await? else {
            tracing::info!("event source exhausted");
            break;
        };

        let pool = event.pool_address().to_string();
        let block = event.block_number();

        {
            let mut guard = simulator.write().await;
            if let Err(err) = guard.handle_events(std::slice::from_ref(&event)) {
                tracing::error!(pool, block, error = %err, "fatal execution error, stopping ingest");
                flush_dirty(&mut guard, store).await?;
                return Err(ReplayError::Core(err));
            }
        }

        if last_flush.elapsed() >= flush_interval {
            let mut guard = simulator.write().await;
            flush_dirty(&mut guard, store).await?;
            last_flush = Instant::now();
        }
    }

    let mut guard = simulator.write().await;
    flush_dirty(&mut guard, store).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use clmm_core::events::{InitializeEvent, MintEvent, PoolEvent};
    use clmm_core::PoolMetadata;
    use primitive_types::U256;
    use std::collections::HashMap;

    use crate::metadata::StaticMetadataProvider;
    use crate::storage::InMemorySnapshotStore;

    fn event_lines() -> String {
        let init = PoolEvent::Initialize(InitializeEvent {
            pool_address: "pool".into(),
            sqrt_price_x96: U256::from(1u128) << 96,
            block_number: 1,
            log_index: 0,
        });
        let mint = PoolEvent::Mint(MintEvent {
            pool_address: "pool".into(),
            owner: "lp".into(),
            tick_lower: -6000,
            tick_upper: 6000,
            amount: 10_000_000_000,
            amount0: U256::zero(),
            amount1: U256::zero(),
            block_number: 2,
            log_index: 0,
        });
        format!(
            "{}\n{}\n",
            serde_json::to_string(&init).unwrap(),
            serde_json::to_string(&mint).unwrap()
        )
    }

    #[tokio::test]
    async fn ingest_loop_replays_events_and_flushes_on_exhaustion() {
        let mut pools = HashMap::new();
        pools.insert(
            "pool".to_string(),
            crate::config::PoolConfigEntry { token0: "t0".into(), token1: "t1".into(), fee_pips: 3000 },
        );
        let mut simulator = Simulator::new(StaticMetadataProvider::new(pools));
        let store = InMemorySnapshotStore::new();
        let source = source::JsonLinesEventSource::new(std::io::Cursor::new(event_lines()));

        run_ingest_loop(source, &mut simulator, &store, Duration::from_secs(3600), CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(simulator.pool("pool").unwrap().liquidity, 10_000_000_000);
        assert!(simulator.dirty_set().is_empty());
        assert!(store.get_snapshot("pool").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn fatal_execution_error_stops_the_loop() {
        // PoolExists: a duplicate Initialize for the same pool is the
        // "execution failure after successful parse" case, which is fatal.
        let init = PoolEvent::Initialize(InitializeEvent {
            pool_address: "pool".into(),
            sqrt_price_x96: U256::from(1u128) << 96,
            block_number: 1,
            log_index: 0,
        });
        let payload = format!(
            "{}\n{}\n",
            serde_json::to_string(&init).unwrap(),
            serde_json::to_string(&init).unwrap()
        );
        // Seeds metadata so the first Initialize succeeds and the second,
        // duplicate one fails with `PoolExists` — an execution error after a
        // successful parse, which is fatal rather than logged-and-skipped.
        let mut simulator = Simulator::new(OnceProviderSync(true));
        let store = InMemorySnapshotStore::new();
        let source = source::JsonLinesEventSource::new(std::io::Cursor::new(payload));

        let result =
            run_ingest_loop(source, &mut simulator, &store, Duration::from_secs(3600), CancellationToken::new())
                .await;
        assert!(result.is_err());
    }

    struct OnceProviderSync(bool);
    impl clmm_core::MetadataProvider for OnceProviderSync {
        fn fetch_pool_config(&mut self, _pool_address: &str) -> clmm_core::Result<PoolMetadata> {
            if std::mem::replace(&mut self.0, false) {
                Ok(PoolMetadata { token0: "t0".into(), token1: "t1".into(), fee_pips: 3000 })
            } else {
                Err(clmm_core::Error::MetadataReverted)
            }
        }
    }

    #[tokio::test]
    async fn shared_loop_replays_events_and_releases_the_lock_between_them() {
        let mut pools = HashMap::new();
        pools.insert(
            "pool".to_string(),
            crate::config::PoolConfigEntry { token0: "t0".into(), token1: "t1".into(), fee_pips: 3000 },
        );
        let simulator = std::sync::Arc::new(tokio::sync::RwLock::new(Simulator::new(StaticMetadataProvider::new(pools))));
        let store = InMemorySnapshotStore::new();
        let source = source::JsonLinesEventSource::new(std::io::Cursor::new(event_lines()));

        run_ingest_loop_shared(source, simulator.clone(), &store, Duration::from_secs(3600), CancellationToken::new())
            .await
            .unwrap();

        let guard = simulator.read().await;
        assert_eq!(guard.pool("pool").unwrap().liquidity, 10_000_000_000);
        assert!(guard.dirty_set().is_empty());
        assert!(store.get_snapshot("pool").await.unwrap().is_some());
    }
}
