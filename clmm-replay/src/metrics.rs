//! Prometheus metric registry, following the same `lazy_static` +
//! `Registry`/`IntGauge` + `TextEncoder` pattern used for CFE metrics in the
//! engine example pack.

use prometheus::{Encoder, IntGauge, Opts, Registry, TextEncoder};

lazy_static::lazy_static! {
    static ref REGISTRY: Registry = Registry::new();
    static ref CURRENT_BLOCK: IntGauge = {
        let gauge = IntGauge::with_opts(Opts::new(
            "clmm_replay_current_block",
            "Highest block number applied to any pool",
        ))
        .expect("metric succesfully created");
        REGISTRY.register(Box::new(gauge.clone())).expect("metric registered");
        gauge
    };
    static ref DIRTY_POOLS: IntGauge = {
        let gauge = IntGauge::with_opts(Opts::new(
            "clmm_replay_dirty_pools",
            "Pools mutated since the last flush",
        ))
        .expect("metric succesfully created");
        REGISTRY.register(Box::new(gauge.clone())).expect("metric registered");
        gauge
    };
    static ref POOLS_TRACKED: IntGauge = {
        let gauge = IntGauge::with_opts(Opts::new(
            "clmm_replay_pools_tracked",
            "Total pools known to the simulator",
        ))
        .expect("metric succesfully created");
        REGISTRY.register(Box::new(gauge.clone())).expect("metric registered");
        gauge
    };
}

/// Updates every gauge from the simulator's current state. Called on each
/// `/metrics` scrape rather than on every event, since nothing consumes
/// these values between scrapes.
pub fn observe(current_block: u64, dirty_pools: usize, pools_tracked: usize) {
    CURRENT_BLOCK.set(current_block as i64);
    DIRTY_POOLS.set(dirty_pools as i64);
    POOLS_TRACKED.set(pools_tracked as i64);
}

/// Encodes the registry in Prometheus text exposition format.
pub fn encode() -> String {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&REGISTRY.gather(), &mut buffer) {
        tracing::error!(error = %e, "failed to encode prometheus metrics");
    }
    String::from_utf8(buffer).unwrap_or_default()
}
