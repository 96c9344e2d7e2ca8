//! Bit-exact concentrated-liquidity pool state engine: the pure core of the
//! simulator. Given a stream of on-chain Initialize/Mint/Burn/Swap events it
//! reproduces a Uniswap-v3-family pool's state without touching a chain,
//! a database, or the network — all of that ambient plumbing lives in the
//! `clmm-replay` binary crate built on top of this one.

pub mod constants;
pub mod error;
pub mod events;
pub mod math;
pub mod pool;
pub mod position;
pub mod simulator;
pub mod snapshot;
pub mod tick;
pub mod types;

pub use error::{Error, Result};
pub use events::PoolEvent;
pub use pool::Pool;
pub use position::{Position, PositionKey};
pub use simulator::{MetadataProvider, NullMetadataProvider, PoolMetadata, Simulator};
pub use snapshot::PoolSnapshot;
pub use tick::Tick;
pub use types::{Address, FeeTier};
