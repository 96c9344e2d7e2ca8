use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Error taxonomy for the pool state engine. Every variant corresponds to a
/// named failure kind in the math, tick/position stores, pool state machine
/// or simulator dispatch loop; none of them are retried internally.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("arithmetic overflow")]
    Overflow,

    #[error("arithmetic underflow")]
    Underflow,

    #[error("invalid tick {0}")]
    InvalidTick(i32),

    #[error("invalid sqrt ratio")]
    InvalidSqrtRatio,

    #[error("pool already initialized")]
    AlreadyInitialized,

    #[error("pool not initialized")]
    NotInitialized,

    #[error("sqrt price limit must be above MIN_SQRT_RATIO")]
    RatioMin,

    #[error("sqrt price limit must be below MAX_SQRT_RATIO")]
    RatioMax,

    #[error("sqrt price limit is on the wrong side of the current price")]
    RatioCurrent,

    #[error("liquidity underflow: position holds less than requested")]
    LiquidityUnderflow,

    #[error("liquidity_gross exceeds max_liquidity_per_tick")]
    LiquidityGrossExceedsMax,

    #[error("update with zero delta on a position that does not exist")]
    PositionEmpty,

    #[error("pool already exists")]
    PoolExists,

    #[error("pool not found")]
    PoolNotFound,

    #[error("requested amount is negative")]
    InvalidRequest,

    #[error("no candidate swap input reproduced the observed event")]
    ResolveSwapInputFailed,

    #[error("metadata provider reverted for this pool")]
    MetadataReverted,
}
