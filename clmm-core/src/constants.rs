//! Bit-exact constants shared across the fixed-point math and pool state machine.

use primitive_types::U256;

pub const MIN_TICK: i32 = -887272;
pub const MAX_TICK: i32 = 887272;

/// `get_sqrt_ratio_at_tick(MIN_TICK)`.
pub const MIN_SQRT_RATIO_U64: u64 = 4295128739;

pub const MAX_FEE_PIPS: u32 = 1_000_000;

/// Tick spacing for each supported fee tier, in pips.
pub const FEE_LOW: u32 = 500;
pub const FEE_MEDIUM: u32 = 3000;
pub const FEE_HIGH: u32 = 10000;

pub const TICK_SPACING_LOW: i32 = 10;
pub const TICK_SPACING_MEDIUM: i32 = 60;
pub const TICK_SPACING_HIGH: i32 = 200;

pub fn min_sqrt_ratio() -> U256 {
    U256::from(MIN_SQRT_RATIO_U64)
}

/// `1461446703485210103287273052203988822378723970342`, `get_sqrt_ratio_at_tick(MAX_TICK)`.
pub fn max_sqrt_ratio() -> U256 {
    U256::from_dec_str("1461446703485210103287273052203988822378723970342")
        .expect("constant parses")
}

pub fn q32() -> U256 {
    U256::from(1u64) << 32
}

pub fn q96() -> U256 {
    U256::from(1u64) << 96
}

pub fn q128() -> U256 {
    U256::from(1u64) << 128
}

/// `max_liquidity_per_tick`, derived from tick spacing: the number of
/// initializable ticks evenly divides `uint128::MAX`.
pub fn max_liquidity_per_tick(tick_spacing: i32) -> u128 {
    let min_tick_compressed = MIN_TICK / tick_spacing;
    let max_tick_compressed = MAX_TICK / tick_spacing;
    let num_ticks = (max_tick_compressed - min_tick_compressed + 1) as u128;
    u128::MAX / num_ticks
}
