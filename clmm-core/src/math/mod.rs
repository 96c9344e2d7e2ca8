pub mod full_math;
pub mod signed;
pub mod sqrt_price_math;
pub mod swap_math;
pub mod tick_math;

pub use full_math::{liquidity_add_delta, mod256_sub, mul_div, mul_div_rounding_up};
pub use signed::I256;
pub use sqrt_price_math::{
    get_amount0_delta, get_amount1_delta, next_sqrt_price_from_input, next_sqrt_price_from_output,
};
pub use swap_math::{compute_swap_step, SwapStepResult};
pub use tick_math::{get_sqrt_ratio_at_tick, get_tick_at_sqrt_ratio};
