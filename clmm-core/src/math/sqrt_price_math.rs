//! Token amount deltas and next-price-from-amount formulas.

use primitive_types::U256;

use crate::error::{Error, Result};

use super::full_math::{mul_div, mul_div_rounding_up};
use super::signed::I256;

fn q96() -> U256 {
    crate::constants::q96()
}

/// `get_amount0_delta(sqrtA, sqrtB, L)` with an unsigned liquidity magnitude;
/// rounding direction is chosen by the caller based on the sign of the
/// original delta: rounded up when L>0, rounded down when L<0.
pub fn get_amount0_delta_unsigned(
    sqrt_ratio_a_x96: U256,
    sqrt_ratio_b_x96: U256,
    liquidity: u128,
    round_up: bool,
) -> Result<U256> {
    let (lo, hi) = order(sqrt_ratio_a_x96, sqrt_ratio_b_x96);
    let numerator1 = U256::from(liquidity) << 96;
    let numerator2 = hi - lo;

    if round_up {
        let inner = mul_div_rounding_up(numerator1, numerator2, hi)?;
        div_round_up(inner, lo)
    } else {
        let inner = mul_div(numerator1, numerator2, hi)?;
        Ok(inner / lo)
    }
}

fn div_round_up(a: U256, b: U256) -> Result<U256> {
    if b.is_zero() {
        return Err(Error::Overflow);
    }
    let q = a / b;
    if (q * b) < a {
        Ok(q + U256::one())
    } else {
        Ok(q)
    }
}

/// `get_amount1_delta(sqrtA, sqrtB, L)` unsigned magnitude form.
pub fn get_amount1_delta_unsigned(
    sqrt_ratio_a_x96: U256,
    sqrt_ratio_b_x96: U256,
    liquidity: u128,
    round_up: bool,
) -> Result<U256> {
    let (lo, hi) = order(sqrt_ratio_a_x96, sqrt_ratio_b_x96);
    let numerator = U256::from(liquidity);
    let diff = hi - lo;
    if round_up {
        mul_div_rounding_up(numerator, diff, q96())
    } else {
        mul_div(numerator, diff, q96())
    }
}

/// Signed `get_amount0_delta`: swaps endpoints if out of order, rounds
/// according to the sign of `liquidity`, and negates the result for
/// negative liquidity.
pub fn get_amount0_delta(sqrt_ratio_a_x96: U256, sqrt_ratio_b_x96: U256, liquidity: i128) -> Result<I256> {
    if liquidity < 0 {
        let magnitude = get_amount0_delta_unsigned(
            sqrt_ratio_a_x96,
            sqrt_ratio_b_x96,
            liquidity.unsigned_abs(),
            false,
        )?;
        Ok(I256::from_u256_magnitude(magnitude).neg())
    } else {
        let magnitude = get_amount0_delta_unsigned(
            sqrt_ratio_a_x96,
            sqrt_ratio_b_x96,
            liquidity as u128,
            true,
        )?;
        I256::from_u256_checked(magnitude)
    }
}

pub fn get_amount1_delta(sqrt_ratio_a_x96: U256, sqrt_ratio_b_x96: U256, liquidity: i128) -> Result<I256> {
    if liquidity < 0 {
        let magnitude = get_amount1_delta_unsigned(
            sqrt_ratio_a_x96,
            sqrt_ratio_b_x96,
            liquidity.unsigned_abs(),
            false,
        )?;
        Ok(I256::from_u256_magnitude(magnitude).neg())
    } else {
        let magnitude = get_amount1_delta_unsigned(
            sqrt_ratio_a_x96,
            sqrt_ratio_b_x96,
            liquidity as u128,
            true,
        )?;
        I256::from_u256_checked(magnitude)
    }
}

fn order(a: U256, b: U256) -> (U256, U256) {
    if a > b {
        (b, a)
    } else {
        (a, b)
    }
}

/// `next_sqrt_price_from_input`: rounds up moving right (token0 in,
/// zero_for_one), rounds down moving left (token1 in).
pub fn next_sqrt_price_from_input(
    sqrt_price_x96: U256,
    liquidity: u128,
    amount_in: U256,
    zero_for_one: bool,
) -> Result<U256> {
    if zero_for_one {
        next_sqrt_price_from_amount0_rounding_up(sqrt_price_x96, liquidity, amount_in, true)
    } else {
        next_sqrt_price_from_amount1_rounding_down(sqrt_price_x96, liquidity, amount_in, true)
    }
}

/// `next_sqrt_price_from_output`: rounds down moving right, up moving left
/// (inverse of the input case — price decreases faster than necessary is
/// never acceptable when we're paying out a fixed amount).
pub fn next_sqrt_price_from_output(
    sqrt_price_x96: U256,
    liquidity: u128,
    amount_out: U256,
    zero_for_one: bool,
) -> Result<U256> {
    if zero_for_one {
        next_sqrt_price_from_amount1_rounding_down(sqrt_price_x96, liquidity, amount_out, false)
    } else {
        next_sqrt_price_from_amount0_rounding_up(sqrt_price_x96, liquidity, amount_out, false)
    }
}

fn next_sqrt_price_from_amount0_rounding_up(
    sqrt_price_x96: U256,
    liquidity: u128,
    amount: U256,
    add: bool,
) -> Result<U256> {
    if amount.is_zero() {
        return Ok(sqrt_price_x96);
    }
    let numerator1 = U256::from(liquidity) << 96;

    if add {
        if let Some(product) = amount.checked_mul(sqrt_price_x96) {
            if let Some(denominator) = numerator1.checked_add(product) {
                return mul_div_rounding_up(numerator1, sqrt_price_x96, denominator);
            }
        }
        // Falls back to a division-only form whenever the direct product
        // would overflow 256 bits: ceil(numerator1 / (numerator1/sqrtPrice + amount)).
        div_round_up(numerator1, (numerator1 / sqrt_price_x96) + amount)
    } else {
        let product = amount.checked_mul(sqrt_price_x96).ok_or(Error::Overflow)?;
        if numerator1 <= product {
            return Err(Error::Overflow);
        }
        let denominator = numerator1 - product;
        mul_div_rounding_up(numerator1, sqrt_price_x96, denominator)
    }
}

fn next_sqrt_price_from_amount1_rounding_down(
    sqrt_price_x96: U256,
    liquidity: u128,
    amount: U256,
    add: bool,
) -> Result<U256> {
    if add {
        let max_uint160 = (U256::one() << 160) - U256::one();
        let quotient = if amount <= max_uint160 {
            (amount << 96) / U256::from(liquidity)
        } else {
            mul_div(amount, crate::constants::q96(), U256::from(liquidity))?
        };
        Ok(sqrt_price_x96 + quotient)
    } else {
        let quotient = mul_div_rounding_up(amount, crate::constants::q96(), U256::from(liquidity))?;
        if sqrt_price_x96 <= quotient {
            return Err(Error::Overflow);
        }
        Ok(sqrt_price_x96 - quotient)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::tick_math::get_sqrt_ratio_at_tick;

    #[test]
    fn amount0_delta_is_symmetric_on_endpoint_order() {
        let a = get_sqrt_ratio_at_tick(-100).unwrap();
        let b = get_sqrt_ratio_at_tick(100).unwrap();
        let forward = get_amount0_delta_unsigned(a, b, 1_000_000, false).unwrap();
        let backward = get_amount0_delta_unsigned(b, a, 1_000_000, false).unwrap();
        assert_eq!(forward, backward);
    }

    #[test]
    fn amount1_delta_rounding_up_is_ge_rounding_down() {
        let a = get_sqrt_ratio_at_tick(-100).unwrap();
        let b = get_sqrt_ratio_at_tick(100).unwrap();
        let down = get_amount1_delta_unsigned(a, b, 123_456_789, false).unwrap();
        let up = get_amount1_delta_unsigned(a, b, 123_456_789, true).unwrap();
        assert!(up >= down);
    }
}
