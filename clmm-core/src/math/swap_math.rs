//! `compute_swap_step`: the single-step routine the swap loop calls once per
//! tick range crossed. Ported bit-for-bit from the reference SwapMath,
//! including its "didn't reach target" fee-remainder special case, verified
//! against concrete numeric test vectors.

use primitive_types::U256;

use crate::constants::MAX_FEE_PIPS;
use crate::error::Result;

use super::full_math::mul_div_rounding_up;
use super::signed::I256;
use super::sqrt_price_math::{
    get_amount0_delta_unsigned, get_amount1_delta_unsigned, next_sqrt_price_from_input,
    next_sqrt_price_from_output,
};

pub struct SwapStepResult {
    pub sqrt_price_next_x96: U256,
    pub amount_in: U256,
    pub amount_out: U256,
    pub fee_amount: U256,
}

pub fn compute_swap_step(
    sqrt_ratio_current_x96: U256,
    sqrt_ratio_target_x96: U256,
    liquidity: u128,
    amount_remaining: I256,
    fee_pips: u32,
) -> Result<SwapStepResult> {
    let zero_for_one = sqrt_ratio_current_x96 >= sqrt_ratio_target_x96;
    let exact_in = !amount_remaining.is_negative();
    let fee_pips_u256 = U256::from(fee_pips);
    let max_fee_u256 = U256::from(MAX_FEE_PIPS);

    let mut sqrt_ratio_next_x96;
    let mut amount_in;
    let mut amount_out;

    if exact_in {
        let amount_remaining_abs = amount_remaining.unsigned_abs();
        let amount_remaining_less_fee =
            crate::math::full_math::mul_div(amount_remaining_abs, max_fee_u256 - fee_pips_u256, max_fee_u256)?;
        amount_in = if zero_for_one {
            get_amount0_delta_unsigned(sqrt_ratio_target_x96, sqrt_ratio_current_x96, liquidity, true)?
        } else {
            get_amount1_delta_unsigned(sqrt_ratio_current_x96, sqrt_ratio_target_x96, liquidity, true)?
        };
        sqrt_ratio_next_x96 = if amount_remaining_less_fee >= amount_in {
            sqrt_ratio_target_x96
        } else {
            next_sqrt_price_from_input(
                sqrt_ratio_current_x96,
                liquidity,
                amount_remaining_less_fee,
                zero_for_one,
            )?
        };
        amount_out = U256::zero();
    } else {
        let amount_remaining_abs = amount_remaining.unsigned_abs();
        amount_out = if zero_for_one {
            get_amount1_delta_unsigned(sqrt_ratio_target_x96, sqrt_ratio_current_x96, liquidity, false)?
        } else {
            get_amount0_delta_unsigned(sqrt_ratio_current_x96, sqrt_ratio_target_x96, liquidity, false)?
        };
        sqrt_ratio_next_x96 = if amount_remaining_abs >= amount_out {
            sqrt_ratio_target_x96
        } else {
            next_sqrt_price_from_output(sqrt_ratio_current_x96, liquidity, amount_remaining_abs, zero_for_one)?
        };
        amount_in = U256::zero();
    }

    let reached_target = sqrt_ratio_next_x96 == sqrt_ratio_target_x96;

    if zero_for_one {
        if !(reached_target && exact_in) {
            amount_in = get_amount0_delta_unsigned(sqrt_ratio_next_x96, sqrt_ratio_current_x96, liquidity, true)?;
        }
        if !(reached_target && !exact_in) {
            amount_out = get_amount1_delta_unsigned(sqrt_ratio_next_x96, sqrt_ratio_current_x96, liquidity, false)?;
        }
    } else {
        if !(reached_target && exact_in) {
            amount_in = get_amount1_delta_unsigned(sqrt_ratio_current_x96, sqrt_ratio_next_x96, liquidity, true)?;
        }
        if !(reached_target && !exact_in) {
            amount_out = get_amount0_delta_unsigned(sqrt_ratio_current_x96, sqrt_ratio_next_x96, liquidity, false)?;
        }
    }

    if !exact_in {
        let cap = amount_remaining.unsigned_abs();
        if amount_out > cap {
            amount_out = cap;
        }
    }

    let fee_amount = if exact_in && sqrt_ratio_next_x96 != sqrt_ratio_target_x96 {
        // Didn't reach the target: the whole unconverted remainder is fee,
        // which also absorbs any floor-rounding slack from the exact-in
        // split above instead of leaking it.
        amount_remaining.unsigned_abs() - amount_in
    } else {
        mul_div_rounding_up(amount_in, fee_pips_u256, max_fee_u256 - fee_pips_u256)?
    };

    Ok(SwapStepResult {
        sqrt_price_next_x96: sqrt_ratio_next_x96,
        amount_in,
        amount_out,
        fee_amount,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn u(s: &str) -> U256 {
        U256::from_dec_str(s).unwrap()
    }

    fn enc_sqrt_ratio(x: u64, y: u64) -> U256 {
        // floor(sqrt(x/y) * 2^96), computed via integer sqrt on (x << 192)/y.
        let numerator = U256::from(x) << 192;
        let ratio = numerator / U256::from(y);
        isqrt(ratio)
    }

    fn isqrt(n: U256) -> U256 {
        if n.is_zero() {
            return U256::zero();
        }
        let mut x = n;
        let mut y = (x + U256::one()) / U256::from(2u8);
        while y < x {
            x = y;
            y = (x + n / x) / U256::from(2u8);
        }
        x
    }

    #[test]
    fn vector_1_exact_in_capped_at_target_one_for_zero() {
        let price = enc_sqrt_ratio(1, 1);
        let target = enc_sqrt_ratio(101, 100);
        let l = 2_000_000_000_000_000_000u128;
        let amount = I256::from_i128(1_000_000_000_000_000_000i128);
        let r = compute_swap_step(price, target, l, amount, 600).unwrap();
        assert_eq!(r.amount_in, u("9975124224178055"));
        assert_eq!(r.fee_amount, u("5988667735148"));
        assert_eq!(r.amount_out, u("9925619580021728"));
        assert_eq!(r.sqrt_price_next_x96, target);
    }

    #[test]
    fn vector_2_exact_in_fully_spent() {
        let price = enc_sqrt_ratio(1, 1);
        let target = enc_sqrt_ratio(1000, 100);
        let l = 2_000_000_000_000_000_000u128;
        let amount = I256::from_i128(1_000_000_000_000_000_000i128);
        let r = compute_swap_step(price, target, l, amount, 600).unwrap();
        assert_eq!(r.amount_in, u("999400000000000000"));
        assert_eq!(r.fee_amount, u("600000000000000"));
        assert_eq!(r.amount_out, u("666399946655997866"));
        assert!(r.sqrt_price_next_x96 < target);
    }

    #[test]
    fn vector_3_amount_out_capped() {
        let price = u("417332158212080721273783715441582");
        let target = u("1452870262520218020823638996");
        let l = u("159344665391607089467575320103").as_u128();
        let amount = I256::from_i128(-1);
        let r = compute_swap_step(price, target, l, amount, 1).unwrap();
        assert_eq!(r.amount_in, u("1"));
        assert_eq!(r.fee_amount, u("1"));
        assert_eq!(r.amount_out, u("1"));
        assert_eq!(r.sqrt_price_next_x96, price - U256::one());
    }

    #[test]
    fn vector_4_entire_input_taken_as_fee() {
        let price = U256::from(2413u64);
        let target = u("79887613182836312");
        let l = u("1985041575832132834610021537970").as_u128();
        let amount = I256::from_i128(10);
        let r = compute_swap_step(price, target, l, amount, 1872).unwrap();
        assert_eq!(r.amount_in, U256::zero());
        assert_eq!(r.fee_amount, U256::from(10u64));
        assert_eq!(r.amount_out, U256::zero());
        assert_eq!(r.sqrt_price_next_x96, price);
    }
}
