//! `mul_div` and friends: full-precision 256x256 -> 256 fixed-point math.

use primitive_types::{U256, U512};

use crate::error::{Error, Result};

fn widen(x: U256) -> U512 {
    U512(
        [x.0[0], x.0[1], x.0[2], x.0[3], 0, 0, 0, 0],
    )
}

/// Narrows a `U512` back to `U256`, failing `Overflow` if it doesn't fit.
fn narrow(x: U512) -> Result<U256> {
    if x.0[4] != 0 || x.0[5] != 0 || x.0[6] != 0 || x.0[7] != 0 {
        return Err(Error::Overflow);
    }
    Ok(U256([x.0[0], x.0[1], x.0[2], x.0[3]]))
}

/// `floor(a * b / denominator)`.
pub fn mul_div(a: U256, b: U256, denominator: U256) -> Result<U256> {
    if denominator.is_zero() {
        return Err(Error::Overflow);
    }
    let product = widen(a) * widen(b);
    let quotient = product / widen(denominator);
    narrow(quotient)
}

/// `ceil(a * b / denominator)`.
pub fn mul_div_rounding_up(a: U256, b: U256, denominator: U256) -> Result<U256> {
    if denominator.is_zero() {
        return Err(Error::Overflow);
    }
    let product = widen(a) * widen(b);
    let denom = widen(denominator);
    let quotient = product / denom;
    let remainder = product % denom;
    let quotient = if remainder.is_zero() {
        quotient
    } else {
        quotient + U512::one()
    };
    narrow(quotient)
}

/// `(a - b) mod 2^256`. `U256` subtraction already wraps modulo 2^256, so
/// this just makes the intent explicit at call sites.
pub fn mod256_sub(a: U256, b: U256) -> U256 {
    a.overflowing_sub(b).0
}

/// `L + delta`, both ends checked against the `uint128` width.
pub fn liquidity_add_delta(l: u128, delta: i128) -> Result<u128> {
    if delta >= 0 {
        l.checked_add(delta as u128).ok_or(Error::Overflow)
    } else {
        l.checked_sub(delta.unsigned_abs()).ok_or(Error::Underflow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mul_div_basic() {
        let a = U256::from(1000u64);
        let b = U256::from(3000u64);
        let d = U256::from(7u64);
        assert_eq!(mul_div(a, b, d).unwrap(), U256::from(428571u64));
        assert_eq!(mul_div_rounding_up(a, b, d).unwrap(), U256::from(428572u64));
    }

    #[test]
    fn mul_div_exact_no_rounding_up_difference() {
        let a = U256::from(10u64);
        let b = U256::from(10u64);
        let d = U256::from(5u64);
        assert_eq!(mul_div(a, b, d).unwrap(), mul_div_rounding_up(a, b, d).unwrap());
    }

    #[test]
    fn mul_div_overflows_when_quotient_exceeds_u256() {
        let a = U256::MAX;
        let b = U256::from(2u64);
        let d = U256::from(1u64);
        assert_eq!(mul_div(a, b, d), Err(Error::Overflow));
    }

    #[test]
    fn mod256_sub_wraps() {
        let a = U256::from(5u64);
        let b = U256::from(10u64);
        assert_eq!(mod256_sub(a, b), a.overflowing_sub(b).0);
    }

    #[test]
    fn liquidity_add_delta_bounds() {
        assert_eq!(liquidity_add_delta(10, -5).unwrap(), 5);
        assert_eq!(liquidity_add_delta(10, -11), Err(Error::Underflow));
        assert_eq!(liquidity_add_delta(u128::MAX, 1), Err(Error::Overflow));
    }
}
