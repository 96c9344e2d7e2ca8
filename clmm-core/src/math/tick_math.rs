//! `get_sqrt_ratio_at_tick` / `get_tick_at_sqrt_ratio`: bit-exact ports of the
//! reference TickMath bit-expansion and log2 refinement.

use primitive_types::U256;

use crate::constants::{max_sqrt_ratio, min_sqrt_ratio, MAX_TICK, MIN_TICK};
use crate::error::{Error, Result};

/// One 128-bit magic constant per set bit of `|tick|`, indexed by bit
/// position. Bit 0's constant is `else 2^128` per spec — i.e. the starting
/// ratio is this constant only when bit 0 of `|tick|` is set, otherwise 2^128.
const MAGIC: [u128; 20] = [
    0xfffcb933bd6fad37aa2d162d1a594001,
    0xfff97272373d413259a46990580e213a,
    0xfff2e50f5f656932ef12357cf3c7fdcc,
    0xffe5caca7e10e4e61c3624eaa0941cd0,
    0xffcb9843d60f6159c9db58835c926644,
    0xff973b41fa98c081472e6896dfb254c0,
    0xff2ea16466c96a3843ec78b326b52861,
    0xfe5dee046a99a2a811c461f1969c3053,
    0xfcbe86c7900a88aedcffc83b479aa3a4,
    0xf987a7253ac413176f2b074cf7815e54,
    0xf3392b0822b70005940c7a398e4b70f3,
    0xe7159475a2c29b7443b29c7fa6e889d9,
    0xd097f3bdfd2022b8845ad8f792aa5825,
    0xa9f746462d870fdf8a65dc1f90e061e5,
    0x70d869a156d2a1b890bb3df62baf32f7,
    0x31be135f97d08fd981231505542fcfa6,
    0x9aa508b5b7a84e1c677de54f3e99bc9,
    0x5d6af8dedb81196699c329225ee604,
    0x2216e584f5fa1ea926041bedfe98,
    0x48a170391f7dc42444e8fa2,
];

pub fn get_sqrt_ratio_at_tick(tick: i32) -> Result<U256> {
    if tick < MIN_TICK || tick > MAX_TICK {
        return Err(Error::InvalidTick(tick));
    }
    let abs_tick = tick.unsigned_abs();

    let mut ratio = if abs_tick & 0x1 != 0 {
        U256::from(MAGIC[0])
    } else {
        U256::from(1u128) << 128
    };

    for (i, magic) in MAGIC.iter().enumerate().skip(1) {
        if abs_tick & (1u32 << i) != 0 {
            ratio = (ratio * U256::from(*magic)) >> 128;
        }
    }

    if tick > 0 {
        ratio = U256::MAX / ratio;
    }

    // ceil(ratio / 2^32)
    let shifted = ratio >> 32;
    let remainder = ratio - (shifted << 32);
    Ok(if remainder.is_zero() { shifted } else { shifted + U256::one() })
}

/// `log(1.0001, x) * 2^64`'s magic multiplier, per the reference implementation.
const LOG_SQRT10001_MAGIC: u128 = 255738958999603826347141;
const TICK_LOW_OFFSET: u128 = 3402992956809132418596140100660247210;
const TICK_HIGH_OFFSET: u128 = 291339464771989622907027621153398088495;

pub fn get_tick_at_sqrt_ratio(sqrt_price_x96: U256) -> Result<i32> {
    let min_ratio = min_sqrt_ratio();
    let max_ratio = max_sqrt_ratio();
    if sqrt_price_x96 < min_ratio || sqrt_price_x96 >= max_ratio {
        return Err(Error::InvalidSqrtRatio);
    }

    let ratio = sqrt_price_x96 << 32;
    let msb = most_significant_bit(ratio);

    let mut r = if msb >= 128 {
        ratio >> (msb - 127) as usize
    } else {
        ratio << (127 - msb) as usize
    };

    let mut log_2: i128 = (msb as i128 - 128) << 64;

    for shift in (50..=63).rev() {
        r = (r * r) >> 127usize;
        let f = (r >> 128usize).low_u32();
        log_2 |= (f as i128) << shift;
        r >>= f as usize;
    }

    let log_sqrt10001 = i256_mul_positive(i128_to_bits(log_2), U256::from(LOG_SQRT10001_MAGIC));

    let tick_low_bits = log_sqrt10001.overflowing_sub(U256::from(TICK_LOW_OFFSET)).0;
    let tick_high_bits = log_sqrt10001.overflowing_add(U256::from(TICK_HIGH_OFFSET)).0;

    let tick_low = bits_to_i32(arithmetic_shr_256(tick_low_bits, 128));
    let tick_high = bits_to_i32(arithmetic_shr_256(tick_high_bits, 128));

    Ok(if tick_low == tick_high {
        tick_low
    } else if get_sqrt_ratio_at_tick(tick_high)? <= sqrt_price_x96 {
        tick_high
    } else {
        tick_low
    })
}

fn most_significant_bit(x: U256) -> u32 {
    debug_assert!(!x.is_zero());
    x.bits() as u32 - 1
}

/// Two's-complement bit pattern of a small `i128`, widened to `U256`.
fn i128_to_bits(v: i128) -> U256 {
    if v >= 0 {
        U256::from(v as u128)
    } else {
        (!U256::from(v.unsigned_abs())).overflowing_add(U256::one()).0
    }
}

/// Multiplies a two's-complement `U256` by a known-positive constant.
fn i256_mul_positive(bits: U256, k: U256) -> U256 {
    let negative = bits.bit(255);
    let magnitude = if negative {
        (!bits).overflowing_add(U256::one()).0
    } else {
        bits
    };
    let product = magnitude * k;
    if negative {
        (!product).overflowing_add(U256::one()).0
    } else {
        product
    }
}

/// Arithmetic (sign-extending) right shift on a two's-complement `U256`,
/// via the standard identity `asr(x, n) == !(!x >> n)`.
fn arithmetic_shr_256(bits: U256, n: usize) -> U256 {
    !((!bits) >> n)
}

fn bits_to_i32(bits: U256) -> i32 {
    if bits.bit(255) {
        let magnitude = (!bits).overflowing_add(U256::one()).0;
        -(magnitude.as_u128() as i64) as i32
    } else {
        bits.as_u128() as i64 as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_match_constants() {
        assert_eq!(get_sqrt_ratio_at_tick(MIN_TICK).unwrap(), min_sqrt_ratio());
        assert_eq!(get_sqrt_ratio_at_tick(MAX_TICK).unwrap(), max_sqrt_ratio());
    }

    #[test]
    fn tick_zero_is_q96() {
        assert_eq!(get_sqrt_ratio_at_tick(0).unwrap(), U256::from(1u128) << 96);
    }

    #[test]
    fn out_of_range_tick_fails() {
        assert_eq!(
            get_sqrt_ratio_at_tick(MAX_TICK + 1),
            Err(Error::InvalidTick(MAX_TICK + 1))
        );
    }

    #[test]
    fn inverse_round_trip_at_endpoints() {
        assert_eq!(get_tick_at_sqrt_ratio(min_sqrt_ratio()).unwrap(), MIN_TICK);
        assert_eq!(
            get_tick_at_sqrt_ratio(max_sqrt_ratio() - U256::one()).unwrap(),
            MAX_TICK - 1
        );
    }

    #[test]
    fn round_trip_across_a_spread_of_ticks() {
        for t in [-887272, -500000, -1, 0, 1, 500000, 887271, 887272] {
            let ratio = get_sqrt_ratio_at_tick(t).unwrap();
            // get_tick_at_sqrt_ratio(get_sqrt_ratio_at_tick(t)) == t except that
            // the ratio computed for MAX_TICK equals MAX_SQRT_RATIO, which is
            // itself out of the half-open domain of get_tick_at_sqrt_ratio.
            if t == MAX_TICK {
                continue;
            }
            assert_eq!(get_tick_at_sqrt_ratio(ratio).unwrap(), t, "tick {t}");
        }
    }
}
