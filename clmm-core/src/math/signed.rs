//! Minimal signed 256-bit integer, stored as a two's-complement `U256`.
//!
//! The core's declared widths are `uint128`/`int128`/`uint160`/`uint256`;
//! token amounts and swap deltas are the one place a genuine
//! signed 256-bit quantity is needed (real Uniswap v3 `amount0`/`amount1`
//! are `int256`). Addition/subtraction on two's-complement values is just
//! wrapping `U256` arithmetic; only multiply, compare and display need to
//! know about the sign bit.

use std::cmp::Ordering;
use std::fmt;

use primitive_types::U256;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct I256(pub U256);

impl I256 {
    pub const ZERO: I256 = I256(U256::zero());

    pub fn from_i128(v: i128) -> Self {
        if v >= 0 {
            I256(U256::from(v as u128))
        } else {
            I256::from_u256_magnitude(U256::from(v.unsigned_abs())).neg()
        }
    }

    pub fn from_u256_magnitude(u: U256) -> Self {
        I256(u)
    }

    /// Interprets `u` as a non-negative signed value; fails if its top bit is set.
    pub fn from_u256_checked(u: U256) -> Result<Self> {
        if u.bit(255) {
            Err(Error::Overflow)
        } else {
            Ok(I256(u))
        }
    }

    pub fn is_negative(&self) -> bool {
        self.0.bit(255)
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn neg(self) -> Self {
        I256((!self.0).overflowing_add(U256::one()).0)
    }

    /// Absolute value, as an unsigned magnitude.
    pub fn unsigned_abs(&self) -> U256 {
        if self.is_negative() {
            self.neg().0
        } else {
            self.0
        }
    }

    pub fn checked_add(self, rhs: Self) -> Result<Self> {
        let result = I256(self.0.overflowing_add(rhs.0).0);
        let sign_a = self.is_negative();
        let sign_b = rhs.is_negative();
        if sign_a == sign_b && result.is_negative() != sign_a {
            Err(Error::Overflow)
        } else {
            Ok(result)
        }
    }

    pub fn checked_sub(self, rhs: Self) -> Result<Self> {
        self.checked_add(rhs.neg())
    }

    /// `self` as an `i128`, assuming (and not checking) that it fits.
    pub fn to_i128_saturating(&self) -> i128 {
        if self.is_negative() {
            -(self.unsigned_abs().as_u128() as i128)
        } else {
            self.0.as_u128() as i128
        }
    }
}

impl PartialOrd for I256 {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for I256 {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.is_negative(), other.is_negative()) {
            (false, true) => Ordering::Greater,
            (true, false) => Ordering::Less,
            // Same sign: two's-complement bit patterns order the same way
            // the true values do within either half of the range.
            _ => self.0.cmp(&other.0),
        }
    }
}

impl fmt::Display for I256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_negative() {
            write!(f, "-{}", self.unsigned_abs())
        } else {
            write!(f, "{}", self.0)
        }
    }
}

impl Serialize for I256 {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for I256 {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let (negative, digits) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s.as_str()),
        };
        let magnitude = U256::from_dec_str(digits).map_err(serde::de::Error::custom)?;
        let value = I256::from_u256_magnitude(magnitude);
        Ok(if negative { value.neg() } else { value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_i128() {
        for v in [0i128, 1, -1, i128::MAX, i128::MIN + 1, -1_000_000] {
            assert_eq!(I256::from_i128(v).to_i128_saturating(), v);
        }
    }

    #[test]
    fn ordering_matches_signed_semantics() {
        assert!(I256::from_i128(-1) < I256::from_i128(1));
        assert!(I256::from_i128(-5) < I256::from_i128(-1));
        assert!(I256::from_i128(0) < I256::from_i128(1));
        assert_eq!(I256::from_i128(0), I256::ZERO);
    }

    #[test]
    fn display_roundtrips_through_serde() {
        let v = I256::from_i128(-42);
        assert_eq!(v.to_string(), "-42");
        let json = serde_json::to_string(&v).unwrap();
        let back: I256 = serde_json::from_str(&json).unwrap();
        assert_eq!(v, back);
    }
}
