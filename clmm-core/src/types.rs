//! Chain-agnostic identifiers and the fee-tier enum.

use serde::{Deserialize, Serialize};

use crate::constants::{FEE_HIGH, FEE_LOW, FEE_MEDIUM, TICK_SPACING_HIGH, TICK_SPACING_LOW, TICK_SPACING_MEDIUM};
use crate::error::{Error, Result};

/// An opaque external identifier (hex, base58, or whatever the upstream
/// chain uses) — the core never parses or validates address encodings.
pub type Address = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeeTier {
    Low,
    Medium,
    High,
}

impl FeeTier {
    pub fn from_fee_pips(fee_pips: u32) -> Result<Self> {
        match fee_pips {
            FEE_LOW => Ok(FeeTier::Low),
            FEE_MEDIUM => Ok(FeeTier::Medium),
            FEE_HIGH => Ok(FeeTier::High),
            _ => Err(Error::InvalidRequest),
        }
    }

    pub fn fee_pips(self) -> u32 {
        match self {
            FeeTier::Low => FEE_LOW,
            FeeTier::Medium => FEE_MEDIUM,
            FeeTier::High => FEE_HIGH,
        }
    }

    pub fn tick_spacing(self) -> i32 {
        match self {
            FeeTier::Low => TICK_SPACING_LOW,
            FeeTier::Medium => TICK_SPACING_MEDIUM,
            FeeTier::High => TICK_SPACING_HIGH,
        }
    }
}
