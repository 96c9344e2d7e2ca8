//! Per-pool ordered tick storage.
//!
//! The sorted view worth caching is just `BTreeMap`'s native ordering — a
//! tree-based ordered map is an equally acceptable substitute for a
//! separately rebuilt index.

use std::collections::BTreeMap;

use primitive_types::U256;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::math::{liquidity_add_delta, mod256_sub};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Tick {
    pub liquidity_gross: u128,
    pub liquidity_net: i128,
    pub fee_growth_outside_0_x128: U256,
    pub fee_growth_outside_1_x128: U256,
}

impl Tick {
    pub fn zero() -> Self {
        Tick {
            liquidity_gross: 0,
            liquidity_net: 0,
            fee_growth_outside_0_x128: U256::zero(),
            fee_growth_outside_1_x128: U256::zero(),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.liquidity_gross != 0
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TickStore {
    ticks: BTreeMap<i32, Tick>,
}

impl TickStore {
    pub fn new() -> Self {
        TickStore { ticks: BTreeMap::new() }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&i32, &Tick)> {
        self.ticks.iter()
    }

    pub fn get_or_init(&mut self, index: i32) -> &mut Tick {
        self.ticks.entry(index).or_insert_with(Tick::zero)
    }

    pub fn get_readonly(&self, index: i32) -> Tick {
        self.ticks.get(&index).copied().unwrap_or_else(Tick::zero)
    }

    pub fn clear(&mut self, index: i32) {
        self.ticks.remove(&index);
    }

    /// Mutates the tick's `fee_growth_outside_*` to the "crossed" side and
    /// returns its (possibly negated by the caller) `liquidity_net`.
    pub fn cross(&mut self, index: i32, fee_growth_global_0: U256, fee_growth_global_1: U256) -> i128 {
        let tick = self.get_or_init(index);
        tick.fee_growth_outside_0_x128 = mod256_sub(fee_growth_global_0, tick.fee_growth_outside_0_x128);
        tick.fee_growth_outside_1_x128 = mod256_sub(fee_growth_global_1, tick.fee_growth_outside_1_x128);
        tick.liquidity_net
    }

    /// The tick-flip-detection primitive: updates `liquidity_gross`/`liquidity_net`
    /// for one endpoint of a position and reports whether the tick flipped
    /// from uninitialized to initialized or vice versa.
    #[allow(clippy::too_many_arguments)]
    pub fn update(
        &mut self,
        index: i32,
        liquidity_delta: i128,
        tick_current: i32,
        fee_growth_global_0: U256,
        fee_growth_global_1: U256,
        is_upper: bool,
        max_liquidity_per_tick: u128,
    ) -> Result<bool> {
        let gross_before = self.get_readonly(index).liquidity_gross;
        let gross_after = liquidity_add_delta(gross_before, liquidity_delta)?;
        if gross_after > max_liquidity_per_tick {
            return Err(Error::LiquidityGrossExceedsMax);
        }
        let flipped = (gross_after == 0) != (gross_before == 0);

        let tick = self.get_or_init(index);
        if gross_before == 0 && index <= tick_current {
            tick.fee_growth_outside_0_x128 = fee_growth_global_0;
            tick.fee_growth_outside_1_x128 = fee_growth_global_1;
        }
        tick.liquidity_gross = gross_after;

        let net_delta = if is_upper { -liquidity_delta } else { liquidity_delta };
        tick.liquidity_net = tick
            .liquidity_net
            .checked_add(net_delta)
            .ok_or(Error::Overflow)?;

        Ok(flipped)
    }

    /// Fee growth inside `[lower, upper]` given the pool's current tick and
    /// global accumulators. Both endpoints must already be present (callers
    /// always `get_or_init` them first via `update`).
    pub fn get_fee_growth_inside(
        &self,
        lower: i32,
        upper: i32,
        tick_current: i32,
        fee_growth_global_0: U256,
        fee_growth_global_1: U256,
    ) -> Result<(U256, U256)> {
        let lower_tick = self.ticks.get(&lower).ok_or(Error::InvalidTick(lower))?;
        let upper_tick = self.ticks.get(&upper).ok_or(Error::InvalidTick(upper))?;

        let (below_0, below_1) = if tick_current >= lower {
            (lower_tick.fee_growth_outside_0_x128, lower_tick.fee_growth_outside_1_x128)
        } else {
            (
                mod256_sub(fee_growth_global_0, lower_tick.fee_growth_outside_0_x128),
                mod256_sub(fee_growth_global_1, lower_tick.fee_growth_outside_1_x128),
            )
        };

        let (above_0, above_1) = if tick_current < upper {
            (upper_tick.fee_growth_outside_0_x128, upper_tick.fee_growth_outside_1_x128)
        } else {
            (
                mod256_sub(fee_growth_global_0, upper_tick.fee_growth_outside_0_x128),
                mod256_sub(fee_growth_global_1, upper_tick.fee_growth_outside_1_x128),
            )
        };

        let inside_0 = mod256_sub(mod256_sub(fee_growth_global_0, below_0), above_0);
        let inside_1 = mod256_sub(mod256_sub(fee_growth_global_1, below_1), above_1);
        Ok((inside_0, inside_1))
    }

    /// `(next_tick, is_initialized)` within the one-word window containing `tick`.
    pub fn next_initialized_tick_within_one_word(
        &self,
        tick: i32,
        tick_spacing: i32,
        lte: bool,
    ) -> (i32, bool) {
        let compressed = floor_div(tick, tick_spacing);

        if lte {
            let word = compressed >> 8;
            let minimum = (word << 8) * tick_spacing;
            let floor_tick = self.ticks.range(..=tick).next_back().map(|(k, _)| *k);
            let candidate = floor_tick.map(|k| k.max(minimum)).unwrap_or(minimum);
            (candidate, self.ticks.contains_key(&candidate))
        } else {
            let word = (compressed + 1) >> 8;
            let maximum = (((word + 1) << 8) - 1) * tick_spacing;
            let ceil_tick = self.ticks.range(tick + 1..).next().map(|(k, _)| *k);
            let candidate = ceil_tick.map(|k| k.min(maximum)).unwrap_or(maximum);
            (candidate, self.ticks.contains_key(&candidate))
        }
    }
}

fn floor_div(a: i32, b: i32) -> i32 {
    let d = a / b;
    let r = a % b;
    if r != 0 && (r < 0) != (b < 0) {
        d - 1
    } else {
        d
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uninitialized_tick_reads_as_zero() {
        let store = TickStore::new();
        assert_eq!(store.get_readonly(100), Tick::zero());
    }

    #[test]
    fn update_flips_on_first_and_last_reference() {
        let mut store = TickStore::new();
        let flipped = store
            .update(60, 100, 0, U256::zero(), U256::zero(), false, u128::MAX)
            .unwrap();
        assert!(flipped);
        assert_eq!(store.get_readonly(60).liquidity_gross, 100);

        let flipped_back = store
            .update(60, -100, 0, U256::zero(), U256::zero(), false, u128::MAX)
            .unwrap();
        assert!(flipped_back);
        assert_eq!(store.get_readonly(60).liquidity_gross, 0);
    }

    #[test]
    fn exceeding_max_liquidity_per_tick_fails() {
        let mut store = TickStore::new();
        let err = store
            .update(60, 100, 0, U256::zero(), U256::zero(), false, 50)
            .unwrap_err();
        assert_eq!(err, Error::LiquidityGrossExceedsMax);
    }

    #[test]
    fn seeds_fee_growth_outside_when_initialized_below_current() {
        let mut store = TickStore::new();
        store
            .update(-60, 100, 0, U256::from(42u64), U256::from(7u64), false, u128::MAX)
            .unwrap();
        let tick = store.get_readonly(-60);
        assert_eq!(tick.fee_growth_outside_0_x128, U256::from(42u64));
        assert_eq!(tick.fee_growth_outside_1_x128, U256::from(7u64));
    }

    #[test]
    fn next_initialized_tick_within_one_word_finds_floor_and_ceiling() {
        let mut store = TickStore::new();
        store.update(60, 100, 0, U256::zero(), U256::zero(), false, u128::MAX).unwrap();
        store.update(180, 100, 0, U256::zero(), U256::zero(), false, u128::MAX).unwrap();

        let (next, initialized) = store.next_initialized_tick_within_one_word(100, 60, true);
        assert_eq!(next, 60);
        assert!(initialized);

        let (next, initialized) = store.next_initialized_tick_within_one_word(100, 60, false);
        assert_eq!(next, 180);
        assert!(initialized);
    }

    #[test]
    fn floor_div_rounds_toward_negative_infinity() {
        assert_eq!(floor_div(-1, 60), -1);
        assert_eq!(floor_div(-60, 60), -1);
        assert_eq!(floor_div(-61, 60), -2);
        assert_eq!(floor_div(59, 60), 0);
    }
}
