//! The stateful pool object: swap state machine and position-modification
//! protocol. Owns a `TickStore` and a `PositionStore`; neither holds a
//! back-pointer, so `Pool` stays tree-shaped and cheaply `Clone`-able for
//! `fork`.

use primitive_types::U256;
use serde::{Deserialize, Serialize};

use crate::constants::{max_liquidity_per_tick, max_sqrt_ratio, min_sqrt_ratio, q128, MAX_TICK, MIN_TICK};
use crate::error::{Error, Result};
use crate::math::{
    compute_swap_step, get_amount0_delta, get_amount1_delta, get_sqrt_ratio_at_tick,
    get_tick_at_sqrt_ratio, liquidity_add_delta, mul_div, I256,
};
use crate::position::{Position, PositionKey, PositionStore};
use crate::tick::TickStore;
use crate::types::{Address, FeeTier};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pool {
    pub address: Address,
    pub token0: Address,
    pub token1: Address,
    pub fee_tier: FeeTier,
    pub tick_spacing: i32,
    pub sqrt_price_x96: U256,
    pub tick_current: i32,
    pub liquidity: u128,
    pub fee_growth_global_0_x128: U256,
    pub fee_growth_global_1_x128: U256,
    pub token0_balance: U256,
    pub token1_balance: U256,
    pub max_liquidity_per_tick: u128,
    pub tick_store: TickStore,
    pub position_store: PositionStore,
    pub deploy_block: u64,
    pub current_block: u64,
}

impl Pool {
    pub fn new(address: Address, token0: Address, token1: Address, fee_tier: FeeTier, deploy_block: u64) -> Self {
        let tick_spacing = fee_tier.tick_spacing();
        Pool {
            address,
            token0,
            token1,
            fee_tier,
            tick_spacing,
            sqrt_price_x96: U256::zero(),
            tick_current: 0,
            liquidity: 0,
            fee_growth_global_0_x128: U256::zero(),
            fee_growth_global_1_x128: U256::zero(),
            token0_balance: U256::zero(),
            token1_balance: U256::zero(),
            max_liquidity_per_tick: max_liquidity_per_tick(tick_spacing),
            tick_store: TickStore::new(),
            position_store: PositionStore::new(),
            deploy_block,
            current_block: deploy_block,
        }
    }

    pub fn is_initialized(&self) -> bool {
        !self.sqrt_price_x96.is_zero()
    }

    fn sqrt_at(&self, tick: i32) -> Result<U256> {
        get_sqrt_ratio_at_tick(tick)
    }

    /// Deep-copies all state, used for `Simulator::fork`. The source pool is
    /// untouched — `Pool` derives `Clone` precisely because every field does.
    pub fn fork(&self) -> Self {
        self.clone()
    }

    pub fn initialize(&mut self, sqrt_price_x96: U256) -> Result<()> {
        if self.is_initialized() {
            return Err(Error::AlreadyInitialized);
        }
        let tick_current = get_tick_at_sqrt_ratio(sqrt_price_x96)?;
        self.sqrt_price_x96 = sqrt_price_x96;
        self.tick_current = tick_current;
        Ok(())
    }

    fn validate_tick_range(&self, lower: i32, upper: i32) -> Result<()> {
        if lower >= upper {
            return Err(Error::InvalidTick(lower));
        }
        if lower < MIN_TICK {
            return Err(Error::InvalidTick(lower));
        }
        if upper > MAX_TICK {
            return Err(Error::InvalidTick(upper));
        }
        Ok(())
    }

    fn update_position(
        &mut self,
        owner: &str,
        lower: i32,
        upper: i32,
        liquidity_delta: i128,
    ) -> Result<Position> {
        let key = PositionKey {
            owner: owner.to_string(),
            tick_lower: lower,
            tick_upper: upper,
        };

        let mut flipped_lower = false;
        let mut flipped_upper = false;
        if liquidity_delta != 0 {
            flipped_lower = self.tick_store.update(
                lower,
                liquidity_delta,
                self.tick_current,
                self.fee_growth_global_0_x128,
                self.fee_growth_global_1_x128,
                false,
                self.max_liquidity_per_tick,
            )?;
            flipped_upper = self.tick_store.update(
                upper,
                liquidity_delta,
                self.tick_current,
                self.fee_growth_global_0_x128,
                self.fee_growth_global_1_x128,
                true,
                self.max_liquidity_per_tick,
            )?;
        }

        let (fee_inside_0, fee_inside_1) = self.tick_store.get_fee_growth_inside(
            lower,
            upper,
            self.tick_current,
            self.fee_growth_global_0_x128,
            self.fee_growth_global_1_x128,
        )?;
        self.position_store.update(&key, liquidity_delta, fee_inside_0, fee_inside_1)?;

        if liquidity_delta < 0 {
            if flipped_lower {
                self.tick_store.clear(lower);
            }
            if flipped_upper {
                self.tick_store.clear(upper);
            }
        }

        Ok(self.position_store.get_readonly(&key))
    }

    /// Common mint/burn routine. Returns the updated position
    /// and the signed token deltas required (positive) or released (negative).
    pub fn modify_position(
        &mut self,
        owner: &str,
        lower: i32,
        upper: i32,
        liquidity_delta: i128,
    ) -> Result<(Position, I256, I256)> {
        self.validate_tick_range(lower, upper)?;

        if liquidity_delta < 0 {
            let key = PositionKey {
                owner: owner.to_string(),
                tick_lower: lower,
                tick_upper: upper,
            };
            let existing = self.position_store.get_readonly(&key);
            if existing.liquidity < liquidity_delta.unsigned_abs() {
                return Err(Error::LiquidityUnderflow);
            }
        }

        let position = self.update_position(owner, lower, upper, liquidity_delta)?;

        let (amount0, amount1) = if self.tick_current < lower {
            let a0 = get_amount0_delta(self.sqrt_at(lower)?, self.sqrt_at(upper)?, liquidity_delta)?;
            (a0, I256::ZERO)
        } else if self.tick_current < upper {
            let a0 = get_amount0_delta(self.sqrt_price_x96, self.sqrt_at(upper)?, liquidity_delta)?;
            let a1 = get_amount1_delta(self.sqrt_at(lower)?, self.sqrt_price_x96, liquidity_delta)?;
            self.liquidity = liquidity_add_delta(self.liquidity, liquidity_delta)?;
            (a0, a1)
        } else {
            let a1 = get_amount1_delta(self.sqrt_at(lower)?, self.sqrt_at(upper)?, liquidity_delta)?;
            (I256::ZERO, a1)
        };

        Ok((position, amount0, amount1))
    }

    pub fn mint(&mut self, recipient: &str, lower: i32, upper: i32, amount: u128) -> Result<(Position, U256, U256)> {
        if amount == 0 {
            return Err(Error::InvalidRequest);
        }
        let liquidity_delta = i128::try_from(amount).map_err(|_| Error::Overflow)?;
        let (position, amount0, amount1) = self.modify_position(recipient, lower, upper, liquidity_delta)?;
        Ok((position, amount0.unsigned_abs(), amount1.unsigned_abs()))
    }

    pub fn burn(&mut self, owner: &str, lower: i32, upper: i32, amount: u128) -> Result<(U256, U256)> {
        let liquidity_delta = -(i128::try_from(amount).map_err(|_| Error::Overflow)?);
        let (_, amount0, amount1) = self.modify_position(owner, lower, upper, liquidity_delta)?;
        let amount0 = amount0.neg().unsigned_abs();
        let amount1 = amount1.neg().unsigned_abs();

        if !amount0.is_zero() || !amount1.is_zero() {
            let key = PositionKey {
                owner: owner.to_string(),
                tick_lower: lower,
                tick_upper: upper,
            };
            self.position_store.credit_tokens_owed(&key, amount0.as_u128(), amount1.as_u128())?;
        }

        Ok((amount0, amount1))
    }

    pub fn collect(
        &mut self,
        owner: &str,
        lower: i32,
        upper: i32,
        amount_0_requested: u128,
        amount_1_requested: u128,
    ) -> Result<(u128, u128)> {
        self.validate_tick_range(lower, upper)?;
        let key = PositionKey {
            owner: owner.to_string(),
            tick_lower: lower,
            tick_upper: upper,
        };
        self.position_store.collect(&key, amount_0_requested, amount_1_requested)
    }

    /// The swap state machine. `is_static` runs the loop
    /// without committing state or mutating crossed ticks — used by
    /// `resolve_swap_input` and by hypothetical what-if swaps.
    pub fn swap(
        &mut self,
        zero_for_one: bool,
        amount_specified: I256,
        sqrt_price_limit_x96: Option<U256>,
        is_static: bool,
    ) -> Result<(I256, I256, U256)> {
        if !self.is_initialized() {
            return Err(Error::NotInitialized);
        }

        let limit = match sqrt_price_limit_x96 {
            Some(l) => l,
            None => {
                if zero_for_one {
                    min_sqrt_ratio() + U256::one()
                } else {
                    max_sqrt_ratio() - U256::one()
                }
            }
        };

        if zero_for_one {
            if limit <= min_sqrt_ratio() {
                return Err(Error::RatioMin);
            }
            if limit >= self.sqrt_price_x96 {
                return Err(Error::RatioCurrent);
            }
        } else {
            if limit >= max_sqrt_ratio() {
                return Err(Error::RatioMax);
            }
            if limit <= self.sqrt_price_x96 {
                return Err(Error::RatioCurrent);
            }
        }

        let exact_input = !amount_specified.is_negative();

        let mut amount_remaining = amount_specified;
        let mut amount_calculated = I256::ZERO;
        let mut sqrt_price = self.sqrt_price_x96;
        let mut tick = self.tick_current;
        let mut liquidity = self.liquidity;
        let mut fee_growth_global_side = if zero_for_one {
            self.fee_growth_global_0_x128
        } else {
            self.fee_growth_global_1_x128
        };

        while !amount_remaining.is_zero() && sqrt_price != limit {
            let sqrt_price_start = sqrt_price;

            let (tick_next_raw, initialized) =
                self.tick_store
                    .next_initialized_tick_within_one_word(tick, self.tick_spacing, zero_for_one);
            let tick_next = tick_next_raw.clamp(MIN_TICK, MAX_TICK);

            let sqrt_next = get_sqrt_ratio_at_tick(tick_next)?;
            let sqrt_target = if zero_for_one {
                limit.max(sqrt_next)
            } else {
                limit.min(sqrt_next)
            };

            let step = compute_swap_step(sqrt_price, sqrt_target, liquidity, amount_remaining, self.fee_tier.fee_pips())?;
            sqrt_price = step.sqrt_price_next_x96;

            let amount_in_plus_fee = I256::from_u256_checked(step.amount_in)?
                .checked_add(I256::from_u256_checked(step.fee_amount)?)?;
            let amount_out = I256::from_u256_checked(step.amount_out)?;

            if exact_input {
                amount_remaining = amount_remaining.checked_sub(amount_in_plus_fee)?;
                amount_calculated = amount_calculated.checked_sub(amount_out)?;
            } else {
                amount_remaining = amount_remaining.checked_add(amount_out)?;
                amount_calculated = amount_calculated.checked_add(amount_in_plus_fee)?;
            }

            if liquidity > 0 {
                let fee_delta = mul_div(step.fee_amount, q128(), U256::from(liquidity))?;
                fee_growth_global_side = fee_growth_global_side.overflowing_add(fee_delta).0;
            }

            if sqrt_price == sqrt_next {
                if initialized {
                    let mut liquidity_net = if is_static {
                        self.tick_store.get_readonly(tick_next).liquidity_net
                    } else {
                        let (fee_global_0, fee_global_1) = if zero_for_one {
                            (fee_growth_global_side, self.fee_growth_global_1_x128)
                        } else {
                            (self.fee_growth_global_0_x128, fee_growth_global_side)
                        };
                        self.tick_store.cross(tick_next, fee_global_0, fee_global_1)
                    };
                    if zero_for_one {
                        liquidity_net = -liquidity_net;
                    }
                    liquidity = liquidity_add_delta(liquidity, liquidity_net)?;
                }
                tick = if zero_for_one { tick_next - 1 } else { tick_next };
            } else if sqrt_price != sqrt_price_start {
                tick = get_tick_at_sqrt_ratio(sqrt_price)?;
            }
        }

        if !is_static {
            self.sqrt_price_x96 = sqrt_price;
            self.tick_current = tick;
            self.liquidity = liquidity;
            if zero_for_one {
                self.fee_growth_global_0_x128 = fee_growth_global_side;
            } else {
                self.fee_growth_global_1_x128 = fee_growth_global_side;
            }
        }

        let amount_settled = amount_specified.checked_sub(amount_remaining)?;
        let (amount0, amount1) = if zero_for_one == exact_input {
            (amount_settled, amount_calculated)
        } else {
            (amount_calculated, amount_settled)
        };

        if !is_static {
            apply_balance_delta(&mut self.token0_balance, amount0)?;
            apply_balance_delta(&mut self.token1_balance, amount1)?;
        }

        Ok((amount0, amount1, sqrt_price))
    }

    /// Reverse-engineers `(amountSpecified, sqrtPriceLimit)` from an observed
    /// on-chain Swap result by replaying an ordered list of candidates in
    /// static mode. `zero_for_one` is inferred from the sign of
    /// `amount0` (positive: token0 flowed into the pool).
    pub fn resolve_swap_input(
        &self,
        amount0: I256,
        amount1: I256,
        sqrt_price_x96: U256,
        liquidity_after: u128,
    ) -> Result<(bool, I256, Option<U256>)> {
        let zero_for_one = if !amount0.is_zero() {
            !amount0.is_negative()
        } else {
            amount1.is_negative()
        };

        let mut candidates: Vec<(I256, Option<U256>)> = vec![(amount0, None), (amount1, None)];

        if sqrt_price_x96 != self.sqrt_price_x96 {
            candidates.push((amount0, Some(sqrt_price_x96)));
            candidates.push((amount1, Some(sqrt_price_x96)));
            if liquidity_after == 0 {
                candidates.push((inc_toward_infinity(amount0), Some(sqrt_price_x96)));
                candidates.push((inc_toward_infinity(amount1), Some(sqrt_price_x96)));
            }
        }

        for (amount_specified, limit) in candidates {
            let mut trial = self.fork();
            let Ok((got0, got1, got_price)) = trial.swap(zero_for_one, amount_specified, limit, true) else {
                continue;
            };
            if got0 == amount0 && got1 == amount1 && got_price == sqrt_price_x96 {
                return Ok((zero_for_one, amount_specified, limit));
            }
        }

        Err(Error::ResolveSwapInputFailed)
    }
}

fn inc_toward_infinity(x: I256) -> I256 {
    if x.is_zero() {
        x
    } else if x.is_negative() {
        x.checked_sub(I256::from_i128(1)).unwrap_or(x)
    } else {
        x.checked_add(I256::from_i128(1)).unwrap_or(x)
    }
}

fn apply_balance_delta(balance: &mut U256, delta: I256) -> Result<()> {
    if delta.is_negative() {
        let magnitude = delta.unsigned_abs();
        *balance = balance.checked_sub(magnitude).ok_or(Error::Underflow)?;
    } else {
        *balance = balance.checked_add(delta.unsigned_abs()).ok_or(Error::Overflow)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh_pool() -> Pool {
        let mut pool = Pool::new(
            "pool".into(),
            "token0".into(),
            "token1".into(),
            FeeTier::Medium,
            0,
        );
        pool.initialize(U256::from(1u128) << 96).unwrap();
        pool
    }

    #[test]
    fn initialize_sets_tick_and_is_idempotency_protected() {
        let mut pool = fresh_pool();
        assert_eq!(pool.tick_current, 0);
        assert_eq!(pool.initialize(U256::from(1u128) << 96), Err(Error::AlreadyInitialized));
    }

    #[test]
    fn mint_in_range_increases_active_liquidity_and_requires_both_tokens() {
        let mut pool = fresh_pool();
        let (_, amount0, amount1) = pool.mint("alice", -600, 600, 1_000_000).unwrap();
        assert!(!amount0.is_zero());
        assert!(!amount1.is_zero());
        assert_eq!(pool.liquidity, 1_000_000);
    }

    #[test]
    fn mint_above_current_price_only_needs_token0() {
        let mut pool = fresh_pool();
        let (_, amount0, amount1) = pool.mint("alice", 600, 1200, 1_000_000).unwrap();
        assert!(!amount0.is_zero());
        assert!(amount1.is_zero());
        assert_eq!(pool.liquidity, 0);
    }

    #[test]
    fn mint_then_burn_round_trips_liquidity() {
        let mut pool = fresh_pool();
        pool.mint("alice", -600, 600, 1_000_000).unwrap();
        let (amount0, amount1) = pool.burn("alice", -600, 600, 1_000_000).unwrap();
        assert!(!amount0.is_zero());
        assert!(!amount1.is_zero());
        assert_eq!(pool.liquidity, 0);

        let (collected0, collected1) = pool.collect("alice", -600, 600, u128::MAX, u128::MAX).unwrap();
        assert_eq!(collected0.to_string(), amount0.to_string());
        assert_eq!(collected1.to_string(), amount1.to_string());
    }

    #[test]
    fn burn_more_than_minted_fails_liquidity_underflow() {
        let mut pool = fresh_pool();
        pool.mint("alice", -600, 600, 1_000).unwrap();
        assert_eq!(
            pool.burn("alice", -600, 600, 2_000).unwrap_err(),
            Error::LiquidityUnderflow
        );
    }

    #[test]
    fn swap_moves_price_and_accrues_fees() {
        let mut pool = fresh_pool();
        pool.mint("lp", -6000, 6000, 10_000_000_000).unwrap();
        let price_before = pool.sqrt_price_x96;
        let (amount0, amount1, final_price) = pool
            .swap(true, I256::from_i128(1_000_000), None, false)
            .unwrap();
        assert!(!amount0.is_negative());
        assert!(amount1.is_negative());
        assert!(final_price < price_before);
        assert!(!pool.fee_growth_global_0_x128.is_zero());
    }

    #[test]
    fn static_swap_does_not_commit_state() {
        let mut pool = fresh_pool();
        pool.mint("lp", -6000, 6000, 10_000_000_000).unwrap();
        let price_before = pool.sqrt_price_x96;
        let liquidity_before = pool.liquidity;
        pool.swap(true, I256::from_i128(1_000_000), None, true).unwrap();
        assert_eq!(pool.sqrt_price_x96, price_before);
        assert_eq!(pool.liquidity, liquidity_before);
    }

    #[test]
    fn fork_is_independent_of_source() {
        let mut pool = fresh_pool();
        pool.mint("lp", -6000, 6000, 10_000_000_000).unwrap();
        let forked = pool.fork();
        pool.swap(true, I256::from_i128(1_000_000), None, false).unwrap();
        assert_ne!(pool.sqrt_price_x96, forked.sqrt_price_x96);
    }

    #[test]
    fn resolve_swap_input_recovers_exact_in_candidate() {
        let mut pool = fresh_pool();
        pool.mint("lp", -6000, 6000, 10_000_000_000).unwrap();
        let mut reference = pool.fork();
        let (amount0, amount1, sqrt_price_x96) = reference
            .swap(true, I256::from_i128(1_000_000), None, false)
            .unwrap();

        let (zero_for_one, amount_specified, _limit) = pool
            .resolve_swap_input(amount0, amount1, sqrt_price_x96, reference.liquidity)
            .unwrap();
        assert!(zero_for_one);
        assert_eq!(amount_specified, I256::from_i128(1_000_000));
    }
}
