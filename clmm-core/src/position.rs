//! Per-pool position storage keyed by `(owner, tickLower, tickUpper)`.

use std::collections::BTreeMap;

use primitive_types::U256;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::math::{liquidity_add_delta, mod256_sub, mul_div};
use crate::types::Address;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PositionKey {
    pub owner: Address,
    pub tick_lower: i32,
    pub tick_upper: i32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Position {
    pub liquidity: u128,
    pub fee_growth_inside_0_last_x128: U256,
    pub fee_growth_inside_1_last_x128: U256,
    pub tokens_owed_0: u128,
    pub tokens_owed_1: u128,
}

impl Position {
    pub fn zero() -> Self {
        Position {
            liquidity: 0,
            fee_growth_inside_0_last_x128: U256::zero(),
            fee_growth_inside_1_last_x128: U256::zero(),
            tokens_owed_0: 0,
            tokens_owed_1: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.liquidity == 0 && self.tokens_owed_0 == 0 && self.tokens_owed_1 == 0
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PositionStore {
    positions: BTreeMap<PositionKey, Position>,
}

impl PositionStore {
    pub fn new() -> Self {
        PositionStore { positions: BTreeMap::new() }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PositionKey, &Position)> {
        self.positions.iter()
    }

    pub fn get_or_init(&mut self, key: &PositionKey) -> &mut Position {
        self.positions.entry(key.clone()).or_insert_with(Position::zero)
    }

    pub fn get_readonly(&self, key: &PositionKey) -> Position {
        self.positions.get(key).copied().unwrap_or_else(Position::zero)
    }

    pub fn set(&mut self, key: PositionKey, position: Position) {
        self.positions.insert(key, position);
    }

    pub fn clear(&mut self, key: &PositionKey) {
        self.positions.remove(key);
    }

    /// Applies a liquidity delta and accrues fees into `tokens_owed_*`.
    /// A zero delta on a nonexistent/empty-liquidity position is
    /// `PositionEmpty`, not a no-op.
    pub fn update(
        &mut self,
        key: &PositionKey,
        liquidity_delta: i128,
        fee_growth_inside_0_x128: U256,
        fee_growth_inside_1_x128: U256,
    ) -> Result<()> {
        let position = self.get_or_init(key);

        let liquidity_next = if liquidity_delta == 0 {
            if position.liquidity == 0 {
                return Err(Error::PositionEmpty);
            }
            position.liquidity
        } else {
            liquidity_add_delta(position.liquidity, liquidity_delta)?
        };

        let owed_0 = mul_div(
            mod256_sub(fee_growth_inside_0_x128, position.fee_growth_inside_0_last_x128),
            U256::from(position.liquidity),
            crate::constants::q128(),
        )?;
        let owed_1 = mul_div(
            mod256_sub(fee_growth_inside_1_x128, position.fee_growth_inside_1_last_x128),
            U256::from(position.liquidity),
            crate::constants::q128(),
        )?;

        position.fee_growth_inside_0_last_x128 = fee_growth_inside_0_x128;
        position.fee_growth_inside_1_last_x128 = fee_growth_inside_1_x128;

        if !owed_0.is_zero() {
            position.tokens_owed_0 = position
                .tokens_owed_0
                .checked_add(owed_0.as_u128())
                .ok_or(Error::Overflow)?;
        }
        if !owed_1.is_zero() {
            position.tokens_owed_1 = position
                .tokens_owed_1
                .checked_add(owed_1.as_u128())
                .ok_or(Error::Overflow)?;
        }

        if liquidity_delta != 0 {
            position.liquidity = liquidity_next;
        }

        Ok(())
    }

    /// Credits withdrawn principal into `tokens_owed_*` after a burn — a
    /// direct mutation distinct from `update`'s fee-growth-driven accrual,
    /// mirroring the reference pool crediting burned principal separately
    /// from `_updatePosition`'s fee bookkeeping.
    pub fn credit_tokens_owed(&mut self, key: &PositionKey, amount0: u128, amount1: u128) -> Result<()> {
        let position = self.get_or_init(key);
        position.tokens_owed_0 = position.tokens_owed_0.checked_add(amount0).ok_or(Error::Overflow)?;
        position.tokens_owed_1 = position.tokens_owed_1.checked_add(amount1).ok_or(Error::Overflow)?;
        Ok(())
    }

    /// `(amount0, amount1)` actually collected; clears the position if it
    /// becomes empty. A zero-zero request never mutates.
    pub fn collect(
        &mut self,
        key: &PositionKey,
        amount_0_requested: u128,
        amount_1_requested: u128,
    ) -> Result<(u128, u128)> {
        let Some(position) = self.positions.get_mut(key) else {
            return Ok((0, 0));
        };

        if amount_0_requested == 0 && amount_1_requested == 0 {
            return Ok((0, 0));
        }

        let amount_0 = amount_0_requested.min(position.tokens_owed_0);
        let amount_1 = amount_1_requested.min(position.tokens_owed_1);

        position.tokens_owed_0 -= amount_0;
        position.tokens_owed_1 -= amount_1;

        if position.is_empty() {
            self.positions.remove(key);
        }

        Ok((amount_0, amount_1))
    }
}
