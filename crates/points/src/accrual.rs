// Copyright 2026 Boundless Foundation, Inc.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Time windowed point accrual of a single balance lot.

use alloy::primitives::U256;

use crate::{
    config::{balance_multiplier, PointCondition, PointsConfig, STANDARD_CONDITION},
    entities::BalanceLot,
    units::{apply_multiplier, HOUR_MS, WAD},
};

/// Points earned per token per hour at a 1.00x multiplier.
pub const POINTS_PER_HOUR: u64 = 10_000;

/// Points accrued by one lot in one call to [accrue_lot].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LotAccrual {
    /// Condition points plus the balance bonus.
    pub points: U256,
    /// Contribution of the standard condition.
    pub referral_base: U256,
}

/// Points earned by holding `amount` between two timestamps under a basis-100 multiplier.
///
/// Elapsed hours are carried in 18 decimal fixed point and the result truncates once.
pub fn points_earned(start: u64, end: u64, amount: U256, multiplier: u64) -> U256 {
    let hours = U256::from(end.saturating_sub(start)) * WAD / U256::from(HOUR_MS);
    let multiplied = apply_multiplier(amount, multiplier);
    hours * multiplied * U256::from(POINTS_PER_HOUR) / WAD
}

/// Accrues `lot` up to `as_of` and advances its points date.
///
/// `recipient_balance` is the owner's total balance and selects the balance bonus tier.
/// Calling again with the same `as_of` accrues nothing.
pub fn accrue_lot(
    config: &PointsConfig,
    lot: &mut BalanceLot,
    recipient_balance: U256,
    as_of: u64,
) -> LotAccrual {
    let mut condition_points = U256::ZERO;
    let mut referral_base = U256::ZERO;
    for condition in &config.point_conditions {
        let earned = condition_points_earned(config, condition, lot, as_of);
        if condition.name == STANDARD_CONDITION {
            referral_base = earned;
        }
        condition_points += earned;
    }

    let bonus = apply_multiplier(
        condition_points,
        balance_multiplier(&config.balance_bonuses, recipient_balance),
    );
    let points = condition_points + bonus;

    lot.points += points;
    lot.referral_points_base += referral_base;
    lot.points_date = lot.points_date.max(as_of);

    LotAccrual { points, referral_base }
}

fn condition_points_earned(
    config: &PointsConfig,
    condition: &PointCondition,
    lot: &BalanceLot,
    as_of: u64,
) -> U256 {
    // The acquisition window end is inclusive for point conditions.
    if condition.balance_start.is_some_and(|start| start > lot.balance_date)
        || condition.balance_end.is_some_and(|end| end < lot.balance_date)
    {
        return U256::ZERO;
    }
    if let Some(asset) = condition.asset {
        if lot.asset != Some(asset) && as_of >= config.asset_restriction_cutoff {
            return U256::ZERO;
        }
    }

    let start = lot.points_date.max(condition.start.unwrap_or(0)).max(lot.balance_date);
    let end = condition.end.map_or(as_of, |end| end.min(as_of));
    if start >= end {
        return U256::ZERO;
    }
    points_earned(start, end, lot.balance, condition.multiplier)
}

/// Sum of the referral conditions active for `lot` at `as_of`.
pub fn referee_multiplier(config: &PointsConfig, lot: &BalanceLot, as_of: u64) -> u64 {
    config
        .referral_conditions
        .iter()
        .filter(|rc| {
            rc.asset.map_or(true, |asset| lot.asset == Some(asset))
                && rc.balance_start.map_or(true, |start| start <= lot.balance_date)
                && rc.balance_end.map_or(true, |end| end > lot.balance_date)
                && rc.start.map_or(true, |start| start <= as_of)
                && rc.end.map_or(true, |end| end > as_of)
        })
        .map(|rc| rc.multiplier)
        .sum()
}
