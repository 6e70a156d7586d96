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

//! Static points program configuration.
//!
//! Everything here is built once at startup and never mutated afterwards.

use alloy::primitives::{address, Address, U256};

use crate::{
    referrals::ReferralDirectory,
    units::{eth, DAY_MS, HOUR_MS},
};

/// The first node delegator.
pub const NODE_DELEGATOR: Address = address!("8bBBCB5F4D31a6db3201D40F478f30Dc4F704aE2");
/// Block the deposit pool was deployed at.
pub const START_BLOCK: u64 = 19143860;

pub const OETH: Address = address!("856c4Efb76C1D1AE02e20CEB03A2A6a08b0b8dC3");
pub const RETH: Address = address!("ae78736Cd615f374D3085123A210448E74Fc6393");

/// 2024-02-05 12:00 PST
pub const PRIME_LAUNCH_MS: u64 = 1_707_163_200_000;
/// 2024-02-09 12:00 PST
pub const NATIVE_STAKING_PRE_LAUNCH_MS: u64 = 1_707_508_800_000;
/// 2024-03-18 12:00 PDT
pub const NATIVE_STAKING_START_MS: u64 = 1_710_788_400_000;
/// 2024-03-25 12:00 PDT
pub const NATIVE_STAKING_END_MS: u64 = 1_711_393_200_000;

/// Asset restrictions on point conditions are only enforced from 2024-03-01T00:00:00Z.
///
/// Totals published before this date were computed without the restriction and must not change.
pub const ASSET_RESTRICTION_CUTOFF_MS: u64 = 1_709_251_200_000;

/// A multiplier rule. Multipliers of simultaneously active conditions sum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointCondition {
    pub name: String,
    /// Basis 100. Every 100 earns 10,000 points per token per hour.
    pub multiplier: u64,
    /// Only lots acquired with this asset qualify.
    pub asset: Option<Address>,
    /// Start of the window the rule is in effect, in ms.
    pub start: Option<u64>,
    /// End of the window the rule is in effect, in ms.
    pub end: Option<u64>,
    /// Lots must have been acquired at or after this time, in ms.
    pub balance_start: Option<u64>,
    /// Latest acquisition time of qualifying lots, in ms. Inclusive for point conditions and
    /// exclusive for referral conditions.
    pub balance_end: Option<u64>,
}

impl PointCondition {
    pub fn new(name: impl Into<String>, multiplier: u64) -> Self {
        Self {
            name: name.into(),
            multiplier,
            asset: None,
            start: None,
            end: None,
            balance_start: None,
            balance_end: None,
        }
    }

    pub fn with_asset(mut self, asset: Address) -> Self {
        self.asset = Some(asset);
        self
    }

    pub fn starting(mut self, start: u64) -> Self {
        self.start = Some(start);
        self
    }

    pub fn ending(mut self, end: u64) -> Self {
        self.end = Some(end);
        self
    }

    pub fn acquired_between(
        mut self,
        balance_start: Option<u64>,
        balance_end: Option<u64>,
    ) -> Self {
        self.balance_start = balance_start;
        self.balance_end = balance_end;
        self
    }

    /// Whether `timestamp` falls in `[start, end)`. Both bounds must be set.
    pub fn contains(&self, timestamp: u64) -> bool {
        match (self.start, self.end) {
            (Some(start), Some(end)) => start <= timestamp && timestamp < end,
            _ => false,
        }
    }
}

/// One tier of the balance bonus table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceBonus {
    pub name: String,
    pub min_balance: U256,
    pub multiplier: u64,
}

/// Returns the multiplier of the first tier the balance reaches. Tiers are ordered by
/// descending threshold.
pub fn balance_multiplier(bonuses: &[BalanceBonus], balance: U256) -> u64 {
    bonuses.iter().find(|b| balance >= b.min_balance).map(|b| b.multiplier).unwrap_or(0)
}

/// A time boxed EL points bonus program with a hard budget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CampaignConfig {
    pub name: String,
    pub excluded: Vec<Address>,
    pub start: u64,
    pub end: u64,
    pub el_point_limit: U256,
    pub el_point_conditions: Vec<PointCondition>,
}

impl CampaignConfig {
    pub fn is_active(&self, timestamp: u64) -> bool {
        timestamp >= self.start && timestamp < self.end
    }

    pub fn is_excluded(&self, address: Address) -> bool {
        self.excluded.contains(&address)
    }
}

/// A node delegator whose restaked holdings earn EL points for all holders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeDelegatorConfig {
    pub address: Address,
    pub start_block: u64,
}

/// Recompute granularities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Granularity {
    /// Checked on every ledger event and at the chain head.
    Short,
    /// Checked at the end of every block.
    Long,
}

#[derive(Debug, Clone)]
pub struct PointsConfig {
    pub point_conditions: Vec<PointCondition>,
    pub referral_conditions: Vec<PointCondition>,
    pub balance_bonuses: Vec<BalanceBonus>,
    pub campaigns: Vec<CampaignConfig>,
    pub referrals: ReferralDirectory,
    /// Lots of this asset are spent last.
    pub spend_last_asset: Option<Address>,
    pub asset_restriction_cutoff: u64,
    /// Pool whose swaps count as acquisitions.
    pub swap_pool: Address,
    pub node_delegators: Vec<NodeDelegatorConfig>,
    pub short_interval_ms: u64,
    pub long_interval_ms: u64,
}

impl PointsConfig {
    /// The primeETH mainnet program.
    pub fn mainnet(swap_pool: Address) -> Self {
        let point_conditions = vec![
            PointCondition::new("oeth-2x", 100).with_asset(OETH).starting(PRIME_LAUNCH_MS),
            PointCondition::new("reth-1.1x", 10).with_asset(RETH).starting(1_707_415_200_000),
            PointCondition::new("week1-5x", 100).starting(PRIME_LAUNCH_MS).ending(1_707_177_600_000),
            PointCondition::new("week1-4x", 100).starting(PRIME_LAUNCH_MS).ending(1_707_264_000_000),
            PointCondition::new("week1-3x", 100).starting(PRIME_LAUNCH_MS).ending(1_707_350_400_000),
            PointCondition::new("week1-2x", 100).starting(PRIME_LAUNCH_MS).ending(1_707_436_800_000),
            PointCondition::new("native-1.5x", 50)
                .starting(NATIVE_STAKING_PRE_LAUNCH_MS)
                .ending(NATIVE_STAKING_END_MS)
                .acquired_between(Some(NATIVE_STAKING_PRE_LAUNCH_MS), Some(NATIVE_STAKING_END_MS)),
            PointCondition::new(STANDARD_CONDITION, 100).starting(PRIME_LAUNCH_MS),
        ];

        let referral_conditions = vec![
            PointCondition::new("referrals-standard", 10)
                .acquired_between(Some(PRIME_LAUNCH_MS), None),
            PointCondition::new("referrals-native-bonus", 10)
                .starting(NATIVE_STAKING_PRE_LAUNCH_MS)
                .ending(NATIVE_STAKING_END_MS)
                .acquired_between(Some(NATIVE_STAKING_PRE_LAUNCH_MS), Some(NATIVE_STAKING_END_MS)),
        ];

        let balance_bonuses = vec![
            BalanceBonus { name: "gte2000".into(), min_balance: eth(2000), multiplier: 20 },
            BalanceBonus { name: "gte1000".into(), min_balance: eth(1000), multiplier: 15 },
            BalanceBonus { name: "gte100".into(), min_balance: eth(100), multiplier: 10 },
            BalanceBonus { name: "gte10".into(), min_balance: eth(10), multiplier: 5 },
        ];

        let campaigns = vec![CampaignConfig {
            name: "native-staking".into(),
            excluded: vec![swap_pool],
            start: NATIVE_STAKING_PRE_LAUNCH_MS,
            end: NATIVE_STAKING_END_MS,
            el_point_limit: eth(1_000_000),
            el_point_conditions: vec![
                PointCondition::new("native-staking-pre-launch", 0)
                    .starting(NATIVE_STAKING_PRE_LAUNCH_MS)
                    .ending(NATIVE_STAKING_START_MS),
                PointCondition::new("native-staking-el-4.20x", 320)
                    .starting(NATIVE_STAKING_START_MS)
                    .ending(NATIVE_STAKING_START_MS + DAY_MS),
                PointCondition::new("native-staking-el-1.69x", 69)
                    .starting(NATIVE_STAKING_START_MS + DAY_MS)
                    .ending(NATIVE_STAKING_START_MS + 4 * DAY_MS),
                PointCondition::new("native-staking-el-1.42x", 42)
                    .starting(NATIVE_STAKING_START_MS + 4 * DAY_MS)
                    .ending(NATIVE_STAKING_START_MS + 7 * DAY_MS),
            ],
        }];

        Self {
            point_conditions,
            referral_conditions,
            balance_bonuses,
            campaigns,
            referrals: ReferralDirectory::mainnet(),
            spend_last_asset: Some(OETH),
            asset_restriction_cutoff: ASSET_RESTRICTION_CUTOFF_MS,
            swap_pool,
            node_delegators: vec![NodeDelegatorConfig {
                address: NODE_DELEGATOR,
                start_block: START_BLOCK,
            }],
            short_interval_ms: 5 * 60_000,
            long_interval_ms: HOUR_MS,
        }
    }

    pub fn interval_ms(&self, granularity: Granularity) -> u64 {
        match granularity {
            Granularity::Short => self.short_interval_ms,
            Granularity::Long => self.long_interval_ms,
        }
    }
}

/// Name of the condition whose accrual is the base for referral rewards.
pub const STANDARD_CONDITION: &str = "standard";
