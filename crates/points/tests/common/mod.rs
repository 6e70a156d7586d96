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

#![allow(dead_code)]

use std::sync::Arc;

use alloy::primitives::{address, Address, B256, U256};
use lrt_points::{
    config::{NodeDelegatorConfig, PointCondition, OETH, STANDARD_CONDITION},
    events::{DepositEvent, Holding, SwapContext, TransferEvent, YieldReport},
    referrals::{ReferralDirectory, ReferralEntry},
    units::HOUR_MS,
    Block, BlockBatch, EventKind, LedgerContext, LedgerEvent, MemoryStore, PointsConfig,
};

pub const ALICE: Address = address!("00000000000000000000000000000000000a11ce");
pub const BOB: Address = address!("0000000000000000000000000000000000000b0b");
pub const CAROL: Address = address!("00000000000000000000000000000000000ca201");
pub const POOL: Address = address!("00000000000000000000000000000000000000aa");
pub const NODE: Address = address!("00000000000000000000000000000000000000dd");

/// An hour aligned timestamp after the program launch.
pub const T0: u64 = 474_223 * HOUR_MS;

/// One standard condition, one referral condition, no bonus tiers and no campaigns.
pub fn test_config() -> PointsConfig {
    let mut config = PointsConfig::mainnet(POOL);
    config.point_conditions = vec![PointCondition::new(STANDARD_CONDITION, 100)];
    config.referral_conditions = vec![PointCondition::new("referrals", 10)];
    config.balance_bonuses.clear();
    config.campaigns.clear();
    config.node_delegators = vec![NodeDelegatorConfig { address: NODE, start_block: 0 }];
    config.referrals = ReferralDirectory::new(vec![ReferralEntry {
        code: "bob".into(),
        address: BOB,
        outgoing_multiplier: 10,
    }]);
    config
}

pub async fn context(
    store: &MemoryStore,
    config: PointsConfig,
) -> LedgerContext<MemoryStore> {
    LedgerContext::initialize(store.clone(), Arc::new(config)).await.unwrap()
}

pub fn block(height: u64, timestamp: u64, events: Vec<LedgerEvent>) -> Block {
    Block { height, hash: B256::repeat_byte(height as u8), timestamp, events }
}

pub fn batch(blocks: Vec<Block>) -> BlockBatch {
    BlockBatch { blocks, is_head: false }
}

pub fn deposit(id: &str, depositor: Address, amount: U256, code: Option<&str>) -> LedgerEvent {
    LedgerEvent {
        id: id.into(),
        kind: EventKind::Deposit(DepositEvent {
            depositor,
            asset: OETH,
            deposit_amount: amount,
            mint_amount: amount,
            referral_code: code.map(str::to_string),
        }),
    }
}

pub fn transfer(id: &str, from: Address, to: Address, amount: U256) -> LedgerEvent {
    LedgerEvent {
        id: id.into(),
        kind: EventKind::Transfer(TransferEvent { from, to, amount, swap: None }),
    }
}

pub fn swap(id: &str, to: Address, amount: U256, tx_input: Option<String>) -> LedgerEvent {
    LedgerEvent {
        id: id.into(),
        kind: EventKind::Transfer(TransferEvent {
            from: POOL,
            to,
            amount,
            swap: Some(SwapContext { pool: POOL, tx_input }),
        }),
    }
}

pub fn yield_report(id: &str, amount: U256) -> LedgerEvent {
    LedgerEvent {
        id: id.into(),
        kind: EventKind::ExternalYieldReport(YieldReport {
            strategy: NODE,
            holdings: vec![Holding { asset: OETH, amount }],
        }),
    }
}
