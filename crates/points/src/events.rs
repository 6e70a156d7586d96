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

//! Decoded chain events consumed by the ledger.

use alloy::primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};

use crate::units::dec_u256;

/// A block with the ledger events it contains, in log order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub height: u64,
    pub hash: B256,
    /// Unix milliseconds.
    pub timestamp: u64,
    #[serde(default)]
    pub events: Vec<LedgerEvent>,
}

impl Block {
    /// `{height:010}-{first five hex digits of the hash}`
    pub fn id(&self) -> String {
        let hash = hex::encode(&self.hash[..3]);
        format!("{:010}-{}", self.height, &hash[..5])
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEvent {
    /// Unique log id, also the id of any lot the event creates.
    pub id: String,
    #[serde(flatten)]
    pub kind: EventKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    Deposit(DepositEvent),
    Transfer(TransferEvent),
    ExternalYieldReport(YieldReport),
}

/// An asset deposited into the pool, minting `mint_amount` to the depositor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositEvent {
    pub depositor: Address,
    pub asset: Address,
    #[serde(with = "dec_u256")]
    pub deposit_amount: U256,
    #[serde(with = "dec_u256")]
    pub mint_amount: U256,
    #[serde(default)]
    pub referral_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferEvent {
    pub from: Address,
    pub to: Address,
    #[serde(with = "dec_u256")]
    pub amount: U256,
    /// Present when the same transaction swapped through a pool.
    #[serde(default)]
    pub swap: Option<SwapContext>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapContext {
    pub pool: Address,
    /// Hex encoded transaction input.
    #[serde(default)]
    pub tx_input: Option<String>,
}

/// A node delegator's strategy deposits as of the end of the block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YieldReport {
    pub strategy: Address,
    pub holdings: Vec<Holding>,
}

impl YieldReport {
    pub fn total(&self) -> U256 {
        self.holdings.iter().map(|h| h.amount).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holding {
    pub asset: Address,
    #[serde(with = "dec_u256")]
    pub amount: U256,
}

/// Consecutive blocks processed as one step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockBatch {
    pub blocks: Vec<Block>,
    /// Whether the last block is the chain head.
    pub is_head: bool,
}
