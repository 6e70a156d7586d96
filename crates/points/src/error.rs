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

use alloy::primitives::{Address, U256};
use thiserror::Error;

use crate::store::StoreError;

/// Ledger failures. Every variant other than [LedgerError::Store] is an invariant violation
/// and aborts the processing step.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("No balance lots for {recipient} while spending {amount}")]
    NoLots { recipient: Address, amount: U256 },

    #[error("Spending {amount} exceeds the tracked balance {balance} of {recipient}")]
    InsufficientBalance { recipient: Address, amount: U256, balance: U256 },

    #[error("Campaign {campaign} awarded {awarded} EL points, over its limit of {limit}")]
    CampaignOverBudget { campaign: String, awarded: U256, limit: U256 },

    #[error("Checkpoint {0} was already created")]
    DuplicateCheckpoint(String),
}
