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

//! Persisted ledger entities.
//!
//! All timestamps are unix milliseconds. Amounts and points are 18 decimal fixed point.

use alloy::primitives::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::{store::Entity, units::dec_u256};

/// Lowercase `0x` hex form used in entity ids.
pub fn address_id(address: Address) -> String {
    format!("{address:#x}")
}

/// Per holder totals. Created lazily, never deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    pub address: Address,
    #[serde(with = "dec_u256")]
    pub balance: U256,
    #[serde(with = "dec_u256")]
    pub points: U256,
    #[serde(with = "dec_u256")]
    pub referral_points: U256,
    #[serde(with = "dec_u256")]
    pub el_points: U256,
    pub points_date: u64,
    /// Referral codes this recipient used that earned a bonus.
    pub referral_count: u32,
    /// Holders earning this recipient a referrer bonus.
    pub referrer_count: u32,
}

impl Recipient {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            balance: U256::ZERO,
            points: U256::ZERO,
            referral_points: U256::ZERO,
            el_points: U256::ZERO,
            points_date: 0,
            referral_count: 0,
            referrer_count: 0,
        }
    }
}

impl Entity for Recipient {
    const TABLE: &'static str = "recipients";

    fn id(&self) -> String {
        address_id(self.address)
    }
}

/// How a lot was acquired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LotSource {
    /// Minted by a deposit.
    Mint,
    /// Bought through the designated swap pool.
    Swap,
}

/// A balance increment with its own acquisition time and accrual state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceLot {
    /// Id of the event that created the lot.
    pub id: String,
    pub recipient: Address,
    /// Amount remaining. Never increases.
    #[serde(with = "dec_u256")]
    pub balance: U256,
    /// Asset deposited to mint the lot, if any.
    pub asset: Option<Address>,
    pub source: Option<LotSource>,
    /// Acquisition time.
    pub balance_date: u64,
    /// Last time points were computed for this lot.
    pub points_date: u64,
    #[serde(with = "dec_u256")]
    pub points: U256,
    /// Accrual of the standard condition only, the base of referral rewards.
    #[serde(with = "dec_u256")]
    pub referral_points_base: U256,
    pub referral_code: Option<String>,
}

impl BalanceLot {
    /// A lot with nothing left to spend and nothing accrued.
    pub fn is_prunable(&self) -> bool {
        self.balance.is_zero() && self.points.is_zero()
    }
}

impl Entity for BalanceLot {
    const TABLE: &'static str = "balance_lots";

    fn id(&self) -> String {
        self.id.clone()
    }

    fn parent(&self) -> Option<String> {
        Some(address_id(self.recipient))
    }

    fn ordinal(&self) -> u64 {
        self.balance_date
    }
}

/// Global totals at a checkpoint. Write once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    /// Block id, `{height:010}-{hash prefix}`.
    pub id: String,
    pub block_number: u64,
    pub timestamp: u64,
    #[serde(with = "dec_u256")]
    pub balance: U256,
    #[serde(with = "dec_u256")]
    pub points: U256,
    #[serde(with = "dec_u256")]
    pub el_points: U256,
}

impl Entity for Summary {
    const TABLE: &'static str = "summaries";

    fn id(&self) -> String {
        self.id.clone()
    }

    fn ordinal(&self) -> u64 {
        self.block_number
    }
}

/// A recipient's totals at a checkpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipientHistory {
    /// `{height}:{recipient}`
    pub id: String,
    pub block_number: u64,
    pub timestamp: u64,
    pub recipient: Address,
    #[serde(with = "dec_u256")]
    pub balance: U256,
    #[serde(with = "dec_u256")]
    pub points: U256,
    pub points_date: u64,
    #[serde(with = "dec_u256")]
    pub el_points: U256,
    #[serde(with = "dec_u256")]
    pub referral_points: U256,
    pub referrer_count: u32,
    pub referral_count: u32,
}

impl RecipientHistory {
    pub fn snapshot(recipient: &Recipient, block_number: u64, timestamp: u64) -> Self {
        Self {
            id: format!("{block_number}:{}", address_id(recipient.address)),
            block_number,
            timestamp,
            recipient: recipient.address,
            balance: recipient.balance,
            points: recipient.points,
            points_date: recipient.points_date,
            el_points: recipient.el_points,
            referral_points: recipient.referral_points,
            referrer_count: recipient.referrer_count,
            referral_count: recipient.referral_count,
        }
    }
}

impl Entity for RecipientHistory {
    const TABLE: &'static str = "recipient_history";

    fn id(&self) -> String {
        self.id.clone()
    }

    fn parent(&self) -> Option<String> {
        Some(address_id(self.recipient))
    }

    fn ordinal(&self) -> u64 {
        self.block_number
    }
}

/// A deposit into the pool. Write once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositRecord {
    pub id: String,
    pub block_number: u64,
    pub timestamp: u64,
    pub asset: Address,
    pub depositor: Address,
    #[serde(with = "dec_u256")]
    pub deposit_amount: U256,
    #[serde(with = "dec_u256")]
    pub amount_received: U256,
    pub referral_code: Option<String>,
}

impl Entity for DepositRecord {
    const TABLE: &'static str = "deposits";

    fn id(&self) -> String {
        self.id.clone()
    }

    fn parent(&self) -> Option<String> {
        Some(address_id(self.depositor))
    }

    fn ordinal(&self) -> u64 {
        self.block_number
    }
}

/// A node delegator's restaked amount and cumulative EL points at a checkpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeDelegator {
    /// `{height}:{node}`
    pub id: String,
    pub block_number: u64,
    pub timestamp: u64,
    pub node: Address,
    #[serde(with = "dec_u256")]
    pub amount: U256,
    #[serde(with = "dec_u256")]
    pub points: U256,
}

impl Entity for NodeDelegator {
    const TABLE: &'static str = "node_delegators";

    fn id(&self) -> String {
        self.id.clone()
    }

    fn parent(&self) -> Option<String> {
        Some(address_id(self.node))
    }

    fn ordinal(&self) -> u64 {
        self.block_number
    }
}

/// Per asset breakdown of a [NodeDelegator] checkpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeDelegatorHolding {
    /// `{height}:{node}:{asset}`
    pub id: String,
    pub delegator: String,
    pub asset: Address,
    #[serde(with = "dec_u256")]
    pub amount: U256,
}

impl Entity for NodeDelegatorHolding {
    const TABLE: &'static str = "node_delegator_holdings";

    fn id(&self) -> String {
        self.id.clone()
    }

    fn parent(&self) -> Option<String> {
        Some(self.delegator.clone())
    }
}

/// Program level ledger of a campaign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Campaign {
    /// The campaign name.
    pub id: String,
    #[serde(with = "dec_u256")]
    pub balance: U256,
    #[serde(with = "dec_u256")]
    pub el_points: U256,
}

impl Campaign {
    pub fn new(name: &str) -> Self {
        Self { id: name.to_string(), balance: U256::ZERO, el_points: U256::ZERO }
    }
}

impl Entity for Campaign {
    const TABLE: &'static str = "campaigns";

    fn id(&self) -> String {
        self.id.clone()
    }
}

/// A campaign's totals at a checkpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignHistory {
    /// `{height}:{campaign}`
    pub id: String,
    pub block_number: u64,
    pub timestamp: u64,
    pub campaign: String,
    #[serde(with = "dec_u256")]
    pub balance: U256,
    #[serde(with = "dec_u256")]
    pub el_points: U256,
}

impl Entity for CampaignHistory {
    const TABLE: &'static str = "campaign_history";

    fn id(&self) -> String {
        self.id.clone()
    }

    fn parent(&self) -> Option<String> {
        Some(self.campaign.clone())
    }

    fn ordinal(&self) -> u64 {
        self.block_number
    }
}

/// A recipient's sub-ledger within a campaign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignRecipient {
    /// `{campaign}:{recipient}`
    pub id: String,
    pub campaign: String,
    pub recipient: Address,
    #[serde(with = "dec_u256")]
    pub balance: U256,
    #[serde(with = "dec_u256")]
    pub el_points: U256,
}

impl CampaignRecipient {
    pub fn id_for(campaign: &str, recipient: Address) -> String {
        format!("{campaign}:{}", address_id(recipient))
    }

    pub fn new(campaign: &str, recipient: Address) -> Self {
        Self {
            id: Self::id_for(campaign, recipient),
            campaign: campaign.to_string(),
            recipient,
            balance: U256::ZERO,
            el_points: U256::ZERO,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.balance.is_zero() && self.el_points.is_zero()
    }
}

impl Entity for CampaignRecipient {
    const TABLE: &'static str = "campaign_recipients";

    fn id(&self) -> String {
        self.id.clone()
    }

    fn parent(&self) -> Option<String> {
        Some(self.campaign.clone())
    }
}

/// Last block fully processed and flushed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessorStatus {
    pub id: String,
    pub height: u64,
    pub timestamp: u64,
}

impl ProcessorStatus {
    pub const ID: &'static str = "points";
}

impl Entity for ProcessorStatus {
    const TABLE: &'static str = "processor_status";

    fn id(&self) -> String {
        self.id.clone()
    }
}
