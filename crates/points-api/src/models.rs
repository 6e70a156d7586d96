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

use alloy::primitives::{utils::format_ether, U256};
use lrt_points::entities::{address_id, Recipient, Summary};
use serde::{Deserialize, Serialize};

/// Response for the protocol wide EL points total
#[derive(Debug, Serialize, Deserialize)]
pub struct ElPointsTotalResponse {
    /// Total EL points with 18 decimals
    pub total: String,

    /// Total EL points in whole points
    pub total_formatted: String,
}

impl From<U256> for ElPointsTotalResponse {
    fn from(total: U256) -> Self {
        Self { total: total.to_string(), total_formatted: format_ether(total) }
    }
}

/// Response for the latest ledger checkpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct SummaryResponse {
    pub block_number: u64,

    /// Unix milliseconds
    pub timestamp: u64,

    /// Total tracked balance
    pub balance: String,

    /// Total points of all recipients
    pub points: String,

    /// Total EL points earned by the node delegators
    pub el_points: String,
}

impl From<Summary> for SummaryResponse {
    fn from(summary: Summary) -> Self {
        Self {
            block_number: summary.block_number,
            timestamp: summary.timestamp,
            balance: summary.balance.to_string(),
            points: summary.points.to_string(),
            el_points: summary.el_points.to_string(),
        }
    }
}

/// Response for a single recipient
#[derive(Debug, Serialize, Deserialize)]
pub struct RecipientResponse {
    pub address: String,
    pub balance: String,
    pub points: String,
    pub referral_points: String,
    pub el_points: String,

    /// Last time points were computed, unix milliseconds
    pub points_date: u64,
    pub referral_count: u32,
    pub referrer_count: u32,
}

impl From<Recipient> for RecipientResponse {
    fn from(recipient: Recipient) -> Self {
        Self {
            address: address_id(recipient.address),
            balance: recipient.balance.to_string(),
            points: recipient.points.to_string(),
            referral_points: recipient.referral_points.to_string(),
            el_points: recipient.el_points.to_string(),
            points_date: recipient.points_date,
            referral_count: recipient.referral_count,
            referrer_count: recipient.referrer_count,
        }
    }
}
