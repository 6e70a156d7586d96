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

//! EL points earned by the node delegators and their pro rata distribution to holders.

use alloy::primitives::{Address, U256};

use crate::{
    context::LedgerContext,
    entities::{address_id, NodeDelegator, NodeDelegatorHolding},
    error::LedgerError,
    events::{Block, YieldReport},
    store::{FindQuery, Store},
    units::{HOUR_MS, WAD},
};

/// EL points earned by restaking `amount` between two timestamps, one point per token-hour.
pub fn node_points_earned(amount: U256, from: u64, to: u64) -> U256 {
    let hours = U256::from(to.saturating_sub(from)) * WAD / U256::from(HOUR_MS);
    amount * hours / WAD
}

struct NodeCheckpoint {
    earned: U256,
    points: U256,
    /// Timestamp of the previous checkpoint, or of the block for the first one.
    from: u64,
}

impl<S> LedgerContext<S> {
    /// Records the latest holdings of a node delegator. The first report switches EL
    /// accounting on.
    pub fn apply_yield_report(&mut self, report: &YieldReport) {
        if !self.el_enabled {
            tracing::info!(
                "First node delegator report from {}, EL accounting enabled",
                report.strategy
            );
        }
        self.el_enabled = true;
        self.yield_reports.insert(report.strategy, report.clone());
    }

    /// Checkpoints every active node delegator and credits the earned EL points to the
    /// tracked recipients. Returns the total cumulative node points, or `None` while EL
    /// accounting is off.
    pub(crate) async fn update_el_points<T: Store>(
        &mut self,
        store: &T,
        block: &Block,
    ) -> Result<Option<U256>, LedgerError> {
        if !self.el_enabled {
            return Ok(None);
        }

        let nodes: Vec<Address> = self
            .config
            .node_delegators
            .iter()
            .filter(|node| node.start_block <= block.height)
            .map(|node| node.address)
            .collect();
        let mut earned = U256::ZERO;
        let mut total_points = U256::ZERO;
        let mut anchor = None;
        for node in nodes {
            let checkpoint = self.checkpoint_node(store, block, node).await?;
            earned += checkpoint.earned;
            total_points += checkpoint.points;
            anchor = anchor.max(Some(checkpoint.from));
        }

        let total_balance: U256 = self.recipients.values().map(|s| s.recipient.balance).sum();
        if total_balance.is_zero() {
            return Ok(Some(total_points));
        }

        // Campaign budgets are first come first served, so walk recipients in a stable order.
        let mut addresses: Vec<Address> = self.recipients.keys().copied().collect();
        addresses.sort();
        for address in addresses {
            let Some(state) = self.recipients.get_mut(&address) else {
                continue;
            };
            let recipient = &mut state.recipient;
            let share = recipient.balance * earned / total_balance;
            recipient.el_points += share;
            if let Some(anchor) = anchor {
                for campaign in self.campaigns.iter_mut().filter(|c| !c.is_complete()) {
                    let bonus = campaign.on_external_yield(store, recipient, share, anchor).await?;
                    recipient.el_points += bonus;
                }
            }
            self.pending.dirty.insert(address);
        }
        Ok(Some(total_points))
    }

    async fn checkpoint_node<T: Store>(
        &mut self,
        store: &T,
        block: &Block,
        node: Address,
    ) -> Result<NodeCheckpoint, LedgerError> {
        let id = format!("{}:{}", block.height, address_id(node));
        let last = match self.pending.node_delegators.get(&id) {
            Some(pending) => Some(pending.clone()),
            None => {
                store
                    .find_one::<NodeDelegator>(FindQuery::latest().with_parent(address_id(node)))
                    .await?
            }
        };
        if last.as_ref().is_some_and(|last| last.id == id) {
            return Err(LedgerError::DuplicateCheckpoint(id));
        }

        let report = self.yield_reports.get(&node);
        let amount = match (report, &last) {
            (Some(report), _) => report.total(),
            (None, Some(last)) => last.amount,
            (None, None) => U256::ZERO,
        };
        let (earned, from) = match &last {
            Some(last) => {
                (node_points_earned(last.amount, last.timestamp, block.timestamp), last.timestamp)
            }
            None => (U256::ZERO, block.timestamp),
        };
        let points = last.as_ref().map_or(U256::ZERO, |last| last.points) + earned;

        for holding in report.map(|r| r.holdings.as_slice()).unwrap_or_default() {
            let holding = NodeDelegatorHolding {
                id: format!("{id}:{}", address_id(holding.asset)),
                delegator: id.clone(),
                asset: holding.asset,
                amount: holding.amount,
            };
            self.pending.holdings.insert(holding.id.clone(), holding);
        }
        self.pending.node_delegators.insert(
            id.clone(),
            NodeDelegator {
                id,
                block_number: block.height,
                timestamp: block.timestamp,
                node,
                amount,
                points,
            },
        );
        Ok(NodeCheckpoint { earned, points, from })
    }
}
