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

//! Time boxed, budget capped EL point campaigns.
//!
//! A campaign keeps a program level ledger and one sub-ledger per recipient. Balances
//! entering and leaving during the campaign window are mirrored into both. EL point awards
//! are clamped against the program total so the budget holds exactly.

use alloy::primitives::{Address, U256};

use crate::{
    cache::EntityCache,
    config::CampaignConfig,
    entities::{Campaign, CampaignHistory, CampaignRecipient, LotSource, Recipient},
    error::LedgerError,
    store::Store,
    units::apply_multiplier,
};

/// Rows a campaign has pending for the next flush.
#[derive(Debug, Default)]
pub struct CampaignRows {
    pub campaigns: Vec<Campaign>,
    pub history: Vec<CampaignHistory>,
    pub recipients: Vec<CampaignRecipient>,
    /// Ids of sub-ledgers back at zero.
    pub removed: Vec<String>,
}

#[derive(Debug)]
pub struct CampaignProcessor {
    config: CampaignConfig,
    campaign: EntityCache<Campaign>,
    recipients: EntityCache<CampaignRecipient>,
    history: Vec<CampaignHistory>,
    complete: bool,
}

impl CampaignProcessor {
    pub fn new(config: CampaignConfig) -> Self {
        Self {
            config,
            campaign: EntityCache::new(),
            recipients: EntityCache::new(),
            history: vec![],
            complete: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Whether the budget has been fully awarded.
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn is_expired(&self, timestamp: u64) -> bool {
        timestamp >= self.config.end
    }

    /// Cached program ledger, if it has been loaded.
    pub fn campaign(&self) -> Option<&Campaign> {
        self.campaign.get(&self.config.name)
    }

    /// Cached sub-ledger of `recipient`, if it has been loaded.
    pub fn recipient(&self, recipient: Address) -> Option<&CampaignRecipient> {
        self.recipients.get(&CampaignRecipient::id_for(&self.config.name, recipient))
    }

    fn applies_to(&self, recipient: Address, timestamp: u64) -> bool {
        self.config.is_active(timestamp) && !self.config.is_excluded(recipient)
    }

    async fn ledgers<S: Store>(
        &mut self,
        store: &S,
        recipient: Address,
    ) -> Result<(&mut Campaign, &mut CampaignRecipient), LedgerError> {
        let name = &self.config.name;
        let campaign = self.campaign.get_or_load(store, name, || Campaign::new(name)).await?;
        let sub_ledger = self
            .recipients
            .get_or_load(store, &CampaignRecipient::id_for(name, recipient), || {
                CampaignRecipient::new(name, recipient)
            })
            .await?;
        Ok((campaign, sub_ledger))
    }

    async fn program<S: Store>(&mut self, store: &S) -> Result<&mut Campaign, LedgerError> {
        let name = &self.config.name;
        Ok(self.campaign.get_or_load(store, name, || Campaign::new(name)).await?)
    }

    /// Enrolls a balance increase. Only minted and swapped acquisitions count.
    pub async fn on_balance_increase<S: Store>(
        &mut self,
        store: &S,
        recipient: Address,
        timestamp: u64,
        amount: U256,
        source: Option<LotSource>,
    ) -> Result<(), LedgerError> {
        if !self.applies_to(recipient, timestamp) {
            return Ok(());
        }
        if !matches!(source, Some(LotSource::Mint | LotSource::Swap)) {
            return Ok(());
        }
        let (campaign, sub_ledger) = self.ledgers(store, recipient).await?;
        campaign.balance += amount;
        sub_ledger.balance += amount;
        Ok(())
    }

    /// Mirrors a balance decrease, whatever its source.
    ///
    /// Ledgers floor at zero when a recipient spends balance it held before enrolling.
    pub async fn on_balance_decrease<S: Store>(
        &mut self,
        store: &S,
        recipient: Address,
        timestamp: u64,
        amount: U256,
    ) -> Result<(), LedgerError> {
        if !self.applies_to(recipient, timestamp) {
            return Ok(());
        }
        let (campaign, sub_ledger) = self.ledgers(store, recipient).await?;
        campaign.balance = campaign.balance.saturating_sub(amount);
        sub_ledger.balance = sub_ledger.balance.saturating_sub(amount);
        Ok(())
    }

    /// Awards campaign EL points on top of `amount`, the recipient's share of a node
    /// delegator's earnings since `anchor`. Returns the award.
    pub async fn on_external_yield<S: Store>(
        &mut self,
        store: &S,
        recipient: &Recipient,
        amount: U256,
        anchor: u64,
    ) -> Result<U256, LedgerError> {
        if !self.applies_to(recipient.address, anchor) {
            return Ok(U256::ZERO);
        }
        let limit = self.config.el_point_limit;
        let awarded = self.program(store).await?.el_points;
        if awarded > limit {
            return Err(LedgerError::CampaignOverBudget {
                campaign: self.config.name.clone(),
                awarded,
                limit,
            });
        }
        if awarded == limit {
            self.complete = true;
            return Ok(U256::ZERO);
        }

        let id = CampaignRecipient::id_for(&self.config.name, recipient.address);
        let Some(sub_ledger) = self.recipients.load(store, &id).await? else {
            return Ok(U256::ZERO);
        };
        if sub_ledger.balance.is_zero() || recipient.balance.is_zero() {
            return Ok(U256::ZERO);
        }

        let multiplier: u64 = self
            .config
            .el_point_conditions
            .iter()
            .filter(|c| c.contains(anchor))
            .map(|c| c.multiplier)
            .sum();
        let mut award =
            apply_multiplier(amount * sub_ledger.balance / recipient.balance, multiplier);
        if awarded + award > limit {
            award = limit - awarded;
            self.complete = true;
            tracing::info!("overage detected - campaign complete");
        }
        sub_ledger.el_points += award;

        let campaign = self.program(store).await?;
        campaign.el_points += award;
        Ok(award)
    }

    /// Snapshots the program totals at a checkpoint.
    pub async fn on_checkpoint<S: Store>(
        &mut self,
        store: &S,
        block_number: u64,
        timestamp: u64,
    ) -> Result<(), LedgerError> {
        let campaign = self.program(store).await?.clone();
        self.history.push(CampaignHistory {
            id: format!("{block_number}:{}", campaign.id),
            block_number,
            timestamp,
            campaign: campaign.id,
            balance: campaign.balance,
            el_points: campaign.el_points,
        });
        Ok(())
    }

    /// Rows to persist. Sub-ledgers at zero are scheduled for removal.
    pub fn pending_rows(&self) -> CampaignRows {
        let (removed, recipients): (Vec<_>, Vec<_>) =
            self.recipients.values().cloned().partition(CampaignRecipient::is_empty);
        CampaignRows {
            campaigns: self.campaign.values().cloned().collect(),
            history: self.history.clone(),
            recipients,
            removed: removed.into_iter().map(|r| r.id).collect(),
        }
    }

    /// Drops what a successful flush made durable.
    pub fn flushed(&mut self) {
        self.history.clear();
        self.recipients.retain(|r| !r.is_empty());
    }
}

#[cfg(test)]
mod tests {
    use alloy::primitives::address;
    use tracing_test::traced_test;

    use super::*;
    use crate::{config::PointCondition, store::MemoryStore, units::eth};

    const ALICE: Address = address!("00000000000000000000000000000000000a11ce");
    const BOB: Address = address!("0000000000000000000000000000000000000b0b");
    const CAROL: Address = address!("00000000000000000000000000000000000ca201");
    const POOL: Address = address!("00000000000000000000000000000000000000aa");
    const START: u64 = 1_000_000;
    const END: u64 = 2_000_000;

    fn campaign(limit: U256) -> CampaignProcessor {
        CampaignProcessor::new(CampaignConfig {
            name: "test".into(),
            excluded: vec![POOL],
            start: START,
            end: END,
            el_point_limit: limit,
            el_point_conditions: vec![
                PointCondition::new("double", 200).starting(START).ending(END),
                PointCondition::new("pre", 0).starting(0).ending(START),
            ],
        })
    }

    fn holder(address: Address, balance: U256) -> Recipient {
        let mut recipient = Recipient::new(address);
        recipient.balance = balance;
        recipient
    }

    #[tokio::test]
    async fn test_increase_filters_source_window_and_exclusions() {
        let store = MemoryStore::new();
        let mut processor = campaign(eth(1_000));

        processor.on_balance_increase(&store, ALICE, START, eth(1), Some(LotSource::Mint)).await.unwrap();
        processor.on_balance_increase(&store, ALICE, START, eth(2), Some(LotSource::Swap)).await.unwrap();
        processor.on_balance_increase(&store, ALICE, START, eth(4), None).await.unwrap();
        processor.on_balance_increase(&store, ALICE, END, eth(8), Some(LotSource::Mint)).await.unwrap();
        processor.on_balance_increase(&store, POOL, START, eth(16), Some(LotSource::Mint)).await.unwrap();

        assert_eq!(processor.campaign().unwrap().balance, eth(3));
        assert_eq!(processor.recipient(ALICE).unwrap().balance, eth(3));
        assert!(processor.recipient(POOL).is_none());

        processor.on_balance_decrease(&store, ALICE, START + 1, eth(5)).await.unwrap();
        assert_eq!(processor.campaign().unwrap().balance, U256::ZERO);
        assert!(processor.recipient(ALICE).unwrap().is_empty());
    }

    #[tokio::test]
    #[traced_test]
    async fn test_award_is_clamped_to_budget() {
        let store = MemoryStore::new();
        let mut processor = campaign(eth(1_000));
        for who in [ALICE, BOB] {
            processor.on_balance_increase(&store, who, START, eth(1), Some(LotSource::Mint)).await.unwrap();
        }

        // A 2x bonus on 350 and 250 computes to 700 and 500.
        let alice = holder(ALICE, eth(1));
        let bob = holder(BOB, eth(1));
        let first = processor.on_external_yield(&store, &alice, eth(350), START).await.unwrap();
        assert_eq!(first, eth(700));
        assert!(!processor.is_complete());

        let second = processor.on_external_yield(&store, &bob, eth(250), START).await.unwrap();
        assert_eq!(second, eth(300));
        assert!(processor.is_complete());
        assert_eq!(processor.campaign().unwrap().el_points, eth(1_000));
        assert!(logs_contain("overage detected - campaign complete"));

        // Budget exhausted: further awards are zero.
        let third = processor.on_external_yield(&store, &alice, eth(100), START).await.unwrap();
        assert_eq!(third, U256::ZERO);
        assert_eq!(processor.campaign().unwrap().el_points, eth(1_000));
    }

    #[tokio::test]
    async fn test_budget_shared_across_recipients() {
        let store = MemoryStore::new();
        let mut processor = campaign(eth(1_000));
        let holders = [ALICE, BOB, CAROL].map(|who| holder(who, eth(1)));
        for recipient in &holders {
            let address = recipient.address;
            processor
                .on_balance_increase(&store, address, START, eth(1), Some(LotSource::Swap))
                .await
                .unwrap();
        }

        // Each award doubles 150 to 300, so the fourth crosses the budget.
        let mut awards = vec![];
        for round in 0..3 {
            for recipient in &holders {
                let award = processor
                    .on_external_yield(&store, recipient, eth(150), START + round)
                    .await
                    .unwrap();
                awards.push(award);
            }
        }
        let expected: Vec<U256> = [300, 300, 300, 100, 0, 0, 0, 0, 0].map(eth).to_vec();
        assert_eq!(awards, expected);
        assert!(processor.is_complete());

        let campaign = processor.campaign().unwrap();
        assert_eq!(campaign.el_points, eth(1_000));
        let per_recipient: Vec<U256> =
            holders.iter().map(|r| processor.recipient(r.address).unwrap().el_points).collect();
        assert_eq!(per_recipient, vec![eth(400), eth(300), eth(300)]);
        assert_eq!(per_recipient.into_iter().sum::<U256>(), campaign.el_points);
    }

    #[tokio::test]
    async fn test_award_uses_campaign_share_of_balance() {
        let store = MemoryStore::new();
        let mut processor = campaign(eth(1_000_000));
        processor.on_balance_increase(&store, ALICE, START, eth(1), Some(LotSource::Mint)).await.unwrap();

        // A quarter of the balance is enrolled.
        let alice = holder(ALICE, eth(4));
        let award = processor.on_external_yield(&store, &alice, eth(100), START + 10).await.unwrap();
        assert_eq!(award, eth(50));
        assert_eq!(processor.recipient(ALICE).unwrap().el_points, eth(50));

        // No award for recipients that never enrolled.
        let bob = holder(BOB, eth(4));
        let award = processor.on_external_yield(&store, &bob, eth(100), START + 10).await.unwrap();
        assert_eq!(award, U256::ZERO);
        assert!(processor.recipient(BOB).is_none());
    }

    #[tokio::test]
    async fn test_over_budget_is_fatal() {
        let store = MemoryStore::new();
        store
            .upsert(&[Campaign { id: "test".into(), balance: U256::ZERO, el_points: eth(2) }])
            .await
            .unwrap();
        let mut processor = campaign(eth(1));

        let err = processor
            .on_external_yield(&store, &holder(ALICE, eth(1)), eth(1), START)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::CampaignOverBudget { .. }));
    }

    #[tokio::test]
    async fn test_checkpoint_and_pending_rows() {
        let store = MemoryStore::new();
        let mut processor = campaign(eth(1_000));
        processor.on_balance_increase(&store, ALICE, START, eth(2), Some(LotSource::Mint)).await.unwrap();
        processor.on_balance_increase(&store, BOB, START, eth(1), Some(LotSource::Mint)).await.unwrap();
        processor.on_balance_decrease(&store, BOB, START, eth(1)).await.unwrap();
        processor.on_checkpoint(&store, 42, START).await.unwrap();

        let rows = processor.pending_rows();
        assert_eq!(rows.campaigns.len(), 1);
        assert_eq!(rows.history.len(), 1);
        assert_eq!(rows.history[0].id, "42:test");
        assert_eq!(rows.history[0].balance, eth(2));
        assert_eq!(rows.recipients.len(), 1);
        assert_eq!(rows.removed, vec![CampaignRecipient::id_for("test", BOB)]);

        processor.flushed();
        let rows = processor.pending_rows();
        assert!(rows.history.is_empty());
        assert!(rows.removed.is_empty());
    }

    #[test]
    fn test_expiry_at_end() {
        let processor = campaign(eth(1));
        assert!(!processor.is_expired(END - 1));
        assert!(processor.is_expired(END));
    }
}
