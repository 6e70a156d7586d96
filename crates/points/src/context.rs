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

//! The ledger context: tracked recipients, campaigns and the writes pending for the next
//! flush.

use std::{
    collections::{hash_map::Entry, BTreeMap, BTreeSet, HashMap},
    sync::Arc,
};

use alloy::primitives::{Address, U256};

use crate::{
    campaigns::CampaignProcessor,
    config::PointsConfig,
    entities::{
        address_id, BalanceLot, CampaignRecipient, DepositRecord, LotSource, NodeDelegator,
        NodeDelegatorHolding, ProcessorStatus, Recipient, RecipientHistory, Summary,
    },
    error::LedgerError,
    events::{Block, DepositEvent, TransferEvent, YieldReport},
    ledger::RecipientState,
    processor::IntervalTracker,
    resolve::resolve_referrals,
    store::{FindQuery, Store, TransactionalStore},
    swap::referral_from_exact_input_single,
};

/// A balance increase to record as a new lot.
#[derive(Debug, Clone)]
pub struct Acquisition {
    /// Id of the event, reused as the lot id.
    pub id: String,
    pub recipient: Address,
    pub amount: U256,
    pub timestamp: u64,
    pub asset: Option<Address>,
    pub source: Option<LotSource>,
    pub referral_code: Option<String>,
}

/// Writes accumulated since the last flush.
#[derive(Debug, Default)]
pub(crate) struct PendingWrites {
    pub summaries: BTreeMap<String, Summary>,
    pub deposits: Vec<DepositRecord>,
    pub history: BTreeMap<String, RecipientHistory>,
    pub node_delegators: BTreeMap<String, NodeDelegator>,
    pub holdings: BTreeMap<String, NodeDelegatorHolding>,
    /// Recipients whose totals or lots changed.
    pub dirty: BTreeSet<Address>,
    pub removed_lots: Vec<String>,
    pub status: Option<ProcessorStatus>,
}

/// Owns every piece of mutable ledger state between flushes.
///
/// Recipients and campaigns outlive a flush and seed the next interval. Everything else is
/// transient and cleared once written.
pub struct LedgerContext<S> {
    pub(crate) store: S,
    pub(crate) config: Arc<PointsConfig>,
    pub(crate) recipients: HashMap<Address, RecipientState>,
    pub(crate) campaigns: Vec<CampaignProcessor>,
    pub(crate) intervals: IntervalTracker,
    /// Set once any node delegator has reported holdings.
    pub(crate) el_enabled: bool,
    /// Latest holdings per node delegator.
    pub(crate) yield_reports: HashMap<Address, YieldReport>,
    pub(crate) pending: PendingWrites,
}

impl<S: TransactionalStore> LedgerContext<S> {
    /// Restores the context from the store.
    ///
    /// Loads every recipient with a positive balance, a used referral code or referees, with
    /// their lots, plus every stored referrer named by a loaded lot. Derives the interval
    /// markers from the last summary.
    pub async fn initialize(store: S, config: Arc<PointsConfig>) -> Result<Self, LedgerError> {
        let el_enabled = store.find_one::<NodeDelegator>(FindQuery::all()).await?.is_some();
        let last_summary = store.find_one::<Summary>(FindQuery::latest()).await?;
        let intervals = IntervalTracker::restore(&config, last_summary.map(|s| s.timestamp));

        let mut recipients = HashMap::new();
        let mut idle = HashMap::new();
        for recipient in store.find::<Recipient>(FindQuery::all()).await? {
            if recipient.balance.is_zero()
                && recipient.referral_count == 0
                && recipient.referrer_count == 0
            {
                idle.insert(recipient.address, recipient);
                continue;
            }
            let state = load_lots(&store, recipient).await?;
            recipients.insert(state.address(), state);
        }

        // Referrers must stay tracked for their referees to keep crediting them.
        let referrers: BTreeSet<Address> = recipients
            .values()
            .flat_map(|state| state.lots.iter())
            .filter_map(|lot| lot.referral_code.as_deref())
            .filter_map(|code| config.referrals.lookup(code))
            .map(|target| target.address)
            .collect();
        for referrer in referrers {
            if let Some(recipient) = idle.remove(&referrer) {
                let state = load_lots(&store, recipient).await?;
                recipients.insert(referrer, state);
            }
        }
        tracing::info!(
            "Restored {} recipients, EL accounting {}",
            recipients.len(),
            if el_enabled { "enabled" } else { "pending" }
        );

        let campaigns = config.campaigns.iter().cloned().map(CampaignProcessor::new).collect();
        Ok(Self {
            store,
            config,
            recipients,
            campaigns,
            intervals,
            el_enabled,
            yield_reports: HashMap::new(),
            pending: PendingWrites::default(),
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S> LedgerContext<S> {
    pub fn config(&self) -> &PointsConfig {
        &self.config
    }

    /// A tracked recipient, without touching the store.
    pub fn recipient_state(&self, address: Address) -> Option<&RecipientState> {
        self.recipients.get(&address)
    }

    pub fn recipients(&self) -> impl Iterator<Item = &RecipientState> {
        self.recipients.values()
    }

    pub fn campaigns(&self) -> &[CampaignProcessor] {
        &self.campaigns
    }

    pub fn el_enabled(&self) -> bool {
        self.el_enabled
    }

    /// Returns the tracked recipient, loading it from `store` or creating it on a miss.
    pub async fn recipient<T: Store>(
        &mut self,
        store: &T,
        address: Address,
    ) -> Result<&mut RecipientState, LedgerError> {
        match self.recipients.entry(address) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let state = match store.get::<Recipient>(&address_id(address)).await? {
                    Some(recipient) => load_lots(store, recipient).await?,
                    None => {
                        self.pending.dirty.insert(address);
                        RecipientState::new(address)
                    }
                };
                Ok(entry.insert(state))
            }
        }
    }

    /// Recomputes points of `roots` and their referees as of `timestamp`.
    pub fn resolve(&mut self, roots: Vec<Address>, timestamp: u64) {
        let visited = resolve_referrals(&self.config, &mut self.recipients, roots, timestamp);
        self.pending.dirty.extend(visited);
    }

    /// Records a new lot and enrolls it in the active campaigns.
    pub async fn add_balance<T: Store>(
        &mut self,
        store: &T,
        acquisition: Acquisition,
    ) -> Result<(), LedgerError> {
        let address = acquisition.recipient;
        let timestamp = acquisition.timestamp;
        // Tier eligibility depends on the balance before the increase.
        if self.recipient(store, address).await?.has_pending_accrual(timestamp) {
            self.resolve(vec![address], timestamp);
        }

        let state = self.recipient(store, address).await?;
        state.add_lot(BalanceLot {
            id: acquisition.id,
            recipient: address,
            balance: acquisition.amount,
            asset: acquisition.asset,
            source: acquisition.source,
            balance_date: timestamp,
            points_date: timestamp,
            points: U256::ZERO,
            referral_points_base: U256::ZERO,
            referral_code: acquisition.referral_code.clone(),
        });
        self.pending.dirty.insert(address);

        // Track the referrer so it is part of the next pass.
        if let Some(target) =
            acquisition.referral_code.as_deref().and_then(|code| self.config.referrals.lookup(code))
        {
            self.recipient(store, target.address).await?;
        }

        for campaign in &mut self.campaigns {
            let (amount, source) = (acquisition.amount, acquisition.source);
            campaign.on_balance_increase(store, address, timestamp, amount, source).await?;
        }
        Ok(())
    }

    /// Accrues the recipient, then spends `amount` from its lots.
    pub async fn remove_balance<T: Store>(
        &mut self,
        store: &T,
        address: Address,
        amount: U256,
        timestamp: u64,
    ) -> Result<(), LedgerError> {
        self.recipient(store, address).await?;
        self.resolve(vec![address], timestamp);

        let spend_last_asset = self.config.spend_last_asset;
        let state = self.recipient(store, address).await?;
        let pruned = state.spend(amount, spend_last_asset)?;
        self.pending.dirty.insert(address);
        self.pending.removed_lots.extend(pruned);

        for campaign in &mut self.campaigns {
            campaign.on_balance_decrease(store, address, timestamp, amount).await?;
        }
        Ok(())
    }

    /// Moves balance between holders. Mints and burns only affect one side.
    pub async fn transfer<T: Store>(
        &mut self,
        store: &T,
        block: &Block,
        event_id: &str,
        transfer: &TransferEvent,
    ) -> Result<(), LedgerError> {
        // Mints are recorded by the deposit.
        if transfer.from == Address::ZERO {
            return Ok(());
        }
        self.remove_balance(store, transfer.from, transfer.amount, block.timestamp).await?;
        if transfer.to == Address::ZERO {
            return Ok(());
        }

        let swap = transfer.swap.as_ref().filter(|swap| swap.pool == self.config.swap_pool);
        let referral_code = swap
            .and_then(|swap| swap.tx_input.as_deref())
            .and_then(referral_from_exact_input_single);
        self.add_balance(
            store,
            Acquisition {
                id: event_id.to_string(),
                recipient: transfer.to,
                amount: transfer.amount,
                timestamp: block.timestamp,
                asset: None,
                source: swap.map(|_| LotSource::Swap),
                referral_code,
            },
        )
        .await
    }

    /// Persists the deposit and credits the minted amount to the depositor.
    pub async fn record_deposit<T: Store>(
        &mut self,
        store: &T,
        block: &Block,
        event_id: &str,
        deposit: &DepositEvent,
    ) -> Result<(), LedgerError> {
        let referral_code = deposit.referral_code.clone().filter(|code| !code.is_empty());
        self.pending.deposits.push(DepositRecord {
            id: event_id.to_string(),
            block_number: block.height,
            timestamp: block.timestamp,
            asset: deposit.asset,
            depositor: deposit.depositor,
            deposit_amount: deposit.deposit_amount,
            amount_received: deposit.mint_amount,
            referral_code: referral_code.clone(),
        });
        self.add_balance(
            store,
            Acquisition {
                id: event_id.to_string(),
                recipient: deposit.depositor,
                amount: deposit.mint_amount,
                timestamp: block.timestamp,
                asset: Some(deposit.asset),
                source: Some(LotSource::Mint),
                referral_code,
            },
        )
        .await
    }

    /// Latest summary, pending or stored.
    pub(crate) async fn last_summary<T: Store>(
        &self,
        store: &T,
    ) -> Result<Option<Summary>, LedgerError> {
        if let Some(summary) = self.pending.summaries.values().max_by_key(|s| s.block_number) {
            return Ok(Some(summary.clone()));
        }
        Ok(store.find_one::<Summary>(FindQuery::latest()).await?)
    }

    /// Runs a full recompute at `block`: accrues every tracked recipient, snapshots their
    /// totals, creates the block summary, distributes EL points and snapshots campaigns.
    pub async fn calculate_points<T: Store>(
        &mut self,
        store: &T,
        block: &Block,
    ) -> Result<(), LedgerError> {
        tracing::info!(
            "Calculating points: {}",
            chrono::DateTime::from_timestamp_millis(block.timestamp as i64)
                .map_or_else(|| block.timestamp.to_string(), |at| at.to_rfc3339())
        );
        let last_summary = self.last_summary(store).await?;
        let block_id = block.id();

        // An earlier pass at the same block already produced the checkpoint.
        let mut summary = None;
        if last_summary.as_ref().map_or(true, |s| s.id != block_id) {
            let all: Vec<Address> = self.recipients.keys().copied().collect();
            self.resolve(all, block.timestamp);

            let mut balance = U256::ZERO;
            let mut points = U256::ZERO;
            for state in self.recipients.values() {
                let recipient = &state.recipient;
                balance += recipient.balance;
                points += recipient.points;
                let history = RecipientHistory::snapshot(recipient, block.height, block.timestamp);
                self.pending.history.insert(history.id.clone(), history);
            }
            summary = Some(Summary {
                id: block_id,
                block_number: block.height,
                timestamp: block.timestamp,
                balance,
                points,
                el_points: last_summary.map_or(U256::ZERO, |s| s.el_points),
            });
        }

        let el_points = self.update_el_points(store, block).await?;
        if let Some(mut summary) = summary {
            if let Some(el_points) = el_points {
                summary.el_points = el_points;
            }
            self.pending.summaries.insert(summary.id.clone(), summary);
        }

        for campaign in &mut self.campaigns {
            campaign.on_checkpoint(store, block.height, block.timestamp).await?;
        }
        Ok(())
    }

    /// Writes every pending row to `store` and resets the transient collections.
    ///
    /// Append-only rows are inserted and fail on duplicates. Recipients are written before
    /// their lots.
    pub async fn save<T: Store>(&mut self, store: &T) -> Result<(), LedgerError> {
        let summaries: Vec<Summary> = self.pending.summaries.values().cloned().collect();
        store.insert(&summaries).await?;
        store.insert(&self.pending.deposits).await?;

        let mut recipients = Vec::with_capacity(self.pending.dirty.len());
        let mut lots = vec![];
        for address in &self.pending.dirty {
            if let Some(state) = self.recipients.get(address) {
                recipients.push(state.recipient.clone());
                lots.extend(state.lots.iter().cloned());
            }
        }
        store.upsert(&recipients).await?;
        store.upsert(&lots).await?;
        store.remove::<BalanceLot>(&self.pending.removed_lots).await?;

        let history: Vec<RecipientHistory> = self.pending.history.values().cloned().collect();
        store.upsert(&history).await?;
        let node_delegators: Vec<NodeDelegator> =
            self.pending.node_delegators.values().cloned().collect();
        store.upsert(&node_delegators).await?;
        let holdings: Vec<NodeDelegatorHolding> = self.pending.holdings.values().cloned().collect();
        store.upsert(&holdings).await?;

        for campaign in &self.campaigns {
            let rows = campaign.pending_rows();
            store.upsert(&rows.campaigns).await?;
            store.upsert(&rows.history).await?;
            store.upsert(&rows.recipients).await?;
            store.remove::<CampaignRecipient>(&rows.removed).await?;
        }
        if let Some(status) = &self.pending.status {
            store.upsert(std::slice::from_ref(status)).await?;
        }

        tracing::debug!(
            "Saved {} summaries, {} deposits, {} recipients, {} lots, {} history rows",
            summaries.len(),
            self.pending.deposits.len(),
            recipients.len(),
            lots.len(),
            history.len()
        );

        self.pending = PendingWrites::default();
        for campaign in &mut self.campaigns {
            campaign.flushed();
        }
        Ok(())
    }

    /// Drops campaigns whose window has ended, with their sub-ledgers.
    pub fn remove_expired_campaigns(&mut self, timestamp: u64) {
        self.campaigns.retain(|campaign| {
            if campaign.is_expired(timestamp) {
                tracing::info!("Removed campaign: {}", campaign.name());
                false
            } else {
                true
            }
        });
    }
}

async fn load_lots<T: Store>(
    store: &T,
    recipient: Recipient,
) -> Result<RecipientState, LedgerError> {
    let lots = store
        .find::<BalanceLot>(FindQuery::all().with_parent(address_id(recipient.address)))
        .await?;
    Ok(RecipientState { recipient, lots })
}
