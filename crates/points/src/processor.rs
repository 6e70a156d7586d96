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

//! Block processing and recompute scheduling.

use crate::{
    config::{Granularity, PointsConfig},
    context::LedgerContext,
    entities::ProcessorStatus,
    error::LedgerError,
    events::{Block, BlockBatch, EventKind},
    store::{Store, StoreTransaction, TransactionalStore},
};

/// Last wall-clock bucket processed per granularity.
///
/// At most one recompute runs per block. Once it has run, crossing another granularity's
/// boundary in the same block only advances that marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntervalTracker {
    short_ms: u64,
    long_ms: u64,
    short: u64,
    long: u64,
    processed: bool,
}

impl IntervalTracker {
    /// Markers as of the last checkpoint, or zero with none.
    pub fn restore(config: &PointsConfig, last_checkpoint: Option<u64>) -> Self {
        let short_ms = config.interval_ms(Granularity::Short);
        let long_ms = config.interval_ms(Granularity::Long);
        let bucket = |ms: u64| last_checkpoint.map_or(0, |at| at / ms);
        Self { short_ms, long_ms, short: bucket(short_ms), long: bucket(long_ms), processed: false }
    }

    pub fn begin_block(&mut self) {
        self.processed = false;
    }

    /// Advances the marker of `granularity` to the bucket of `timestamp` and returns whether
    /// a recompute is due.
    pub fn advance(&mut self, granularity: Granularity, timestamp: u64) -> bool {
        let processed = self.processed;
        let (marker, ms) = match granularity {
            Granularity::Short => (&mut self.short, self.short_ms),
            Granularity::Long => (&mut self.long, self.long_ms),
        };
        let bucket = timestamp / ms;
        if processed || *marker == bucket {
            *marker = bucket;
            return false;
        }
        *marker = bucket;
        self.processed = true;
        true
    }
}

impl<S: TransactionalStore> LedgerContext<S> {
    /// Processes a batch of blocks in one store transaction and returns the new status.
    ///
    /// Every flush of the batch lands in the same transaction, so either the whole batch
    /// becomes visible or none of it. On error the in-memory state is ahead of the store and
    /// the context must be rebuilt with [LedgerContext::initialize].
    pub async fn process_batch(
        &mut self,
        batch: &BlockBatch,
    ) -> Result<Option<ProcessorStatus>, LedgerError> {
        let Some(last) = batch.blocks.last() else {
            return Ok(None);
        };
        let tx = self.store.begin().await?;

        for block in &batch.blocks {
            self.process_block(&tx, block).await?;
        }
        if batch.is_head && self.intervals.advance(Granularity::Short, last.timestamp) {
            self.checkpoint(&tx, last).await?;
        }

        let status = ProcessorStatus {
            id: ProcessorStatus::ID.into(),
            height: last.height,
            timestamp: last.timestamp,
        };
        self.pending.status = Some(status.clone());
        self.save(&tx).await?;
        self.remove_expired_campaigns(last.timestamp);
        tx.commit().await?;

        tracing::debug!(
            "Processed blocks {}..={} ({} tracked recipients)",
            batch.blocks[0].height,
            last.height,
            self.recipients.len()
        );
        Ok(Some(status))
    }

    async fn process_block<T: Store>(
        &mut self,
        store: &T,
        block: &Block,
    ) -> Result<(), LedgerError> {
        self.intervals.begin_block();

        // Holdings are read as of the end of the block.
        for event in &block.events {
            if let EventKind::ExternalYieldReport(report) = &event.kind {
                self.apply_yield_report(report);
            }
        }

        for event in &block.events {
            self.process_interval(store, block, Granularity::Short).await?;
            match &event.kind {
                EventKind::Deposit(deposit) => {
                    self.record_deposit(store, block, &event.id, deposit).await?
                }
                EventKind::Transfer(transfer) => {
                    self.transfer(store, block, &event.id, transfer).await?
                }
                EventKind::ExternalYieldReport(_) => {}
            }
        }
        self.process_interval(store, block, Granularity::Long).await
    }

    async fn process_interval<T: Store>(
        &mut self,
        store: &T,
        block: &Block,
        granularity: Granularity,
    ) -> Result<(), LedgerError> {
        if self.intervals.advance(granularity, block.timestamp) {
            self.checkpoint(store, block).await?;
        }
        Ok(())
    }

    async fn checkpoint<T: Store>(&mut self, store: &T, block: &Block) -> Result<(), LedgerError> {
        self.save(store).await?;
        self.calculate_points(store, block).await
    }
}

#[cfg(test)]
mod tests {
    use alloy::primitives::Address;

    use super::*;
    use crate::units::HOUR_MS;

    fn tracker(last: Option<u64>) -> IntervalTracker {
        IntervalTracker::restore(&PointsConfig::mainnet(Address::ZERO), last)
    }

    #[test]
    fn test_restore_from_last_checkpoint() {
        let at = 10 * HOUR_MS + 7 * 60_000;
        let tracker = tracker(Some(at));
        assert_eq!(tracker.long, 10);
        assert_eq!(tracker.short, at / 300_000);
    }

    #[test]
    fn test_one_recompute_per_block() {
        let mut tracker = tracker(Some(0));
        tracker.begin_block();
        assert!(!tracker.advance(Granularity::Short, 60_000));
        // Crossing both boundaries in the same block recomputes once.
        assert!(tracker.advance(Granularity::Short, HOUR_MS));
        assert!(!tracker.advance(Granularity::Long, HOUR_MS));
        assert_eq!(tracker.long, 1);

        tracker.begin_block();
        assert!(!tracker.advance(Granularity::Long, HOUR_MS + 1));
        assert!(tracker.advance(Granularity::Short, HOUR_MS + 300_000));
    }

    #[test]
    fn test_fresh_tracker_triggers_immediately() {
        let mut tracker = tracker(None);
        tracker.begin_block();
        assert!(tracker.advance(Granularity::Short, 1_707_200_000_000));
    }
}
