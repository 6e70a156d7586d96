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

use std::sync::Arc;

use lrt_points::{
    entities::ProcessorStatus, LedgerContext, LedgerError, PointsConfig, Store, StoreError,
};
use thiserror::Error;
use tokio::time::Duration;

use crate::{
    db::{DbError, PointsDb},
    source::{BlockSource, SourceError},
    validate::{ValidationError, Validator},
};

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] DbError),

    #[error("Store error: {0}")]
    StoreError(#[from] StoreError),

    #[error("Ledger error: {0}")]
    LedgerError(#[from] LedgerError),

    #[error("Block source error: {0}")]
    SourceError(#[from] SourceError),

    #[error("Validation error: {0}")]
    ValidationError(#[from] ValidationError),

    #[error("Maximum retries reached")]
    MaxRetries,
}

#[derive(Clone)]
pub struct IndexerServiceConfig {
    pub interval: Duration,
    pub retries: u32,
    pub batch_size: usize,
}

pub struct IndexerService<B> {
    pub db: PointsDb,
    pub source: B,
    pub points: Arc<PointsConfig>,
    pub config: IndexerServiceConfig,
    pub validator: Option<Validator>,
}

impl<B: BlockSource> IndexerService<B> {
    pub async fn new(
        db_conn: &str,
        source: B,
        points: PointsConfig,
        config: IndexerServiceConfig,
    ) -> Result<Self, ServiceError> {
        let db = PointsDb::new(db_conn).await?;
        Ok(Self { db, source, points: Arc::new(points), config, validator: None })
    }

    pub fn with_validator(self, validator: Validator) -> Self {
        Self { validator: Some(validator), ..self }
    }

    /// Processes the feed until `end_block` is reached, or forever without one.
    pub async fn run(
        &mut self,
        starting_block: Option<u64>,
        end_block: Option<u64>,
    ) -> Result<(), ServiceError> {
        let mut interval = tokio::time::interval(self.config.interval);
        let mut ctx = LedgerContext::initialize(self.db.clone(), self.points.clone()).await?;
        let mut from_block = self.starting_block(starting_block).await?;
        if let Some(end) = end_block {
            tracing::info!("Starting indexer at block {} (will stop at block {})", from_block, end);
        } else {
            tracing::info!("Starting indexer at block {}", from_block);
        }

        let mut attempt = 0;
        loop {
            if end_block.is_some_and(|end| from_block > end) {
                tracing::info!("Reached end block {}, exiting", from_block - 1);
                return Ok(());
            }
            interval.tick().await;

            let mut batch = match self.source.next_batch(from_block, self.config.batch_size).await {
                Ok(Some(batch)) => batch,
                Ok(None) => continue,
                Err(e) => {
                    // The context has not been touched, retry from the same block.
                    attempt += 1;
                    tracing::warn!(
                        "Failed to fetch blocks from {}: {:?}, attempt number {}",
                        from_block,
                        e,
                        attempt
                    );
                    if attempt > self.config.retries {
                        tracing::error!("Aborting after {} consecutive attempts", attempt);
                        return Err(ServiceError::MaxRetries);
                    }
                    continue;
                }
            };
            if let Some(end) = end_block {
                let fetched = batch.blocks.len();
                batch.blocks.retain(|b| b.height <= end);
                batch.is_head &= batch.blocks.len() == fetched;
            }
            let (Some(first), Some(last)) = (batch.blocks.first(), batch.blocks.last()) else {
                continue;
            };
            let (first, last) = (first.height, last.height);

            tracing::info!("Processing blocks from {} to {}", first, last);
            let start = std::time::Instant::now();
            if let Err(e) = ctx.process_batch(&batch).await {
                tracing::error!("Failed to process blocks from {} to {}: {:?}", first, last, e);
                return Err(e.into());
            }
            if let Some(validator) = &mut self.validator {
                validator.validate(&self.db, &batch.blocks).await?;
            }
            tracing::info!("process_batch completed in {:?}", start.elapsed());
            attempt = 0;
            from_block = last + 1;
        }
    }

    // Resume after the last processed block if there is one, otherwise start at
    // `starting_block`.
    async fn starting_block(&self, starting_block: Option<u64>) -> Result<u64, ServiceError> {
        let status = self.db.get::<ProcessorStatus>(ProcessorStatus::ID).await?;
        Ok(match status {
            Some(status) => status.height + 1,
            None => starting_block.unwrap_or(0),
        })
    }
}
