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

//! Replay validation against known good checkpoint rows.

use std::{collections::VecDeque, fmt::Debug, path::Path};

use lrt_points::{
    entities::{RecipientHistory, Summary},
    Block, Entity, Store, StoreError,
};
use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Failed to read expectations: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed expectations: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Expected entity does not exist: Entity={table} id={id}")]
    Missing { table: &'static str, id: String },

    #[error("Entity={table} id={id} differs, expected {expected} got {actual}")]
    Mismatch { table: &'static str, id: String, expected: String, actual: String },

    #[error("Something is missing: Entity={table} expected block {expected} before block {height}")]
    Skipped { table: &'static str, expected: u64, height: u64 },
}

/// Expectation rows, as the ledger stores them.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expectations {
    #[serde(default)]
    pub summaries: Vec<Summary>,
    #[serde(default)]
    pub recipient_history: Vec<RecipientHistory>,
}

/// Checks checkpoint rows as their blocks are processed.
///
/// Expectations are consumed in block order. On the first block every expectation before it
/// is checked too; afterwards an expectation for a block that was never processed is fatal.
pub struct Validator {
    summaries: VecDeque<Summary>,
    history: VecDeque<RecipientHistory>,
    first_block: bool,
}

impl Validator {
    pub fn new(expectations: Expectations) -> Self {
        let mut summaries = expectations.summaries;
        summaries.sort_by_key(|s| s.block_number);
        let mut history = expectations.recipient_history;
        history.sort_by_key(|h| h.block_number);
        Self { summaries: summaries.into(), history: history.into(), first_block: true }
    }

    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, ValidationError> {
        let content = tokio::fs::read_to_string(path).await?;
        Ok(Self::new(serde_json::from_str(&content)?))
    }

    /// Expectations not yet checked.
    pub fn remaining(&self) -> usize {
        self.summaries.len() + self.history.len()
    }

    /// Validates the expectations of `blocks`, which must have been committed to `store`.
    pub async fn validate<S: Store>(
        &mut self,
        store: &S,
        blocks: &[Block],
    ) -> Result<(), ValidationError> {
        for block in blocks {
            check_block(store, &mut self.summaries, block.height, self.first_block).await?;
            check_block(store, &mut self.history, block.height, self.first_block).await?;
            self.first_block = false;
        }
        Ok(())
    }
}

async fn check_block<S: Store, E: Entity + PartialEq + Debug>(
    store: &S,
    expectations: &mut VecDeque<E>,
    height: u64,
    first_block: bool,
) -> Result<(), ValidationError> {
    if first_block {
        while expectations.front().is_some_and(|e| e.ordinal() < height) {
            if let Some(expected) = expectations.pop_front() {
                check_expectation(store, &expected).await?;
            }
        }
    }
    if let Some(expected) = expectations.front().filter(|e| e.ordinal() < height) {
        return Err(ValidationError::Skipped {
            table: E::TABLE,
            expected: expected.ordinal(),
            height,
        });
    }
    while expectations.front().is_some_and(|e| e.ordinal() == height) {
        if let Some(expected) = expectations.pop_front() {
            check_expectation(store, &expected).await?;
        }
    }
    Ok(())
}

async fn check_expectation<S: Store, E: Entity + PartialEq + Debug>(
    store: &S,
    expected: &E,
) -> Result<(), ValidationError> {
    let id = expected.id();
    let Some(actual) = store.get::<E>(&id).await? else {
        return Err(ValidationError::Missing { table: E::TABLE, id });
    };
    if &actual != expected {
        return Err(ValidationError::Mismatch {
            table: E::TABLE,
            id,
            expected: format!("{expected:?}"),
            actual: format!("{actual:?}"),
        });
    }
    tracing::info!("Validated entity: Entity={} id={}", E::TABLE, id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use alloy::primitives::{B256, U256};
    use lrt_points::MemoryStore;
    use tracing_test::traced_test;

    use super::*;

    fn summary(block_number: u64) -> Summary {
        Summary {
            id: format!("{block_number:010}-00000"),
            block_number,
            timestamp: block_number,
            balance: U256::from(block_number),
            points: U256::ZERO,
            el_points: U256::ZERO,
        }
    }

    fn block(height: u64) -> Block {
        Block { height, hash: B256::ZERO, timestamp: height, events: vec![] }
    }

    fn validator(summaries: Vec<Summary>) -> Validator {
        Validator::new(Expectations { summaries, recipient_history: vec![] })
    }

    #[tokio::test]
    #[traced_test]
    async fn test_checks_earlier_rows_on_first_block() {
        let store = MemoryStore::new();
        store.insert(&[summary(5), summary(8)]).await.unwrap();

        let mut validator = validator(vec![summary(8), summary(5)]);
        validator.validate(&store, &[block(7)]).await.unwrap();
        assert_eq!(validator.remaining(), 1);
        assert!(logs_contain("Validated entity: Entity=summaries id=0000000005-00000"));
        validator.validate(&store, &[block(8), block(9)]).await.unwrap();
        assert_eq!(validator.remaining(), 0);
    }

    #[tokio::test]
    async fn test_skipped_block_is_fatal() {
        let store = MemoryStore::new();
        let mut validator = validator(vec![summary(8)]);
        validator.validate(&store, &[block(7)]).await.unwrap();
        let err = validator.validate(&store, &[block(9)]).await.unwrap_err();
        assert!(matches!(err, ValidationError::Skipped { expected: 8, height: 9, .. }));
    }

    #[tokio::test]
    async fn test_missing_and_mismatched_rows() {
        let store = MemoryStore::new();
        let err = validator(vec![summary(3)]).validate(&store, &[block(3)]).await.unwrap_err();
        assert!(matches!(err, ValidationError::Missing { table: "summaries", .. }));

        let mut stored = summary(3);
        stored.points = U256::from(1);
        store.insert(&[stored]).await.unwrap();
        let err = validator(vec![summary(3)]).validate(&store, &[block(3)]).await.unwrap_err();
        assert!(matches!(err, ValidationError::Mismatch { .. }));
    }

    #[test]
    fn test_expectations_json() {
        let json = r#"{
            "summaries": [{
                "id": "0019145906-9a91c",
                "block_number": 19145906,
                "timestamp": 1706940011000,
                "balance": "20690928672687557",
                "points": "0",
                "el_points": "0"
            }]
        }"#;
        let expectations: Expectations = serde_json::from_str(json).unwrap();
        assert_eq!(expectations.summaries[0].balance, U256::from(20_690_928_672_687_557u64));
        assert!(expectations.recipient_history.is_empty());
    }
}
