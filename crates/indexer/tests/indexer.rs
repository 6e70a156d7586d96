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

use std::{io::Write, time::Duration};

use alloy::primitives::{address, Address, B256, U256};
use lrt_points::{
    config::{PointCondition, OETH, STANDARD_CONDITION},
    entities::{address_id, ProcessorStatus, Recipient, Summary},
    events::DepositEvent,
    units::{eth, HOUR_MS},
    Block, EventKind, FindQuery, LedgerEvent, PointsConfig, Store,
};
use lrt_points_indexer::{
    test_utils::TestDb, Expectations, FileBlockSource, IndexerService, IndexerServiceConfig,
    ServiceError, ValidationError, Validator,
};
use tempfile::NamedTempFile;

const ALICE: Address = address!("00000000000000000000000000000000000a11ce");
const POOL: Address = address!("00000000000000000000000000000000000000aa");
const T0: u64 = 474_223 * HOUR_MS;

fn points_config() -> PointsConfig {
    let mut config = PointsConfig::mainnet(POOL);
    config.point_conditions = vec![PointCondition::new(STANDARD_CONDITION, 100)];
    config.referral_conditions.clear();
    config.balance_bonuses.clear();
    config.campaigns.clear();
    config.node_delegators.clear();
    config
}

fn block(height: u64, timestamp: u64, events: Vec<LedgerEvent>) -> Block {
    Block { height, hash: B256::repeat_byte(height as u8), timestamp, events }
}

fn deposit(id: &str, depositor: Address, amount: U256) -> LedgerEvent {
    LedgerEvent {
        id: id.into(),
        kind: EventKind::Deposit(DepositEvent {
            depositor,
            asset: OETH,
            deposit_amount: amount,
            mint_amount: amount,
            referral_code: None,
        }),
    }
}

fn append(feed: &mut NamedTempFile, blocks: &[Block]) {
    for block in blocks {
        writeln!(feed, "{}", serde_json::to_string(block).unwrap()).unwrap();
    }
}

async fn service(test_db: &TestDb, feed: &NamedTempFile) -> IndexerService<FileBlockSource> {
    let config =
        IndexerServiceConfig { interval: Duration::from_millis(1), retries: 2, batch_size: 2 };
    IndexerService::new(&test_db.db_url, FileBlockSource::new(feed.path()), points_config(), config)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_processes_feed_and_resumes() {
    let test_db = TestDb::new().await.unwrap();
    let mut feed = NamedTempFile::new().unwrap();
    append(
        &mut feed,
        &[
            block(1, T0, vec![deposit("d1", ALICE, eth(100))]),
            block(2, T0 + HOUR_MS, vec![]),
            block(3, T0 + 2 * HOUR_MS, vec![]),
        ],
    );

    service(&test_db, &feed).await.run(Some(1), Some(3)).await.unwrap();

    let db = &test_db.db;
    let status = db.get::<ProcessorStatus>(ProcessorStatus::ID).await.unwrap().unwrap();
    assert_eq!(status.height, 3);
    let alice = db.get::<Recipient>(&address_id(ALICE)).await.unwrap().unwrap();
    assert_eq!(alice.points, eth(2_000_000));

    // A new service picks up after the last processed block.
    append(&mut feed, &[block(4, T0 + 3 * HOUR_MS, vec![])]);
    service(&test_db, &feed).await.run(Some(1), Some(4)).await.unwrap();

    let alice = db.get::<Recipient>(&address_id(ALICE)).await.unwrap().unwrap();
    assert_eq!(alice.points, eth(3_000_000));
    let summaries = db.find::<Summary>(FindQuery::all()).await.unwrap();
    let heights: Vec<u64> = summaries.iter().map(|s| s.block_number).collect();
    assert_eq!(heights, vec![1, 2, 3, 4]);
}

#[tokio::test]
async fn test_validates_checkpoints() {
    let test_db = TestDb::new().await.unwrap();
    let mut feed = NamedTempFile::new().unwrap();
    append(
        &mut feed,
        &[
            block(1, T0, vec![deposit("d1", ALICE, eth(100))]),
            block(2, T0 + HOUR_MS, vec![]),
        ],
    );
    let expected = Summary {
        id: "0000000002-02020".to_string(),
        block_number: 2,
        timestamp: T0 + HOUR_MS,
        balance: eth(100),
        points: eth(1_000_000),
        el_points: U256::ZERO,
    };

    let validator = Validator::new(Expectations {
        summaries: vec![expected.clone()],
        recipient_history: vec![],
    });
    let mut indexer = service(&test_db, &feed).await.with_validator(validator);
    indexer.run(Some(1), Some(2)).await.unwrap();
    assert_eq!(indexer.validator.as_ref().unwrap().remaining(), 0);
}

#[tokio::test]
async fn test_mismatch_aborts() {
    let test_db = TestDb::new().await.unwrap();
    let mut feed = NamedTempFile::new().unwrap();
    append(
        &mut feed,
        &[
            block(1, T0, vec![deposit("d1", ALICE, eth(100))]),
            block(2, T0 + HOUR_MS, vec![]),
        ],
    );
    let wrong = Summary {
        id: "0000000002-02020".to_string(),
        block_number: 2,
        timestamp: T0 + HOUR_MS,
        balance: eth(100),
        points: eth(999_999),
        el_points: U256::ZERO,
    };

    let validator =
        Validator::new(Expectations { summaries: vec![wrong], recipient_history: vec![] });
    let err = service(&test_db, &feed)
        .await
        .with_validator(validator)
        .run(Some(1), Some(2))
        .await
        .unwrap_err();
    assert!(
        matches!(err, ServiceError::ValidationError(ValidationError::Mismatch { .. })),
        "{err:?}"
    );
}

#[tokio::test]
async fn test_unreadable_feed_exhausts_retries() {
    let test_db = TestDb::new().await.unwrap();
    let config =
        IndexerServiceConfig { interval: Duration::from_millis(1), retries: 2, batch_size: 2 };
    let mut indexer = IndexerService::new(
        &test_db.db_url,
        FileBlockSource::new("/nonexistent/blocks.ndjson"),
        points_config(),
        config,
    )
    .await
    .unwrap();

    let err = indexer.run(Some(1), Some(2)).await.unwrap_err();
    assert!(matches!(err, ServiceError::MaxRetries), "{err:?}");
}
