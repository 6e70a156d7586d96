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

use std::{path::PathBuf, time::Duration};

use alloy::primitives::Address;
use anyhow::{bail, Result};
use clap::Parser;
use lrt_points::{config::START_BLOCK, PointsConfig};
use lrt_points_indexer::{FileBlockSource, IndexerService, IndexerServiceConfig, Validator};

/// Arguments of the points indexer.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct MainArgs {
    /// DB connection string.
    #[clap(long, env = "DATABASE_URL")]
    db: String,
    /// Newline delimited JSON file of decoded blocks.
    #[clap(long, env = "POINTS_FEED")]
    feed: PathBuf,
    /// Address of the pool whose swaps count as acquisitions.
    #[clap(long, env)]
    swap_pool_address: Address,
    /// Starting block number, used when the database has no processed block yet.
    #[clap(long)]
    start_block: Option<u64>,
    /// Ending block number (if set, indexer will process up to this block and exit).
    #[clap(long)]
    end_block: Option<u64>,
    /// Interval in seconds between checking for new blocks.
    #[clap(long, default_value = "3")]
    interval: u64,
    /// Number of retries before quitting after an error.
    #[clap(long, default_value = "10")]
    retries: u32,
    /// Number of blocks to process in each batch.
    #[clap(long, default_value = "500")]
    batch_size: usize,
    /// Optional JSON file of checkpoint rows to validate while processing.
    #[clap(long, env)]
    expectations: Option<PathBuf>,
    /// Whether to log in JSON format.
    #[clap(long, env, default_value_t = false)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = MainArgs::parse();

    if args.log_json {
        tracing_subscriber::fmt()
            .with_ansi(false)
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .init();
    }

    let config = IndexerServiceConfig {
        interval: Duration::from_secs(args.interval),
        retries: args.retries,
        batch_size: args.batch_size,
    };

    let mut indexer_service = IndexerService::new(
        &args.db,
        FileBlockSource::new(args.feed),
        PointsConfig::mainnet(args.swap_pool_address),
        config,
    )
    .await?;

    if let Some(path) = &args.expectations {
        // Validation only makes sense for a replay from the deployment block.
        if args.start_block.is_some_and(|block| block != START_BLOCK) {
            bail!("--expectations requires replaying from block {START_BLOCK}");
        }
        tracing::info!("Validating against {}", path.display());
        indexer_service = indexer_service.with_validator(Validator::from_file(path).await?);
    }

    let start_block = args.start_block.or(Some(START_BLOCK));
    if let Err(err) = indexer_service.run(start_block, args.end_block).await {
        bail!("FATAL: Error running the indexer: {err}");
    }
    tracing::info!("Indexer completed successfully");

    Ok(())
}
