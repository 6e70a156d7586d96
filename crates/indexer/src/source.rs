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

//! Ordered block feeds.

use std::path::PathBuf;

use async_trait::async_trait;
use lrt_points::{Block, BlockBatch};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Failed to read block feed {path}: {source}")]
    Io { path: PathBuf, source: std::io::Error },

    #[error("Malformed block on line {line}: {source}")]
    Parse { line: usize, source: serde_json::Error },

    #[error("Block {height} follows block {previous}")]
    OutOfOrder { height: u64, previous: u64 },
}

/// Delivers decoded blocks in height order.
#[async_trait]
pub trait BlockSource: Send {
    /// Returns up to `max_blocks` blocks at or above `from_height`, or `None` if there are
    /// none yet. The batch is flagged as head when it ends at the latest known block.
    async fn next_batch(
        &mut self,
        from_height: u64,
        max_blocks: usize,
    ) -> Result<Option<BlockBatch>, SourceError>;
}

/// Reads blocks from a newline delimited JSON file, one [Block] per line.
///
/// The file is re-read on every call so a feed that is appended to is picked up.
#[derive(Debug, Clone)]
pub struct FileBlockSource {
    path: PathBuf,
}

impl FileBlockSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn read_blocks(&self) -> Result<Vec<Block>, SourceError> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| SourceError::Io { path: self.path.clone(), source })?;
        parse_blocks(&content)
    }
}

/// Parses newline delimited blocks, skipping blank lines.
pub fn parse_blocks(content: &str) -> Result<Vec<Block>, SourceError> {
    let mut blocks: Vec<Block> = vec![];
    for (index, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let block: Block = serde_json::from_str(line)
            .map_err(|source| SourceError::Parse { line: index + 1, source })?;
        if let Some(previous) = blocks.last() {
            if block.height <= previous.height {
                return Err(SourceError::OutOfOrder {
                    height: block.height,
                    previous: previous.height,
                });
            }
        }
        blocks.push(block);
    }
    Ok(blocks)
}

#[async_trait]
impl BlockSource for FileBlockSource {
    async fn next_batch(
        &mut self,
        from_height: u64,
        max_blocks: usize,
    ) -> Result<Option<BlockBatch>, SourceError> {
        let blocks = self.read_blocks().await?;
        let Some(latest) = blocks.last().map(|b| b.height) else {
            return Ok(None);
        };
        let batch: Vec<Block> =
            blocks.into_iter().filter(|b| b.height >= from_height).take(max_blocks).collect();
        if batch.is_empty() {
            return Ok(None);
        }
        let is_head = batch.last().is_some_and(|b| b.height == latest);
        Ok(Some(BlockBatch { blocks: batch, is_head }))
    }
}
