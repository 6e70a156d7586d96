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

//! Durable entity store capability used by the ledger.
//!
//! Every entity kind lives in its own keyspace. Rows carry an optional parent id (the owning
//! recipient, node delegator or campaign) and an ordinal used for ordering.

mod memory;

pub use memory::{MemoryStore, MemoryTx};

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Entity {table}:{id} already exists")]
    Duplicate { table: &'static str, id: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store backend error: {0}")]
    Backend(String),
}

/// A persisted ledger row.
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Keyspace of this entity kind.
    const TABLE: &'static str;

    fn id(&self) -> String;

    /// Id of the owning entity, used by [FindQuery::parent].
    fn parent(&self) -> Option<String> {
        None
    }

    /// Ordering key, usually a block number.
    fn ordinal(&self) -> u64 {
        0
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// Filter, ordering and limit of a [Store::find].
///
/// Results are ordered by `(ordinal, id)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FindQuery {
    pub parent: Option<String>,
    pub order: SortOrder,
    pub limit: Option<u64>,
}

impl FindQuery {
    pub fn all() -> Self {
        Self::default()
    }

    /// The most recent rows first.
    pub fn latest() -> Self {
        Self { order: SortOrder::Desc, ..Self::default() }
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Get, find, insert, upsert and remove, per entity kind.
///
/// Implemented both by a store and by its open transactions so ledger code never needs to
/// know which one it is writing to.
#[async_trait]
pub trait Store: Send + Sync {
    async fn get<E: Entity>(&self, id: &str) -> Result<Option<E>, StoreError>;

    async fn find<E: Entity>(&self, query: FindQuery) -> Result<Vec<E>, StoreError>;

    async fn find_one<E: Entity>(&self, query: FindQuery) -> Result<Option<E>, StoreError> {
        Ok(self.find(query.with_limit(1)).await?.into_iter().next())
    }

    /// Fails with [StoreError::Duplicate] if any id already exists.
    async fn insert<E: Entity>(&self, entities: &[E]) -> Result<(), StoreError>;

    async fn upsert<E: Entity>(&self, entities: &[E]) -> Result<(), StoreError>;

    /// Missing ids are ignored.
    async fn remove<E: Entity>(&self, ids: &[String]) -> Result<(), StoreError>;
}

/// A store able to group writes in an atomic unit.
#[async_trait]
pub trait TransactionalStore: Store {
    type Tx: StoreTransaction;

    async fn begin(&self) -> Result<Self::Tx, StoreError>;
}

#[async_trait]
pub trait StoreTransaction: Store + Sized {
    /// Makes every write of the transaction visible at once.
    async fn commit(self) -> Result<(), StoreError>;
}
