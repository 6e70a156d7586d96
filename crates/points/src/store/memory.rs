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

use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{Entity, FindQuery, SortOrder, Store, StoreError, StoreTransaction, TransactionalStore};

#[derive(Debug, Clone)]
struct Row {
    parent: Option<String>,
    ordinal: u64,
    data: serde_json::Value,
}

type Tables = HashMap<&'static str, BTreeMap<String, Row>>;

/// In-memory [Store]. Rows are kept as JSON so they round trip exactly like a durable store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows of an entity kind.
    pub async fn count<E: Entity>(&self) -> usize {
        self.tables.read().await.get(E::TABLE).map(|t| t.len()).unwrap_or(0)
    }
}

/// Writes staged against a snapshot of the store, swapped in on commit.
///
/// Only one transaction may be open at a time.
#[derive(Debug)]
pub struct MemoryTx {
    store: MemoryStore,
    staged: RwLock<Tables>,
}

fn get_row<E: Entity>(tables: &Tables, id: &str) -> Result<Option<E>, StoreError> {
    tables
        .get(E::TABLE)
        .and_then(|t| t.get(id))
        .map(|row| serde_json::from_value(row.data.clone()))
        .transpose()
        .map_err(StoreError::from)
}

fn find_rows<E: Entity>(tables: &Tables, query: &FindQuery) -> Result<Vec<E>, StoreError> {
    let Some(table) = tables.get(E::TABLE) else {
        return Ok(vec![]);
    };
    let mut rows: Vec<(&String, &Row)> = table
        .iter()
        .filter(|(_, row)| query.parent.is_none() || row.parent == query.parent)
        .collect();
    rows.sort_by(|a, b| (a.1.ordinal, a.0).cmp(&(b.1.ordinal, b.0)));
    if query.order == SortOrder::Desc {
        rows.reverse();
    }
    let limit = query.limit.map(|l| l as usize).unwrap_or(usize::MAX);
    rows.into_iter()
        .take(limit)
        .map(|(_, row)| serde_json::from_value(row.data.clone()).map_err(StoreError::from))
        .collect()
}

fn to_row<E: Entity>(entity: &E) -> Result<Row, StoreError> {
    Ok(Row {
        parent: entity.parent(),
        ordinal: entity.ordinal(),
        data: serde_json::to_value(entity)?,
    })
}

fn insert_rows<E: Entity>(tables: &mut Tables, entities: &[E]) -> Result<(), StoreError> {
    let table = tables.entry(E::TABLE).or_default();
    for entity in entities {
        if table.contains_key(&entity.id()) {
            return Err(StoreError::Duplicate { table: E::TABLE, id: entity.id() });
        }
    }
    for entity in entities {
        table.insert(entity.id(), to_row(entity)?);
    }
    Ok(())
}

fn upsert_rows<E: Entity>(tables: &mut Tables, entities: &[E]) -> Result<(), StoreError> {
    let table = tables.entry(E::TABLE).or_default();
    for entity in entities {
        table.insert(entity.id(), to_row(entity)?);
    }
    Ok(())
}

fn remove_rows<E: Entity>(tables: &mut Tables, ids: &[String]) {
    if let Some(table) = tables.get_mut(E::TABLE) {
        for id in ids {
            table.remove(id);
        }
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn get<E: Entity>(&self, id: &str) -> Result<Option<E>, StoreError> {
        get_row(&*self.tables.read().await, id)
    }

    async fn find<E: Entity>(&self, query: FindQuery) -> Result<Vec<E>, StoreError> {
        find_rows(&*self.tables.read().await, &query)
    }

    async fn insert<E: Entity>(&self, entities: &[E]) -> Result<(), StoreError> {
        insert_rows(&mut *self.tables.write().await, entities)
    }

    async fn upsert<E: Entity>(&self, entities: &[E]) -> Result<(), StoreError> {
        upsert_rows(&mut *self.tables.write().await, entities)
    }

    async fn remove<E: Entity>(&self, ids: &[String]) -> Result<(), StoreError> {
        remove_rows::<E>(&mut *self.tables.write().await, ids);
        Ok(())
    }
}

#[async_trait]
impl TransactionalStore for MemoryStore {
    type Tx = MemoryTx;

    async fn begin(&self) -> Result<MemoryTx, StoreError> {
        let snapshot = self.tables.read().await.clone();
        Ok(MemoryTx { store: self.clone(), staged: RwLock::new(snapshot) })
    }
}

#[async_trait]
impl Store for MemoryTx {
    async fn get<E: Entity>(&self, id: &str) -> Result<Option<E>, StoreError> {
        get_row(&*self.staged.read().await, id)
    }

    async fn find<E: Entity>(&self, query: FindQuery) -> Result<Vec<E>, StoreError> {
        find_rows(&*self.staged.read().await, &query)
    }

    async fn insert<E: Entity>(&self, entities: &[E]) -> Result<(), StoreError> {
        insert_rows(&mut *self.staged.write().await, entities)
    }

    async fn upsert<E: Entity>(&self, entities: &[E]) -> Result<(), StoreError> {
        upsert_rows(&mut *self.staged.write().await, entities)
    }

    async fn remove<E: Entity>(&self, ids: &[String]) -> Result<(), StoreError> {
        remove_rows::<E>(&mut *self.staged.write().await, ids);
        Ok(())
    }
}

#[async_trait]
impl StoreTransaction for MemoryTx {
    async fn commit(self) -> Result<(), StoreError> {
        *self.store.tables.write().await = self.staged.into_inner();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Item {
        id: String,
        owner: String,
        block: u64,
    }

    impl Entity for Item {
        const TABLE: &'static str = "items";

        fn id(&self) -> String {
            self.id.clone()
        }

        fn parent(&self) -> Option<String> {
            Some(self.owner.clone())
        }

        fn ordinal(&self) -> u64 {
            self.block
        }
    }

    fn item(id: &str, owner: &str, block: u64) -> Item {
        Item { id: id.into(), owner: owner.into(), block }
    }

    #[tokio::test]
    async fn test_find_orders_by_ordinal_then_id() {
        let store = MemoryStore::new();
        store.upsert(&[item("9:a", "a", 9), item("10:a", "a", 10), item("10:b", "b", 10)]).await.unwrap();

        let latest: Option<Item> = store.find_one(FindQuery::latest().with_parent("a")).await.unwrap();
        assert_eq!(latest, Some(item("10:a", "a", 10)));

        let all: Vec<Item> = store.find(FindQuery::all()).await.unwrap();
        let ids: Vec<_> = all.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["9:a", "10:a", "10:b"]);
    }

    #[tokio::test]
    async fn test_insert_rejects_existing_id() {
        let store = MemoryStore::new();
        store.insert(&[item("1", "a", 1)]).await.unwrap();
        let err = store.insert(&[item("2", "a", 2), item("1", "a", 1)]).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate { table: "items", .. }));
        // Nothing from the failed batch was written.
        assert_eq!(store.count::<Item>().await, 1);
    }

    #[tokio::test]
    async fn test_transaction_is_invisible_until_commit() {
        let store = MemoryStore::new();
        let tx = store.begin().await.unwrap();
        tx.upsert(&[item("1", "a", 1)]).await.unwrap();
        assert!(store.get::<Item>("1").await.unwrap().is_none());
        assert!(tx.get::<Item>("1").await.unwrap().is_some());

        tx.commit().await.unwrap();
        assert!(store.get::<Item>("1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_dropped_transaction_discards_writes() {
        let store = MemoryStore::new();
        {
            let tx = store.begin().await.unwrap();
            tx.upsert(&[item("1", "a", 1)]).await.unwrap();
            tx.remove::<Item>(&["missing".to_string()]).await.unwrap();
        }
        assert_eq!(store.count::<Item>().await, 0);
    }
}
