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

use std::collections::{hash_map::Entry, HashMap};

use crate::store::{Entity, Store, StoreError};

/// Write-through cache of entities keyed by id.
///
/// Lookups consult the cache before the store. Every mutation happens on the cached
/// instance, which the owner persists when it flushes.
#[derive(Debug, Clone)]
pub struct EntityCache<E> {
    entries: HashMap<String, E>,
}

impl<E> Default for EntityCache<E> {
    fn default() -> Self {
        Self { entries: HashMap::new() }
    }
}

impl<E: Entity> EntityCache<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached entity, loading it from `store` or creating it on a miss.
    pub async fn get_or_load<S: Store>(
        &mut self,
        store: &S,
        id: &str,
        create: impl FnOnce() -> E,
    ) -> Result<&mut E, StoreError> {
        match self.entries.entry(id.to_string()) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let entity = store.get::<E>(id).await?.unwrap_or_else(create);
                Ok(entry.insert(entity))
            }
        }
    }

    /// Like [EntityCache::get_or_load] without creating missing entities.
    pub async fn load<S: Store>(
        &mut self,
        store: &S,
        id: &str,
    ) -> Result<Option<&mut E>, StoreError> {
        match self.entries.entry(id.to_string()) {
            Entry::Occupied(entry) => Ok(Some(entry.into_mut())),
            Entry::Vacant(entry) => match store.get::<E>(id).await? {
                Some(entity) => Ok(Some(entry.insert(entity))),
                None => Ok(None),
            },
        }
    }

    pub fn get(&self, id: &str) -> Option<&E> {
        self.entries.get(id)
    }

    pub fn retain(&mut self, mut keep: impl FnMut(&E) -> bool) {
        self.entries.retain(|_, entity| keep(entity));
    }

    pub fn values(&self) -> impl Iterator<Item = &E> {
        self.entries.values()
    }
}
