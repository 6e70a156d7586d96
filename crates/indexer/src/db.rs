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

//! SQL backed [Store] over the sqlx `Any` driver, so the same code runs on SQLite and
//! Postgres.

use async_trait::async_trait;
use lrt_points::{
    store::{SortOrder, StoreTransaction},
    Entity, FindQuery, Store, StoreError, TransactionalStore,
};
use sqlx::{
    any::AnyPoolOptions,
    AnyConnection,
    Any, AnyPool, Row, Transaction,
};
use thiserror::Error;
use tokio::sync::Mutex;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQL error {0:?}")]
    SqlErr(#[from] sqlx::Error),

    #[error("SQL Migration error {0:?}")]
    MigrateErr(#[from] sqlx::migrate::MigrateError),
}

/// Ledger store backed by a SQL database.
#[derive(Clone)]
pub struct PointsDb {
    pool: AnyPool,
}

impl PointsDb {
    pub async fn new(database_url: &str) -> Result<Self, DbError> {
        sqlx::any::install_default_drivers();
        let pool = AnyPoolOptions::new().max_connections(5).connect(database_url).await?;

        // Run migrations
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }
}

/// An open database transaction. Writes become visible on [StoreTransaction::commit] and are
/// rolled back if it is dropped first.
pub struct PointsDbTx {
    tx: Mutex<Transaction<'static, Any>>,
}

fn backend(err: sqlx::Error) -> StoreError {
    StoreError::Backend(err.to_string())
}

fn decode<E: Entity>(data: &str) -> Result<E, StoreError> {
    Ok(serde_json::from_str(data)?)
}

async fn get_row<E: Entity>(conn: &mut AnyConnection, id: &str) -> Result<Option<E>, StoreError> {
    let sql = format!("SELECT data FROM {} WHERE id = $1", E::TABLE);
    let row = sqlx::query(&sql).bind(id).fetch_optional(&mut *conn).await.map_err(backend)?;
    match row {
        Some(row) => Ok(Some(decode(&row.try_get::<String, _>("data").map_err(backend)?)?)),
        None => Ok(None),
    }
}

async fn find_rows<E: Entity>(
    conn: &mut AnyConnection,
    query: &FindQuery,
) -> Result<Vec<E>, StoreError> {
    let mut sql = format!("SELECT data FROM {}", E::TABLE);
    if query.parent.is_some() {
        sql.push_str(" WHERE parent = $1");
    }
    match query.order {
        SortOrder::Asc => sql.push_str(" ORDER BY ordinal ASC, id ASC"),
        SortOrder::Desc => sql.push_str(" ORDER BY ordinal DESC, id DESC"),
    }
    if let Some(limit) = query.limit {
        sql.push_str(&format!(" LIMIT {limit}"));
    }

    let mut select = sqlx::query(&sql);
    if let Some(parent) = &query.parent {
        select = select.bind(parent.clone());
    }
    let rows = select.fetch_all(&mut *conn).await.map_err(backend)?;
    rows.iter()
        .map(|row| decode(&row.try_get::<String, _>("data").map_err(backend)?))
        .collect()
}

async fn write_rows<E: Entity>(
    conn: &mut AnyConnection,
    entities: &[E],
    on_conflict_update: bool,
) -> Result<(), StoreError> {
    let mut sql =
        format!("INSERT INTO {} (id, parent, ordinal, data) VALUES ($1, $2, $3, $4)", E::TABLE);
    if on_conflict_update {
        sql.push_str(
            " ON CONFLICT (id) DO UPDATE SET \
             parent = EXCLUDED.parent, ordinal = EXCLUDED.ordinal, data = EXCLUDED.data",
        );
    }
    for entity in entities {
        let id = entity.id();
        let result = sqlx::query(&sql)
            .bind(id.clone())
            .bind(entity.parent())
            .bind(entity.ordinal() as i64)
            .bind(serde_json::to_string(entity)?)
            .execute(&mut *conn)
            .await;
        match result {
            Ok(_) => {}
            Err(sqlx::Error::Database(err)) if err.is_unique_violation() => {
                return Err(StoreError::Duplicate { table: E::TABLE, id });
            }
            Err(err) => return Err(backend(err)),
        }
    }
    Ok(())
}

async fn remove_rows<E: Entity>(
    conn: &mut AnyConnection,
    ids: &[String],
) -> Result<(), StoreError> {
    let sql = format!("DELETE FROM {} WHERE id = $1", E::TABLE);
    for id in ids {
        sqlx::query(&sql).bind(id.clone()).execute(&mut *conn).await.map_err(backend)?;
    }
    Ok(())
}

#[async_trait]
impl Store for PointsDb {
    async fn get<E: Entity>(&self, id: &str) -> Result<Option<E>, StoreError> {
        let mut conn = self.pool.acquire().await.map_err(backend)?;
        get_row(&mut conn, id).await
    }

    async fn find<E: Entity>(&self, query: FindQuery) -> Result<Vec<E>, StoreError> {
        let mut conn = self.pool.acquire().await.map_err(backend)?;
        find_rows(&mut conn, &query).await
    }

    async fn insert<E: Entity>(&self, entities: &[E]) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await.map_err(backend)?;
        write_rows(&mut tx, entities, false).await?;
        tx.commit().await.map_err(backend)
    }

    async fn upsert<E: Entity>(&self, entities: &[E]) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await.map_err(backend)?;
        write_rows(&mut tx, entities, true).await?;
        tx.commit().await.map_err(backend)
    }

    async fn remove<E: Entity>(&self, ids: &[String]) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await.map_err(backend)?;
        remove_rows::<E>(&mut tx, ids).await?;
        tx.commit().await.map_err(backend)
    }
}

#[async_trait]
impl TransactionalStore for PointsDb {
    type Tx = PointsDbTx;

    async fn begin(&self) -> Result<PointsDbTx, StoreError> {
        let tx = self.pool.begin().await.map_err(backend)?;
        Ok(PointsDbTx { tx: Mutex::new(tx) })
    }
}

#[async_trait]
impl Store for PointsDbTx {
    async fn get<E: Entity>(&self, id: &str) -> Result<Option<E>, StoreError> {
        get_row(&mut **self.tx.lock().await, id).await
    }

    async fn find<E: Entity>(&self, query: FindQuery) -> Result<Vec<E>, StoreError> {
        find_rows(&mut **self.tx.lock().await, &query).await
    }

    async fn insert<E: Entity>(&self, entities: &[E]) -> Result<(), StoreError> {
        write_rows(&mut **self.tx.lock().await, entities, false).await
    }

    async fn upsert<E: Entity>(&self, entities: &[E]) -> Result<(), StoreError> {
        write_rows(&mut **self.tx.lock().await, entities, true).await
    }

    async fn remove<E: Entity>(&self, ids: &[String]) -> Result<(), StoreError> {
        remove_rows::<E>(&mut **self.tx.lock().await, ids).await
    }
}

#[async_trait]
impl StoreTransaction for PointsDbTx {
    async fn commit(self) -> Result<(), StoreError> {
        self.tx.into_inner().commit().await.map_err(backend)
    }
}
