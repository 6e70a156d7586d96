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

use anyhow::Result;
use lrt_points_indexer::PointsDb;

use crate::el_points::{ElPointsClient, CACHE_TTL};

/// Application state containing the database connection and the EL points client
pub struct AppState {
    pub db: PointsDb,
    pub el_points: ElPointsClient,
}

impl AppState {
    pub async fn new(database_url: &str, el_points_url: &str) -> Result<Self> {
        tracing::info!("Connecting to database...");
        let db = PointsDb::new(database_url).await?;
        tracing::info!("Database connection established");

        Ok(Self { db, el_points: ElPointsClient::new(el_points_url, CACHE_TTL) })
    }
}
