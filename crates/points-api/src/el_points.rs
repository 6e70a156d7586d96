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

//! Protocol wide EL points reported by EigenLayer.

use std::{str::FromStr, time::Duration};

use alloy::primitives::U256;
use anyhow::{Context, Result};
use moka::future::Cache;
use serde_json::Value;
use tokio::sync::RwLock;

/// Restaking points and native staking summary of the zero address, which EigenLayer
/// answers with protocol wide totals.
pub const DEFAULT_EL_POINTS_URL: &str = "https://app.eigenlayer.xyz/api/trpc/tokenStaking.getRestakingPoints,nativeStaking.getNativeStakingSummaryByEigenpod?batch=1&input=%7B%220%22%3A%7B%22json%22%3A%7B%22staker%22%3A%220x0000000000000000000000000000000000000000%22%7D%7D%2C%221%22%3A%7B%22json%22%3A%7B%22podOwnerAddress%22%3A%220x0000000000000000000000000000000000000000%22%7D%7D%7D";

pub const CACHE_TTL: Duration = Duration::from_secs(300);

const SECONDS_PER_HOUR: u64 = 3600;
const WEI_PER_POINT: f64 = 1e18;

/// Cached client for the upstream EL points total.
pub struct ElPointsClient {
    http: reqwest::Client,
    url: String,
    cache: Cache<(), U256>,
    /// Outlives cache expiry so a failed refresh can fall back to it.
    last_known: RwLock<Option<U256>>,
}

impl ElPointsClient {
    pub fn new(url: impl Into<String>, ttl: Duration) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: url.into(),
            cache: Cache::builder().max_capacity(1).time_to_live(ttl).build(),
            last_known: RwLock::new(None),
        }
    }

    /// Total EL points with 18 decimals.
    ///
    /// Served from cache while fresh. When a refresh fails the last known total is served,
    /// or zero if there is none.
    pub async fn total(&self) -> U256 {
        // Concurrent calls on an empty or expired cache coalesce into a single fetch.
        // https://docs.rs/moka/latest/moka/future/struct.Cache.html#concurrent-calls-on-the-same-key
        match self.cache.try_get_with((), self.fetch()).await {
            Ok(total) => total,
            Err(err) => {
                tracing::warn!("Failed to fetch EL points from {}: {:?}", self.url, err);
                self.last_known.read().await.unwrap_or_default()
            }
        }
    }

    async fn fetch(&self) -> Result<U256> {
        let body: Value = self
            .http
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
            .context("Invalid EL points response")?;
        let total = parse_total(&body)?;
        *self.last_known.write().await = Some(total);
        Ok(total)
    }
}

/// Sums the restaking points of every strategy, one point per share-hour, and the native
/// staking points.
pub fn parse_total(body: &Value) -> Result<U256> {
    let strategies = body
        .pointer("/0/result/data/json")
        .and_then(Value::as_array)
        .context("Missing restaking strategies")?;
    let mut total = U256::ZERO;
    for strategy in strategies {
        let shares = match strategy.get("totalIntegratedShares") {
            Some(Value::String(shares)) => U256::from_str(shares)?,
            Some(Value::Number(shares)) => {
                U256::from(shares.as_u64().context("Fractional share count")?)
            }
            _ => U256::ZERO,
        };
        total += shares / U256::from(SECONDS_PER_HOUR);
    }

    let native = body
        .pointer("/1/result/data/json/globalStats/points")
        .and_then(Value::as_f64)
        .unwrap_or_default();
    total += U256::from((native * WEI_PER_POINT) as u128);
    Ok(total)
}
