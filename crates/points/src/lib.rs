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

//! Points ledger for liquid restaking token holders.
//!
//! Holders accrue points per balance lot under time windowed multiplier rules, share a
//! portion with their referrers, and receive EL points earned by the protocol's node
//! delegators, optionally boosted by budget capped campaigns.

pub mod accrual;
pub mod cache;
pub mod campaigns;
pub mod config;
pub mod context;
pub mod el_points;
pub mod entities;
pub mod error;
pub mod events;
pub mod ledger;
pub mod processor;
pub mod referrals;
pub mod resolve;
pub mod store;
pub mod swap;
pub mod units;

pub use config::PointsConfig;
pub use context::{Acquisition, LedgerContext};
pub use error::LedgerError;
pub use events::{Block, BlockBatch, EventKind, LedgerEvent};
pub use store::{Entity, FindQuery, MemoryStore, Store, StoreError, TransactionalStore};
