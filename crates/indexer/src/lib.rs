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

pub mod db;
pub mod service;
pub mod source;
pub mod test_utils;
pub mod validate;

pub use db::{DbError, PointsDb, PointsDbTx};
pub use service::{IndexerService, IndexerServiceConfig, ServiceError};
pub use source::{BlockSource, FileBlockSource, SourceError};
pub use validate::{Expectations, ValidationError, Validator};
