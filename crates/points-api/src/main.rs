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

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use lrt_points_api::{create_app, el_points::DEFAULT_EL_POINTS_URL, AppState};

/// Arguments of the points API.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct MainArgs {
    /// DB connection string.
    #[clap(long, env = "DATABASE_URL")]
    db: String,
    /// Port to listen on.
    #[clap(long, env, default_value = "3000")]
    port: u16,
    /// Upstream endpoint reporting the protocol wide EL points.
    #[clap(long, env, default_value = DEFAULT_EL_POINTS_URL)]
    el_points_url: String,
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

    tracing::info!("Starting points-api");
    let state = AppState::new(&args.db, &args.el_points_url).await?;
    let app = create_app(Arc::new(state));

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", args.port)).await?;
    tracing::info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
