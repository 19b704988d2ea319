// Copyright 2024 SAP SE
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

#![warn(clippy::pedantic)]

mod executor;
mod hook_config;
mod images;
mod push_event;
mod server;
mod util;

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use clap::builder::NonEmptyStringValueParser;
use clap::{CommandFactory, Parser};
use executor::ProcessRunner;
use server::AppState;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Runs configured commands when a registry reports a push of an image tag
#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Configuration file to read from
    #[arg(long)]
    conf: Option<String>,

    /// HTTP address to listen on
    #[arg(long, default_value = ":8080", value_parser = NonEmptyStringValueParser::new())]
    http: String,
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let cli = Cli::parse_from(util::long_flags(std::env::args_os()));

    let Some(conf) = cli.conf.filter(|conf| !conf.is_empty()) else {
        eprint!("{}", Cli::command().render_help());
        return Ok(());
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let images = hook_config::load(Path::new(&conf))?;
    let state = Arc::new(AppState {
        images,
        runner: ProcessRunner,
    });
    let app = server::router(state).context("while registering hooks")?;

    let addr = util::listen_addr(&cli.http);
    let listener = TcpListener::bind(addr.as_str())
        .await
        .with_context(|| format!("cannot listen on {addr}"))?;
    info!("Serving on {}", cli.http);
    axum::serve(listener, app).await.context("while serving http")?;

    Ok(())
}
