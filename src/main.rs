use std::path::PathBuf;
use std::process;

use anyhow::Context;
use clap::Parser;
use tokio::io::AsyncReadExt;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

mod config;
use config::BuildEnv;

mod github;
use github::GitHubClient;

mod input;
use input::Payload;

mod reconcile;

mod version;

/// `out` half of a Concourse resource that points GitHub webhooks at
/// pipeline resource check endpoints
#[derive(Parser)]
#[command(version)]
struct Opts {
    /// Build directory provided by Concourse, unused by this resource
    destination: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    // stdout carries the version object, so all diagnostics go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run().await {
        error!("put failed: {:#}", err);
        process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let opts = Opts::parse();
    if let Some(destination) = &opts.destination {
        debug!("ignoring destination directory {}", destination.display());
    }

    let mut raw = String::new();
    tokio::io::stdin()
        .read_to_string(&mut raw)
        .await
        .context("couldn't read put request from stdin")?;
    let payload: Payload =
        serde_json::from_str(&raw).context("couldn't parse put request payload")?;

    let request = input::validate(payload, BuildEnv::from_env())?;
    let client = GitHubClient::new(
        &request.github_api,
        &request.github_token,
        &request.org,
        &request.repo,
    )?;
    let id = reconcile::reconcile(&client, &request).await?;
    version::emit(&id)
}
