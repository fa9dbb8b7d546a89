//! # WordPress → Appwrite article sync
//!
//! Mirrors recently published WordPress posts into an Appwrite collection.
//! One invocation performs one pass over the configured timeframes (day,
//! week, month by default); the deterministic document key `wp_<post id>`
//! plus a pre-write existence check make re-runs idempotent, so the job is
//! safe to schedule as often as needed.
//!
//! ## Usage
//!
//! ```sh
//! WORDPRESS_URL=https://news.example.com \
//! APPWRITE_FUNCTION_ENDPOINT=https://cloud.appwrite.io/v1 \
//! APPWRITE_FUNCTION_PROJECT_ID=my-project \
//! APPWRITE_API_KEY=... \
//! APPWRITE_DATABASE_ID=main \
//! APPWRITE_COLLECTION_ID=articles \
//! wp_appwrite_sync
//! ```
//!
//! The run report is printed to stdout as a single JSON object; structured
//! logs go to stderr.
//!
//! ## Architecture
//!
//! A strictly sequential pipeline per timeframe:
//! 1. **Fetch**: pull the posts window from the WordPress REST API
//! 2. **Dedup**: skip ids already handled this run or already stored
//! 3. **Normalize**: reformat dates, cap content length, resolve media
//! 4. **Store**: create the Appwrite document with public read access

use clap::Parser;
use serde_json::json;
use tracing::{debug, error, info};
use tracing_subscriber::{fmt as tfmt, EnvFilter};

mod appwrite;
mod cli;
mod error;
mod models;
mod normalize;
mod sync;
mod wordpress;

use appwrite::AppwriteClient;
use cli::{Cli, SyncConfig};
use error::Result;
use wordpress::WordPressClient;

#[tokio::main]
async fn main() -> Result<()> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .with_writer(std::io::stderr)
        .init();

    let args = Cli::parse();
    debug!(?args.timeframes, "Parsed CLI arguments");

    let config = match SyncConfig::from_cli(&args) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Refusing to start without required configuration");
            println!("{}", json!({ "success": false, "message": e.to_string() }));
            std::process::exit(1);
        }
    };

    let wordpress = WordPressClient::new(&config.wordpress_url)?;
    let appwrite = AppwriteClient::new(
        &config.appwrite_endpoint,
        &config.appwrite_project_id,
        &config.appwrite_api_key,
        &config.appwrite_database_id,
        &config.appwrite_collection_id,
    )?;

    let report = sync::run(&wordpress, &appwrite, &args.timeframes).await;
    info!(total_stored = report.total_stored, "Sync complete");
    println!("{}", serde_json::to_string(&report)?);

    Ok(())
}
