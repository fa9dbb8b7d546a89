//! Command-line interface and runtime configuration.
//!
//! Every option mirrors an environment variable, so the binary runs
//! unchanged as a scheduled job (env only) or interactively (flags). The
//! WordPress URL and the database and collection ids are required before any
//! work starts; endpoint, project id and API key fall back to empty strings
//! and are rejected by the Appwrite server itself on first use.

use clap::Parser;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::wordpress::Timeframe;

/// Command-line arguments for the WordPress → Appwrite sync.
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// WordPress site base URL, e.g. https://news.example.com
    #[arg(long, env = "WORDPRESS_URL")]
    pub wordpress_url: Option<String>,

    /// Appwrite API endpoint, e.g. https://cloud.appwrite.io/v1
    #[arg(long, env = "APPWRITE_FUNCTION_ENDPOINT", default_value = "")]
    pub appwrite_endpoint: String,

    /// Appwrite project id
    #[arg(long, env = "APPWRITE_FUNCTION_PROJECT_ID", default_value = "")]
    pub appwrite_project_id: String,

    /// Appwrite API key with documents read/write scope
    #[arg(
        long,
        env = "APPWRITE_API_KEY",
        default_value = "",
        hide_env_values = true
    )]
    pub appwrite_api_key: String,

    /// Database holding the articles collection
    #[arg(long, env = "APPWRITE_DATABASE_ID")]
    pub appwrite_database_id: Option<String>,

    /// Collection the articles are written to
    #[arg(long, env = "APPWRITE_COLLECTION_ID")]
    pub appwrite_collection_id: Option<String>,

    /// Timeframes to sync, comma separated
    #[arg(
        long,
        value_delimiter = ',',
        default_values_t = Timeframe::ALL,
        value_parser = Timeframe::from_str
    )]
    pub timeframes: Vec<Timeframe>,
}

/// Validated runtime configuration.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub wordpress_url: String,
    pub appwrite_endpoint: String,
    pub appwrite_project_id: String,
    pub appwrite_api_key: String,
    pub appwrite_database_id: String,
    pub appwrite_collection_id: String,
}

impl SyncConfig {
    /// Extract and validate configuration from parsed arguments.
    ///
    /// # Errors
    ///
    /// [`Error::MissingConfig`] when the WordPress URL, database id or
    /// collection id is absent or empty.
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let wordpress_url = required(cli.wordpress_url.as_deref())?;
        let appwrite_database_id = required(cli.appwrite_database_id.as_deref())?;
        let appwrite_collection_id = required(cli.appwrite_collection_id.as_deref())?;
        Ok(Self {
            wordpress_url,
            appwrite_endpoint: cli.appwrite_endpoint.clone(),
            appwrite_project_id: cli.appwrite_project_id.clone(),
            appwrite_api_key: cli.appwrite_api_key.clone(),
            appwrite_database_id,
            appwrite_collection_id,
        })
    }
}

fn required(value: Option<&str>) -> Result<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v.to_string()),
        _ => Err(Error::MissingConfig),
    }
}
