//! Error taxonomy for the sync pipeline.
//!
//! Fatal vs recoverable is a property of where an error is caught, not of the
//! variant itself: [`Error::MissingConfig`] aborts before any work begins,
//! fetch-side errors are contained to one timeframe, and store-side errors to
//! one article. The orchestrator folds contained errors into the run report
//! instead of propagating them.

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Missing required environment variables")]
    MissingConfig,

    #[error("invalid timeframe {0:?}: use day, week, or month")]
    InvalidTimeframe(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// Non-success status from the WordPress posts endpoint. The body is
    /// trimmed to a preview at the call site before it lands here.
    #[error("failed to fetch articles: HTTP {status}: {body}")]
    Fetch { status: StatusCode, body: String },

    #[error("failed to parse posts response: {0}")]
    ResponseParse(#[source] serde_json::Error),

    #[error("malformed date: {0:?}")]
    MalformedDate(String),

    #[error("failed to store document {document_id}: {message}")]
    Write {
        document_id: String,
        message: String,
    },

    #[error("invalid credential header: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
