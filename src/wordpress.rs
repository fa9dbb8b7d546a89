//! WordPress REST API fetcher.
//!
//! Queries `GET {site}/wp-json/wp/v2/posts` for posts published after a
//! timeframe-dependent cutoff, with embedded related content expanded
//! (`_embed=1`) so featured-media URLs come back inline.
//!
//! # Pagination
//!
//! A single request at the API's maximum page size (100) is issued per
//! timeframe. Windows containing more than 100 posts are truncated to the
//! first page in the source's default ordering; this is a documented
//! limitation of the sync, not something the fetcher works around.

use std::fmt;
use std::str::FromStr;

use chrono::{Duration, NaiveDateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::error::{Error, Result};
use crate::models::RawArticle;
use crate::normalize::truncate_for_log;
use crate::sync::ArticleSource;

/// Maximum posts per request; the WordPress REST API caps `per_page` at 100.
const PER_PAGE: u32 = 100;

/// Lookback window for article freshness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Timeframe {
    Day,
    Week,
    Month,
}

impl Timeframe {
    /// The fixed default pass order.
    pub const ALL: [Timeframe; 3] = [Timeframe::Day, Timeframe::Week, Timeframe::Month];

    /// Window start relative to `now`.
    pub fn cutoff(&self, now: NaiveDateTime) -> NaiveDateTime {
        let days = match self {
            Timeframe::Day => 1,
            Timeframe::Week => 7,
            Timeframe::Month => 30,
        };
        now - Duration::days(days)
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Timeframe::Day => "day",
            Timeframe::Week => "week",
            Timeframe::Month => "month",
        })
    }
}

impl FromStr for Timeframe {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "day" => Ok(Timeframe::Day),
            "week" => Ok(Timeframe::Week),
            "month" => Ok(Timeframe::Month),
            other => Err(Error::InvalidTimeframe(other.to_string())),
        }
    }
}

/// Client for one WordPress site's posts endpoint.
#[derive(Debug, Clone)]
pub struct WordPressClient {
    http: reqwest::Client,
    posts_url: Url,
}

impl WordPressClient {
    /// Build a client for `site_url` (scheme + host, optionally a subpath,
    /// with or without a trailing slash).
    pub fn new(site_url: &str) -> Result<Self> {
        let posts_url = Url::parse(&format!(
            "{}/wp-json/wp/v2/posts",
            site_url.trim_end_matches('/')
        ))
        .map_err(|_| Error::InvalidUrl(site_url.to_string()))?;
        Ok(Self {
            http: reqwest::Client::new(),
            posts_url,
        })
    }
}

impl ArticleSource for WordPressClient {
    /// Fetch posts published after the timeframe's cutoff.
    ///
    /// Returns the decoded first page (up to [`PER_PAGE`] posts); an empty
    /// window is a normal result, not an error.
    #[instrument(level = "info", skip(self))]
    async fn fetch(&self, timeframe: Timeframe) -> Result<Vec<RawArticle>> {
        let after = timeframe
            .cutoff(Utc::now().naive_utc())
            .format("%Y-%m-%dT%H:%M:%S")
            .to_string();
        info!(url = %self.posts_url, %after, per_page = PER_PAGE, "Fetching articles");

        let response = self
            .http
            .get(self.posts_url.clone())
            .query(&[
                ("after", after),
                ("per_page", PER_PAGE.to_string()),
                ("_embed", "1".to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        debug!(%status, "WordPress responded");
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let body = truncate_for_log(&body, 500);
            warn!(%status, %body, "Error response from WordPress");
            return Err(Error::Fetch { status, body });
        }

        let body = response.text().await?;
        let articles: Vec<RawArticle> = serde_json::from_str(&body).map_err(|e| {
            warn!(preview = %truncate_for_log(&body, 500), "Unparseable posts response");
            Error::ResponseParse(e)
        })?;
        info!(count = articles.len(), %timeframe, "Successfully fetched articles");
        Ok(articles)
    }
}
