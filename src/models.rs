//! Data models for WordPress posts and their Appwrite representations.
//!
//! This module defines the core data structures used throughout the sync:
//! - [`RawArticle`]: a post as returned by the WordPress REST API
//! - [`NormalizedArticle`]: the destination record written to Appwrite
//! - [`TimeframeOutcome`] / [`SyncReport`]: the run report returned to the
//!   caller
//!
//! `RawArticle` is decoded as received and never mutated; each one maps 1:1
//! to a `NormalizedArticle` built exactly once. Field names follow the
//! WordPress wire format on the way in and the destination collection schema
//! on the way out.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::normalize::{format_date, truncate_content};
use crate::wordpress::Timeframe;

/// Rich-text wrapper used by the WordPress REST API (`{"rendered": "..."}`).
#[derive(Debug, Clone, Deserialize)]
pub struct Rendered {
    /// The rendered HTML of the field.
    pub rendered: String,
}

/// A post as returned by `GET /wp-json/wp/v2/posts`.
///
/// Only the fields the sync consumes are modeled; everything else in the
/// payload is ignored. The `_embedded` section is present only when the
/// request asked for embedded related content, and its absence is a normal
/// case, not an error.
#[derive(Debug, Clone, Deserialize)]
pub struct RawArticle {
    /// The post's numeric identifier.
    pub id: u64,
    /// The post title.
    pub title: Rendered,
    /// The full post body.
    pub content: Rendered,
    /// The post excerpt.
    pub excerpt: Rendered,
    /// URL-friendly post name.
    pub slug: String,
    /// Canonical link to the post.
    pub link: String,
    /// Publish timestamp, site-local.
    pub date: String,
    /// Last-modification timestamp, site-local.
    pub modified: String,
    /// Embedded related content, present when requested with `_embed`.
    #[serde(rename = "_embedded")]
    pub embedded: Option<Embedded>,
}

/// The `_embedded` section of a post payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Embedded {
    #[serde(rename = "wp:featuredmedia", default)]
    pub featured_media: Vec<FeaturedMedia>,
}

/// One entry of the embedded featured-media list.
#[derive(Debug, Clone, Deserialize)]
pub struct FeaturedMedia {
    #[serde(default)]
    pub source_url: Option<String>,
}

impl RawArticle {
    /// Deterministic destination document key for this post.
    pub fn document_id(&self) -> String {
        format!("wp_{}", self.id)
    }

    /// URL of the first embedded featured-media entry, if any.
    ///
    /// Posts without a featured image simply lack the `_embedded` section or
    /// carry an empty `wp:featuredmedia` list; both yield `None`.
    pub fn featured_image(&self) -> Option<&str> {
        self.embedded
            .as_ref()?
            .featured_media
            .first()?
            .source_url
            .as_deref()
    }
}

/// The destination record, derived 1:1 from a [`RawArticle`].
///
/// Field names match the destination collection schema. Created once per
/// article and never mutated afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct NormalizedArticle {
    /// String form of the source post id.
    pub wp_id: String,
    pub title: String,
    /// Post body, capped at the destination attribute limit.
    pub content: String,
    pub excerpt: String,
    pub slug: String,
    pub link: String,
    /// Publish timestamp as `YYYY/MM/DD,HH:MM:SS`.
    pub published_date: String,
    /// Modification timestamp as `YYYY/MM/DD,HH:MM:SS`.
    pub modified_date: String,
    /// Featured image URL, when the post has one.
    pub featured_image: Option<String>,
}

impl NormalizedArticle {
    /// Build the destination record: dates reformatted, content
    /// length-capped, featured image resolved.
    ///
    /// # Errors
    ///
    /// The only failure is an unparseable source timestamp
    /// ([`crate::error::Error::MalformedDate`]).
    pub fn from_raw(article: &RawArticle) -> Result<Self> {
        Ok(Self {
            wp_id: article.id.to_string(),
            title: article.title.rendered.clone(),
            content: truncate_content(&article.content.rendered),
            excerpt: article.excerpt.rendered.clone(),
            slug: article.slug.clone(),
            link: article.link.clone(),
            published_date: format_date(&article.date)?,
            modified_date: format_date(&article.modified)?,
            featured_image: article.featured_image().map(str::to_string),
        })
    }
}

/// Outcome of one timeframe pass.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum TimeframeOutcome {
    /// The fetch succeeded; counts cover the whole window.
    Synced { fetched: usize, stored: usize },
    /// The fetch failed; nothing in the window was attempted.
    Failed { error: String },
}

/// The invocation's sole output: per-timeframe outcomes plus totals.
///
/// `success` refers to the run itself and stays `true` even when individual
/// timeframes report errors; only the missing-configuration early exit
/// produces a `success: false` response.
#[derive(Debug, Serialize)]
pub struct SyncReport {
    pub success: bool,
    pub total_stored: usize,
    pub results: BTreeMap<Timeframe, TimeframeOutcome>,
}
