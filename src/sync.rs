//! Upsert and orchestration logic.
//!
//! One run walks the configured timeframes in order, fetches each window and
//! upserts every article at most once. Duplicates across overlapping windows
//! are caught by the run-scoped id set before any store roundtrip; duplicates
//! across runs are caught by the destination point lookup on the
//! deterministic `wp_<id>` document key. Execution is strictly sequential —
//! timeframes one at a time, articles one at a time — so the id set needs no
//! locking.
//!
//! # Failure isolation
//!
//! A failed fetch poisons only its own timeframe entry in the report; a
//! failed article poisons only itself. The report's `success` flag refers to
//! the run, which completes regardless of either. Nothing is retried within
//! a run: the idempotent document keys make re-running the whole job the
//! recovery path.

use std::collections::{BTreeMap, HashSet};

use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::error::Result;
use crate::models::{NormalizedArticle, RawArticle, SyncReport, TimeframeOutcome};
use crate::wordpress::Timeframe;

/// Source of raw articles for one timeframe window.
pub trait ArticleSource {
    async fn fetch(&self, timeframe: Timeframe) -> Result<Vec<RawArticle>>;
}

/// Result of a destination point lookup.
///
/// `Failed` is deliberately not an error: a lookup that cannot complete is
/// treated as "not stored" so a transient outage never stalls the pipeline.
/// The worst case is a duplicate create attempt, which the destination
/// rejects on the document key.
#[derive(Debug)]
pub enum Lookup {
    /// The document exists; carries the raw document payload.
    Found(Value),
    /// The store answered definitively that no such document exists.
    NotFound,
    /// The lookup itself failed (transport error, unexpected status).
    Failed(String),
}

/// Destination document store keyed by deterministic document ids.
pub trait ArticleStore {
    /// Point lookup by document key. Infallible by design; see [`Lookup`].
    async fn lookup(&self, document_id: &str) -> Lookup;

    /// Create a document under `document_id` with public read access.
    async fn create(&self, document_id: &str, article: &NormalizedArticle) -> Result<()>;
}

/// Upsert a single article.
///
/// Returns the written record, or `None` when the article was skipped as a
/// session duplicate, found already stored, or failed to write. Write
/// failures are logged and swallowed here, leaving `stored_ids` untouched so
/// a later occurrence of the same id would retry the existence check. A
/// malformed source timestamp propagates so the caller can skip the article.
pub async fn store_article<S>(
    article: &RawArticle,
    store: &S,
    stored_ids: &mut HashSet<String>,
) -> Result<Option<NormalizedArticle>>
where
    S: ArticleStore + ?Sized,
{
    let article_id = article.id.to_string();
    if stored_ids.contains(&article_id) {
        info!(%article_id, "Skipping article - already stored in this session");
        return Ok(None);
    }

    let document_id = article.document_id();
    match store.lookup(&document_id).await {
        Lookup::Found(document) => {
            debug!(existing = %document["$id"], "Document already present");
            info!(%article_id, "Skipping article - already exists in Appwrite");
            stored_ids.insert(article_id);
            return Ok(None);
        }
        Lookup::NotFound => {}
        Lookup::Failed(reason) => {
            warn!(%article_id, %reason, "Existence check failed; treating article as absent");
        }
    }

    let normalized = NormalizedArticle::from_raw(article)?;
    match store.create(&document_id, &normalized).await {
        Ok(()) => {
            info!(%article_id, "Successfully stored article");
            stored_ids.insert(article_id);
            Ok(Some(normalized))
        }
        Err(e) => {
            warn!(%article_id, error = %e, "Error storing article");
            Ok(None)
        }
    }
}

/// Run one full sync pass over `timeframes`.
///
/// All passes always run, in order; an article published within the last day
/// shows up in every window but is stored at most once thanks to the
/// run-scoped id set. Always returns a report — fetch and article failures
/// are folded into it rather than propagated.
#[instrument(level = "info", skip(source, store))]
pub async fn run<F, S>(source: &F, store: &S, timeframes: &[Timeframe]) -> SyncReport
where
    F: ArticleSource + ?Sized,
    S: ArticleStore + ?Sized,
{
    let mut stored_ids: HashSet<String> = HashSet::new();
    let mut results = BTreeMap::new();
    let mut total_stored = 0usize;

    for &timeframe in timeframes {
        let articles = match source.fetch(timeframe).await {
            Ok(articles) => articles,
            Err(e) => {
                warn!(%timeframe, error = %e, "Error processing timeframe");
                results.insert(
                    timeframe,
                    TimeframeOutcome::Failed {
                        error: e.to_string(),
                    },
                );
                continue;
            }
        };

        let fetched = articles.len();
        let mut stored = 0usize;
        for article in &articles {
            match store_article(article, store, &mut stored_ids).await {
                Ok(Some(_)) => stored += 1,
                Ok(None) => {}
                Err(e) => {
                    warn!(article_id = article.id, error = %e, "Error processing article");
                }
            }
        }

        info!(%timeframe, fetched, stored, "Timeframe pass complete");
        results.insert(timeframe, TimeframeOutcome::Synced { fetched, stored });
        total_stored += stored;
    }

    SyncReport {
        success: true,
        total_stored,
        results,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::models::{Embedded, Rendered};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn raw_article(id: u64) -> RawArticle {
        RawArticle {
            id,
            title: Rendered {
                rendered: format!("Article {id}"),
            },
            content: Rendered {
                rendered: "<p>Body.</p>".to_string(),
            },
            excerpt: Rendered {
                rendered: "<p>Excerpt.</p>".to_string(),
            },
            slug: format!("article-{id}"),
            link: format!("https://news.example.com/article-{id}/"),
            date: "2024-03-05T14:22:01".to_string(),
            modified: "2024-03-05T14:22:01".to_string(),
            embedded: Some(Embedded::default()),
        }
    }

    #[derive(Default)]
    struct MemoryStore {
        documents: Mutex<HashMap<String, NormalizedArticle>>,
        lookup_calls: AtomicUsize,
        fail_lookups: bool,
        fail_creates: bool,
    }

    impl MemoryStore {
        fn document_count(&self) -> usize {
            self.documents.lock().unwrap().len()
        }
    }

    impl ArticleStore for MemoryStore {
        async fn lookup(&self, document_id: &str) -> Lookup {
            self.lookup_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_lookups {
                return Lookup::Failed("connection reset by peer".to_string());
            }
            match self.documents.lock().unwrap().get(document_id) {
                Some(_) => Lookup::Found(serde_json::json!({ "$id": document_id })),
                None => Lookup::NotFound,
            }
        }

        async fn create(&self, document_id: &str, article: &NormalizedArticle) -> Result<()> {
            if self.fail_creates {
                return Err(Error::Write {
                    document_id: document_id.to_string(),
                    message: "HTTP 503 Service Unavailable".to_string(),
                });
            }
            let mut documents = self.documents.lock().unwrap();
            if documents.contains_key(document_id) {
                return Err(Error::Write {
                    document_id: document_id.to_string(),
                    message: "document already exists".to_string(),
                });
            }
            documents.insert(document_id.to_string(), article.clone());
            Ok(())
        }
    }

    struct StubSource {
        batches: HashMap<Timeframe, std::result::Result<Vec<RawArticle>, String>>,
    }

    impl StubSource {
        fn new() -> Self {
            Self {
                batches: HashMap::new(),
            }
        }

        fn with(mut self, timeframe: Timeframe, ids: &[u64]) -> Self {
            self.batches
                .insert(timeframe, Ok(ids.iter().copied().map(raw_article).collect()));
            self
        }

        fn failing(mut self, timeframe: Timeframe, body: &str) -> Self {
            self.batches.insert(timeframe, Err(body.to_string()));
            self
        }
    }

    impl ArticleSource for StubSource {
        async fn fetch(&self, timeframe: Timeframe) -> Result<Vec<RawArticle>> {
            match self.batches.get(&timeframe) {
                Some(Ok(articles)) => Ok(articles.clone()),
                Some(Err(body)) => Err(Error::Fetch {
                    status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
                    body: body.clone(),
                }),
                None => Ok(Vec::new()),
            }
        }
    }

    #[tokio::test]
    async fn test_duplicate_across_timeframes_stored_once() {
        let source = StubSource::new()
            .with(Timeframe::Day, &[1, 2])
            .with(Timeframe::Week, &[1])
            .with(Timeframe::Month, &[]);
        let store = MemoryStore::default();

        let report = run(&source, &store, &Timeframe::ALL).await;

        assert!(report.success);
        assert_eq!(report.total_stored, 2);
        assert_eq!(store.document_count(), 2);
        assert!(matches!(
            report.results[&Timeframe::Day],
            TimeframeOutcome::Synced {
                fetched: 2,
                stored: 2
            }
        ));
        assert!(matches!(
            report.results[&Timeframe::Week],
            TimeframeOutcome::Synced {
                fetched: 1,
                stored: 0
            }
        ));
    }

    #[tokio::test]
    async fn test_second_run_stores_nothing() {
        let source = StubSource::new()
            .with(Timeframe::Day, &[10, 11])
            .with(Timeframe::Week, &[10, 11, 12]);
        let store = MemoryStore::default();

        let first = run(&source, &store, &Timeframe::ALL).await;
        assert_eq!(first.total_stored, 3);

        let second = run(&source, &store, &Timeframe::ALL).await;
        assert_eq!(second.total_stored, 0);
        assert_eq!(store.document_count(), 3);
    }

    #[tokio::test]
    async fn test_fetch_failure_isolated_to_timeframe() {
        let source = StubSource::new()
            .with(Timeframe::Day, &[1])
            .failing(Timeframe::Week, "upstream exploded")
            .with(Timeframe::Month, &[2]);
        let store = MemoryStore::default();

        let report = run(&source, &store, &Timeframe::ALL).await;

        assert!(report.success);
        assert_eq!(report.total_stored, 2);
        match &report.results[&Timeframe::Week] {
            TimeframeOutcome::Failed { error } => assert!(error.contains("500")),
            other => panic!("expected week failure, got {other:?}"),
        }
        assert!(matches!(
            report.results[&Timeframe::Day],
            TimeframeOutcome::Synced { fetched: 1, .. }
        ));
        assert!(matches!(
            report.results[&Timeframe::Month],
            TimeframeOutcome::Synced { fetched: 1, .. }
        ));
    }

    #[tokio::test]
    async fn test_lookup_failure_treated_as_absent() {
        let source = StubSource::new().with(Timeframe::Day, &[7]);
        let store = MemoryStore {
            fail_lookups: true,
            ..MemoryStore::default()
        };

        let report = run(&source, &store, &[Timeframe::Day]).await;

        // The failed existence check must not block the write.
        assert_eq!(report.total_stored, 1);
        assert_eq!(store.document_count(), 1);
    }

    #[tokio::test]
    async fn test_write_failure_leaves_tracker_retryable() {
        let source = StubSource::new().with(Timeframe::Day, &[5, 5]);
        let store = MemoryStore {
            fail_creates: true,
            ..MemoryStore::default()
        };

        let report = run(&source, &store, &[Timeframe::Day]).await;

        assert_eq!(report.total_stored, 0);
        // The id never enters the session set on a failed write, so the
        // second occurrence goes back to the existence check.
        assert_eq!(store.lookup_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_session_duplicate_skips_store_access() {
        let source = StubSource::new().with(Timeframe::Day, &[5, 5]);
        let store = MemoryStore::default();

        let report = run(&source, &store, &[Timeframe::Day]).await;

        assert_eq!(report.total_stored, 1);
        assert_eq!(store.lookup_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_preexisting_document_marks_session_set() {
        let mut stored_ids = HashSet::new();
        let store = MemoryStore::default();
        let article = raw_article(3);
        let normalized = NormalizedArticle::from_raw(&article).unwrap();
        store
            .documents
            .lock()
            .unwrap()
            .insert("wp_3".to_string(), normalized);

        let result = store_article(&article, &store, &mut stored_ids)
            .await
            .unwrap();

        assert!(result.is_none());
        assert!(stored_ids.contains("3"));
        assert_eq!(store.document_count(), 1);
    }

    #[tokio::test]
    async fn test_malformed_date_skips_article_only() {
        let mut bad = raw_article(8);
        bad.date = "the day before yesterday".to_string();
        let mut batches = HashMap::new();
        batches.insert(Timeframe::Day, Ok(vec![bad, raw_article(9)]));
        let source = StubSource { batches };
        let store = MemoryStore::default();

        let report = run(&source, &store, &[Timeframe::Day]).await;

        assert!(matches!(
            report.results[&Timeframe::Day],
            TimeframeOutcome::Synced {
                fetched: 2,
                stored: 1
            }
        ));
        assert_eq!(store.document_count(), 1);
    }

    #[tokio::test]
    async fn test_empty_window_is_normal() {
        let source = StubSource::new();
        let store = MemoryStore::default();

        let report = run(&source, &store, &Timeframe::ALL).await;

        assert!(report.success);
        assert_eq!(report.total_stored, 0);
        for timeframe in Timeframe::ALL {
            assert!(matches!(
                report.results[&timeframe],
                TimeframeOutcome::Synced {
                    fetched: 0,
                    stored: 0
                }
            ));
        }
    }
}
