//! Minimal Appwrite Databases REST client.
//!
//! Appwrite has no official Rust SDK; the two document operations this sync
//! needs — point lookup and create — are small enough to call directly. The
//! client authenticates every request with the project id and API key
//! headers and speaks to a single collection.

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::StatusCode;
use serde_json::{json, Value};
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::NormalizedArticle;
use crate::normalize::truncate_for_log;
use crate::sync::{ArticleStore, Lookup};

/// Permission string granting anonymous read access on created documents.
const PUBLIC_READ: &str = "read(\"any\")";

/// Client for one Appwrite collection.
#[derive(Debug, Clone)]
pub struct AppwriteClient {
    http: reqwest::Client,
    documents_url: String,
}

impl AppwriteClient {
    /// Build a client for one collection.
    ///
    /// `endpoint` is the API root including the version segment, e.g.
    /// `https://cloud.appwrite.io/v1`. Credentials are not validated here;
    /// the server rejects them on first use.
    pub fn new(
        endpoint: &str,
        project_id: &str,
        api_key: &str,
        database_id: &str,
        collection_id: &str,
    ) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert("X-Appwrite-Project", HeaderValue::from_str(project_id)?);
        let mut api_key = HeaderValue::from_str(api_key)?;
        api_key.set_sensitive(true);
        headers.insert("X-Appwrite-Key", api_key);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;
        let documents_url = format!(
            "{}/databases/{}/collections/{}/documents",
            endpoint.trim_end_matches('/'),
            database_id,
            collection_id
        );
        Ok(Self {
            http,
            documents_url,
        })
    }

    fn document_url(&self, document_id: &str) -> String {
        format!("{}/{}", self.documents_url, document_id)
    }
}

impl ArticleStore for AppwriteClient {
    /// Point lookup by document key.
    ///
    /// HTTP 404 maps to [`Lookup::NotFound`]; transport failures and any
    /// other non-success status map to [`Lookup::Failed`] rather than an
    /// error, matching the caller's treat-as-absent policy.
    async fn lookup(&self, document_id: &str) -> Lookup {
        let response = match self.http.get(self.document_url(document_id)).send().await {
            Ok(response) => response,
            Err(e) => return Lookup::Failed(e.to_string()),
        };
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Lookup::NotFound;
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Lookup::Failed(format!("HTTP {status}: {}", truncate_for_log(&body, 500)));
        }
        match response.json::<Value>().await {
            Ok(document) => Lookup::Found(document),
            Err(e) => Lookup::Failed(e.to_string()),
        }
    }

    /// Create the document with public read access.
    async fn create(&self, document_id: &str, article: &NormalizedArticle) -> Result<()> {
        let payload = json!({
            "documentId": document_id,
            "data": article,
            "permissions": [PUBLIC_READ],
        });
        let response = self
            .http
            .post(&self.documents_url)
            .json(&payload)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Write {
                document_id: document_id.to_string(),
                message: format!("HTTP {status}: {}", truncate_for_log(&body, 500)),
            });
        }
        debug!(document_id, "Created document");
        Ok(())
    }
}
