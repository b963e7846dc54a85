//! HTTP client for the hosted Deta Base API (v1).

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode, Url};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::base::{with_key, Base, Item};
use crate::error::{StoreError, StoreResult};
use crate::query::Query;

/// Default API host
pub const DEFAULT_HOST: &str = "https://database.deta.sh/v1";

/// Default request timeout in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Header carrying the project key
const API_KEY_HEADER: &str = "X-API-Key";

/// Items requested per query page
const QUERY_PAGE_LIMIT: usize = 1000;

/// A Deta project. Hands out `DetaBase` handles sharing one HTTP client.
#[derive(Clone)]
pub struct Deta {
    project_key: String,
    project_id: String,
    host: String,
    http: Client,
}

impl fmt::Debug for Deta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deta")
            .field("project_key", &"[REDACTED]")
            .field("project_id", &self.project_id)
            .field("host", &self.host)
            .finish()
    }
}

impl Deta {
    /// Connect to the default host with the default timeout.
    pub fn new(project_key: impl Into<String>) -> StoreResult<Self> {
        Self::with_options(
            project_key,
            DEFAULT_HOST,
            Duration::from_millis(DEFAULT_TIMEOUT_MS),
        )
    }

    pub fn with_options(
        project_key: impl Into<String>,
        host: impl Into<String>,
        timeout: Duration,
    ) -> StoreResult<Self> {
        let project_key = project_key.into();
        let project_id = project_id(&project_key)?;
        let http = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            project_key,
            project_id,
            host: host.into(),
            http,
        })
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// Handle for the named Base. Bases are created by the store on first write.
    pub fn base(&self, name: &str) -> StoreResult<DetaBase> {
        if name.is_empty() {
            return Err(StoreError::InvalidUrl("empty base name".to_string()));
        }

        let raw = format!(
            "{}/{}/{}",
            self.host.trim_end_matches('/'),
            self.project_id,
            name
        );
        let url = Url::parse(&raw).map_err(|e| StoreError::InvalidUrl(format!("{raw}: {e}")))?;
        if url.cannot_be_a_base() {
            return Err(StoreError::InvalidUrl(raw));
        }

        debug!("Using Deta Base {} at {}", name, url);

        Ok(DetaBase {
            name: name.to_string(),
            url,
            api_key: self.project_key.clone(),
            http: self.http.clone(),
        })
    }
}

/// Project id is the part of the key before the first underscore.
fn project_id(project_key: &str) -> StoreResult<String> {
    match project_key.split_once('_') {
        Some((id, secret)) if !id.is_empty() && !secret.is_empty() => Ok(id.to_string()),
        _ => Err(StoreError::InvalidProjectKey),
    }
}

/// One Base of a Deta project.
#[derive(Clone)]
pub struct DetaBase {
    name: String,
    url: Url,
    api_key: String,
    http: Client,
}

impl fmt::Debug for DetaBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DetaBase")
            .field("name", &self.name)
            .field("url", &self.url.as_str())
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    errors: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ItemList {
    #[serde(default)]
    items: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct PutResponse {
    #[serde(default)]
    processed: ItemList,
    #[serde(default)]
    failed: ItemList,
}

#[derive(Debug, Deserialize)]
struct Paging {
    #[serde(default)]
    last: Option<String>,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    paging: Paging,
    #[serde(default)]
    items: Vec<Item>,
}

impl DetaBase {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Base URL extended with path segments. Segments are percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> StoreResult<Url> {
        let mut url = self.url.clone();
        url.path_segments_mut()
            .map_err(|_| StoreError::InvalidUrl(self.url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn query_body(query: &Query, last: Option<&str>) -> serde_json::Value {
        let mut body = json!({ "limit": QUERY_PAGE_LIMIT });
        if !query.is_empty() {
            body["query"] = json!([query]);
        }
        if let Some(last) = last {
            body["last"] = json!(last);
        }
        body
    }
}

/// Turn a non-success response into `StoreError::Api`, keeping the store's messages.
async fn error_for_status(response: Response) -> StoreResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let errors = match serde_json::from_str::<ErrorBody>(&body) {
        Ok(parsed) => parsed.errors,
        Err(_) if body.is_empty() => Vec::new(),
        Err(_) => vec![body],
    };

    Err(StoreError::Api {
        status: status.as_u16(),
        errors,
    })
}

#[async_trait]
impl Base for DetaBase {
    async fn get(&self, key: &str) -> StoreResult<Option<Item>> {
        let url = self.endpoint(&["items", key])?;
        debug!(base = %self.name, key = %key, "GET item");

        let response = self
            .http
            .get(url)
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let item = error_for_status(response).await?.json::<Item>().await?;
        Ok(Some(item))
    }

    async fn fetch(&self, query: Query) -> StoreResult<Vec<Item>> {
        let url = self.endpoint(&["query"])?;
        let mut items = Vec::new();
        let mut last: Option<String> = None;

        loop {
            debug!(base = %self.name, last = ?last, "POST query");
            let response = self
                .http
                .post(url.clone())
                .header(API_KEY_HEADER, &self.api_key)
                .json(&Self::query_body(&query, last.as_deref()))
                .send()
                .await?;

            let page = error_for_status(response)
                .await?
                .json::<QueryResponse>()
                .await?;
            items.extend(page.items);

            match page.paging.last {
                Some(cursor) => last = Some(cursor),
                None => break,
            }
        }

        Ok(items)
    }

    async fn insert(&self, key: &str, item: Item) -> StoreResult<Item> {
        let url = self.endpoint(&["items"])?;
        debug!(base = %self.name, key = %key, "POST item");

        let response = self
            .http
            .post(url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&json!({ "item": with_key(key, item) }))
            .send()
            .await?;

        if response.status() == StatusCode::CONFLICT {
            return Err(StoreError::KeyExists(key.to_string()));
        }

        Ok(error_for_status(response).await?.json::<Item>().await?)
    }

    async fn put(&self, key: &str, item: Item) -> StoreResult<Item> {
        let url = self.endpoint(&["items"])?;
        debug!(base = %self.name, key = %key, "PUT item");

        let item = with_key(key, item);
        let response = self
            .http
            .put(url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&json!({ "items": [&item] }))
            .send()
            .await?;

        let result = error_for_status(response)
            .await?
            .json::<PutResponse>()
            .await?;

        if !result.failed.items.is_empty() {
            return Err(StoreError::Api {
                status: StatusCode::MULTI_STATUS.as_u16(),
                errors: vec![format!("put failed for key {key}")],
            });
        }

        Ok(result.processed.items.into_iter().next().unwrap_or(item))
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        let url = self.endpoint(&["items", key])?;
        debug!(base = %self.name, key = %key, "DELETE item");

        let response = self
            .http
            .delete(url)
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await?;

        error_for_status(response).await?;
        Ok(())
    }
}
