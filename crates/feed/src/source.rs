//! Upstream data sources
//!
//! A [`DataSource`] yields one raw JSON payload per call. Decoding into
//! engine types happens in [`crate::decode`], retries in [`crate::retry`].

use crate::error::FeedError;
use crate::Result;
use async_trait::async_trait;
use config::{SourceConfig, SourceKind};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

#[async_trait]
pub trait DataSource: Send + Sync {
    fn name(&self) -> &str;

    async fn fetch(&self) -> Result<Value>;
}

/// The exchange rejects requests that do not look like a browser
fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        USER_AGENT,
        HeaderValue::from_static(
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
        ),
    );
    headers.insert(ACCEPT, HeaderValue::from_static("application/json, text/plain, */*"));
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
    headers
}

pub struct HttpSource {
    name: String,
    url: String,
    client: reqwest::Client,
}

impl HttpSource {
    pub fn new(name: impl Into<String>, url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(browser_headers())
            .build()?;

        Ok(Self {
            name: name.into(),
            url: url.into(),
            client,
        })
    }
}

#[async_trait]
impl DataSource for HttpSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self) -> Result<Value> {
        debug!(source = %self.name, url = %self.url, "GET");
        let response = self.client.get(&self.url).send().await?.error_for_status()?;
        let body = response.json::<Value>().await?;
        Ok(body)
    }
}

/// Replays a JSON file; re-read on every fetch so it can be swapped live
pub struct FileSource {
    name: String,
    path: PathBuf,
}

impl FileSource {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

#[async_trait]
impl DataSource for FileSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self) -> Result<Value> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| FeedError::transport(&self.name, format!("{}: {}", self.path.display(), e)))?;
        Ok(serde_json::from_str(&content)?)
    }
}

type Scripted = std::result::Result<Value, String>;

/// In-memory source. Scripted responses are served in order; the last one
/// repeats once the script runs out.
pub struct StaticSource {
    name: String,
    responses: Mutex<VecDeque<Scripted>>,
    calls: AtomicU32,
}

impl StaticSource {
    pub fn new(name: impl Into<String>, payload: Value) -> Self {
        Self::scripted(name, vec![Ok(payload)])
    }

    pub fn failing(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::scripted(name, vec![Err(message.into())])
    }

    pub fn scripted(name: impl Into<String>, responses: Vec<Scripted>) -> Self {
        Self {
            name: name.into(),
            responses: Mutex::new(responses.into()),
            calls: AtomicU32::new(0),
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    fn next_response(&self) -> Option<Scripted> {
        let mut queue = self.responses.lock();
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

#[async_trait]
impl DataSource for StaticSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self) -> Result<Value> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.next_response() {
            Some(Ok(v)) => Ok(v),
            Some(Err(message)) => Err(FeedError::transport(&self.name, message)),
            None => Err(FeedError::transport(&self.name, "no scripted response")),
        }
    }
}

/// Build the source for a config entry: `http(s)://` or `file://<path>`
pub fn source_from_config(kind: SourceKind, cfg: &SourceConfig) -> Result<Arc<dyn DataSource>> {
    let url = cfg.url.trim();
    if let Some(path) = url.strip_prefix("file://") {
        return Ok(Arc::new(FileSource::new(kind.as_str(), path)));
    }
    if url.starts_with("http://") || url.starts_with("https://") {
        return Ok(Arc::new(HttpSource::new(kind.as_str(), url, cfg.timeout())?));
    }
    Err(FeedError::InvalidUrl(cfg.url.clone()))
}
