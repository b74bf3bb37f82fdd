//! In-process fakes for the browser, chat endpoint, extractors and store.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::anyhow;
use async_trait::async_trait;

use crate::ai::{ChatModel, ChatRequest};
use crate::db::{NewsStore, Repository};
use crate::error::{AppError, Result};
use crate::models::{ArticleCandidate, IngestDate, NewNewsRecord, NewsRecord, RawContent, Source};
use crate::services::{BrowserLauncher, BrowserSession};
use crate::sources::PageExtractor;

/// Chat model with a fixed reply or a fixed failure.
pub struct ScriptedChat {
    reply: std::result::Result<String, String>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedChat {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Ok(reply.to_string()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            reply: Err(message.to_string()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatModel for ScriptedChat {
    async fn complete(&self, request: &ChatRequest) -> Result<String> {
        self.requests.lock().unwrap().push(request.clone());
        self.reply.clone().map_err(AppError::ChatApi)
    }
}

/// Browser session serving canned HTML by URL. Unknown URLs fail.
#[derive(Clone, Default)]
pub struct ScriptedSession {
    pages: HashMap<String, String>,
    visited: Arc<Mutex<Vec<String>>>,
    closes: Arc<AtomicUsize>,
}

impl ScriptedSession {
    pub fn with_page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), html.to_string());
        self
    }

    pub fn visited(&self) -> Vec<String> {
        self.visited.lock().unwrap().clone()
    }
}

#[async_trait]
impl BrowserSession for ScriptedSession {
    async fn open_page(&mut self, url: &str, _settle: Duration) -> Result<String> {
        self.visited.lock().unwrap().push(url.to_string());
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| anyhow!("navigation to {} failed", url).into())
    }

    async fn close(&mut self) -> Result<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Hands out [`ScriptedSession`]s that share open/close counters.
#[derive(Default)]
pub struct ScriptedLauncher {
    session: ScriptedSession,
    launches: AtomicUsize,
    fail_launch: bool,
}

impl ScriptedLauncher {
    pub fn failing() -> Self {
        Self {
            fail_launch: true,
            ..Self::default()
        }
    }

    pub fn launches(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.session.closes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BrowserLauncher for ScriptedLauncher {
    async fn launch(&self) -> Result<Box<dyn BrowserSession>> {
        if self.fail_launch {
            return Err(anyhow!("browser binary not found").into());
        }
        self.launches.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(self.session.clone()))
    }
}

/// Extractor with a canned listing. Articles get a body derived from their
/// URL unless marked as failing.
pub struct ScriptedExtractor {
    source: Source,
    listing: std::result::Result<Vec<ArticleCandidate>, String>,
    failing_articles: HashSet<String>,
    fetched: Mutex<Vec<String>>,
}

impl ScriptedExtractor {
    pub fn new(source: Source, urls: &[&str]) -> Self {
        let listing = urls
            .iter()
            .map(|url| ArticleCandidate {
                url: url.to_string(),
                scraped_title: format!("Scraped {}", url),
            })
            .collect();
        Self {
            source,
            listing: Ok(listing),
            failing_articles: HashSet::new(),
            fetched: Mutex::new(Vec::new()),
        }
    }

    pub fn with_failing_listing(source: Source, reason: &str) -> Self {
        Self {
            source,
            listing: Err(reason.to_string()),
            failing_articles: HashSet::new(),
            fetched: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_article(mut self, url: &str) -> Self {
        self.failing_articles.insert(url.to_string());
        self
    }

    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }

    pub fn body_for(url: &str) -> String {
        format!("Body of {}", url)
    }
}

#[async_trait]
impl PageExtractor for ScriptedExtractor {
    fn source(&self) -> Source {
        self.source
    }

    async fn fetch_listing(
        &self,
        _session: &mut dyn BrowserSession,
        _today: IngestDate,
    ) -> Result<Vec<ArticleCandidate>> {
        self.listing.clone().map_err(|reason| anyhow!(reason).into())
    }

    async fn fetch_article(&self, _session: &mut dyn BrowserSession, url: &str) -> Result<RawContent> {
        self.fetched.lock().unwrap().push(url.to_string());
        if self.failing_articles.contains(url) {
            return Err(anyhow!("timed out loading {}", url).into());
        }
        Ok(RawContent {
            full_text: Self::body_for(url),
            image_url: format!("{}/image.png", url),
        })
    }
}

/// Real in-memory repository whose inserts fail for chosen URLs, and whose
/// lookups can be switched off entirely.
pub struct FlakyStore {
    inner: Repository,
    failing_inserts: HashSet<String>,
    lookups_fail: bool,
}

impl FlakyStore {
    pub async fn new() -> Self {
        Self {
            inner: Repository::in_memory().await.unwrap(),
            failing_inserts: HashSet::new(),
            lookups_fail: false,
        }
    }

    pub fn failing_insert(mut self, url: &str) -> Self {
        self.failing_inserts.insert(url.to_string());
        self
    }

    pub fn failing_lookups(mut self) -> Self {
        self.lookups_fail = true;
        self
    }
}

#[async_trait]
impl NewsStore for FlakyStore {
    async fn insert(&self, record: NewNewsRecord) -> Result<i64> {
        if self.failing_inserts.contains(&record.url) {
            return Err(anyhow!("disk I/O error").into());
        }
        self.inner.insert(record).await
    }

    async fn exists_by_url(&self, url: &str) -> Result<bool> {
        if self.lookups_fail {
            return Err(anyhow!("database is locked").into());
        }
        self.inner.exists_by_url(url).await
    }

    async fn count_by_date(&self, date: IngestDate) -> Result<i64> {
        self.inner.count_by_date(date).await
    }

    async fn query_by_date(&self, date: IngestDate) -> Result<Vec<NewsRecord>> {
        self.inner.query_by_date(date).await
    }
}
