//! One ingestion run: every configured source, one after another.

use std::sync::Arc;

use crate::ai::{parse_rewrite, Rewriter};
use crate::db::NewsStore;
use crate::error::{AppError, ArticleError, Result};
use crate::models::{ArticleCandidate, IngestDate, NewNewsRecord, ParsedRewrite, RewriteResult, Source};
use crate::services::{BrowserLauncher, BrowserSession};
use crate::sources::PageExtractor;

pub const DEFAULT_ARTICLE_LIMIT: usize = 10;

/// Per-source counters for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SourceStats {
    pub listed: usize,
    pub duplicates: usize,
    pub attempted: usize,
    pub persisted: usize,
    pub failed: usize,
}

#[derive(Debug)]
pub struct SourceReport {
    pub source: Source,
    pub outcome: Result<SourceStats>,
}

#[derive(Debug)]
pub struct RunReport {
    pub date: IngestDate,
    pub sources: Vec<SourceReport>,
}

impl RunReport {
    pub fn succeeded(&self) -> bool {
        self.sources.iter().all(|report| report.outcome.is_ok())
    }

    /// Total records written across sources.
    pub fn persisted(&self) -> usize {
        self.sources
            .iter()
            .filter_map(|report| report.outcome.as_ref().ok())
            .map(|stats| stats.persisted)
            .sum()
    }

    /// `Err` carries every source failure joined with `"; "`.
    pub fn into_result(self) -> std::result::Result<(), String> {
        let failures: Vec<String> = self
            .sources
            .into_iter()
            .filter_map(|report| report.outcome.err())
            .map(|e| e.to_string())
            .collect();

        if failures.is_empty() {
            Ok(())
        } else {
            Err(failures.join("; "))
        }
    }
}

pub struct Pipeline {
    store: Arc<dyn NewsStore>,
    rewriter: Rewriter,
    launcher: Arc<dyn BrowserLauncher>,
    extractors: Vec<Arc<dyn PageExtractor>>,
    article_limit: usize,
}

impl Pipeline {
    pub fn new(
        store: Arc<dyn NewsStore>,
        rewriter: Rewriter,
        launcher: Arc<dyn BrowserLauncher>,
        extractors: Vec<Arc<dyn PageExtractor>>,
        article_limit: usize,
    ) -> Self {
        Self {
            store,
            rewriter,
            launcher,
            extractors,
            article_limit,
        }
    }

    pub async fn run_all(&self) -> RunReport {
        self.run_all_on(IngestDate::today()).await
    }

    /// Runs each source in order. A failed source never stops the next one.
    pub async fn run_all_on(&self, date: IngestDate) -> RunReport {
        let mut sources = Vec::with_capacity(self.extractors.len());

        for extractor in &self.extractors {
            let source = extractor.source();
            tracing::info!(%source, %date, "source run started");

            let outcome = self.run_source(extractor.as_ref(), date).await;
            match &outcome {
                Ok(stats) => tracing::info!(
                    %source,
                    listed = stats.listed,
                    duplicates = stats.duplicates,
                    persisted = stats.persisted,
                    failed = stats.failed,
                    "source run finished"
                ),
                Err(e) => tracing::error!(%source, error = %e, "source run failed"),
            }
            sources.push(SourceReport { source, outcome });
        }

        RunReport { date, sources }
    }

    /// The browser session is closed on every exit path.
    pub async fn run_source(&self, extractor: &dyn PageExtractor, date: IngestDate) -> Result<SourceStats> {
        let mut session = self.launcher.launch().await?;

        let outcome = self.ingest(extractor, session.as_mut(), date).await;

        if let Err(e) = session.close().await {
            tracing::warn!(source = %extractor.source(), error = %e, "failed to close browser session");
        }
        outcome
    }

    async fn ingest(
        &self,
        extractor: &dyn PageExtractor,
        session: &mut dyn BrowserSession,
        date: IngestDate,
    ) -> Result<SourceStats> {
        let source = extractor.source();
        let candidates = extractor
            .fetch_listing(session, date)
            .await
            .map_err(|e| AppError::Listing {
                site: source,
                reason: e.to_string(),
            })?;

        let mut stats = SourceStats {
            listed: candidates.len(),
            ..SourceStats::default()
        };

        // Duplicates are free; only new candidates count against the limit.
        for candidate in candidates {
            if stats.attempted >= self.article_limit {
                tracing::debug!(%source, limit = self.article_limit, "article limit reached");
                break;
            }

            if self.store.exists_by_url(&candidate.url).await? {
                stats.duplicates += 1;
                tracing::debug!(%source, url = %candidate.url, "already ingested, skipping");
                continue;
            }

            stats.attempted += 1;
            let url = candidate.url.clone();
            match self.ingest_article(extractor, session, candidate, date).await {
                Ok(id) => {
                    stats.persisted += 1;
                    tracing::info!(%source, %url, id, "article stored");
                }
                Err(e) => {
                    stats.failed += 1;
                    tracing::warn!(%source, %url, stage = %e.stage, error = %e.error, "article skipped");
                }
            }
        }

        Ok(stats)
    }

    async fn ingest_article(
        &self,
        extractor: &dyn PageExtractor,
        session: &mut dyn BrowserSession,
        candidate: ArticleCandidate,
        date: IngestDate,
    ) -> std::result::Result<i64, ArticleError> {
        let raw = extractor
            .fetch_article(session, &candidate.url)
            .await
            .map_err(ArticleError::fetch)?;

        let rewrite = self.rewriter.rewrite(&raw.full_text).await;
        let parsed = match &rewrite {
            RewriteResult::Completed { raw_text, .. } => parse_rewrite(raw_text),
            RewriteResult::Failed { reason } => {
                tracing::warn!(url = %candidate.url, %reason, "rewrite failed, storing extraction only");
                ParsedRewrite::default()
            }
        };

        let record = NewNewsRecord::assemble(candidate, raw, &rewrite, parsed, extractor.source(), date);
        self.store.insert(record).await.map_err(ArticleError::persist)
    }
}
