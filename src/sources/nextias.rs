use async_trait::async_trait;
use scraper::Html;
use url::Url;

use crate::error::Result;
use crate::models::{ArticleCandidate, IngestDate, RawContent, Source};
use crate::services::BrowserSession;

use super::{anchor_candidate, selector, PageExtractor, SettleDelays};

pub const BASE_URL: &str = "https://www.nextias.com";
pub const DEFAULT_LOOKBACK_DAYS: u64 = 5;

/// NextIAS publishes one listing page per calendar day. Days without a
/// digest render a 404 body instead of an error status.
#[derive(Debug, Clone)]
pub struct NextIas {
    base_url: Url,
    delays: SettleDelays,
    lookback_days: u64,
}

impl NextIas {
    pub fn new(delays: SettleDelays) -> Result<Self> {
        Ok(Self {
            base_url: Url::parse(BASE_URL)?,
            delays,
            lookback_days: DEFAULT_LOOKBACK_DAYS,
        })
    }

    pub fn with_lookback_days(mut self, days: u64) -> Self {
        self.lookback_days = days;
        self
    }

    pub fn listing_url(&self, date: IngestDate) -> String {
        format!(
            "{}/ca/current-affairs/{}",
            self.base_url.as_str().trim_end_matches('/'),
            date.dashed()
        )
    }

    /// `None` when the page is the site's not-found placeholder.
    pub fn parse_listing(&self, html: &str) -> Result<Option<Vec<ArticleCandidate>>> {
        let document = Html::parse_document(html);
        let not_found_selector = selector("div.error404")?;
        let link_selector = selector("div.row.card-text.entry-meta > a")?;

        if document.select(&not_found_selector).next().is_some() {
            return Ok(None);
        }

        let candidates = document
            .select(&link_selector)
            .filter_map(|anchor| anchor_candidate(&self.base_url, anchor))
            .collect();
        Ok(Some(candidates))
    }
}

/// Every non-blank text node of the post body, one per line.
pub fn parse_article(html: &str) -> Result<RawContent> {
    let document = Html::parse_document(html);
    let container_selector = selector("div.entry-content")?;
    let image_selector = selector("img")?;

    let Some(container) = document.select(&container_selector).next() else {
        return Ok(RawContent::default());
    };

    let full_text = container
        .text()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n");

    let image_url = container
        .select(&image_selector)
        .next()
        .and_then(|img| img.value().attr("src"))
        .unwrap_or_default()
        .to_string();

    Ok(RawContent {
        full_text,
        image_url,
    })
}

#[async_trait]
impl PageExtractor for NextIas {
    fn source(&self) -> Source {
        Source::NextIas
    }

    async fn fetch_listing(
        &self,
        session: &mut dyn BrowserSession,
        today: IngestDate,
    ) -> Result<Vec<ArticleCandidate>> {
        for offset in 0..self.lookback_days {
            let Some(date) = today.days_before(offset) else {
                break;
            };
            let url = self.listing_url(date);
            let html = session.open_page(&url, self.delays.listing).await?;

            match self.parse_listing(&html)? {
                Some(candidates) => {
                    tracing::info!(
                        source = %Source::NextIas,
                        listing_date = %date,
                        count = candidates.len(),
                        "listing parsed"
                    );
                    return Ok(candidates);
                }
                None => tracing::info!(%url, "no digest for this date, trying the previous day"),
            }
        }

        tracing::warn!(
            source = %Source::NextIas,
            lookback_days = self.lookback_days,
            "no listing found in the lookback window"
        );
        Ok(Vec::new())
    }

    async fn fetch_article(&self, session: &mut dyn BrowserSession, url: &str) -> Result<RawContent> {
        let html = session.open_page(url, self.delays.article).await?;
        parse_article(&html)
    }
}
