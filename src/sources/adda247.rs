use async_trait::async_trait;
use scraper::{ElementRef, Html};
use url::Url;

use crate::error::Result;
use crate::models::{ArticleCandidate, IngestDate, RawContent, Source};
use crate::services::BrowserSession;

use super::{anchor_candidate, element_text, selector, PageExtractor, SettleDelays};

pub const BASE_URL: &str = "https://currentaffairs.adda247.com";

/// Adda247 current affairs. The home page lists the latest posts.
#[derive(Debug, Clone)]
pub struct Adda247 {
    base_url: Url,
    delays: SettleDelays,
}

impl Adda247 {
    pub fn new(delays: SettleDelays) -> Result<Self> {
        Ok(Self {
            base_url: Url::parse(BASE_URL)?,
            delays,
        })
    }

    pub fn parse_listing(&self, html: &str) -> Result<Vec<ArticleCandidate>> {
        let document = Html::parse_document(html);
        let item_selector = selector("li")?;
        let desc_link_selector = selector(".desc a")?;
        let catlist_selector = selector("ul.lcp_catlist li")?;
        let link_selector = selector("a")?;

        let mut candidates = Vec::new();

        for item in document.select(&item_selector) {
            if let Some(anchor) = item.select(&desc_link_selector).next() {
                candidates.extend(anchor_candidate(&self.base_url, anchor));
            }
        }

        for item in document.select(&catlist_selector) {
            if let Some(anchor) = item.select(&link_selector).next() {
                candidates.extend(anchor_candidate(&self.base_url, anchor));
            }
        }

        Ok(candidates)
    }
}

/// Article body and lead image from a rendered post.
pub fn parse_article(html: &str) -> Result<RawContent> {
    let document = Html::parse_document(html);
    let container_selector = selector("div.entry-content")?;
    let block_selector = selector("h2, h3, p, ul, ol")?;
    let item_selector = selector("li")?;
    let featured_selector = selector("div.site-featured-image img")?;
    let image_selector = selector("img")?;

    let container = document
        .select(&container_selector)
        .next()
        .unwrap_or_else(|| document.root_element());

    let mut lines = Vec::new();
    for block in container.select(&block_selector) {
        match block.value().name() {
            "h2" | "h3" => lines.push(format!("\n{}\n", element_text(block))),
            "p" => lines.push(element_text(block)),
            _ => lines.extend(
                block
                    .select(&item_selector)
                    .map(|item| format!("- {}", element_text(item))),
            ),
        }
    }
    let full_text = lines.join("\n").trim().to_string();

    let image: Option<ElementRef<'_>> = document
        .select(&featured_selector)
        .next()
        .or_else(|| container.select(&image_selector).next());
    let image_url = image
        .and_then(|img| img.value().attr("src"))
        .unwrap_or_default()
        .to_string();

    Ok(RawContent {
        full_text,
        image_url,
    })
}

#[async_trait]
impl PageExtractor for Adda247 {
    fn source(&self) -> Source {
        Source::Adda247
    }

    async fn fetch_listing(
        &self,
        session: &mut dyn BrowserSession,
        _today: IngestDate,
    ) -> Result<Vec<ArticleCandidate>> {
        let html = session
            .open_page(self.base_url.as_str(), self.delays.listing)
            .await?;
        let candidates = self.parse_listing(&html)?;
        tracing::info!(source = %Source::Adda247, count = candidates.len(), "listing parsed");
        Ok(candidates)
    }

    async fn fetch_article(&self, session: &mut dyn BrowserSession, url: &str) -> Result<RawContent> {
        let html = session.open_page(url, self.delays.article).await?;
        parse_article(&html)
    }
}
