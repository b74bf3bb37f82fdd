//! Per-site extraction rules.
//!
//! Each site gets a [`PageExtractor`] that drives a [`BrowserSession`] to the
//! listing and article pages. The markup parsing itself is plain functions
//! over HTML strings, so it can be exercised without a browser.

pub mod adda247;
pub mod nextias;

use std::time::Duration;

use async_trait::async_trait;
use scraper::{ElementRef, Selector};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{ArticleCandidate, IngestDate, RawContent, Source};
use crate::services::BrowserSession;

pub use adda247::Adda247;
pub use nextias::NextIas;

#[async_trait]
pub trait PageExtractor: Send + Sync {
    fn source(&self) -> Source;

    /// Candidates from the site's current listing, in page order.
    ///
    /// An error here means the listing could not be loaded at all.
    async fn fetch_listing(
        &self,
        session: &mut dyn BrowserSession,
        today: IngestDate,
    ) -> Result<Vec<ArticleCandidate>>;

    async fn fetch_article(&self, session: &mut dyn BrowserSession, url: &str) -> Result<RawContent>;
}

/// Post-navigation waits for client-side rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettleDelays {
    pub listing: Duration,
    pub article: Duration,
}

impl Default for SettleDelays {
    fn default() -> Self {
        Self {
            listing: Duration::from_secs(3),
            article: Duration::from_secs(2),
        }
    }
}

pub(crate) fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| AppError::Config(format!("invalid selector {:?}: {}", css, e)))
}

/// Element text with runs of whitespace collapsed to single spaces.
pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Resolve a potentially relative href against the site root.
pub(crate) fn resolve_url(base: &Url, href: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        return href.to_string();
    }

    match base.join(href) {
        Ok(resolved) => resolved.to_string(),
        Err(_) => href.to_string(),
    }
}

/// `(href, text)` candidate for an anchor, if it has an href.
pub(crate) fn anchor_candidate(base: &Url, anchor: ElementRef<'_>) -> Option<ArticleCandidate> {
    let href = anchor.value().attr("href")?.trim();
    if href.is_empty() {
        return None;
    }
    Some(ArticleCandidate {
        url: resolve_url(base, href),
        scraped_title: element_text(anchor),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    #[test]
    fn test_element_text_collapses_whitespace() {
        let doc = Html::parse_fragment("<p>  G20   summit\n in <b>New Delhi</b> </p>");
        let p = doc.select(&selector("p").unwrap()).next().unwrap();
        assert_eq!(element_text(p), "G20 summit in New Delhi");
    }

    #[test]
    fn test_resolve_url() {
        let base = Url::parse("https://currentaffairs.adda247.com").unwrap();
        assert_eq!(
            resolve_url(&base, "/rbi-policy/"),
            "https://currentaffairs.adda247.com/rbi-policy/"
        );
        assert_eq!(
            resolve_url(&base, "https://other.example/x"),
            "https://other.example/x"
        );
    }

    #[test]
    fn test_anchor_without_href_is_skipped() {
        let base = Url::parse("https://example.com").unwrap();
        let doc = Html::parse_fragment(r#"<a>no link</a><a href=" ">blank</a><a href="/a">A</a>"#);
        let candidates: Vec<_> = doc
            .select(&selector("a").unwrap())
            .filter_map(|a| anchor_candidate(&base, a))
            .collect();
        assert_eq!(
            candidates,
            vec![ArticleCandidate {
                url: "https://example.com/a".to_string(),
                scraped_title: "A".to_string(),
            }]
        );
    }
}
