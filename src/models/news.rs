use std::fmt;
use std::str::FromStr;

use crate::error::AppError;

use super::{IngestDate, ParsedRewrite, RewriteResult};

/// A site the pipeline scrapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    Adda247,
    NextIas,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Adda247 => "Adda247",
            Source::NextIas => "NextIAS",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Source {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Adda247" => Ok(Source::Adda247),
            "NextIAS" => Ok(Source::NextIas),
            other => Err(AppError::Config(format!("unknown source: {}", other))),
        }
    }
}

/// A link discovered on a listing page, not yet checked or fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleCandidate {
    pub url: String,
    pub scraped_title: String,
}

/// Text and lead image pulled from one article page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawContent {
    pub full_text: String,
    /// Empty when the page has no usable image.
    pub image_url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewsRecord {
    pub id: i64,
    pub url: String,
    pub scraped_title: String,
    pub title: String,
    pub summary: String,
    pub image_url: String,
    pub scraped_text: String,
    pub rewritten_article: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cost: f64,
    pub source: Source,
    pub date: IngestDate,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewNewsRecord {
    pub url: String,
    pub scraped_title: String,
    pub title: String,
    pub summary: String,
    pub image_url: String,
    pub scraped_text: String,
    pub rewritten_article: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cost: f64,
    pub source: Source,
    pub date: IngestDate,
}

impl NewNewsRecord {
    /// Combine the extraction and rewrite outputs for one article.
    pub fn assemble(
        candidate: ArticleCandidate,
        raw: RawContent,
        rewrite: &RewriteResult,
        parsed: ParsedRewrite,
        source: Source,
        date: IngestDate,
    ) -> Self {
        Self {
            url: candidate.url,
            scraped_title: candidate.scraped_title,
            title: parsed.title,
            summary: parsed.summary,
            image_url: raw.image_url,
            scraped_text: raw.full_text,
            rewritten_article: parsed.rewritten_article,
            input_tokens: rewrite.input_tokens(),
            output_tokens: rewrite.output_tokens(),
            cost: rewrite.cost(),
            source,
            date,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_round_trips_through_display() {
        for source in [Source::Adda247, Source::NextIas] {
            assert_eq!(source.to_string().parse::<Source>().unwrap(), source);
        }
        assert!("nextias".parse::<Source>().is_err());
    }

    #[test]
    fn test_assemble_after_failed_rewrite_keeps_extraction() {
        let date = IngestDate::from_ymd(2025, 6, 1).unwrap();
        let record = NewNewsRecord::assemble(
            ArticleCandidate {
                url: "https://example.com/a".to_string(),
                scraped_title: "Scraped".to_string(),
            },
            RawContent {
                full_text: "Body".to_string(),
                image_url: "https://example.com/a.png".to_string(),
            },
            &RewriteResult::Failed {
                reason: "Error summarizing: timeout".to_string(),
            },
            ParsedRewrite::default(),
            Source::Adda247,
            date,
        );

        assert_eq!(record.title, "");
        assert_eq!(record.rewritten_article, "");
        assert_eq!(record.scraped_text, "Body");
        assert_eq!(record.input_tokens, 0);
        assert_eq!(record.cost, 0.0);
    }
}
