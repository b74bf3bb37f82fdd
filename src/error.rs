use std::fmt;

use thiserror::Error;

use crate::models::Source;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] tokio_rusqlite::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("Config write error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Browser error: {0}")]
    Browser(#[from] chromiumoxide::error::CdpError),

    #[error("Tokenizer error: {0}")]
    Tokenizer(String),

    #[error("Chat API error: {0}")]
    ChatApi(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("{site} listing failed: {reason}")]
    Listing { site: Source, reason: String },

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;

/// Which per-article stage failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArticleStage {
    Fetch,
    Persist,
}

impl fmt::Display for ArticleStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArticleStage::Fetch => f.write_str("fetch"),
            ArticleStage::Persist => f.write_str("persist"),
        }
    }
}

/// A failure scoped to one candidate. The pipeline logs it and moves on.
#[derive(Debug, Error)]
#[error("{stage} failed: {error}")]
pub struct ArticleError {
    pub stage: ArticleStage,
    #[source]
    pub error: AppError,
}

impl ArticleError {
    pub fn fetch(error: AppError) -> Self {
        Self {
            stage: ArticleStage::Fetch,
            error,
        }
    }

    pub fn persist(error: AppError) -> Self {
        Self {
            stage: ArticleStage::Persist,
            error,
        }
    }
}
