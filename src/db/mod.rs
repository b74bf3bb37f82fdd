mod repository;
mod schema;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{IngestDate, NewNewsRecord, NewsRecord};

pub use repository::Repository;

/// Storage for ingested articles.
#[async_trait]
pub trait NewsStore: Send + Sync {
    async fn insert(&self, record: NewNewsRecord) -> Result<i64>;

    /// Exact, case-sensitive match on the stored url.
    async fn exists_by_url(&self, url: &str) -> Result<bool>;

    async fn count_by_date(&self, date: IngestDate) -> Result<i64>;

    async fn query_by_date(&self, date: IngestDate) -> Result<Vec<NewsRecord>>;
}
