use async_trait::async_trait;
use rusqlite::types::Type;
use rusqlite::{params, Row};
use tokio_rusqlite::Connection;

use crate::error::Result;
use crate::models::{IngestDate, NewNewsRecord, NewsRecord, Source};

use super::schema::SCHEMA;
use super::NewsStore;

pub struct Repository {
    conn: Connection,
}

impl Repository {
    pub async fn new(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path).await?;
        Self::init(conn).await
    }

    pub async fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().await?;
        Self::init(conn).await
    }

    async fn init(conn: Connection) -> Result<Self> {
        conn.call(|conn| {
            conn.execute_batch(SCHEMA)?;
            Ok(())
        })
        .await?;

        Ok(Self { conn })
    }
}

#[async_trait]
impl NewsStore for Repository {
    async fn insert(&self, record: NewNewsRecord) -> Result<i64> {
        let id = self
            .conn
            .call(move |conn| {
                conn.execute(
                    r#"INSERT INTO news (url, scraped_title, title, summary, image_url, scraped_text,
                                         rewritten_article, input_tokens, output_tokens, cost, source, date)
                       VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)"#,
                    params![
                        record.url,
                        record.scraped_title,
                        record.title,
                        record.summary,
                        record.image_url,
                        record.scraped_text,
                        record.rewritten_article,
                        record.input_tokens.to_string(),
                        record.output_tokens.to_string(),
                        record.cost.to_string(),
                        record.source.as_str(),
                        record.date.to_string(),
                    ],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await?;
        Ok(id)
    }

    async fn exists_by_url(&self, url: &str) -> Result<bool> {
        let url = url.to_string();
        let exists = self
            .conn
            .call(move |conn| {
                let exists: bool = conn.query_row(
                    "SELECT EXISTS(SELECT 1 FROM news WHERE url = ?1)",
                    params![url],
                    |row| row.get(0),
                )?;
                Ok(exists)
            })
            .await?;
        Ok(exists)
    }

    async fn count_by_date(&self, date: IngestDate) -> Result<i64> {
        let date = date.to_string();
        let count = self
            .conn
            .call(move |conn| {
                let count: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM news WHERE date = ?1",
                    params![date],
                    |row| row.get(0),
                )?;
                Ok(count)
            })
            .await?;
        Ok(count)
    }

    async fn query_by_date(&self, date: IngestDate) -> Result<Vec<NewsRecord>> {
        let date = date.to_string();
        let records = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    r#"SELECT id, url, scraped_title, title, summary, image_url, scraped_text,
                              rewritten_article, input_tokens, output_tokens, cost, source, date
                       FROM news
                       WHERE date = ?1
                       ORDER BY id"#,
                )?;
                let records = stmt
                    .query_map(params![date], news_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(records)
            })
            .await?;
        Ok(records)
    }
}

fn text(row: &Row, idx: usize) -> rusqlite::Result<String> {
    Ok(row.get::<_, Option<String>>(idx)?.unwrap_or_default())
}

fn conversion_failure(idx: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, message.into())
}

fn news_from_row(row: &Row) -> rusqlite::Result<NewsRecord> {
    let source = text(row, 11)?;
    let date = text(row, 12)?;
    Ok(NewsRecord {
        id: row.get(0)?,
        url: text(row, 1)?,
        scraped_title: text(row, 2)?,
        title: text(row, 3)?,
        summary: text(row, 4)?,
        image_url: text(row, 5)?,
        scraped_text: text(row, 6)?,
        rewritten_article: text(row, 7)?,
        input_tokens: text(row, 8)?.parse().unwrap_or(0),
        output_tokens: text(row, 9)?.parse().unwrap_or(0),
        cost: text(row, 10)?.parse().unwrap_or(0.0),
        source: source
            .parse::<Source>()
            .map_err(|e| conversion_failure(11, e.to_string()))?,
        date: date
            .parse::<IngestDate>()
            .map_err(|e| conversion_failure(12, e.to_string()))?,
    })
}
