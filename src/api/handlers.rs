use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::{AppError, Result};
use crate::models::{IngestDate, NewNewsRecord, NewsRecord, Source};

use super::AppState;

#[derive(Debug, Deserialize)]
pub struct DateQuery {
    pub date: Option<String>,
}

/// Record shape served to the frontend.
#[derive(Debug, Serialize)]
pub struct NewsItem {
    pub title: String,
    pub summary: String,
    pub source: String,
    pub url: String,
    pub rewritten_article: String,
    #[serde(rename = "imageUrl")]
    pub image_url: String,
    pub input_tokens: String,
    pub output_tokens: String,
    pub cost: String,
    pub scraped_title: String,
    pub scraped_text: String,
    pub date: String,
}

impl From<NewsRecord> for NewsItem {
    fn from(record: NewsRecord) -> Self {
        Self {
            title: record.title,
            summary: record.summary,
            source: record.source.to_string(),
            url: record.url,
            rewritten_article: record.rewritten_article,
            image_url: record.image_url,
            input_tokens: record.input_tokens.to_string(),
            output_tokens: record.output_tokens.to_string(),
            cost: record.cost.to_string(),
            scraped_title: record.scraped_title,
            scraped_text: record.scraped_text,
            date: record.date.to_string(),
        }
    }
}

/// Numbers arrive either as JSON numbers or as the stored text form.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Numeric {
    Count(u64),
    Number(f64),
    Text(String),
}

impl Numeric {
    /// Token counts must be non-negative whole numbers.
    fn as_count(&self, field: &str) -> Result<u64> {
        match self {
            Numeric::Count(n) => Ok(*n),
            Numeric::Number(n) => Err(invalid_number(field, n)),
            Numeric::Text(s) => s.trim().parse().map_err(|_| invalid_number(field, s)),
        }
    }

    fn as_amount(&self, field: &str) -> Result<f64> {
        let amount = match self {
            Numeric::Count(n) => *n as f64,
            Numeric::Number(n) => *n,
            Numeric::Text(s) => s.trim().parse().map_err(|_| invalid_number(field, s))?,
        };
        if amount.is_finite() && amount >= 0.0 {
            Ok(amount)
        } else {
            Err(invalid_number(field, &amount))
        }
    }
}

fn invalid_number(field: &str, value: &dyn std::fmt::Debug) -> AppError {
    AppError::Config(format!("{} is not a valid number: {:?}", field, value))
}

#[derive(Debug, Deserialize)]
pub struct AddArticle {
    pub url: String,
    #[serde(default)]
    pub scraped_title: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub scraped_text: String,
    #[serde(default)]
    pub rewritten_article: String,
    pub input_tokens: Option<Numeric>,
    pub output_tokens: Option<Numeric>,
    pub cost: Option<Numeric>,
    pub source: String,
    pub date: String,
}

impl AddArticle {
    fn into_record(self) -> Result<NewNewsRecord> {
        let count = |value: &Option<Numeric>, field: &str| match value {
            Some(n) => n.as_count(field),
            None => Ok(0),
        };

        Ok(NewNewsRecord {
            input_tokens: count(&self.input_tokens, "input_tokens")?,
            output_tokens: count(&self.output_tokens, "output_tokens")?,
            cost: match &self.cost {
                Some(n) => n.as_amount("cost")?,
                None => 0.0,
            },
            source: self.source.parse::<Source>()?,
            date: self.date.parse::<IngestDate>()?,
            url: self.url,
            scraped_title: self.scraped_title,
            title: self.title,
            summary: self.summary,
            image_url: self.image_url,
            scraped_text: self.scraped_text,
            rewritten_article: self.rewritten_article,
        })
    }
}

fn error_response(status: StatusCode, message: String) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

fn authorized(state: &AppState, headers: &HeaderMap) -> bool {
    let Some(token) = state.secret_token.as_deref() else {
        return false;
    };
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value == format!("Bearer {}", token))
}

pub async fn add_article(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: std::result::Result<Json<AddArticle>, JsonRejection>,
) -> Response {
    if !authorized(&state, &headers) {
        return error_response(StatusCode::FORBIDDEN, "Unauthorized".to_string());
    }

    let record = match payload {
        Ok(Json(article)) => article.into_record(),
        Err(rejection) => Err(AppError::Config(rejection.body_text())),
    };
    let record = match record {
        Ok(record) => record,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, format!("DB Error: {}", e)),
    };

    match state.store.insert(record).await {
        Ok(id) => {
            tracing::info!(id, "article added through the API");
            Json(json!({ "status": "Article added to DB" })).into_response()
        }
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, format!("DB Error: {}", e)),
    }
}

pub async fn news_by_date(State(state): State<Arc<AppState>>, Query(query): Query<DateQuery>) -> Response {
    let Some(date) = query.date.and_then(|raw| raw.parse::<IngestDate>().ok()) else {
        return Json(Vec::<NewsItem>::new()).into_response();
    };

    match state.store.query_by_date(date).await {
        Ok(records) => Json(records.into_iter().map(NewsItem::from).collect::<Vec<_>>()).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "query by date failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

pub async fn scraping_status(State(state): State<Arc<AppState>>, Query(query): Query<DateQuery>) -> Response {
    let Some(raw) = query.date.filter(|raw| !raw.is_empty()) else {
        return error_response(StatusCode::BAD_REQUEST, "Missing date parameter".to_string());
    };

    // An unparsable date cannot match any stored row.
    let count = match raw.parse::<IngestDate>() {
        Ok(date) => match state.store.count_by_date(date).await {
            Ok(count) => count,
            Err(e) => return error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
        },
        Err(_) => 0,
    };

    Json(json!({
        "scraped": count > 0,
        "date": raw,
        "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
        "articles_count": count,
    }))
    .into_response()
}

pub async fn run_scraper(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    if !authorized(&state, &headers) {
        return error_response(StatusCode::FORBIDDEN, "Unauthorized".to_string());
    }

    let Ok(_guard) = state.run_lock.try_lock() else {
        return error_response(StatusCode::CONFLICT, "Scraper already running".to_string());
    };

    match state.pipeline.run_all().await.into_result() {
        Ok(()) => Json(json!({ "status": "Scraper completed successfully" })).into_response(),
        Err(reason) => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Scraper failed: {}", reason),
        ),
    }
}
