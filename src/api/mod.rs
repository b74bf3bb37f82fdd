//! HTTP surface: manual inserts, per-date queries and the run trigger.

mod handlers;

pub use handlers::NewsItem;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;

use crate::db::NewsStore;
use crate::error::Result;
use crate::pipeline::Pipeline;

pub struct AppState {
    pub store: Arc<dyn NewsStore>,
    pub pipeline: Arc<Pipeline>,
    /// Bearer token for the mutating routes. `None` rejects every request.
    pub secret_token: Option<String>,
    /// Held for the duration of a triggered run.
    pub run_lock: Mutex<()>,
}

impl AppState {
    pub fn new(store: Arc<dyn NewsStore>, pipeline: Arc<Pipeline>, secret_token: Option<String>) -> Self {
        Self {
            store,
            pipeline,
            secret_token,
            run_lock: Mutex::new(()),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/add", post(handlers::add_article))
        .route("/news-by-date", get(handlers::news_by_date))
        .route("/scraping-status", get(handlers::scraping_status))
        .route("/run-scraper", post(handlers::run_scraper))
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(state))
}

pub async fn serve(state: AppState, bind_addr: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "listening");
    axum::serve(listener, router(state)).await?;
    Ok(())
}
