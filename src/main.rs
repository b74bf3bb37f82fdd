use std::sync::Arc;

use anyhow::anyhow;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod ai;
mod api;
mod cli;
mod config;
mod db;
mod error;
mod models;
mod pipeline;
mod services;
mod sources;
#[cfg(test)]
mod testing;

use ai::{OpenAiChat, Rewriter, TokenAccountant};
use api::{AppState, NewsItem};
use cli::{Cli, Command};
use config::Config;
use db::{NewsStore, Repository};
use error::{AppError, Result};
use models::IngestDate;
use pipeline::{Pipeline, RunReport};
use services::ChromeLauncher;
use sources::{Adda247, NextIas, PageExtractor};

#[tokio::main]
async fn main() -> Result<()> {
    // .env is optional; real environment variables win
    dotenvy::dotenv().ok();

    // Initialize logging (info by default, RUST_LOG overrides)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;
    let store: Arc<dyn NewsStore> = Arc::new(Repository::new(&config.db_path).await?);

    match cli.command {
        Command::Run => {
            let pipeline = build_pipeline(&config, store)?;
            let report = pipeline.run_all().await;
            print_report(&report);
            report
                .into_result()
                .map_err(|reason| AppError::Other(anyhow!(reason)))?;
        }
        Command::Serve { bind } => {
            let pipeline = Arc::new(build_pipeline(&config, store.clone())?);
            if config.secret_token.is_none() {
                tracing::warn!("SECRET_TOKEN is not set; /add and /run-scraper will reject every request");
            }
            let state = AppState::new(store, pipeline, config.secret_token.clone());
            let bind_addr = bind.unwrap_or_else(|| config.bind_addr.clone());
            api::serve(state, &bind_addr).await?;
        }
        Command::Articles { date } => {
            let date: IngestDate = date.parse()?;
            let items: Vec<NewsItem> = store
                .query_by_date(date)
                .await?
                .into_iter()
                .map(NewsItem::from)
                .collect();
            println!("{}", serde_json::to_string_pretty(&items)?);
        }
        Command::Status { date } => {
            let date: IngestDate = date.parse()?;
            let count = store.count_by_date(date).await?;
            println!("{} articles stored for {}", count, date);
        }
    }

    Ok(())
}

fn build_pipeline(config: &Config, store: Arc<dyn NewsStore>) -> Result<Pipeline> {
    let chat = OpenAiChat::new(config.require_api_key()?.to_string())?
        .with_base_url(&config.openai_base_url);
    let accountant = TokenAccountant::for_model(&config.model_name)?.with_pricing(config.pricing());
    let rewriter = Rewriter::new(Arc::new(chat), accountant).with_temperature(config.temperature);

    let launcher = Arc::new(ChromeLauncher::new(
        config.headless,
        config.no_sandbox,
        config.chrome_path.clone(),
    ));

    let delays = config.settle_delays();
    let extractors: Vec<Arc<dyn PageExtractor>> = vec![
        Arc::new(Adda247::new(delays)?),
        Arc::new(NextIas::new(delays)?.with_lookback_days(config.lookback_days)),
    ];

    Ok(Pipeline::new(store, rewriter, launcher, extractors, config.article_limit))
}

fn print_report(report: &RunReport) {
    let outcome = if report.succeeded() {
        "completed"
    } else {
        "completed with failures"
    };
    println!(
        "Run for {} {}, {} articles stored",
        report.date,
        outcome,
        report.persisted()
    );
    for source_report in &report.sources {
        match &source_report.outcome {
            Ok(stats) => println!(
                "  {}: {} listed, {} already stored, {} stored, {} failed",
                source_report.source, stats.listed, stats.duplicates, stats.persisted, stats.failed
            ),
            Err(e) => println!("  {}: {}", source_report.source, e),
        }
    }
}
