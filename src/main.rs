mod analysis;
mod api;
mod config;
mod db;
mod draw_refresh;
mod error;
mod fetcher;
mod scorer;
mod types;

use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::analysis::Analyzer;
use crate::api::health::HealthState;
use crate::api::latency::LatencyStats;
use crate::api::routes::{router, ApiState};
use crate::config::Config;
use crate::db::seed::seed_if_empty;
use crate::db::{DrawStore, SqliteStore};
use crate::draw_refresh::DrawRefresher;
use crate::error::Result;
use crate::fetcher::DrawFetcher;

#[tokio::main]
async fn main() {
    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cfg.log_level))
        .init();

    if let Err(e) = run(cfg).await {
        error!("Fatal error: {e}");
        std::process::exit(1);
    }
}

async fn run(cfg: Config) -> Result<()> {
    // --- Database setup ---
    let pool = sqlx::SqlitePool::connect(&format!("sqlite:{}?mode=rwc", cfg.db_path)).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    let store = SqliteStore::new(pool);
    info!("Database ready at {}", cfg.db_path);

    if cfg.seed_sample_data {
        seed_if_empty(&store).await?;
    }
    let draw_count = store.count_draws().await?;
    if draw_count == 0 {
        warn!("No draws stored yet. POST /api/update to fetch history from the provider.");
    } else {
        info!("{draw_count} draws stored");
    }

    // --- Services ---
    let health = Arc::new(HealthState::new());
    let latency = Arc::new(LatencyStats::new());
    let analyzer = Arc::new(Analyzer::new(
        store.clone(),
        cfg.analysis_seed,
        Arc::clone(&latency),
        Arc::clone(&health),
    ));
    let fetcher = Arc::new(DrawFetcher::new(&cfg)?);
    if cfg.analysis_seed.is_some() {
        info!("Shuffled candidate set seeded from ANALYSIS_SEED");
    }

    // --- Spawn tasks ---

    // Draw refresher (background, every REFRESH_INTERVAL_SECS)
    if cfg.refresh_interval_secs > 0 {
        let refresher = DrawRefresher::new(
            cfg.refresh_interval_secs,
            store.clone(),
            Arc::clone(&fetcher),
            Arc::clone(&analyzer),
            Arc::clone(&health),
        );
        info!("Scheduled refresh every {}s", cfg.refresh_interval_secs);
        tokio::spawn(async move { refresher.run().await });
    }

    // HTTP API server
    let api_state = ApiState {
        store,
        analyzer,
        fetcher,
        health,
        latency,
    };
    let app = router(api_state);
    let bind_addr = format!("0.0.0.0:{}", cfg.api_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("HTTP API listening on {bind_addr}");

    axum::serve(listener, app).await?;

    Ok(())
}
