use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, warn};

use crate::analysis::{AnalysisBundle, Analyzer};
use crate::api::health::HealthState;
use crate::api::latency::{LatencySnapshot, LatencyStats};
use crate::db::{DrawStore, SqliteStore};
use crate::draw_refresh::update_draws;
use crate::error::AppError;
use crate::fetcher::DrawFetcher;
use crate::scorer::CandidateSet;
use crate::types::{AnalysisRecord, Draw, Period, Statistics};

#[derive(Clone)]
pub struct ApiState {
    pub store: SqliteStore,
    pub analyzer: Arc<Analyzer<SqliteStore>>,
    pub fetcher: Arc<DrawFetcher>,
    pub health: Arc<HealthState>,
    pub latency: Arc<LatencyStats>,
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(get_health))
        .route("/api/latest-number", get(get_latest_number))
        .route("/api/history", get(get_history))
        .route("/api/update", post(post_update))
        .route("/api/statistics", get(get_statistics))
        .route("/api/analyze", post(post_analyze))
        .route("/api/analysis/latest", get(get_latest_analysis))
        .route("/api/stats/latency", get(get_stats_latency))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Query param structs
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct HistoryQuery {
    pub page: Option<usize>,
    pub limit: Option<usize>,
}

#[derive(Deserialize)]
pub struct AnalyzeQuery {
    /// Newest draws to analyze; absent or 0 means the full history.
    pub periods: Option<usize>,
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
    pub database: &'static str,
    pub total_draws: Option<usize>,
    pub last_fetch_at: Option<DateTime<Utc>>,
    pub last_fetch_written: u64,
    pub last_analysis_at: Option<DateTime<Utc>>,
    pub update_in_progress: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Serialize)]
pub struct AnalysisSummary {
    pub total_periods: usize,
    pub last_update: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct LatestNumberResponse {
    pub latest_period: Period,
    pub latest_date: NaiveDate,
    pub latest_numbers: Vec<u8>,
    pub latest_special: u8,
    pub recommended_avoid_numbers: Vec<u8>,
    pub recommended_avoid_sets: Vec<CandidateSet>,
    pub recommended_likely_numbers: Vec<u8>,
    pub recommended_likely_sets: Vec<CandidateSet>,
    pub analysis_summary: AnalysisSummary,
}

#[derive(Serialize)]
pub struct HistoryResponse {
    pub data: Vec<Draw>,
    pub total: usize,
    pub page: usize,
    pub per_page: usize,
}

#[derive(Serialize)]
pub struct UpdateResponse {
    pub success: bool,
    pub message: String,
    pub updated_count: usize,
    pub last_period: Option<Period>,
}

#[derive(Serialize)]
pub struct AnalyzeResponse {
    pub success: bool,
    pub message: String,
    #[serde(flatten)]
    pub bundle: Option<AnalysisBundle>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

const MAX_PAGE_SIZE: usize = 100;

async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": "Super Lotto number analysis API",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn get_health(State(state): State<ApiState>) -> Json<HealthResponse> {
    let count = state.store.count_draws().await;
    let (status, database, total_draws, error) = match count {
        Ok(n) => ("healthy", "connected", Some(n), None),
        Err(e) => ("unhealthy", "unavailable", None, Some(e.to_string())),
    };
    Json(HealthResponse {
        status,
        timestamp: Utc::now(),
        database,
        total_draws,
        last_fetch_at: state.health.last_fetch_at(),
        last_fetch_written: state.health.last_fetch_written(),
        last_analysis_at: state.health.last_analysis_at(),
        update_in_progress: state.health.update_in_progress(),
        error,
    })
}

/// Latest draw plus a fresh analysis. Falls back to the stored analysis when
/// the history is too short to analyze.
async fn get_latest_number(
    State(state): State<ApiState>,
) -> Result<Json<LatestNumberResponse>, AppError> {
    let latest = state
        .store
        .get_latest_draw()
        .await?
        .ok_or_else(|| AppError::NotFound("no draws stored".to_string()))?;

    let (avoid_sets, likely_sets, summary) = match state.analyzer.analyze(None).await? {
        Some(bundle) => {
            let summary = AnalysisSummary {
                total_periods: bundle.total_periods,
                last_update: bundle.analysis_date,
            };
            (bundle.avoid_number_sets, bundle.likely_number_sets, summary)
        }
        None => {
            let stored = state.analyzer.latest_analysis().await?.ok_or_else(|| {
                AppError::NotFound("no analysis available, not enough draws".to_string())
            })?;
            let summary = AnalysisSummary {
                total_periods: stored.total_periods,
                last_update: stored.analysis_date,
            };
            (vec![stored.avoid_numbers], Vec::new(), summary)
        }
    };

    Ok(Json(LatestNumberResponse {
        latest_period: latest.period,
        latest_date: latest.draw_date,
        latest_numbers: latest.numbers.to_vec(),
        latest_special: latest.special_number,
        recommended_avoid_numbers: avoid_sets.first().cloned().unwrap_or_default(),
        recommended_avoid_sets: avoid_sets,
        recommended_likely_numbers: likely_sets.first().cloned().unwrap_or_default(),
        recommended_likely_sets: likely_sets,
        analysis_summary: summary,
    }))
}

async fn get_history(
    State(state): State<ApiState>,
    Query(params): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>, AppError> {
    let page = params.page.unwrap_or(1).max(1);
    let per_page = params.limit.unwrap_or(10).clamp(1, MAX_PAGE_SIZE);

    let total = state.store.count_draws().await?;
    let data = state.store.get_draws_paginated(page, per_page).await?;

    Ok(Json(HistoryResponse {
        data,
        total,
        page,
        per_page,
    }))
}

/// Fetch and upsert new draws, then analyze in the background.
async fn post_update(State(state): State<ApiState>) -> impl IntoResponse {
    let Some(_guard) = state.health.try_begin_update() else {
        return (
            StatusCode::CONFLICT,
            Json(UpdateResponse {
                success: false,
                message: "update already in progress".to_string(),
                updated_count: 0,
                last_period: None,
            }),
        );
    };

    info!("Manual update requested");
    let outcome = match update_draws(&state.store, &state.fetcher, &state.health).await {
        Ok(o) => o,
        Err(e) => {
            warn!("Manual update failed: {e}");
            return (
                StatusCode::OK,
                Json(UpdateResponse {
                    success: false,
                    message: format!("update failed: {e}"),
                    updated_count: 0,
                    last_period: None,
                }),
            );
        }
    };

    let analyzer = Arc::clone(&state.analyzer);
    tokio::spawn(async move {
        if let Err(e) = analyzer.analyze(None).await {
            error!("Background analysis after update failed: {e}");
        }
    });

    (
        StatusCode::OK,
        Json(UpdateResponse {
            success: true,
            message: format!("update complete, {} draws fetched", outcome.fetched),
            updated_count: outcome.written,
            last_period: outcome.last_period,
        }),
    )
}

async fn get_statistics(State(state): State<ApiState>) -> Result<Json<Statistics>, AppError> {
    Ok(Json(state.analyzer.statistics().await?))
}

async fn post_analyze(
    State(state): State<ApiState>,
    Query(params): Query<AnalyzeQuery>,
) -> Result<Json<AnalyzeResponse>, AppError> {
    let response = match state.analyzer.analyze(params.periods).await? {
        Some(bundle) => AnalyzeResponse {
            success: true,
            message: format!("analyzed {} draws", bundle.total_periods),
            bundle: Some(bundle),
        },
        None => AnalyzeResponse {
            success: false,
            message: "not enough draws to analyze, at least 3 are required".to_string(),
            bundle: None,
        },
    };
    Ok(Json(response))
}

async fn get_latest_analysis(
    State(state): State<ApiState>,
) -> Result<Json<AnalysisRecord>, AppError> {
    state
        .analyzer
        .latest_analysis()
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("no analysis stored".to_string()))
}

async fn get_stats_latency(State(state): State<ApiState>) -> Json<LatencySnapshot> {
    Json(state.latency.snapshot())
}
