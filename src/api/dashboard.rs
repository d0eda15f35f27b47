use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::Json,
    routing::get,
    Router,
};
use serde::Deserialize;
use sqlx::PgPool;
use tracing::error;
use uuid::Uuid;

use crate::auth::{jwt_auth_middleware, AuthService};
use crate::models::{CoverageSummary, KenyaHeatmap, TrainingInsights};
use crate::services::{KenyaHeatmapService, TrainingInsightsService};

#[derive(Clone)]
pub struct AppState {
    pub heatmap_service: KenyaHeatmapService,
    pub insights_service: TrainingInsightsService,
}

pub fn dashboard_routes(db: PgPool, auth_service: AuthService) -> Router {
    let state = AppState {
        heatmap_service: KenyaHeatmapService::new(db.clone()),
        insights_service: TrainingInsightsService::new(db),
    };

    Router::new()
        .route("/heatmap", get(county_heatmap))
        .route("/coverage", get(coverage_summary))
        .route("/trainings/:id/insights", get(training_insights))
        .route_layer(middleware::from_fn_with_state(
            auth_service,
            jwt_auth_middleware,
        ))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct HeatmapQuery {
    /// Bypass the five-minute cache
    pub refresh: Option<bool>,
}

/// County-level participant counts with normalized 0-100 intensity
#[tracing::instrument(skip(state))]
async fn county_heatmap(
    State(state): State<AppState>,
    Query(query): Query<HeatmapQuery>,
) -> Result<Json<KenyaHeatmap>, StatusCode> {
    let heatmap = state
        .heatmap_service
        .county_heatmap(query.refresh.unwrap_or(false))
        .await
        .map_err(|e| {
            error!("Failed to compute county heatmap: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    Ok(Json(heatmap))
}

/// Counties covered, plus cadre and status breakdowns for the charts
#[tracing::instrument(skip(state))]
async fn coverage_summary(
    State(state): State<AppState>,
) -> Result<Json<CoverageSummary>, StatusCode> {
    let summary = state
        .insights_service
        .coverage_summary()
        .await
        .map_err(|e| {
            error!("Failed to compute coverage summary: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    Ok(Json(summary))
}

/// Completion/attendance/pass statistics for one training
#[tracing::instrument(skip(state))]
async fn training_insights(
    State(state): State<AppState>,
    Path(training_id): Path<Uuid>,
) -> Result<Json<TrainingInsights>, StatusCode> {
    let insights = state
        .insights_service
        .training_insights(training_id)
        .await
        .map_err(|e| {
            error!("Failed to compute training insights: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .ok_or(StatusCode::NOT_FOUND)?;

    Ok(Json(insights))
}
