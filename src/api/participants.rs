use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::Json,
    routing::{get, post},
    Router,
};
use axum_extra::extract::WithRejection;
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::{coordinator_or_admin_middleware, jwt_auth_middleware, AuthService};
use crate::models::{
    CreateParticipant, ParticipantStatus, TrainingParticipant, UpdateParticipant,
};
use crate::services::ParticipantService;

use super::ApiError;

#[derive(Clone)]
pub struct AppState {
    pub participant_service: ParticipantService,
}

pub fn participant_routes(db: PgPool, auth_service: AuthService) -> Router {
    let state = AppState {
        participant_service: ParticipantService::new(db),
    };

    Router::new()
        .route("/", post(create_participant).get(list_participants))
        .route(
            "/:id",
            get(get_participant)
                .put(update_participant)
                .delete(delete_participant),
        )
        .route_layer(middleware::from_fn(coordinator_or_admin_middleware))
        .route_layer(middleware::from_fn_with_state(
            auth_service,
            jwt_auth_middleware,
        ))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct ParticipantListQuery {
    pub training_id: Option<Uuid>,
    pub county_id: Option<Uuid>,
    pub status: Option<ParticipantStatus>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Register a mentee into a training (admin side)
async fn create_participant(
    State(state): State<AppState>,
    WithRejection(Json(participant_data), _): WithRejection<Json<CreateParticipant>, ApiError>,
) -> Result<(StatusCode, Json<TrainingParticipant>), StatusCode> {
    let duplicate = state
        .participant_service
        .enrollment_exists(participant_data.training_id, &participant_data.email)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    if duplicate {
        return Err(StatusCode::CONFLICT);
    }

    let participant = state
        .participant_service
        .create_participant(participant_data)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok((StatusCode::CREATED, Json(participant)))
}

async fn list_participants(
    State(state): State<AppState>,
    Query(query): Query<ParticipantListQuery>,
) -> Result<Json<Vec<TrainingParticipant>>, StatusCode> {
    let limit = query.limit.unwrap_or(50).clamp(1, 100);
    let offset = query.offset.unwrap_or(0).max(0);

    let participants = state
        .participant_service
        .list_participants(query.training_id, query.county_id, query.status, limit, offset)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(Json(participants))
}

async fn get_participant(
    State(state): State<AppState>,
    Path(participant_id): Path<Uuid>,
) -> Result<Json<TrainingParticipant>, StatusCode> {
    let participant = state
        .participant_service
        .get_participant_by_id(participant_id)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or(StatusCode::NOT_FOUND)?;

    Ok(Json(participant))
}

async fn update_participant(
    State(state): State<AppState>,
    Path(participant_id): Path<Uuid>,
    Json(participant_data): Json<UpdateParticipant>,
) -> Result<Json<TrainingParticipant>, StatusCode> {
    let participant = state
        .participant_service
        .update_participant(participant_id, participant_data)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or(StatusCode::NOT_FOUND)?;

    Ok(Json(participant))
}

async fn delete_participant(
    State(state): State<AppState>,
    Path(participant_id): Path<Uuid>,
) -> Result<StatusCode, StatusCode> {
    let deleted = state
        .participant_service
        .delete_participant(participant_id)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(StatusCode::NOT_FOUND)
    }
}
