use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::Json,
    routing::{get, post, put},
    Extension, Router,
};
use axum_extra::extract::WithRejection;
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::{
    coordinator_or_admin_middleware, jwt_auth_middleware, AuthService, UserSession,
};
use crate::models::{
    CreateTraining, CreateTrainingObjective, CreateTrainingSession, ParticipantResult,
    RecordScoreRequest, SetObjectiveWeightRequest, Training, TrainingObjective, TrainingSession,
    TrainingStatus, UpdateTraining, UpdateTrainingSession,
};
use crate::services::{AssessmentService, TrainingService};

use super::ApiError;

#[derive(Clone)]
pub struct AppState {
    pub training_service: TrainingService,
    pub assessment_service: AssessmentService,
}

pub fn training_routes(db: PgPool, auth_service: AuthService) -> Router {
    let state = AppState {
        training_service: TrainingService::new(db.clone()),
        assessment_service: AssessmentService::new(db),
    };

    Router::new()
        .route("/", post(create_training).get(list_trainings))
        .route(
            "/:id",
            get(get_training).put(update_training).delete(delete_training),
        )
        .route("/:id/sessions", get(list_sessions).post(create_session))
        .route(
            "/sessions/:session_id",
            put(update_session).delete(delete_session),
        )
        .route("/:id/objectives", get(list_objectives).post(add_objective))
        .route("/:id/objectives/weights", put(set_objective_weight))
        .route("/:id/objectives/:objective_id", axum::routing::delete(delete_objective))
        .route(
            "/:id/participants/:participant_id/scores",
            post(record_score),
        )
        .route(
            "/:id/participants/:participant_id/result",
            get(participant_result),
        )
        .route_layer(middleware::from_fn(coordinator_or_admin_middleware))
        .route_layer(middleware::from_fn_with_state(
            auth_service,
            jwt_auth_middleware,
        ))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct TrainingListQuery {
    pub county_id: Option<Uuid>,
    pub status: Option<TrainingStatus>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Create a training (starts in draft)
async fn create_training(
    State(state): State<AppState>,
    Extension(session): Extension<UserSession>,
    WithRejection(Json(training_data), _): WithRejection<Json<CreateTraining>, ApiError>,
) -> Result<(StatusCode, Json<Training>), StatusCode> {
    if training_data.end_date < training_data.start_date {
        return Err(StatusCode::BAD_REQUEST);
    }

    let training = state
        .training_service
        .create_training(session.user_id, training_data)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok((StatusCode::CREATED, Json(training)))
}

async fn list_trainings(
    State(state): State<AppState>,
    Query(query): Query<TrainingListQuery>,
) -> Result<Json<Vec<Training>>, StatusCode> {
    let limit = query.limit.unwrap_or(50).clamp(1, 100);
    let offset = query.offset.unwrap_or(0).max(0);

    let trainings = state
        .training_service
        .list_trainings(query.county_id, query.status, limit, offset)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(Json(trainings))
}

async fn get_training(
    State(state): State<AppState>,
    Path(training_id): Path<Uuid>,
) -> Result<Json<Training>, StatusCode> {
    let training = state
        .training_service
        .get_training_by_id(training_id)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or(StatusCode::NOT_FOUND)?;

    Ok(Json(training))
}

async fn update_training(
    State(state): State<AppState>,
    Path(training_id): Path<Uuid>,
    Json(training_data): Json<UpdateTraining>,
) -> Result<Json<Training>, StatusCode> {
    let training = state
        .training_service
        .update_training(training_id, training_data)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or(StatusCode::NOT_FOUND)?;

    Ok(Json(training))
}

async fn delete_training(
    State(state): State<AppState>,
    Path(training_id): Path<Uuid>,
) -> Result<StatusCode, StatusCode> {
    let deleted = state
        .training_service
        .delete_training(training_id)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(StatusCode::NOT_FOUND)
    }
}

async fn list_sessions(
    State(state): State<AppState>,
    Path(training_id): Path<Uuid>,
) -> Result<Json<Vec<TrainingSession>>, StatusCode> {
    let sessions = state
        .training_service
        .list_sessions(training_id)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(Json(sessions))
}

async fn create_session(
    State(state): State<AppState>,
    Path(training_id): Path<Uuid>,
    Json(session_data): Json<CreateTrainingSession>,
) -> Result<(StatusCode, Json<TrainingSession>), StatusCode> {
    // Sessions hang off an existing training
    state
        .training_service
        .get_training_by_id(training_id)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or(StatusCode::NOT_FOUND)?;

    let session = state
        .training_service
        .create_session(training_id, session_data)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok((StatusCode::CREATED, Json(session)))
}

async fn update_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(session_data): Json<UpdateTrainingSession>,
) -> Result<Json<TrainingSession>, StatusCode> {
    let session = state
        .training_service
        .update_session(session_id, session_data)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or(StatusCode::NOT_FOUND)?;

    Ok(Json(session))
}

async fn delete_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<StatusCode, StatusCode> {
    let deleted = state
        .training_service
        .delete_session(session_id)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(StatusCode::NOT_FOUND)
    }
}

async fn list_objectives(
    State(state): State<AppState>,
    Path(training_id): Path<Uuid>,
) -> Result<Json<Vec<TrainingObjective>>, StatusCode> {
    let objectives = state
        .training_service
        .list_objectives(training_id)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(Json(objectives))
}

/// Add an objective; sibling weights are rebalanced to keep the 100 total.
async fn add_objective(
    State(state): State<AppState>,
    Path(training_id): Path<Uuid>,
    Json(objective_data): Json<CreateTrainingObjective>,
) -> Result<(StatusCode, Json<Vec<TrainingObjective>>), StatusCode> {
    state
        .training_service
        .get_training_by_id(training_id)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or(StatusCode::NOT_FOUND)?;

    state
        .training_service
        .add_objective(training_id, objective_data)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let objectives = state
        .assessment_service
        .rebalance_training(training_id)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok((StatusCode::CREATED, Json(objectives)))
}

/// Set one objective's weight, rebalancing the rest proportionally.
async fn set_objective_weight(
    State(state): State<AppState>,
    Path(training_id): Path<Uuid>,
    Json(request): Json<SetObjectiveWeightRequest>,
) -> Result<Json<Vec<TrainingObjective>>, StatusCode> {
    let objectives = state
        .assessment_service
        .set_objective_weight(training_id, request.objective_id, request.weight)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or(StatusCode::NOT_FOUND)?;

    Ok(Json(objectives))
}

async fn delete_objective(
    State(state): State<AppState>,
    Path((training_id, objective_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Vec<TrainingObjective>>, StatusCode> {
    let deleted = state
        .training_service
        .delete_objective(training_id, objective_id)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    if !deleted {
        return Err(StatusCode::NOT_FOUND);
    }

    let objectives = state
        .assessment_service
        .rebalance_training(training_id)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(Json(objectives))
}

/// Record a participant's score against one of the training's objectives
async fn record_score(
    State(state): State<AppState>,
    Path((training_id, participant_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<RecordScoreRequest>,
) -> Result<Json<ParticipantResult>, StatusCode> {
    if !(0.0..=100.0).contains(&request.score) {
        return Err(StatusCode::BAD_REQUEST);
    }

    let objectives = state
        .training_service
        .list_objectives(training_id)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    if !objectives.iter().any(|o| o.id == request.objective_id) {
        return Err(StatusCode::NOT_FOUND);
    }

    state
        .assessment_service
        .record_score(participant_id, request.objective_id, request.score)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let result = state
        .assessment_service
        .participant_result(training_id, participant_id)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(Json(result))
}

async fn participant_result(
    State(state): State<AppState>,
    Path((training_id, participant_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ParticipantResult>, StatusCode> {
    let result = state
        .assessment_service
        .participant_result(training_id, participant_id)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(Json(result))
}
