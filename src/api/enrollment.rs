use axum::{
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::Json,
    routing::{get, post},
    Extension, Router,
};
use serde::Deserialize;
use sqlx::PgPool;
use tracing::error;
use uuid::Uuid;

use crate::auth::{jwt_auth_middleware, AuthService, UserSession};
use crate::models::{
    CreateParticipant, EnrollmentSummary, SessionAttendance, Training, TrainingParticipant,
    TrainingStatus,
};
use crate::services::{
    NotificationService, ParticipantService, SmtpConfig, TrainingService, UserService,
};

#[derive(Clone)]
pub struct AppState {
    pub training_service: TrainingService,
    pub participant_service: ParticipantService,
    pub user_service: UserService,
    pub notification_service: NotificationService,
}

/// Mentee-facing enrollment and attendance flows
pub fn enrollment_routes(db: PgPool, auth_service: AuthService) -> Router {
    let state = AppState {
        training_service: TrainingService::new(db.clone()),
        participant_service: ParticipantService::new(db.clone()),
        user_service: UserService::new(db.clone()),
        notification_service: NotificationService::new(db, SmtpConfig::from_env()),
    };

    Router::new()
        .route("/trainings", get(list_open_trainings))
        .route("/trainings/:id/enroll", post(enroll))
        .route("/trainings/:id/complete", post(complete))
        .route("/my-trainings", get(my_trainings))
        .route("/sessions/:id/attendance", post(mark_attendance))
        .route_layer(middleware::from_fn_with_state(
            auth_service,
            jwt_auth_middleware,
        ))
        .with_state(state)
}

/// Trainings currently open for self-enrollment
async fn list_open_trainings(
    State(state): State<AppState>,
) -> Result<Json<Vec<Training>>, StatusCode> {
    let trainings = state
        .training_service
        .list_open_trainings()
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(Json(trainings))
}

/// Self-enroll the authenticated mentee into a training
async fn enroll(
    State(state): State<AppState>,
    Extension(session): Extension<UserSession>,
    Path(training_id): Path<Uuid>,
) -> Result<(StatusCode, Json<TrainingParticipant>), StatusCode> {
    let training = state
        .training_service
        .get_training_by_id(training_id)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or(StatusCode::NOT_FOUND)?;

    if matches!(
        training.status,
        TrainingStatus::Completed | TrainingStatus::Cancelled
    ) {
        return Err(StatusCode::CONFLICT);
    }

    let user = state
        .user_service
        .get_user_by_id(session.user_id)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let duplicate = state
        .participant_service
        .enrollment_exists(training_id, &user.email)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    if duplicate {
        return Err(StatusCode::CONFLICT);
    }

    let participant = state
        .participant_service
        .create_participant(CreateParticipant {
            training_id,
            user_id: Some(user.id),
            full_name: user.full_name.clone(),
            email: user.email.clone(),
            phone: None,
            cadre_id: None,
            facility_id: None,
        })
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    // Confirmation email is queued; delivery is handled by the scheduler
    if let Err(e) = state
        .notification_service
        .notify_enrollment(&participant, &training)
        .await
    {
        error!("Failed to queue enrollment notification: {}", e);
    }

    Ok((StatusCode::CREATED, Json(participant)))
}

/// The authenticated mentee's enrollments with session progress
async fn my_trainings(
    State(state): State<AppState>,
    Extension(session): Extension<UserSession>,
) -> Result<Json<Vec<EnrollmentSummary>>, StatusCode> {
    let enrollments = state
        .participant_service
        .my_enrollments(session.user_id)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(Json(enrollments))
}

#[derive(Debug, Deserialize, Default)]
struct AttendanceRequest {
    present: Option<bool>,
}

/// Mark the mentee's own attendance for a session
async fn mark_attendance(
    State(state): State<AppState>,
    Extension(session): Extension<UserSession>,
    Path(session_id): Path<Uuid>,
    body: Option<Json<AttendanceRequest>>,
) -> Result<Json<SessionAttendance>, StatusCode> {
    state
        .training_service
        .get_session_by_id(session_id)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or(StatusCode::NOT_FOUND)?;

    // Attendance is only valid for trainings the mentee is enrolled in
    let participant = state
        .participant_service
        .find_by_session_and_user(session_id, session.user_id)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or(StatusCode::FORBIDDEN)?;

    let present = body.and_then(|Json(b)| b.present).unwrap_or(true);

    let attendance = state
        .participant_service
        .mark_attendance(session_id, participant.id, present)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(Json(attendance))
}

/// Mark the mentee's own participation completed
async fn complete(
    State(state): State<AppState>,
    Extension(session): Extension<UserSession>,
    Path(training_id): Path<Uuid>,
) -> Result<Json<TrainingParticipant>, StatusCode> {
    let training = state
        .training_service
        .get_training_by_id(training_id)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or(StatusCode::NOT_FOUND)?;

    let participant = state
        .participant_service
        .find_by_training_and_user(training_id, session.user_id)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or(StatusCode::NOT_FOUND)?;

    let completed = state
        .participant_service
        .complete_participation(participant.id)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        // Only the enrolled/active states can complete
        .ok_or(StatusCode::CONFLICT)?;

    if let Err(e) = state
        .notification_service
        .notify_training_completion(&completed, &training)
        .await
    {
        error!("Failed to queue completion notification: {}", e);
    }

    Ok(Json(completed))
}
