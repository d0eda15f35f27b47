use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "participant_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ParticipantStatus {
    Enrolled,
    Active,
    Completed,
    Dropped,
}

/// A mentee enrolled in a training.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TrainingParticipant {
    pub id: Uuid,
    pub training_id: Uuid,
    pub user_id: Option<Uuid>,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub cadre_id: Option<Uuid>,
    pub facility_id: Option<Uuid>,
    pub status: ParticipantStatus,
    pub enrolled_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateParticipant {
    pub training_id: Uuid,
    pub user_id: Option<Uuid>,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub cadre_id: Option<Uuid>,
    pub facility_id: Option<Uuid>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateParticipant {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub cadre_id: Option<Uuid>,
    pub facility_id: Option<Uuid>,
    pub status: Option<ParticipantStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SessionAttendance {
    pub id: Uuid,
    pub session_id: Uuid,
    pub participant_id: Uuid,
    pub present: bool,
    pub recorded_at: DateTime<Utc>,
}

/// A mentee's view of one of their enrollments.
#[derive(Debug, Serialize, FromRow)]
pub struct EnrollmentSummary {
    pub participant_id: Uuid,
    pub training_id: Uuid,
    pub training_title: String,
    pub status: ParticipantStatus,
    pub sessions_total: i64,
    pub sessions_attended: i64,
    pub enrolled_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}
