use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AssessmentScore {
    pub id: Uuid,
    pub participant_id: Uuid,
    pub objective_id: Uuid,
    pub score: f64,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RecordScoreRequest {
    pub objective_id: Uuid,
    pub score: f64,
}

/// A participant's weighted result across all objectives of a training.
#[derive(Debug, Serialize)]
pub struct ParticipantResult {
    pub participant_id: Uuid,
    pub scored_objectives: usize,
    pub total_objectives: usize,
    pub overall_score: f64,
    pub passed: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SetObjectiveWeightRequest {
    pub objective_id: Uuid,
    pub weight: i32,
}
