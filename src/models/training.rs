use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "training_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TrainingStatus {
    Draft,
    Ongoing,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Training {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub county_id: Option<Uuid>,
    pub department_id: Option<Uuid>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: TrainingStatus,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateTraining {
    pub title: String,
    pub description: Option<String>,
    pub county_id: Option<Uuid>,
    pub department_id: Option<Uuid>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateTraining {
    pub title: Option<String>,
    pub description: Option<String>,
    pub county_id: Option<Uuid>,
    pub department_id: Option<Uuid>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub status: Option<TrainingStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TrainingSession {
    pub id: Uuid,
    pub training_id: Uuid,
    pub session_date: NaiveDate,
    pub topic: String,
    pub facility_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateTrainingSession {
    pub session_date: NaiveDate,
    pub topic: String,
    pub facility_id: Option<Uuid>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateTrainingSession {
    pub session_date: Option<NaiveDate>,
    pub topic: Option<String>,
    pub facility_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TrainingObjective {
    pub id: Uuid,
    pub training_id: Uuid,
    pub description: String,
    pub weight: i32,
    pub position: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateTrainingObjective {
    pub description: String,
    pub weight: Option<i32>,
}
