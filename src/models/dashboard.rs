use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// One county's slice of the heatmap.
#[derive(Debug, Clone, Serialize)]
pub struct CountyHeat {
    pub county_id: Uuid,
    pub code: i32,
    pub name: String,
    pub participants: i64,
    /// Normalized 0-100 score relative to the busiest county.
    pub intensity: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct KenyaHeatmap {
    pub generated_at: DateTime<Utc>,
    pub max_participants: i64,
    pub counties: Vec<CountyHeat>,
}

/// Raw per-county participant count as it comes off the database.
#[derive(Debug, Clone, FromRow)]
pub struct CountyParticipantRow {
    pub county_id: Uuid,
    pub county_code: i32,
    pub county_name: String,
    pub participants: i64,
}

#[derive(Debug, Serialize)]
pub struct TrainingInsights {
    pub training_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub total_participants: i64,
    pub completed_participants: i64,
    pub completion_rate: f64,
    pub attendance_rate: f64,
    pub assessed_participants: i64,
    pub passed_participants: i64,
    pub pass_rate: f64,
    pub average_score: f64,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Serialize, FromRow)]
pub struct CadreBreakdown {
    pub cadre: String,
    pub participants: i64,
}

#[derive(Debug, Serialize, FromRow)]
pub struct StatusBreakdown {
    pub status: String,
    pub participants: i64,
}

#[derive(Debug, Serialize)]
pub struct CoverageSummary {
    pub generated_at: DateTime<Utc>,
    pub counties_total: i64,
    pub counties_covered: i64,
    pub coverage_percent: f64,
    pub trainings_total: i64,
    pub participants_total: i64,
    pub by_cadre: Vec<CadreBreakdown>,
    pub by_status: Vec<StatusBreakdown>,
}
