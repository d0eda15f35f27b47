use anyhow::Result;
use chrono::Utc;
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

use crate::models::{CadreBreakdown, CoverageSummary, StatusBreakdown, TrainingInsights};
use crate::services::assessment_service::{weighted_overall, PASS_MARK};

/// Percentage ratio, zero when the denominator is zero.
pub fn ratio(numerator: i64, denominator: i64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64 * 100.0
    }
}

/// Canned guidance picked by static thresholds over the computed rates.
pub fn build_recommendations(
    total_participants: i64,
    completion_rate: f64,
    attendance_rate: f64,
    assessed_participants: i64,
    pass_rate: f64,
) -> Vec<String> {
    let mut recommendations = Vec::new();

    if total_participants == 0 {
        recommendations.push(
            "No participants are enrolled yet. Work with county coordinators to recruit mentees."
                .to_string(),
        );
        return recommendations;
    }

    if completion_rate < 50.0 {
        recommendations.push(
            "Completion is below half of enrollment. Follow up with inactive mentees and review session scheduling."
                .to_string(),
        );
    }
    if attendance_rate < 60.0 {
        recommendations.push(
            "Attendance is low. Consider venue accessibility and sending session reminders earlier."
                .to_string(),
        );
    }
    if assessed_participants > 0 && pass_rate < 60.0 {
        recommendations.push(
            "Less than 60% of assessed mentees are passing. Revisit the objective weighting and add remedial sessions."
                .to_string(),
        );
    }
    if assessed_participants == 0 {
        recommendations.push(
            "No assessments recorded. Score mentees against the training objectives to track outcomes."
                .to_string(),
        );
    }

    if recommendations.is_empty() {
        recommendations.push("Training is on track. Keep the current cadence.".to_string());
    }

    recommendations
}

#[derive(Debug, sqlx::FromRow)]
struct ParticipantScoreRow {
    participant_id: Uuid,
    score: f64,
    weight: i32,
}

/// Per-training completion/attendance/pass statistics and the
/// platform-wide coverage summary.
#[derive(Clone)]
pub struct TrainingInsightsService {
    db: PgPool,
}

impl TrainingInsightsService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn training_insights(&self, training_id: Uuid) -> Result<Option<TrainingInsights>> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM trainings WHERE id = $1)")
            .bind(training_id)
            .fetch_one(&self.db)
            .await?;
        if !exists {
            return Ok(None);
        }

        let total_participants: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM training_participants WHERE training_id = $1",
        )
        .bind(training_id)
        .fetch_one(&self.db)
        .await?;

        let completed_participants: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM training_participants WHERE training_id = $1 AND status = 'completed'",
        )
        .bind(training_id)
        .fetch_one(&self.db)
        .await?;

        let session_count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM training_sessions WHERE training_id = $1",
        )
        .bind(training_id)
        .fetch_one(&self.db)
        .await?;

        let attended: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM session_attendance sa
             JOIN training_sessions ts ON ts.id = sa.session_id
             WHERE ts.training_id = $1 AND sa.present",
        )
        .bind(training_id)
        .fetch_one(&self.db)
        .await?;

        let score_rows = sqlx::query_as::<_, ParticipantScoreRow>(
            "SELECT s.participant_id, s.score, o.weight
             FROM assessment_scores s
             JOIN training_objectives o ON o.id = s.objective_id
             WHERE o.training_id = $1",
        )
        .bind(training_id)
        .fetch_all(&self.db)
        .await?;

        let mut per_participant: HashMap<Uuid, Vec<(f64, i32)>> = HashMap::new();
        for row in score_rows {
            per_participant
                .entry(row.participant_id)
                .or_default()
                .push((row.score, row.weight));
        }

        let overalls: Vec<f64> = per_participant
            .values()
            .map(|pairs| weighted_overall(pairs))
            .collect();
        let assessed_participants = overalls.len() as i64;
        let passed_participants = overalls.iter().filter(|&&s| s >= PASS_MARK).count() as i64;
        let average_score = if overalls.is_empty() {
            0.0
        } else {
            overalls.iter().sum::<f64>() / overalls.len() as f64
        };

        let completion_rate = ratio(completed_participants, total_participants);
        let attendance_rate = ratio(attended, session_count * total_participants);
        let pass_rate = ratio(passed_participants, assessed_participants);

        Ok(Some(TrainingInsights {
            training_id,
            generated_at: Utc::now(),
            total_participants,
            completed_participants,
            completion_rate,
            attendance_rate,
            assessed_participants,
            passed_participants,
            pass_rate,
            average_score,
            recommendations: build_recommendations(
                total_participants,
                completion_rate,
                attendance_rate,
                assessed_participants,
                pass_rate,
            ),
        }))
    }

    pub async fn coverage_summary(&self) -> Result<CoverageSummary> {
        let counties_total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM counties")
            .fetch_one(&self.db)
            .await?;

        let counties_covered: i64 = sqlx::query_scalar(
            "SELECT COUNT(DISTINCT s.county_id)
             FROM training_participants tp
             JOIN facilities f ON f.id = tp.facility_id
             JOIN subcounties s ON s.id = f.subcounty_id",
        )
        .fetch_one(&self.db)
        .await?;

        let trainings_total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM trainings")
            .fetch_one(&self.db)
            .await?;

        let participants_total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM training_participants")
                .fetch_one(&self.db)
                .await?;

        let by_cadre = sqlx::query_as::<_, CadreBreakdown>(
            "SELECT COALESCE(c.name, 'Unspecified') AS cadre, COUNT(tp.id) AS participants
             FROM training_participants tp
             LEFT JOIN cadres c ON c.id = tp.cadre_id
             GROUP BY c.name
             ORDER BY participants DESC",
        )
        .fetch_all(&self.db)
        .await?;

        let by_status = sqlx::query_as::<_, StatusBreakdown>(
            "SELECT status::TEXT AS status, COUNT(*) AS participants
             FROM training_participants
             GROUP BY status
             ORDER BY participants DESC",
        )
        .fetch_all(&self.db)
        .await?;

        Ok(CoverageSummary {
            generated_at: Utc::now(),
            counties_total,
            counties_covered,
            coverage_percent: ratio(counties_covered, counties_total),
            trainings_total,
            participants_total,
            by_cadre,
            by_status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratio_handles_zero_denominator() {
        assert_eq!(ratio(5, 0), 0.0);
        assert_eq!(ratio(0, 10), 0.0);
        assert_eq!(ratio(5, 10), 50.0);
        assert_eq!(ratio(10, 10), 100.0);
    }

    #[test]
    fn test_recommendations_for_empty_training() {
        let recs = build_recommendations(0, 0.0, 0.0, 0, 0.0);
        assert_eq!(recs.len(), 1);
        assert!(recs[0].contains("No participants"));
    }

    #[test]
    fn test_recommendations_flag_weak_rates() {
        let recs = build_recommendations(30, 40.0, 55.0, 20, 45.0);
        assert_eq!(recs.len(), 3);
        assert!(recs.iter().any(|r| r.contains("Completion")));
        assert!(recs.iter().any(|r| r.contains("Attendance")));
        assert!(recs.iter().any(|r| r.contains("passing")));
    }

    #[test]
    fn test_recommendations_nudge_when_unassessed() {
        let recs = build_recommendations(30, 80.0, 90.0, 0, 0.0);
        assert_eq!(recs.len(), 1);
        assert!(recs[0].contains("No assessments"));
    }

    #[test]
    fn test_recommendations_on_track() {
        let recs = build_recommendations(30, 80.0, 85.0, 25, 90.0);
        assert_eq!(recs, vec!["Training is on track. Keep the current cadence.".to_string()]);
    }
}
