use anyhow::{anyhow, Result};
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{AssessmentScore, ParticipantResult, TrainingObjective};

/// Minimum weighted overall score for a participant to pass.
pub const PASS_MARK: f64 = 60.0;

/// Split `total` across `shares` proportionally, using largest-remainder
/// rounding so the parts always sum to exactly `total`. All-zero shares are
/// treated as equal shares.
pub fn distribute(total: i32, shares: &[i32]) -> Vec<i32> {
    if shares.is_empty() {
        return Vec::new();
    }

    let shares: Vec<i64> = if shares.iter().all(|&s| s <= 0) {
        vec![1; shares.len()]
    } else {
        shares.iter().map(|&s| s.max(0) as i64).collect()
    };
    let sum: i64 = shares.iter().sum();
    let total = total as i64;

    let mut parts: Vec<i64> = shares.iter().map(|&s| total * s / sum).collect();
    let mut remainders: Vec<(usize, i64)> = shares
        .iter()
        .enumerate()
        .map(|(i, &s)| (i, (total * s) % sum))
        .collect();

    // Stable by construction: ties keep the lower index first
    remainders.sort_by(|a, b| b.1.cmp(&a.1));

    let mut leftover = total - parts.iter().sum::<i64>();
    for (index, _) in remainders {
        if leftover == 0 {
            break;
        }
        parts[index] += 1;
        leftover -= 1;
    }

    parts.into_iter().map(|p| p as i32).collect()
}

/// Scale a set of objective weights so they sum to exactly 100.
pub fn normalize_weights(weights: &[i32]) -> Vec<i32> {
    distribute(100, weights)
}

/// Pin one weight to a fixed value and rebalance the rest proportionally
/// into the remaining budget. A lone objective always ends up at 100.
pub fn rebalance_with_pinned(weights: &[i32], pinned_index: usize, pinned_weight: i32) -> Vec<i32> {
    if weights.len() == 1 {
        return vec![100];
    }

    let pinned_weight = pinned_weight.clamp(0, 100);
    let others: Vec<i32> = weights
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != pinned_index)
        .map(|(_, &w)| w)
        .collect();
    let redistributed = distribute(100 - pinned_weight, &others);

    let mut result = Vec::with_capacity(weights.len());
    let mut others_iter = redistributed.into_iter();
    for i in 0..weights.len() {
        if i == pinned_index {
            result.push(pinned_weight);
        } else {
            result.push(others_iter.next().expect("one share per other objective"));
        }
    }
    result
}

/// Weight-weighted overall score, with weights given as percentages.
pub fn weighted_overall(pairs: &[(f64, i32)]) -> f64 {
    pairs.iter().map(|(score, weight)| score * *weight as f64).sum::<f64>() / 100.0
}

#[derive(Debug, sqlx::FromRow)]
struct ScoreWeightRow {
    score: f64,
    weight: i32,
}

#[derive(Clone)]
pub struct AssessmentService {
    db: PgPool,
}

impl AssessmentService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Bring a training's objective weights back to a 100 total, keeping
    /// their relative proportions. Run after objectives are added or removed.
    pub async fn rebalance_training(&self, training_id: Uuid) -> Result<Vec<TrainingObjective>> {
        let objectives = self.list_objectives(training_id).await?;
        if objectives.is_empty() {
            return Ok(objectives);
        }

        let weights: Vec<i32> = objectives.iter().map(|o| o.weight).collect();
        let normalized = normalize_weights(&weights);

        self.apply_weights(&objectives, &normalized).await?;
        self.list_objectives(training_id).await
    }

    /// Set one objective's weight and rebalance the siblings so the total
    /// stays at exactly 100.
    pub async fn set_objective_weight(
        &self,
        training_id: Uuid,
        objective_id: Uuid,
        weight: i32,
    ) -> Result<Option<Vec<TrainingObjective>>> {
        let objectives = self.list_objectives(training_id).await?;
        let Some(pinned_index) = objectives.iter().position(|o| o.id == objective_id) else {
            return Ok(None);
        };

        let weights: Vec<i32> = objectives.iter().map(|o| o.weight).collect();
        let rebalanced = rebalance_with_pinned(&weights, pinned_index, weight);

        self.apply_weights(&objectives, &rebalanced).await?;
        Ok(Some(self.list_objectives(training_id).await?))
    }

    pub async fn record_score(
        &self,
        participant_id: Uuid,
        objective_id: Uuid,
        score: f64,
    ) -> Result<AssessmentScore> {
        if !(0.0..=100.0).contains(&score) {
            return Err(anyhow!("score {score} is outside the 0-100 range"));
        }

        let recorded = sqlx::query_as::<_, AssessmentScore>(
            "INSERT INTO assessment_scores (id, participant_id, objective_id, score, recorded_at)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (participant_id, objective_id)
             DO UPDATE SET score = EXCLUDED.score, recorded_at = EXCLUDED.recorded_at
             RETURNING id, participant_id, objective_id, score, recorded_at",
        )
        .bind(Uuid::new_v4())
        .bind(participant_id)
        .bind(objective_id)
        .bind(score)
        .bind(Utc::now())
        .fetch_one(&self.db)
        .await?;

        Ok(recorded)
    }

    /// A participant's weighted result across the training's objectives.
    /// Unscored objectives count as zero.
    pub async fn participant_result(
        &self,
        training_id: Uuid,
        participant_id: Uuid,
    ) -> Result<ParticipantResult> {
        let total_objectives: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM training_objectives WHERE training_id = $1",
        )
        .bind(training_id)
        .fetch_one(&self.db)
        .await?;

        let rows = sqlx::query_as::<_, ScoreWeightRow>(
            "SELECT s.score, o.weight
             FROM assessment_scores s
             JOIN training_objectives o ON o.id = s.objective_id
             WHERE s.participant_id = $1 AND o.training_id = $2",
        )
        .bind(participant_id)
        .bind(training_id)
        .fetch_all(&self.db)
        .await?;

        let pairs: Vec<(f64, i32)> = rows.iter().map(|r| (r.score, r.weight)).collect();
        let overall_score = weighted_overall(&pairs);

        Ok(ParticipantResult {
            participant_id,
            scored_objectives: rows.len(),
            total_objectives: total_objectives as usize,
            overall_score,
            passed: overall_score >= PASS_MARK,
        })
    }

    async fn list_objectives(&self, training_id: Uuid) -> Result<Vec<TrainingObjective>> {
        let objectives = sqlx::query_as::<_, TrainingObjective>(
            "SELECT id, training_id, description, weight, position, created_at
             FROM training_objectives WHERE training_id = $1 ORDER BY position, created_at",
        )
        .bind(training_id)
        .fetch_all(&self.db)
        .await?;

        Ok(objectives)
    }

    async fn apply_weights(
        &self,
        objectives: &[TrainingObjective],
        weights: &[i32],
    ) -> Result<()> {
        let mut tx = self.db.begin().await?;
        for (objective, &weight) in objectives.iter().zip(weights) {
            sqlx::query("UPDATE training_objectives SET weight = $2 WHERE id = $1")
                .bind(objective.id)
                .bind(weight)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distribute_sums_to_total() {
        for shares in [
            vec![1, 1, 1],
            vec![30, 30, 40],
            vec![1, 2, 4],
            vec![0, 0, 0],
            vec![7],
            vec![99, 1],
        ] {
            let parts = distribute(100, &shares);
            assert_eq!(parts.iter().sum::<i32>(), 100, "shares: {shares:?}");
        }
    }

    #[test]
    fn test_distribute_preserves_proportions() {
        assert_eq!(distribute(100, &[1, 1]), vec![50, 50]);
        assert_eq!(distribute(100, &[1, 3]), vec![25, 75]);
        assert_eq!(distribute(100, &[2, 2, 1]), vec![40, 40, 20]);
    }

    #[test]
    fn test_distribute_largest_remainder() {
        // 100/3 = 33.33..; the leftover point goes to the first index on a tie
        assert_eq!(distribute(100, &[1, 1, 1]), vec![34, 33, 33]);
        // 100/6 shares of [1,2,3]: 16.66, 33.33, 50 -> remainders favor index 0
        assert_eq!(distribute(100, &[1, 2, 3]), vec![17, 33, 50]);
    }

    #[test]
    fn test_distribute_empty_and_zero_total() {
        assert!(distribute(100, &[]).is_empty());
        assert_eq!(distribute(0, &[1, 2]), vec![0, 0]);
    }

    #[test]
    fn test_normalize_weights() {
        assert_eq!(normalize_weights(&[50, 50, 50]), vec![34, 33, 33]);
        assert_eq!(normalize_weights(&[10, 10]), vec![50, 50]);
        assert_eq!(normalize_weights(&[0, 0]), vec![50, 50]);
        assert_eq!(normalize_weights(&[100]), vec![100]);
    }

    #[test]
    fn test_rebalance_with_pinned() {
        // Pin the first objective at 40; the 30/30 siblings split the rest
        assert_eq!(rebalance_with_pinned(&[20, 30, 30], 0, 40), vec![40, 30, 30]);
        // Uneven siblings keep their proportions in the remaining budget
        assert_eq!(rebalance_with_pinned(&[50, 30, 20], 0, 60), vec![60, 24, 16]);
        // All-zero siblings split the remainder evenly
        assert_eq!(rebalance_with_pinned(&[0, 0, 0], 1, 50), vec![25, 50, 25]);
    }

    #[test]
    fn test_rebalance_with_pinned_clamps_and_sums() {
        let rebalanced = rebalance_with_pinned(&[10, 20, 70], 2, 150);
        assert_eq!(rebalanced[2], 100);
        assert_eq!(rebalanced.iter().sum::<i32>(), 100);

        let rebalanced = rebalance_with_pinned(&[25, 25, 50], 0, -5);
        assert_eq!(rebalanced[0], 0);
        assert_eq!(rebalanced.iter().sum::<i32>(), 100);
    }

    #[test]
    fn test_rebalance_single_objective_gets_everything() {
        assert_eq!(rebalance_with_pinned(&[40], 0, 40), vec![100]);
    }

    #[test]
    fn test_weighted_overall() {
        // Full marks across the board is 100 regardless of weighting
        assert_eq!(weighted_overall(&[(100.0, 60), (100.0, 40)]), 100.0);
        // 80 on a 60% objective and 50 on a 40% objective
        assert!((weighted_overall(&[(80.0, 60), (50.0, 40)]) - 68.0).abs() < 1e-9);
        assert_eq!(weighted_overall(&[]), 0.0);
    }
}
