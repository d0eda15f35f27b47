use anyhow::Result;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{
    CreateTraining, CreateTrainingObjective, CreateTrainingSession, Training, TrainingObjective,
    TrainingSession, TrainingStatus, UpdateTraining, UpdateTrainingSession,
};

const TRAINING_COLUMNS: &str =
    "id, title, description, county_id, department_id, start_date, end_date, status, created_by, created_at, updated_at";

#[derive(Clone)]
pub struct TrainingService {
    db: PgPool,
}

impl TrainingService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn create_training(
        &self,
        created_by: Uuid,
        training_data: CreateTraining,
    ) -> Result<Training> {
        let training = sqlx::query_as::<_, Training>(&format!(
            "INSERT INTO trainings (id, title, description, county_id, department_id, start_date, end_date, status, created_by, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, 'draft', $8, $9, $9)
             RETURNING {TRAINING_COLUMNS}",
        ))
        .bind(Uuid::new_v4())
        .bind(&training_data.title)
        .bind(&training_data.description)
        .bind(training_data.county_id)
        .bind(training_data.department_id)
        .bind(training_data.start_date)
        .bind(training_data.end_date)
        .bind(created_by)
        .bind(Utc::now())
        .fetch_one(&self.db)
        .await?;

        Ok(training)
    }

    pub async fn get_training_by_id(&self, training_id: Uuid) -> Result<Option<Training>> {
        let training = sqlx::query_as::<_, Training>(&format!(
            "SELECT {TRAINING_COLUMNS} FROM trainings WHERE id = $1",
        ))
        .bind(training_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(training)
    }

    pub async fn list_trainings(
        &self,
        county_id: Option<Uuid>,
        status: Option<TrainingStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Training>> {
        let mut query = format!("SELECT {TRAINING_COLUMNS} FROM trainings WHERE TRUE");
        let mut param_count = 1;

        if county_id.is_some() {
            query.push_str(&format!(" AND county_id = ${param_count}"));
            param_count += 1;
        }
        if status.is_some() {
            query.push_str(&format!(" AND status = ${param_count}"));
            param_count += 1;
        }
        query.push_str(&format!(
            " ORDER BY start_date DESC LIMIT ${} OFFSET ${}",
            param_count,
            param_count + 1
        ));

        let mut query_builder = sqlx::query_as::<_, Training>(&query);
        if let Some(county_id) = county_id {
            query_builder = query_builder.bind(county_id);
        }
        if let Some(status) = status {
            query_builder = query_builder.bind(status);
        }
        let trainings = query_builder
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.db)
            .await?;

        Ok(trainings)
    }

    /// Trainings a mentee may still enroll into.
    pub async fn list_open_trainings(&self) -> Result<Vec<Training>> {
        let trainings = sqlx::query_as::<_, Training>(&format!(
            "SELECT {TRAINING_COLUMNS} FROM trainings
             WHERE status IN ('draft', 'ongoing') AND end_date >= CURRENT_DATE
             ORDER BY start_date",
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(trainings)
    }

    pub async fn update_training(
        &self,
        training_id: Uuid,
        training_data: UpdateTraining,
    ) -> Result<Option<Training>> {
        let training = sqlx::query_as::<_, Training>(&format!(
            "UPDATE trainings
             SET title = COALESCE($2, title),
                 description = COALESCE($3, description),
                 county_id = COALESCE($4, county_id),
                 department_id = COALESCE($5, department_id),
                 start_date = COALESCE($6, start_date),
                 end_date = COALESCE($7, end_date),
                 status = COALESCE($8, status),
                 updated_at = $9
             WHERE id = $1
             RETURNING {TRAINING_COLUMNS}",
        ))
        .bind(training_id)
        .bind(training_data.title)
        .bind(training_data.description)
        .bind(training_data.county_id)
        .bind(training_data.department_id)
        .bind(training_data.start_date)
        .bind(training_data.end_date)
        .bind(training_data.status)
        .bind(Utc::now())
        .fetch_optional(&self.db)
        .await?;

        Ok(training)
    }

    pub async fn delete_training(&self, training_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM trainings WHERE id = $1")
            .bind(training_id)
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn create_session(
        &self,
        training_id: Uuid,
        session_data: CreateTrainingSession,
    ) -> Result<TrainingSession> {
        let session = sqlx::query_as::<_, TrainingSession>(
            "INSERT INTO training_sessions (id, training_id, session_date, topic, facility_id, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $6)
             RETURNING id, training_id, session_date, topic, facility_id, created_at, updated_at",
        )
        .bind(Uuid::new_v4())
        .bind(training_id)
        .bind(session_data.session_date)
        .bind(&session_data.topic)
        .bind(session_data.facility_id)
        .bind(Utc::now())
        .fetch_one(&self.db)
        .await?;

        Ok(session)
    }

    pub async fn get_session_by_id(&self, session_id: Uuid) -> Result<Option<TrainingSession>> {
        let session = sqlx::query_as::<_, TrainingSession>(
            "SELECT id, training_id, session_date, topic, facility_id, created_at, updated_at
             FROM training_sessions WHERE id = $1",
        )
        .bind(session_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(session)
    }

    pub async fn list_sessions(&self, training_id: Uuid) -> Result<Vec<TrainingSession>> {
        let sessions = sqlx::query_as::<_, TrainingSession>(
            "SELECT id, training_id, session_date, topic, facility_id, created_at, updated_at
             FROM training_sessions WHERE training_id = $1 ORDER BY session_date",
        )
        .bind(training_id)
        .fetch_all(&self.db)
        .await?;

        Ok(sessions)
    }

    pub async fn update_session(
        &self,
        session_id: Uuid,
        session_data: UpdateTrainingSession,
    ) -> Result<Option<TrainingSession>> {
        let session = sqlx::query_as::<_, TrainingSession>(
            "UPDATE training_sessions
             SET session_date = COALESCE($2, session_date),
                 topic = COALESCE($3, topic),
                 facility_id = COALESCE($4, facility_id),
                 updated_at = $5
             WHERE id = $1
             RETURNING id, training_id, session_date, topic, facility_id, created_at, updated_at",
        )
        .bind(session_id)
        .bind(session_data.session_date)
        .bind(session_data.topic)
        .bind(session_data.facility_id)
        .bind(Utc::now())
        .fetch_optional(&self.db)
        .await?;

        Ok(session)
    }

    pub async fn delete_session(&self, session_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM training_sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn add_objective(
        &self,
        training_id: Uuid,
        objective_data: CreateTrainingObjective,
    ) -> Result<TrainingObjective> {
        let objective = sqlx::query_as::<_, TrainingObjective>(
            "INSERT INTO training_objectives (id, training_id, description, weight, position, created_at)
             VALUES ($1, $2, $3, $4,
                     COALESCE((SELECT MAX(position) + 1 FROM training_objectives WHERE training_id = $2), 0),
                     $5)
             RETURNING id, training_id, description, weight, position, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(training_id)
        .bind(&objective_data.description)
        .bind(objective_data.weight.unwrap_or(0).clamp(0, 100))
        .bind(Utc::now())
        .fetch_one(&self.db)
        .await?;

        Ok(objective)
    }

    pub async fn list_objectives(&self, training_id: Uuid) -> Result<Vec<TrainingObjective>> {
        let objectives = sqlx::query_as::<_, TrainingObjective>(
            "SELECT id, training_id, description, weight, position, created_at
             FROM training_objectives WHERE training_id = $1 ORDER BY position, created_at",
        )
        .bind(training_id)
        .fetch_all(&self.db)
        .await?;

        Ok(objectives)
    }

    pub async fn delete_objective(&self, training_id: Uuid, objective_id: Uuid) -> Result<bool> {
        let result =
            sqlx::query("DELETE FROM training_objectives WHERE id = $1 AND training_id = $2")
                .bind(objective_id)
                .bind(training_id)
                .execute(&self.db)
                .await?;

        Ok(result.rows_affected() > 0)
    }
}
