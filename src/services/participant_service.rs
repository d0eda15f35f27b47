use anyhow::Result;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{
    CreateParticipant, EnrollmentSummary, ParticipantStatus, SessionAttendance,
    TrainingParticipant, UpdateParticipant,
};

const PARTICIPANT_COLUMNS: &str =
    "id, training_id, user_id, full_name, email, phone, cadre_id, facility_id, status, enrolled_at, completed_at, created_at, updated_at";

#[derive(Clone)]
pub struct ParticipantService {
    db: PgPool,
}

impl ParticipantService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn enrollment_exists(&self, training_id: Uuid, email: &str) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM training_participants WHERE training_id = $1 AND email = $2)",
        )
        .bind(training_id)
        .bind(email)
        .fetch_one(&self.db)
        .await?;

        Ok(exists)
    }

    pub async fn create_participant(
        &self,
        participant_data: CreateParticipant,
    ) -> Result<TrainingParticipant> {
        let now = Utc::now();

        let participant = sqlx::query_as::<_, TrainingParticipant>(&format!(
            "INSERT INTO training_participants (id, training_id, user_id, full_name, email, phone, cadre_id, facility_id, status, enrolled_at, completed_at, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'enrolled', $9, NULL, $9, $9)
             RETURNING {PARTICIPANT_COLUMNS}",
        ))
        .bind(Uuid::new_v4())
        .bind(participant_data.training_id)
        .bind(participant_data.user_id)
        .bind(&participant_data.full_name)
        .bind(&participant_data.email)
        .bind(&participant_data.phone)
        .bind(participant_data.cadre_id)
        .bind(participant_data.facility_id)
        .bind(now)
        .fetch_one(&self.db)
        .await?;

        Ok(participant)
    }

    pub async fn get_participant_by_id(
        &self,
        participant_id: Uuid,
    ) -> Result<Option<TrainingParticipant>> {
        let participant = sqlx::query_as::<_, TrainingParticipant>(&format!(
            "SELECT {PARTICIPANT_COLUMNS} FROM training_participants WHERE id = $1",
        ))
        .bind(participant_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(participant)
    }

    pub async fn list_participants(
        &self,
        training_id: Option<Uuid>,
        county_id: Option<Uuid>,
        status: Option<ParticipantStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<TrainingParticipant>> {
        let mut query = format!(
            "SELECT tp.id, tp.training_id, tp.user_id, tp.full_name, tp.email, tp.phone, tp.cadre_id, tp.facility_id, tp.status, tp.enrolled_at, tp.completed_at, tp.created_at, tp.updated_at
             FROM training_participants tp WHERE TRUE"
        );
        let mut param_count = 1;

        if training_id.is_some() {
            query.push_str(&format!(" AND tp.training_id = ${param_count}"));
            param_count += 1;
        }
        if county_id.is_some() {
            query.push_str(&format!(
                " AND tp.facility_id IN (SELECT f.id FROM facilities f JOIN subcounties s ON s.id = f.subcounty_id WHERE s.county_id = ${param_count})"
            ));
            param_count += 1;
        }
        if status.is_some() {
            query.push_str(&format!(" AND tp.status = ${param_count}"));
            param_count += 1;
        }
        query.push_str(&format!(
            " ORDER BY tp.enrolled_at DESC LIMIT ${} OFFSET ${}",
            param_count,
            param_count + 1
        ));

        let mut query_builder = sqlx::query_as::<_, TrainingParticipant>(&query);
        if let Some(training_id) = training_id {
            query_builder = query_builder.bind(training_id);
        }
        if let Some(county_id) = county_id {
            query_builder = query_builder.bind(county_id);
        }
        if let Some(status) = status {
            query_builder = query_builder.bind(status);
        }
        let participants = query_builder
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.db)
            .await?;

        Ok(participants)
    }

    pub async fn update_participant(
        &self,
        participant_id: Uuid,
        participant_data: UpdateParticipant,
    ) -> Result<Option<TrainingParticipant>> {
        let participant = sqlx::query_as::<_, TrainingParticipant>(&format!(
            "UPDATE training_participants
             SET full_name = COALESCE($2, full_name),
                 phone = COALESCE($3, phone),
                 cadre_id = COALESCE($4, cadre_id),
                 facility_id = COALESCE($5, facility_id),
                 status = COALESCE($6, status),
                 updated_at = $7
             WHERE id = $1
             RETURNING {PARTICIPANT_COLUMNS}",
        ))
        .bind(participant_id)
        .bind(participant_data.full_name)
        .bind(participant_data.phone)
        .bind(participant_data.cadre_id)
        .bind(participant_data.facility_id)
        .bind(participant_data.status)
        .bind(Utc::now())
        .fetch_optional(&self.db)
        .await?;

        Ok(participant)
    }

    pub async fn delete_participant(&self, participant_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM training_participants WHERE id = $1")
            .bind(participant_id)
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn find_by_training_and_user(
        &self,
        training_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<TrainingParticipant>> {
        let participant = sqlx::query_as::<_, TrainingParticipant>(&format!(
            "SELECT {PARTICIPANT_COLUMNS} FROM training_participants
             WHERE training_id = $1 AND user_id = $2",
        ))
        .bind(training_id)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(participant)
    }

    /// The mentee's participant record for the training a session belongs to.
    pub async fn find_by_session_and_user(
        &self,
        session_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<TrainingParticipant>> {
        let participant = sqlx::query_as::<_, TrainingParticipant>(
            "SELECT tp.id, tp.training_id, tp.user_id, tp.full_name, tp.email, tp.phone, tp.cadre_id, tp.facility_id, tp.status, tp.enrolled_at, tp.completed_at, tp.created_at, tp.updated_at
             FROM training_participants tp
             JOIN training_sessions ts ON ts.training_id = tp.training_id
             WHERE ts.id = $1 AND tp.user_id = $2",
        )
        .bind(session_id)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(participant)
    }

    pub async fn mark_attendance(
        &self,
        session_id: Uuid,
        participant_id: Uuid,
        present: bool,
    ) -> Result<SessionAttendance> {
        let attendance = sqlx::query_as::<_, SessionAttendance>(
            "INSERT INTO session_attendance (id, session_id, participant_id, present, recorded_at)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (session_id, participant_id)
             DO UPDATE SET present = EXCLUDED.present, recorded_at = EXCLUDED.recorded_at
             RETURNING id, session_id, participant_id, present, recorded_at",
        )
        .bind(Uuid::new_v4())
        .bind(session_id)
        .bind(participant_id)
        .bind(present)
        .bind(Utc::now())
        .fetch_one(&self.db)
        .await?;

        Ok(attendance)
    }

    /// Completion is only valid from the enrolled/active states.
    pub async fn complete_participation(
        &self,
        participant_id: Uuid,
    ) -> Result<Option<TrainingParticipant>> {
        let now = Utc::now();

        let participant = sqlx::query_as::<_, TrainingParticipant>(&format!(
            "UPDATE training_participants
             SET status = 'completed', completed_at = $2, updated_at = $2
             WHERE id = $1 AND status IN ('enrolled', 'active')
             RETURNING {PARTICIPANT_COLUMNS}",
        ))
        .bind(participant_id)
        .bind(now)
        .fetch_optional(&self.db)
        .await?;

        Ok(participant)
    }

    pub async fn my_enrollments(&self, user_id: Uuid) -> Result<Vec<EnrollmentSummary>> {
        let enrollments = sqlx::query_as::<_, EnrollmentSummary>(
            "SELECT tp.id AS participant_id,
                    tp.training_id,
                    t.title AS training_title,
                    tp.status,
                    (SELECT COUNT(*) FROM training_sessions ts
                     WHERE ts.training_id = tp.training_id) AS sessions_total,
                    (SELECT COUNT(*) FROM session_attendance sa
                     JOIN training_sessions ts ON ts.id = sa.session_id
                     WHERE ts.training_id = tp.training_id
                       AND sa.participant_id = tp.id
                       AND sa.present) AS sessions_attended,
                    tp.enrolled_at,
                    tp.completed_at
             FROM training_participants tp
             JOIN trainings t ON t.id = tp.training_id
             WHERE tp.user_id = $1
             ORDER BY tp.enrolled_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;

        Ok(enrollments)
    }
}
