use chrono::{Duration, NaiveDate, Utc};
use sqlx::PgPool;
use std::sync::Arc;
use tokio::time::{interval, Duration as TokioDuration};
use tracing::{error, info};
use uuid::Uuid;

use crate::models::TrainingSession;
use crate::services::NotificationService;

#[derive(Clone)]
pub struct NotificationScheduler {
    notification_service: Arc<NotificationService>,
    db: PgPool,
}

#[derive(Debug, sqlx::FromRow)]
struct ReminderRow {
    session_id: Uuid,
    training_id: Uuid,
    topic: String,
    session_date: NaiveDate,
    training_title: String,
    email: String,
    full_name: String,
    created_at: chrono::DateTime<Utc>,
    updated_at: chrono::DateTime<Utc>,
}

impl NotificationScheduler {
    pub fn new(notification_service: Arc<NotificationService>, db: PgPool) -> Self {
        Self {
            notification_service,
            db,
        }
    }

    /// Start the notification scheduler
    pub async fn start(&self) {
        let scheduler = self.clone();
        tokio::spawn(async move {
            scheduler.run_pending_dispatch().await;
        });

        let scheduler = self.clone();
        tokio::spawn(async move {
            scheduler.run_session_reminder_sweep().await;
        });

        info!("Notification scheduler started");
    }

    /// Push pending notifications out every minute
    async fn run_pending_dispatch(&self) {
        let mut interval = interval(TokioDuration::from_secs(60));

        loop {
            interval.tick().await;

            if let Err(e) = self.notification_service.dispatch_pending().await {
                error!("Failed to dispatch pending notifications: {}", e);
            }
        }
    }

    /// Queue reminders for tomorrow's sessions every 15 minutes
    async fn run_session_reminder_sweep(&self) {
        let mut interval = interval(TokioDuration::from_secs(15 * 60));

        loop {
            interval.tick().await;

            match self.queue_session_reminders().await {
                Ok(count) => {
                    if count > 0 {
                        info!("Queued {} session reminders", count);
                    }
                }
                Err(e) => {
                    error!("Session reminder sweep failed: {}", e);
                }
            }
        }
    }

    /// One reminder per participant per session; already-queued reminders
    /// are skipped.
    async fn queue_session_reminders(&self) -> anyhow::Result<usize> {
        let tomorrow = Utc::now().date_naive() + Duration::days(1);

        let rows = sqlx::query_as::<_, ReminderRow>(
            "SELECT ts.id AS session_id,
                    ts.training_id,
                    ts.topic,
                    ts.session_date,
                    ts.created_at,
                    ts.updated_at,
                    t.title AS training_title,
                    tp.email,
                    tp.full_name
             FROM training_sessions ts
             JOIN trainings t ON t.id = ts.training_id
             JOIN training_participants tp ON tp.training_id = ts.training_id
             WHERE ts.session_date = $1
               AND tp.status IN ('enrolled', 'active')
               AND NOT EXISTS (
                   SELECT 1 FROM notifications n
                   WHERE n.notification_type = 'session_reminder'
                     AND n.recipient_email = tp.email
                     AND n.data->>'session_id' = ts.id::TEXT
               )",
        )
        .bind(tomorrow)
        .fetch_all(&self.db)
        .await?;

        let mut queued = 0;
        for row in rows {
            let session = TrainingSession {
                id: row.session_id,
                training_id: row.training_id,
                session_date: row.session_date,
                topic: row.topic.clone(),
                facility_id: None,
                created_at: row.created_at,
                updated_at: row.updated_at,
            };

            self.notification_service
                .notify_session_reminder(&row.email, &row.full_name, &row.training_title, &session)
                .await?;
            queued += 1;
        }

        Ok(queued)
    }
}
