use anyhow::Result;
use chrono::Utc;
use futures::future::join_all;
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::{
    CreateNotificationRequest, DeliveryStatus, Facility, Notification, NotificationType,
    StockRequest, Training, TrainingParticipant, TrainingSession,
};
use crate::services::email_notification_service::{EmailNotificationService, SmtpConfig};

const NOTIFICATION_COLUMNS: &str =
    "id, recipient_email, user_id, notification_type, subject, message, data, delivery_status, sent_at, created_at";

/// Records outbound notifications and pushes pending ones through email.
#[derive(Clone)]
pub struct NotificationService {
    db: PgPool,
    email_service: Arc<EmailNotificationService>,
}

impl NotificationService {
    pub fn new(db: PgPool, smtp_config: SmtpConfig) -> Self {
        Self {
            db,
            email_service: Arc::new(EmailNotificationService::new(smtp_config)),
        }
    }

    pub async fn create_notification(
        &self,
        request: CreateNotificationRequest,
    ) -> Result<Notification> {
        self.insert_notification(request, DeliveryStatus::Pending)
            .await
    }

    pub async fn notify_enrollment(
        &self,
        participant: &TrainingParticipant,
        training: &Training,
    ) -> Result<Notification> {
        self.create_notification(CreateNotificationRequest {
            recipient_email: participant.email.clone(),
            user_id: participant.user_id,
            notification_type: NotificationType::EnrollmentConfirmation,
            subject: training.title.clone(),
            message: format!(
                "You have been enrolled in '{}' running from {} to {}.",
                training.title, training.start_date, training.end_date
            ),
            data: Some(json!({
                "training_id": training.id,
                "participant_id": participant.id,
                "recipient_name": participant.full_name,
            })),
        })
        .await
    }

    pub async fn notify_training_completion(
        &self,
        participant: &TrainingParticipant,
        training: &Training,
    ) -> Result<Notification> {
        self.create_notification(CreateNotificationRequest {
            recipient_email: participant.email.clone(),
            user_id: participant.user_id,
            notification_type: NotificationType::TrainingCompletion,
            subject: training.title.clone(),
            message: format!("You have successfully completed '{}'.", training.title),
            data: Some(json!({
                "training_id": training.id,
                "participant_id": participant.id,
                "recipient_name": participant.full_name,
            })),
        })
        .await
    }

    pub async fn notify_session_reminder(
        &self,
        recipient_email: &str,
        recipient_name: &str,
        training_title: &str,
        session: &TrainingSession,
    ) -> Result<Notification> {
        self.create_notification(CreateNotificationRequest {
            recipient_email: recipient_email.to_string(),
            user_id: None,
            notification_type: NotificationType::SessionReminder,
            subject: training_title.to_string(),
            message: format!(
                "Reminder: session '{}' of '{}' is scheduled for {}.",
                session.topic, training_title, session.session_date
            ),
            data: Some(json!({
                "session_id": session.id,
                "training_id": session.training_id,
                "recipient_name": recipient_name,
            })),
        })
        .await
    }

    /// Route an approved stock request to its central store. Without a store
    /// (or a store contact) the notification is recorded as failed.
    pub async fn notify_stock_request_approved(
        &self,
        request: &StockRequest,
        central_store: Option<&Facility>,
    ) -> Result<Notification> {
        let contact = central_store.and_then(|store| store.contact_email.clone());

        let notification_request = CreateNotificationRequest {
            recipient_email: contact.clone().unwrap_or_else(|| "unrouted".to_string()),
            user_id: None,
            notification_type: NotificationType::StockRequestApproved,
            subject: request.item_name.clone(),
            message: format!(
                "A request for {} x '{}' has been approved and routed to your store for dispatch.",
                request.quantity, request.item_name
            ),
            data: Some(json!({
                "stock_request_id": request.id,
                "facility_id": request.facility_id,
                "item_name": request.item_name,
                "quantity": request.quantity,
                "recipient_name": central_store.map(|store| store.name.clone()),
            })),
        };

        if contact.is_none() {
            warn!(
                "Stock request {} approved but no central store contact to notify",
                request.id
            );
            return self
                .insert_notification(notification_request, DeliveryStatus::Failed)
                .await;
        }

        self.create_notification(notification_request).await
    }

    /// Send everything still pending. Returns the number delivered.
    pub async fn dispatch_pending(&self) -> Result<usize> {
        let pending = sqlx::query_as::<_, Notification>(&format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notifications
             WHERE delivery_status = 'pending' ORDER BY created_at LIMIT 50",
        ))
        .fetch_all(&self.db)
        .await?;

        let sends = pending.iter().map(|notification| async move {
            let recipient_name = notification
                .data
                .as_ref()
                .and_then(|data| data.get("recipient_name"))
                .and_then(|name| name.as_str())
                .unwrap_or("there")
                .to_string();
            let outcome = self
                .email_service
                .send_notification_email(notification, &recipient_name)
                .await;
            (notification.id, outcome)
        });

        let mut sent = 0;
        for (notification_id, outcome) in join_all(sends).await {
            match outcome {
                Ok(()) => {
                    self.mark_notification(notification_id, DeliveryStatus::Sent)
                        .await?;
                    sent += 1;
                }
                Err(e) => {
                    warn!("Failed to send notification {}: {}", notification_id, e);
                    self.mark_notification(notification_id, DeliveryStatus::Failed)
                        .await?;
                }
            }
        }

        if sent > 0 {
            info!("Dispatched {} notifications", sent);
        }
        Ok(sent)
    }

    async fn insert_notification(
        &self,
        request: CreateNotificationRequest,
        status: DeliveryStatus,
    ) -> Result<Notification> {
        let notification = sqlx::query_as::<_, Notification>(&format!(
            "INSERT INTO notifications (id, recipient_email, user_id, notification_type, subject, message, data, delivery_status, sent_at, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NULL, $9)
             RETURNING {NOTIFICATION_COLUMNS}",
        ))
        .bind(Uuid::new_v4())
        .bind(&request.recipient_email)
        .bind(request.user_id)
        .bind(&request.notification_type)
        .bind(&request.subject)
        .bind(&request.message)
        .bind(&request.data)
        .bind(&status)
        .bind(Utc::now())
        .fetch_one(&self.db)
        .await?;

        Ok(notification)
    }

    async fn mark_notification(
        &self,
        notification_id: Uuid,
        status: DeliveryStatus,
    ) -> Result<()> {
        let sent_at = match status {
            DeliveryStatus::Sent => Some(Utc::now()),
            _ => None,
        };

        sqlx::query("UPDATE notifications SET delivery_status = $2, sent_at = $3 WHERE id = $1")
            .bind(notification_id)
            .bind(&status)
            .bind(sent_at)
            .execute(&self.db)
            .await?;

        Ok(())
    }
}
