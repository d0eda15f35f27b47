use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "notification_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    EnrollmentConfirmation,
    SessionReminder,
    StockRequestApproved,
    TrainingCompletion,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "delivery_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Pending,
    Sent,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Notification {
    pub id: Uuid,
    pub recipient_email: String,
    pub user_id: Option<Uuid>,
    pub notification_type: NotificationType,
    pub subject: String,
    pub message: String,
    pub data: Option<serde_json::Value>,
    pub delivery_status: DeliveryStatus,
    pub sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateNotificationRequest {
    pub recipient_email: String,
    pub user_id: Option<Uuid>,
    pub notification_type: NotificationType,
    pub subject: String,
    pub message: String,
    pub data: Option<serde_json::Value>,
}
