use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "stock_request_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum StockRequestStatus {
    Pending,
    Approved,
    Dispatched,
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StockRequest {
    pub id: Uuid,
    pub facility_id: Uuid,
    pub central_store_id: Option<Uuid>,
    pub item_name: String,
    pub quantity: i32,
    pub status: StockRequestStatus,
    pub requested_by: Option<Uuid>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateStockRequest {
    pub facility_id: Uuid,
    pub item_name: String,
    pub quantity: i32,
    pub notes: Option<String>,
}
