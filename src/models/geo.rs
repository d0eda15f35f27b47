use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct County {
    pub id: Uuid,
    pub code: i32,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Subcounty {
    pub id: Uuid,
    pub county_id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Facility {
    pub id: Uuid,
    pub subcounty_id: Uuid,
    pub name: String,
    pub mfl_code: String,
    pub facility_type: Option<String>,
    pub is_central_store: bool,
    pub contact_email: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateFacility {
    pub subcounty_id: Uuid,
    pub name: String,
    pub mfl_code: String,
    pub facility_type: Option<String>,
    pub is_central_store: Option<bool>,
    pub contact_email: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateFacility {
    pub name: Option<String>,
    pub facility_type: Option<String>,
    pub is_central_store: Option<bool>,
    pub contact_email: Option<String>,
}
