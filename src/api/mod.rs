// HTTP routers and handlers

pub mod auth;
pub mod dashboard;
pub mod enrollment;
pub mod facilities;
pub mod health;
pub mod participants;
pub mod routes;
pub mod stock_requests;
pub mod trainings;

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct PaginationQuery {
    /// Maximum number of items to return (default: 50, max: 100)
    pub limit: Option<i64>,
    /// Number of items to skip (default: 0)
    pub offset: Option<i64>,
}

impl PaginationQuery {
    pub fn validate(&self) -> Result<(), &'static str> {
        if let Some(limit) = self.limit {
            if !(1..=100).contains(&limit) {
                return Err("Limit must be between 1 and 100");
            }
        }
        if let Some(offset) = self.offset {
            if offset < 0 {
                return Err("Offset must be non-negative");
            }
        }
        Ok(())
    }

    pub fn get_limit(&self) -> i64 {
        self.limit.unwrap_or(50).clamp(1, 100)
    }

    pub fn get_offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    /// Error code for programmatic handling
    pub error_code: String,
    /// Human-readable error message
    pub message: String,
}

impl ApiError {
    pub fn new(code: &str, message: &str) -> Self {
        Self {
            error_code: code.to_string(),
            message: message.to_string(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::new("invalid_body", &rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (StatusCode::BAD_REQUEST, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_defaults_and_clamping() {
        let query = PaginationQuery {
            limit: None,
            offset: None,
        };
        assert_eq!(query.get_limit(), 50);
        assert_eq!(query.get_offset(), 0);

        let query = PaginationQuery {
            limit: Some(500),
            offset: Some(-3),
        };
        assert!(query.validate().is_err());
        assert_eq!(query.get_limit(), 100);
        assert_eq!(query.get_offset(), 0);
    }

    #[test]
    fn test_pagination_accepts_valid_values() {
        let query = PaginationQuery {
            limit: Some(25),
            offset: Some(75),
        };
        assert!(query.validate().is_ok());
        assert_eq!(query.get_limit(), 25);
        assert_eq!(query.get_offset(), 75);
    }
}
