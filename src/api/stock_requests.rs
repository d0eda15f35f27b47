use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::Json,
    routing::{get, post},
    Extension, Router,
};
use serde::Deserialize;
use sqlx::PgPool;
use tracing::error;
use uuid::Uuid;

use crate::auth::{
    coordinator_or_admin_middleware, jwt_auth_middleware, AuthService, UserSession,
};
use crate::models::{CreateStockRequest, StockRequest, StockRequestStatus};
use crate::services::{NotificationService, SmtpConfig, StockRequestService};

#[derive(Clone)]
pub struct AppState {
    pub stock_request_service: StockRequestService,
    pub notification_service: NotificationService,
}

pub fn stock_request_routes(db: PgPool, auth_service: AuthService) -> Router {
    let state = AppState {
        stock_request_service: StockRequestService::new(db.clone()),
        notification_service: NotificationService::new(db, SmtpConfig::from_env()),
    };

    Router::new()
        .route("/", post(create_request).get(list_requests))
        .route("/:id", get(get_request))
        .route("/:id/approve", post(approve_request))
        .route("/:id/dispatch", post(dispatch_request))
        .route("/:id/reject", post(reject_request))
        .route_layer(middleware::from_fn(coordinator_or_admin_middleware))
        .route_layer(middleware::from_fn_with_state(
            auth_service,
            jwt_auth_middleware,
        ))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct StockRequestListQuery {
    pub facility_id: Option<Uuid>,
    pub status: Option<StockRequestStatus>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

async fn create_request(
    State(state): State<AppState>,
    Extension(session): Extension<UserSession>,
    Json(request_data): Json<CreateStockRequest>,
) -> Result<(StatusCode, Json<StockRequest>), StatusCode> {
    if request_data.quantity <= 0 {
        return Err(StatusCode::BAD_REQUEST);
    }

    let request = state
        .stock_request_service
        .create_request(session.user_id, request_data)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok((StatusCode::CREATED, Json(request)))
}

async fn list_requests(
    State(state): State<AppState>,
    Query(query): Query<StockRequestListQuery>,
) -> Result<Json<Vec<StockRequest>>, StatusCode> {
    let limit = query.limit.unwrap_or(50).clamp(1, 100);
    let offset = query.offset.unwrap_or(0).max(0);

    let requests = state
        .stock_request_service
        .list_requests(query.facility_id, query.status, limit, offset)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(Json(requests))
}

async fn get_request(
    State(state): State<AppState>,
    Path(request_id): Path<Uuid>,
) -> Result<Json<StockRequest>, StatusCode> {
    let request = state
        .stock_request_service
        .get_request_by_id(request_id)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or(StatusCode::NOT_FOUND)?;

    Ok(Json(request))
}

/// Approve a pending request; the central store is notified by email.
async fn approve_request(
    State(state): State<AppState>,
    Path(request_id): Path<Uuid>,
) -> Result<Json<StockRequest>, StatusCode> {
    state
        .stock_request_service
        .get_request_by_id(request_id)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or(StatusCode::NOT_FOUND)?;

    let (request, central_store) = state
        .stock_request_service
        .approve_request(request_id)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        // Exists but no longer pending
        .ok_or(StatusCode::CONFLICT)?;

    // Notification problems are recorded, not surfaced to the caller
    if let Err(e) = state
        .notification_service
        .notify_stock_request_approved(&request, central_store.as_ref())
        .await
    {
        error!("Failed to queue stock request notification: {}", e);
    }

    Ok(Json(request))
}

async fn dispatch_request(
    State(state): State<AppState>,
    Path(request_id): Path<Uuid>,
) -> Result<Json<StockRequest>, StatusCode> {
    state
        .stock_request_service
        .get_request_by_id(request_id)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or(StatusCode::NOT_FOUND)?;

    let request = state
        .stock_request_service
        .dispatch_request(request_id)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        // Exists but not in the approved state
        .ok_or(StatusCode::CONFLICT)?;

    Ok(Json(request))
}

async fn reject_request(
    State(state): State<AppState>,
    Path(request_id): Path<Uuid>,
) -> Result<Json<StockRequest>, StatusCode> {
    state
        .stock_request_service
        .get_request_by_id(request_id)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or(StatusCode::NOT_FOUND)?;

    let request = state
        .stock_request_service
        .reject_request(request_id)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or(StatusCode::CONFLICT)?;

    Ok(Json(request))
}
