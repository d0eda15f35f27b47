use axum::{routing::get, Router};
use sqlx::PgPool;

use super::auth::{admin_user_routes, auth_routes};
use super::health::health_check;
use crate::auth::{cors_layer, security_headers_layer, AuthService};

pub fn create_routes(db: PgPool, jwt_secret: &str) -> Router {
    let auth_service = AuthService::new(db.clone(), jwt_secret);

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/auth", auth_routes(auth_service.clone()))
        .nest("/api/admin", admin_routes(db.clone(), auth_service.clone()))
        .nest(
            "/api/dashboard",
            super::dashboard::dashboard_routes(db.clone(), auth_service.clone()),
        )
        .nest(
            "/api/enrollment",
            super::enrollment::enrollment_routes(db, auth_service),
        )
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .layer(security_headers_layer())
        .layer(cors_layer())
}

/// Admin panel: CRUD resources plus user management
fn admin_routes(db: PgPool, auth_service: AuthService) -> Router {
    Router::new()
        .nest(
            "/trainings",
            super::trainings::training_routes(db.clone(), auth_service.clone()),
        )
        .nest(
            "/participants",
            super::participants::participant_routes(db.clone(), auth_service.clone()),
        )
        .nest(
            "/stock-requests",
            super::stock_requests::stock_request_routes(db.clone(), auth_service.clone()),
        )
        .merge(super::facilities::facility_routes(db, auth_service.clone()))
        .merge(admin_user_routes(auth_service))
}
