use axum::{
    extract::{Path, Query, Request, State},
    middleware,
    response::Json,
    routing::{get, post, put},
    Extension, Router,
};
use serde::Deserialize;
use std::time::Duration;
use uuid::Uuid;

use crate::auth::{
    admin_only_middleware, jwt_auth_middleware, rate_limit_middleware, AuthError, AuthResponse,
    AuthService, ChangePasswordRequest, ForgotPasswordRequest, LoginRequest, MessageResponse,
    RateLimiter, RefreshTokenRequest, RegisterRequest, ResetPasswordRequest, TokenResponse,
    UserInfo, UserRole, UserSession,
};
use crate::models::{UpdateUser, UserResponse};

use super::PaginationQuery;

/// Authentication routes
pub fn auth_routes(auth_service: AuthService) -> Router {
    let rate_limiter = RateLimiter::new(5, Duration::from_secs(300));

    Router::new()
        .route(
            "/register",
            post(register).route_layer(middleware::from_fn_with_state(
                rate_limiter.clone(),
                rate_limit_middleware,
            )),
        )
        .route(
            "/login",
            post(login).route_layer(middleware::from_fn_with_state(
                rate_limiter,
                rate_limit_middleware,
            )),
        )
        .route("/refresh", post(refresh_token))
        .route("/logout", post(logout))
        .route("/forgot-password", post(forgot_password))
        .route("/reset-password", post(reset_password))
        .route(
            "/profile",
            get(get_profile).put(update_profile).route_layer(
                middleware::from_fn_with_state(auth_service.clone(), jwt_auth_middleware),
            ),
        )
        .route(
            "/change-password",
            post(change_password).route_layer(middleware::from_fn_with_state(
                auth_service.clone(),
                jwt_auth_middleware,
            )),
        )
        .with_state(auth_service)
}

/// Register a new user
#[tracing::instrument(skip(auth_service, request))]
async fn register(
    State(auth_service): State<AuthService>,
    Json(request): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>, AuthError> {
    let response = auth_service.register(request).await?;
    Ok(Json(response))
}

/// Login user
#[tracing::instrument(skip(auth_service, request))]
async fn login(
    State(auth_service): State<AuthService>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AuthError> {
    let response = auth_service.login(request).await?;
    Ok(Json(response))
}

/// Refresh access token
#[tracing::instrument(skip(auth_service, request))]
async fn refresh_token(
    State(auth_service): State<AuthService>,
    Json(request): Json<RefreshTokenRequest>,
) -> Result<Json<TokenResponse>, AuthError> {
    let response = auth_service.refresh_token(request).await?;
    Ok(Json(response))
}

/// Logout user, revoking outstanding refresh tokens
#[tracing::instrument(skip(auth_service, request))]
async fn logout(
    State(auth_service): State<AuthService>,
    request: Request,
) -> Result<Json<MessageResponse>, AuthError> {
    let auth_header = request
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .ok_or(AuthError::MissingAuthHeader)?;

    let token = crate::auth::extract_bearer_token(auth_header)?;
    let response = auth_service.logout(token).await?;
    Ok(Json(response))
}

/// Get user profile
#[tracing::instrument(skip(auth_service, session))]
async fn get_profile(
    State(auth_service): State<AuthService>,
    Extension(session): Extension<UserSession>,
) -> Result<Json<UserInfo>, AuthError> {
    let user_info = auth_service.get_profile(session.user_id).await?;
    Ok(Json(user_info))
}

/// Update user profile
#[tracing::instrument(skip(auth_service, session, update_request))]
async fn update_profile(
    State(auth_service): State<AuthService>,
    Extension(session): Extension<UserSession>,
    Json(update_request): Json<UpdateUser>,
) -> Result<Json<UserInfo>, AuthError> {
    let user_info = auth_service
        .update_profile(session.user_id, update_request)
        .await?;
    Ok(Json(user_info))
}

/// Forgot password: issue a reset token
#[tracing::instrument(skip(auth_service, request))]
async fn forgot_password(
    State(auth_service): State<AuthService>,
    Json(request): Json<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>, AuthError> {
    let response = auth_service.forgot_password(request).await?;
    Ok(Json(response))
}

/// Reset password with a previously issued token
#[tracing::instrument(skip(auth_service, request))]
async fn reset_password(
    State(auth_service): State<AuthService>,
    Json(request): Json<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, AuthError> {
    let response = auth_service.reset_password(request).await?;
    Ok(Json(response))
}

/// Change user password
#[tracing::instrument(skip(auth_service, session, change_request))]
async fn change_password(
    State(auth_service): State<AuthService>,
    Extension(session): Extension<UserSession>,
    Json(change_request): Json<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>, AuthError> {
    let response = auth_service
        .change_password(session.user_id, change_request)
        .await?;
    Ok(Json(response))
}

/// Admin user-management endpoints
pub fn admin_user_routes(auth_service: AuthService) -> Router {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/:id/role", put(update_user_role))
        .route_layer(middleware::from_fn(admin_only_middleware))
        .route_layer(middleware::from_fn_with_state(
            auth_service.clone(),
            jwt_auth_middleware,
        ))
        .with_state(auth_service)
}

/// List all users (admin only)
async fn list_users(
    State(auth_service): State<AuthService>,
    Query(pagination): Query<PaginationQuery>,
) -> Result<Json<Vec<UserResponse>>, AuthError> {
    let users = auth_service
        .list_users(pagination.get_limit(), pagination.get_offset())
        .await?;
    Ok(Json(users))
}

#[derive(Debug, Deserialize)]
struct UpdateRoleRequest {
    role: UserRole,
}

/// Update user role (admin only)
async fn update_user_role(
    State(auth_service): State<AuthService>,
    Path(user_id): Path<Uuid>,
    Json(request): Json<UpdateRoleRequest>,
) -> Result<Json<UserInfo>, AuthError> {
    let user_info = auth_service.update_user_role(user_id, request.role).await?;
    Ok(Json(user_info))
}
