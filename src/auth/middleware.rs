use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderValue, StatusCode},
    middleware::Next,
    response::Response,
};
use tower_http::cors::{Any, CorsLayer};

use crate::auth::{extract_bearer_token, AuthError, AuthService, UserRole, UserSession};

/// JWT authentication middleware
pub async fn jwt_auth_middleware(
    State(auth_service): State<AuthService>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .ok_or(AuthError::MissingAuthHeader)?;

    let token = extract_bearer_token(auth_header)?;
    let session = auth_service.validate_session(token).await?;

    request.extensions_mut().insert(session);

    Ok(next.run(request).await)
}

/// Admin-only middleware
pub async fn admin_only_middleware(request: Request, next: Next) -> Result<Response, AuthError> {
    let session = request
        .extensions()
        .get::<UserSession>()
        .ok_or(AuthError::InsufficientPermissions)?;

    if session.role != UserRole::Admin {
        return Err(AuthError::InsufficientPermissions);
    }

    Ok(next.run(request).await)
}

/// Coordinator or Admin middleware
pub async fn coordinator_or_admin_middleware(
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let session = request
        .extensions()
        .get::<UserSession>()
        .ok_or(AuthError::InsufficientPermissions)?;

    if !matches!(session.role, UserRole::Coordinator | UserRole::Admin) {
        return Err(AuthError::InsufficientPermissions);
    }

    Ok(next.run(request).await)
}

/// CORS configuration for the API
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Security headers middleware
pub fn security_headers_layer() -> tower_http::set_header::SetResponseHeaderLayer<HeaderValue> {
    tower_http::set_header::SetResponseHeaderLayer::overriding(
        axum::http::header::HeaderName::from_static("x-content-type-options"),
        HeaderValue::from_static("nosniff"),
    )
}

/// Rate limiting middleware (simple in-memory implementation)
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct RateLimiter {
    requests: Arc<Mutex<HashMap<String, Vec<Instant>>>>,
    max_requests: usize,
    window: Duration,
}

impl RateLimiter {
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            requests: Arc::new(Mutex::new(HashMap::new())),
            max_requests,
            window,
        }
    }

    pub fn check_rate_limit(&self, key: &str) -> bool {
        let mut requests = self.requests.lock().unwrap();
        let now = Instant::now();

        let entry = requests.entry(key.to_string()).or_insert_with(Vec::new);
        entry.retain(|&time| now.duration_since(time) < self.window);

        if entry.len() >= self.max_requests {
            return false;
        }

        entry.push(now);
        true
    }
}

/// Rate limiting middleware, keyed on forwarded client IP
pub async fn rate_limit_middleware(
    State(rate_limiter): State<RateLimiter>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let client_ip = request
        .headers()
        .get("x-forwarded-for")
        .or_else(|| request.headers().get("x-real-ip"))
        .and_then(|header| header.to_str().ok())
        .unwrap_or("unknown");

    if !rate_limiter.check_rate_limit(client_ip) {
        return Err(StatusCode::TOO_MANY_REQUESTS);
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_rate_limiter() {
        let limiter = RateLimiter::new(3, Duration::from_secs(60));

        assert!(limiter.check_rate_limit("client1"));
        assert!(limiter.check_rate_limit("client1"));
        assert!(limiter.check_rate_limit("client1"));

        assert!(!limiter.check_rate_limit("client1"));

        // Different client should succeed
        assert!(limiter.check_rate_limit("client2"));
    }

    #[test]
    fn test_user_role_permissions() {
        let admin = UserRole::Admin;
        let coordinator = UserRole::Coordinator;
        let mentee = UserRole::Mentee;

        assert!(admin.can_access(&admin));
        assert!(admin.can_access(&coordinator));
        assert!(admin.can_access(&mentee));

        assert!(coordinator.can_access(&coordinator));
        assert!(coordinator.can_access(&mentee));
        assert!(!coordinator.can_access(&admin));

        assert!(mentee.can_access(&mentee));
        assert!(!mentee.can_access(&coordinator));
        assert!(!mentee.can_access(&admin));
    }
}
