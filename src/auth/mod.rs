// JWT authentication, roles, and route guards

pub mod errors;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod password;
pub mod service;

pub use errors::AuthError;
pub use jwt::{extract_bearer_token, JwtService};
pub use middleware::{
    admin_only_middleware, coordinator_or_admin_middleware, cors_layer, jwt_auth_middleware,
    rate_limit_middleware, security_headers_layer, RateLimiter,
};
pub use models::{
    AuthResponse, ChangePasswordRequest, Claims, ForgotPasswordRequest, LoginRequest,
    MessageResponse, RefreshTokenRequest, RegisterRequest, ResetPasswordRequest, TokenResponse,
    UserInfo, UserRole, UserSession,
};
pub use service::AuthService;
