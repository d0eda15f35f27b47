use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User roles for role-based access control
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Coordinator,
    Mentee,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Coordinator => "coordinator",
            UserRole::Mentee => "mentee",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "admin" => Some(UserRole::Admin),
            "coordinator" => Some(UserRole::Coordinator),
            "mentee" => Some(UserRole::Mentee),
            _ => None,
        }
    }

    /// Check if this role has permission to access another role's resources
    pub fn can_access(&self, target_role: &UserRole) -> bool {
        match self {
            UserRole::Admin => true,
            UserRole::Coordinator => {
                matches!(target_role, UserRole::Coordinator | UserRole::Mentee)
            }
            UserRole::Mentee => matches!(target_role, UserRole::Mentee),
        }
    }
}

/// JWT token claims
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,    // Subject (user ID)
    pub email: String,  // User email
    pub role: UserRole, // User role
    pub exp: usize,     // Expiration time
    pub iat: usize,     // Issued at
    pub jti: String,    // JWT ID (for revocation)
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub role: Option<UserRole>, // Optional, defaults to Mentee
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub new_password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: usize,
    pub user: UserInfo,
}

#[derive(Debug, Serialize)]
pub struct UserInfo {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: usize,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// User session information attached to authenticated requests
#[derive(Debug, Clone)]
pub struct UserSession {
    pub user_id: Uuid,
    pub email: String,
    pub role: UserRole,
    pub jti: String,
}

impl UserSession {
    pub fn from_claims(claims: &Claims) -> Result<Self, uuid::Error> {
        Ok(Self {
            user_id: Uuid::parse_str(&claims.sub)?,
            email: claims.email.clone(),
            role: claims.role.clone(),
            jti: claims.jti.clone(),
        })
    }
}
