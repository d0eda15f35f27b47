use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::password::{
    generate_reset_token, hash_password, validate_password_strength, verify_password,
};
use crate::auth::{
    AuthError, AuthResponse, ChangePasswordRequest, ForgotPasswordRequest, JwtService,
    LoginRequest, MessageResponse, RefreshTokenRequest, RegisterRequest, ResetPasswordRequest,
    TokenResponse, UserInfo, UserRole, UserSession,
};
use crate::models::{UpdateUser, User, UserResponse};

use super::password::is_valid_email;

#[derive(Debug, Clone, sqlx::FromRow)]
struct StoredRefreshToken {
    expires_at: DateTime<Utc>,
    revoked: bool,
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct StoredResetToken {
    user_id: Uuid,
    expires_at: DateTime<Utc>,
    used: bool,
}

#[derive(Debug, Clone)]
pub struct AuthService {
    jwt_service: JwtService,
    db: PgPool,
}

impl AuthService {
    pub fn new(db: PgPool, jwt_secret: &str) -> Self {
        Self {
            jwt_service: JwtService::new(jwt_secret),
            db,
        }
    }

    /// Register a new user
    pub async fn register(&self, request: RegisterRequest) -> Result<AuthResponse, AuthError> {
        if !is_valid_email(&request.email) {
            return Err(AuthError::EmailValidation(format!(
                "'{}' is not a valid email address",
                request.email
            )));
        }
        validate_password_strength(&request.password)
            .map_err(|e| AuthError::PasswordValidation(e.to_string()))?;

        if self.get_user_by_email(&request.email).await?.is_some() {
            return Err(AuthError::EmailAlreadyExists);
        }

        let password_hash = hash_password(&request.password)?;
        let role = request.role.unwrap_or(UserRole::Mentee);
        let now = Utc::now();

        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users (id, email, password_hash, full_name, role, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $6)
             RETURNING id, email, password_hash, full_name, role, created_at, updated_at",
        )
        .bind(Uuid::new_v4())
        .bind(&request.email)
        .bind(&password_hash)
        .bind(&request.full_name)
        .bind(&role)
        .bind(now)
        .fetch_one(&self.db)
        .await
        .map_err(AuthError::Database)?;

        self.issue_token_pair(user).await
    }

    /// Login user
    pub async fn login(&self, request: LoginRequest) -> Result<AuthResponse, AuthError> {
        let user = self
            .get_user_by_email(&request.email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !verify_password(&request.password, &user.password_hash)? {
            return Err(AuthError::InvalidCredentials);
        }

        self.issue_token_pair(user).await
    }

    /// Exchange a refresh token for a fresh access token
    pub async fn refresh_token(
        &self,
        request: RefreshTokenRequest,
    ) -> Result<TokenResponse, AuthError> {
        let claims = self.jwt_service.validate_token(&request.refresh_token)?;

        let stored = sqlx::query_as::<_, StoredRefreshToken>(
            "SELECT expires_at, revoked FROM refresh_tokens WHERE jti = $1",
        )
        .bind(&claims.jti)
        .fetch_optional(&self.db)
        .await?
        .ok_or(AuthError::InvalidToken)?;

        if stored.revoked {
            return Err(AuthError::RefreshTokenRevoked);
        }
        if stored.expires_at < Utc::now() {
            return Err(AuthError::TokenExpired);
        }

        // Re-read the user so a role change takes effect on refresh
        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AuthError::InvalidToken)?;
        let user = self
            .get_user_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let access_token =
            self.jwt_service
                .create_access_token(user.id, &user.email, user.role)?;

        Ok(TokenResponse {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: self.jwt_service.access_token_expires_in_seconds(),
        })
    }

    /// Logout: revoke all of the user's outstanding refresh tokens
    pub async fn logout(&self, access_token: &str) -> Result<MessageResponse, AuthError> {
        let session = self.jwt_service.extract_user_session(access_token)?;

        sqlx::query("UPDATE refresh_tokens SET revoked = TRUE WHERE user_id = $1 AND revoked = FALSE")
            .bind(session.user_id)
            .execute(&self.db)
            .await?;

        Ok(MessageResponse {
            message: "Logged out successfully".to_string(),
        })
    }

    /// Validate a bearer token into a session (used by the auth middleware)
    pub async fn validate_session(&self, token: &str) -> Result<UserSession, AuthError> {
        self.jwt_service.extract_user_session(token)
    }

    pub async fn get_profile(&self, user_id: Uuid) -> Result<UserInfo, AuthError> {
        let user = self
            .get_user_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;
        Ok(user_info(user))
    }

    pub async fn change_password(
        &self,
        user_id: Uuid,
        request: ChangePasswordRequest,
    ) -> Result<MessageResponse, AuthError> {
        let user = self
            .get_user_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if !verify_password(&request.current_password, &user.password_hash)? {
            return Err(AuthError::InvalidCredentials);
        }
        validate_password_strength(&request.new_password)
            .map_err(|e| AuthError::PasswordValidation(e.to_string()))?;

        let password_hash = hash_password(&request.new_password)?;
        sqlx::query("UPDATE users SET password_hash = $2, updated_at = $3 WHERE id = $1")
            .bind(user_id)
            .bind(&password_hash)
            .bind(Utc::now())
            .execute(&self.db)
            .await?;

        Ok(MessageResponse {
            message: "Password changed successfully".to_string(),
        })
    }

    /// Issue a reset token. The response is identical whether or not the
    /// email is known.
    pub async fn forgot_password(
        &self,
        request: ForgotPasswordRequest,
    ) -> Result<MessageResponse, AuthError> {
        if let Some(user) = self.get_user_by_email(&request.email).await? {
            let token = generate_reset_token();

            sqlx::query(
                "INSERT INTO password_reset_tokens (id, user_id, token, expires_at, used, created_at)
                 VALUES ($1, $2, $3, $4, FALSE, $5)",
            )
            .bind(Uuid::new_v4())
            .bind(user.id)
            .bind(&token)
            .bind(Utc::now() + chrono::Duration::hours(1))
            .bind(Utc::now())
            .execute(&self.db)
            .await?;

            tracing::info!("Password reset token issued for user {}", user.id);
        }

        Ok(MessageResponse {
            message: "If an account with that email exists, a password reset link has been sent."
                .to_string(),
        })
    }

    pub async fn reset_password(
        &self,
        request: ResetPasswordRequest,
    ) -> Result<MessageResponse, AuthError> {
        let stored = sqlx::query_as::<_, StoredResetToken>(
            "SELECT user_id, expires_at, used FROM password_reset_tokens WHERE token = $1",
        )
        .bind(&request.token)
        .fetch_optional(&self.db)
        .await?
        .ok_or(AuthError::InvalidToken)?;

        if stored.used {
            return Err(AuthError::InvalidToken);
        }
        if stored.expires_at < Utc::now() {
            return Err(AuthError::TokenExpired);
        }

        validate_password_strength(&request.new_password)
            .map_err(|e| AuthError::PasswordValidation(e.to_string()))?;
        let password_hash = hash_password(&request.new_password)?;

        sqlx::query("UPDATE users SET password_hash = $2, updated_at = $3 WHERE id = $1")
            .bind(stored.user_id)
            .bind(&password_hash)
            .bind(Utc::now())
            .execute(&self.db)
            .await?;

        sqlx::query("UPDATE password_reset_tokens SET used = TRUE WHERE token = $1")
            .bind(&request.token)
            .execute(&self.db)
            .await?;

        Ok(MessageResponse {
            message: "Password reset successfully".to_string(),
        })
    }

    pub async fn update_profile(
        &self,
        user_id: Uuid,
        update: UpdateUser,
    ) -> Result<UserInfo, AuthError> {
        if let Some(email) = &update.email {
            if !is_valid_email(email) {
                return Err(AuthError::EmailValidation(format!(
                    "'{email}' is not a valid email address"
                )));
            }
        }

        let user = sqlx::query_as::<_, User>(
            "UPDATE users
             SET email = COALESCE($2, email),
                 full_name = COALESCE($3, full_name),
                 updated_at = $4
             WHERE id = $1
             RETURNING id, email, password_hash, full_name, role, created_at, updated_at",
        )
        .bind(user_id)
        .bind(update.email)
        .bind(update.full_name)
        .bind(Utc::now())
        .fetch_optional(&self.db)
        .await?
        .ok_or(AuthError::UserNotFound)?;

        Ok(user_info(user))
    }

    /// List users (admin)
    pub async fn list_users(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<UserResponse>, AuthError> {
        let users = sqlx::query_as::<_, User>(
            "SELECT id, email, password_hash, full_name, role, created_at, updated_at
             FROM users ORDER BY created_at DESC LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await?;

        Ok(users.into_iter().map(UserResponse::from).collect())
    }

    /// Update a user's role (admin)
    pub async fn update_user_role(
        &self,
        user_id: Uuid,
        role: UserRole,
    ) -> Result<UserInfo, AuthError> {
        let user = sqlx::query_as::<_, User>(
            "UPDATE users SET role = $2, updated_at = $3 WHERE id = $1
             RETURNING id, email, password_hash, full_name, role, created_at, updated_at",
        )
        .bind(user_id)
        .bind(&role)
        .bind(Utc::now())
        .fetch_optional(&self.db)
        .await?
        .ok_or(AuthError::UserNotFound)?;

        Ok(user_info(user))
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, password_hash, full_name, role, created_at, updated_at
             FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?;

        Ok(user)
    }

    pub async fn get_user_by_id(&self, user_id: Uuid) -> Result<Option<User>, AuthError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, password_hash, full_name, role, created_at, updated_at
             FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(user)
    }

    async fn issue_token_pair(&self, user: User) -> Result<AuthResponse, AuthError> {
        let (access_token, refresh_token) =
            self.jwt_service
                .create_token_pair(user.id, &user.email, user.role.clone())?;

        self.store_refresh_token(user.id, &refresh_token).await?;

        Ok(AuthResponse {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: self.jwt_service.access_token_expires_in_seconds(),
            user: user_info(user),
        })
    }

    async fn store_refresh_token(&self, user_id: Uuid, token: &str) -> Result<(), AuthError> {
        let claims = self.jwt_service.validate_token(token)?;
        let expires_at = DateTime::<Utc>::from_timestamp(claims.exp as i64, 0)
            .ok_or(AuthError::InvalidToken)?;

        sqlx::query(
            "INSERT INTO refresh_tokens (id, user_id, jti, expires_at, revoked, created_at)
             VALUES ($1, $2, $3, $4, FALSE, $5)",
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(&claims.jti)
        .bind(expires_at)
        .bind(Utc::now())
        .execute(&self.db)
        .await?;

        Ok(())
    }
}

fn user_info(user: User) -> UserInfo {
    UserInfo {
        id: user.id,
        email: user.email,
        full_name: user.full_name,
        role: user.role,
        created_at: user.created_at,
        updated_at: user.updated_at,
    }
}
