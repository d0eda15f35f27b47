use anyhow::Result;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::password::hash_password;
use crate::auth::UserRole;
use crate::models::{CreateUser, User};

#[derive(Clone)]
pub struct UserService {
    db: PgPool,
}

impl UserService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn create_user(&self, user_data: CreateUser) -> Result<User> {
        let password_hash = hash_password(&user_data.password)?;
        let role = user_data.role.unwrap_or(UserRole::Mentee);

        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users (id, email, password_hash, full_name, role, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $6)
             RETURNING id, email, password_hash, full_name, role, created_at, updated_at",
        )
        .bind(Uuid::new_v4())
        .bind(&user_data.email)
        .bind(&password_hash)
        .bind(&user_data.full_name)
        .bind(&role)
        .bind(Utc::now())
        .fetch_one(&self.db)
        .await?;

        Ok(user)
    }

    pub async fn get_user_by_id(&self, user_id: Uuid) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, password_hash, full_name, role, created_at, updated_at
             FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(user)
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, password_hash, full_name, role, created_at, updated_at
             FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?;

        Ok(user)
    }

}
