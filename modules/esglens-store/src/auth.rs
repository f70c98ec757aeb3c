use chrono::{DateTime, Utc};
use sqlx::PgPool;

use esglens_common::EsgError;

#[derive(Clone)]
pub struct AuthStore {
    pool: PgPool,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub hashed_password: String,
    pub is_active: bool,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ApiKeyRow {
    pub id: i32,
    pub user_id: i32,
    pub key_hash: String,
    pub key_prefix: String,
    pub name: String,
    pub scopes: Vec<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_active: bool,
}

impl AuthStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a user. The password must already be hashed; plaintext never
    /// reaches this layer.
    pub async fn create_user(
        &self,
        username: &str,
        email: &str,
        hashed_password: &str,
    ) -> Result<UserRow, EsgError> {
        sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (username, email, hashed_password)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(username)
        .bind(email)
        .bind(hashed_password)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                EsgError::InvalidInput("username or email already registered".into())
            }
            other => EsgError::Database(other.to_string()),
        })
    }

    pub async fn user_by_username(&self, username: &str) -> Result<Option<UserRow>, EsgError> {
        sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| EsgError::Database(e.to_string()))
    }

    /// Store a new API key record. Only the hash and public prefix persist.
    pub async fn create_api_key(
        &self,
        user_id: i32,
        key_hash: &str,
        key_prefix: &str,
        name: &str,
        scopes: &[String],
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<i32, EsgError> {
        sqlx::query_scalar::<_, i32>(
            r#"
            INSERT INTO api_keys (user_id, key_hash, key_prefix, name, scopes, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(key_hash)
        .bind(key_prefix)
        .bind(name)
        .bind(scopes)
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| EsgError::Database(e.to_string()))
    }

    /// Look up an API key by its hash, active and unexpired only. Bumps
    /// `last_used_at` on a hit.
    pub async fn api_key_by_hash(&self, key_hash: &str) -> Result<Option<ApiKeyRow>, EsgError> {
        let row = sqlx::query_as::<_, ApiKeyRow>(
            r#"
            SELECT id, user_id, key_hash, key_prefix, name, scopes, expires_at, is_active
            FROM api_keys
            WHERE key_hash = $1
              AND is_active
              AND (expires_at IS NULL OR expires_at > NOW())
            "#,
        )
        .bind(key_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| EsgError::Database(e.to_string()))?;

        if let Some(ref key) = row {
            sqlx::query("UPDATE api_keys SET last_used_at = NOW() WHERE id = $1")
                .bind(key.id)
                .execute(&self.pool)
                .await
                .map_err(|e| EsgError::Database(e.to_string()))?;
        }

        Ok(row)
    }
}
