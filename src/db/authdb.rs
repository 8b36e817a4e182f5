// db/authdb.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::db::DBClient;
use crate::models::usermodel::LoginCode;

#[async_trait]
pub trait LoginCodeExt {
    async fn save_login_code(
        &self,
        user_id: i64,
        code: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<LoginCode, sqlx::Error>;

    /// The most recent unused code matching (user, code), if any.
    async fn get_unused_login_code(
        &self,
        user_id: i64,
        code: &str,
    ) -> Result<Option<LoginCode>, sqlx::Error>;

    /// Single-use: once marked, the code can never be redeemed again.
    async fn mark_login_code_used(&self, code_id: i64) -> Result<(), sqlx::Error>;
}

#[async_trait]
impl LoginCodeExt for DBClient {
    async fn save_login_code(
        &self,
        user_id: i64,
        code: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<LoginCode, sqlx::Error> {
        sqlx::query_as::<_, LoginCode>(
            r#"
            INSERT INTO login_codes (user_id, code, expires_at)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, code, expires_at, used, created_at
            "#,
        )
        .bind(user_id)
        .bind(code)
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_unused_login_code(
        &self,
        user_id: i64,
        code: &str,
    ) -> Result<Option<LoginCode>, sqlx::Error> {
        sqlx::query_as::<_, LoginCode>(
            r#"
            SELECT id, user_id, code, expires_at, used, created_at
            FROM login_codes
            WHERE user_id = $1 AND code = $2 AND used = FALSE
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .bind(code)
        .fetch_optional(&self.pool)
        .await
    }

    async fn mark_login_code_used(&self, code_id: i64) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE login_codes SET used = TRUE WHERE id = $1")
            .bind(code_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
