// db/userdb.rs
use async_trait::async_trait;

use super::db::DBClient;
use crate::models::usermodel::{User, UserRole};

const USER_COLUMNS: &str = r#"
    id, full_name, username, email, password_hash,
    role, phone_number, county, installer_category,
    contract_accepted, password_reset_required,
    created_at, updated_at
"#;

#[async_trait]
pub trait UserExt {
    async fn get_user(
        &self,
        user_id: Option<i64>,
        username: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<User>, sqlx::Error>;

    async fn save_user<T: Into<String> + Send>(
        &self,
        full_name: T,
        username: T,
        email: T,
        password_hash: T,
        phone_number: Option<String>,
    ) -> Result<User, sqlx::Error>;

    async fn save_installer(
        &self,
        full_name: String,
        username: String,
        email: String,
        password_hash: String,
        phone_number: String,
        county: String,
        installer_category: String,
    ) -> Result<User, sqlx::Error>;

    /// Customers and banned users, for the admin user listing.
    async fn get_customers(
        &self,
        search: Option<&str>,
        page: u32,
        limit: usize,
    ) -> Result<Vec<User>, sqlx::Error>;

    async fn count_customers(&self, search: Option<&str>) -> Result<i64, sqlx::Error>;

    async fn get_installers(
        &self,
        search: Option<&str>,
        page: u32,
        limit: usize,
    ) -> Result<Vec<User>, sqlx::Error>;

    async fn count_installers(&self, search: Option<&str>) -> Result<i64, sqlx::Error>;

    async fn update_user_role(&self, user_id: i64, role: UserRole) -> Result<User, sqlx::Error>;

    /// Sets a new password hash and clears the forced-reset flag.
    async fn update_user_password(
        &self,
        user_id: i64,
        password_hash: String,
    ) -> Result<User, sqlx::Error>;

    /// Returns the number of deleted rows (0 when the user did not exist).
    async fn delete_user(&self, user_id: i64) -> Result<u64, sqlx::Error>;
}

fn like_pattern(search: &str) -> String {
    format!("%{}%", search)
}

#[async_trait]
impl UserExt for DBClient {
    async fn get_user(
        &self,
        user_id: Option<i64>,
        username: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<User>, sqlx::Error> {
        let mut user: Option<User> = None;

        if let Some(user_id) = user_id {
            user = sqlx::query_as::<_, User>(&format!(
                "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
            ))
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        } else if let Some(username) = username {
            user = sqlx::query_as::<_, User>(&format!(
                "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
            ))
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        } else if let Some(email) = email {
            user = sqlx::query_as::<_, User>(&format!(
                "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
            ))
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        }

        Ok(user)
    }

    async fn save_user<T: Into<String> + Send>(
        &self,
        full_name: T,
        username: T,
        email: T,
        password_hash: T,
        phone_number: Option<String>,
    ) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (full_name, username, email, password_hash, phone_number, role)
            VALUES ($1, $2, $3, $4, $5, 'customer'::user_role)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(full_name.into())
        .bind(username.into())
        .bind(email.into())
        .bind(password_hash.into())
        .bind(phone_number)
        .fetch_one(&self.pool)
        .await
    }

    async fn save_installer(
        &self,
        full_name: String,
        username: String,
        email: String,
        password_hash: String,
        phone_number: String,
        county: String,
        installer_category: String,
    ) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (
                full_name, username, email, password_hash, phone_number,
                county, installer_category, role, password_reset_required
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, 'installer'::user_role, TRUE)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(full_name)
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .bind(phone_number)
        .bind(county)
        .bind(installer_category)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_customers(
        &self,
        search: Option<&str>,
        page: u32,
        limit: usize,
    ) -> Result<Vec<User>, sqlx::Error> {
        let offset = (page.max(1) - 1) as i64 * limit as i64;
        let pattern = search.map(like_pattern);

        sqlx::query_as::<_, User>(&format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            WHERE role IN ('customer'::user_role, 'banned'::user_role)
            AND ($1::TEXT IS NULL OR full_name ILIKE $1 OR email ILIKE $1 OR username ILIKE $1)
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(pattern)
        .bind(limit as i64)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
    }

    async fn count_customers(&self, search: Option<&str>) -> Result<i64, sqlx::Error> {
        let pattern = search.map(like_pattern);

        sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM users
            WHERE role IN ('customer'::user_role, 'banned'::user_role)
            AND ($1::TEXT IS NULL OR full_name ILIKE $1 OR email ILIKE $1 OR username ILIKE $1)
            "#,
        )
        .bind(pattern)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_installers(
        &self,
        search: Option<&str>,
        page: u32,
        limit: usize,
    ) -> Result<Vec<User>, sqlx::Error> {
        let offset = (page.max(1) - 1) as i64 * limit as i64;
        let pattern = search.map(like_pattern);

        sqlx::query_as::<_, User>(&format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            WHERE role = 'installer'::user_role
            AND ($1::TEXT IS NULL
                OR full_name ILIKE $1 OR email ILIKE $1
                OR county ILIKE $1 OR installer_category ILIKE $1)
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(pattern)
        .bind(limit as i64)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
    }

    async fn count_installers(&self, search: Option<&str>) -> Result<i64, sqlx::Error> {
        let pattern = search.map(like_pattern);

        sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM users
            WHERE role = 'installer'::user_role
            AND ($1::TEXT IS NULL
                OR full_name ILIKE $1 OR email ILIKE $1
                OR county ILIKE $1 OR installer_category ILIKE $1)
            "#,
        )
        .bind(pattern)
        .fetch_one(&self.pool)
        .await
    }

    async fn update_user_role(&self, user_id: i64, role: UserRole) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET role = $2,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(role)
        .fetch_one(&self.pool)
        .await
    }

    async fn update_user_password(
        &self,
        user_id: i64,
        password_hash: String,
    ) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET password_hash = $2,
                password_reset_required = FALSE,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
    }

    async fn delete_user(&self, user_id: i64) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
