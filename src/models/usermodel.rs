use chrono::prelude::*;
use serde::{Deserialize, Serialize};

/// Seconds of clock skew allowed when redeeming a login code.
pub const LOGIN_CODE_SKEW_GRACE_SECS: i64 = 10;

#[derive(Debug, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq)]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
pub enum UserRole {
    Customer,
    Installer,
    Admin,
    Banned,
}

impl UserRole {
    pub fn to_str(&self) -> &str {
        match self {
            UserRole::Customer => "customer",
            UserRole::Installer => "installer",
            UserRole::Admin => "admin",
            UserRole::Banned => "banned",
        }
    }

    /// Prefix used when generating role-based usernames.
    pub fn username_prefix(&self) -> &str {
        match self {
            UserRole::Customer => "CUS",
            UserRole::Installer => "INS",
            UserRole::Admin => "ADM",
            UserRole::Banned => "USR",
        }
    }
}

#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct User {
    pub id: i64,
    pub full_name: String,
    pub username: String,
    pub email: String,
    // Installers created by an admin have no password until they set one
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    pub role: UserRole,
    pub phone_number: Option<String>,
    pub county: Option<String>,
    pub installer_category: Option<String>,
    pub contract_accepted: bool,
    pub password_reset_required: bool,

    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,

    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct LoginCode {
    pub id: i64,
    pub user_id: i64,
    pub code: String,
    pub expires_at: DateTime<Utc>,
    pub used: bool,
    pub created_at: DateTime<Utc>,
}

impl LoginCode {
    /// A code is expired once its expiry is older than `now` minus a small
    /// clock-skew grace window. Expired codes must also be marked used so a
    /// redemption attempt cannot be retried.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now - chrono::Duration::seconds(LOGIN_CODE_SKEW_GRACE_SECS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn code_expiring_at(expires_at: DateTime<Utc>) -> LoginCode {
        LoginCode {
            id: 1,
            user_id: 1,
            code: "123456".to_string(),
            expires_at,
            used: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn code_within_validity_window_is_not_expired() {
        let now = Utc::now();
        let code = code_expiring_at(now + Duration::minutes(5));
        assert!(!code.is_expired(now));
    }

    #[test]
    fn code_inside_skew_grace_is_still_redeemable() {
        let now = Utc::now();
        let code = code_expiring_at(now - Duration::seconds(LOGIN_CODE_SKEW_GRACE_SECS - 1));
        assert!(!code.is_expired(now));
    }

    #[test]
    fn code_past_grace_window_is_expired() {
        let now = Utc::now();
        let code = code_expiring_at(now - Duration::seconds(LOGIN_CODE_SKEW_GRACE_SECS + 1));
        assert!(code.is_expired(now));
    }

    #[test]
    fn role_strings_match_database_labels() {
        assert_eq!(UserRole::Customer.to_str(), "customer");
        assert_eq!(UserRole::Banned.to_str(), "banned");
        assert_eq!(UserRole::Installer.username_prefix(), "INS");
    }
}
