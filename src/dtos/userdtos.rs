use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::usermodel::User;

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct RegisterUserDto {
    #[validate(length(min = 1, message = "Full name is required"))]
    pub full_name: String,

    #[validate(
        length(min = 1, message = "Email is required"),
        email(message = "Email is invalid")
    )]
    pub email: String,

    #[validate(
        length(min = 1, message = "Password is required"),
        length(min = 6, message = "Password must be at least 6 characters")
    )]
    pub password: String,

    pub phone_number: Option<String>,
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct LoginUserDto {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct ConfirmCodeDto {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,

    #[validate(length(min = 6, max = 6, message = "Code must be 6 digits"))]
    pub code: String,
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct ChangePasswordDto {
    #[validate(
        length(min = 1, message = "New password is required"),
        length(min = 6, message = "Password must be at least 6 characters")
    )]
    pub new_password: String,
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct AddInstallerDto {
    #[validate(length(min = 1, message = "Full name is required"))]
    pub full_name: String,

    #[validate(
        length(min = 1, message = "Email is required"),
        email(message = "Email is invalid")
    )]
    pub email: String,

    #[validate(length(min = 1, message = "Phone number is required"))]
    pub phone_number: String,

    #[validate(length(min = 1, message = "County is required"))]
    pub county: String,

    #[validate(length(min = 1, message = "Installer category is required"))]
    pub installer_category: String,
}

#[derive(Serialize, Deserialize, Validate, Debug, Default)]
pub struct RequestQueryDto {
    #[validate(range(min = 1))]
    pub page: Option<u32>,

    #[validate(range(min = 1, max = 50))]
    pub limit: Option<usize>,

    pub search: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct FilterUserDto {
    pub id: i64,
    pub full_name: String,
    pub username: String,
    pub email: String,
    pub role: String,
    pub phone_number: Option<String>,
    pub county: Option<String>,
    pub installer_category: Option<String>,
    pub contract_accepted: bool,
    pub password_reset_required: bool,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl FilterUserDto {
    pub fn filter_user(user: &User) -> Self {
        FilterUserDto {
            id: user.id,
            full_name: user.full_name.to_owned(),
            username: user.username.to_owned(),
            email: user.email.to_owned(),
            role: user.role.to_str().to_string(),
            phone_number: user.phone_number.to_owned(),
            county: user.county.to_owned(),
            installer_category: user.installer_category.to_owned(),
            contract_accepted: user.contract_accepted,
            password_reset_required: user.password_reset_required,
            created_at: user.created_at,
        }
    }

    pub fn filter_users(users: &[User]) -> Vec<FilterUserDto> {
        users.iter().map(FilterUserDto::filter_user).collect()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponseDto {
    pub status: String,
    pub user: FilterUserDto,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponseDto {
    pub message: String,
    pub username: String,
    pub role: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserLoginResponseDto {
    pub message: String,
    pub access_token: String,
    pub user: FilterUserDto,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PaginationDto {
    pub current_page: u32,
    pub total_pages: u32,
    pub total: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserListResponseDto {
    pub users: Vec<FilterUserDto>,
    pub pagination: PaginationDto,
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn register_dto_rejects_short_password() {
        let dto = RegisterUserDto {
            full_name: "Jane Wanjiku".to_string(),
            email: "jane@example.com".to_string(),
            password: "abc".to_string(),
            phone_number: None,
        };
        assert!(dto.validate().is_err());
    }

    #[test]
    fn confirm_dto_requires_six_digit_code() {
        let dto = ConfirmCodeDto {
            username: "CUS-Jane-1234".to_string(),
            code: "12345".to_string(),
        };
        assert!(dto.validate().is_err());
    }

    #[test]
    fn filter_user_never_exposes_the_password_hash() {
        let value = serde_json::to_value(FilterUserDto {
            id: 1,
            full_name: "Jane".into(),
            username: "CUS-Jane-1234".into(),
            email: "jane@example.com".into(),
            role: "customer".into(),
            phone_number: None,
            county: None,
            installer_category: None,
            contract_accepted: false,
            password_reset_required: false,
            created_at: Utc::now(),
        })
        .unwrap();
        assert!(value.get("password_hash").is_none());
        assert_eq!(value["role"], "customer");
    }
}
