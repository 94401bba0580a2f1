//! Staff accounts and credentials.
//!
//! Only plaintext credentials are validated here. Hashing happens in the
//! API layer.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::validation::ValidationResult;

/// Shortest password an account may be created with.
pub const MIN_PASSWORD_LEN: usize = 6;

const MAX_USERNAME_LEN: usize = 50;

/// What an account may do.
///
/// Older clients send `Admin` and `Customer`; both spellings are accepted
/// and anything that is not an admin is staff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Role {
    #[serde(alias = "Admin")]
    Admin,
    #[serde(alias = "Staff", alias = "customer", alias = "Customer")]
    Staff,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::Staff => write!(f, "staff"),
        }
    }
}

/// A login account, without its password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct User {
    pub id: String,
    pub username: String,
    pub role: Role,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Username and password as posted by the login form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl Credentials {
    pub fn new(username: &str, password: &str) -> Self {
        Credentials {
            username: Some(username.to_string()),
            password: Some(password.to_string()),
        }
    }

    /// Presence check only; a login attempt never learns the password rules.
    pub fn validate_login(&self) -> ValidationResult<(String, String)> {
        let username = self.username.as_deref().map(str::trim).unwrap_or_default();
        let password = self.password.as_deref().unwrap_or_default();

        for (field, value) in [("username", username), ("password", password)] {
            if value.is_empty() {
                return Err(ValidationError::Required {
                    field: field.to_string(),
                });
            }
        }

        Ok((username.to_string(), password.to_string()))
    }

    /// Rules for a new account: trimmed username up to 50 characters,
    /// password of at least [`MIN_PASSWORD_LEN`] characters.
    pub fn validate_new_account(&self) -> ValidationResult<(String, String)> {
        let (username, password) = self.validate_login()?;

        if username.len() > MAX_USERNAME_LEN {
            return Err(ValidationError::TooLong {
                field: "username".to_string(),
                max: MAX_USERNAME_LEN,
            });
        }

        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ValidationError::InvalidFormat {
                field: "password".to_string(),
                reason: format!("must be at least {} characters long", MIN_PASSWORD_LEN),
            });
        }

        Ok((username, password))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_accepts_legacy_spellings() {
        let admin: Role = serde_json::from_str("\"Admin\"").unwrap();
        assert_eq!(admin, Role::Admin);
        let staff: Role = serde_json::from_str("\"Customer\"").unwrap();
        assert_eq!(staff, Role::Staff);
        assert_eq!(serde_json::to_value(Role::Admin).unwrap(), "admin");
    }

    #[test]
    fn test_login_requires_both_fields() {
        assert!(Credentials::new("owner", "").validate_login().is_err());
        assert!(Credentials::default().validate_login().is_err());
        assert_eq!(
            Credentials::new(" owner ", "x").validate_login().unwrap(),
            ("owner".to_string(), "x".to_string())
        );
    }

    #[test]
    fn test_new_account_password_length() {
        let err = Credentials::new("owner", "12345").validate_new_account().unwrap_err();
        assert_eq!(err.to_string(), "password has invalid format: must be at least 6 characters long");
        assert!(Credentials::new("owner", "123456").validate_new_account().is_ok());
    }
}
