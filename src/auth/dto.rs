use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::repo::User;
use crate::repository::patch::provided;

/// Request body for user registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

/// Login credentials. Form posts use the OAuth2 password-grant field
/// `username`; JSON bodies may say `email` instead. Extra form fields such
/// as `scope` are ignored.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(alias = "email")]
    pub username: String,
    pub password: String,
}

/// Request body for token refresh.
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Partial update of a user. On `/users/me` the flag fields are ignored.
#[derive(Debug, Default, Deserialize)]
pub struct UserUpdate {
    #[serde(default, deserialize_with = "provided")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "provided")]
    pub password: Option<String>,
    #[serde(default, deserialize_with = "provided")]
    pub is_active: Option<bool>,
    #[serde(default, deserialize_with = "provided")]
    pub is_superuser: Option<bool>,
    #[serde(default, deserialize_with = "provided")]
    pub is_verified: Option<bool>,
}

/// Returned after login or refresh.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
}

/// Public view of a user.
#[derive(Debug, Serialize, Deserialize)]
pub struct UserRead {
    pub id: Uuid,
    pub email: String,
    pub is_active: bool,
    pub is_superuser: bool,
    pub is_verified: bool,
}

impl From<User> for UserRead {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            is_active: user.is_active,
            is_superuser: user.is_superuser,
            is_verified: user.is_verified,
        }
    }
}
