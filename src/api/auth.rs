//! `/auth` endpoints

use serde::{Deserialize, Serialize};

use super::{ApiClient, NO_QUERY};
use crate::entity::User;
use crate::error::ApiError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginParams {
    pub username: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub captcha: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterParams {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

/// Login and register both answer with a token and the user
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    #[serde(default)]
    pub message: String,
    pub token: String,
    pub user: User,
}

#[derive(Debug, Deserialize)]
struct MeEnvelope {
    user: User,
}

impl ApiClient {
    /// POST /auth/login. The returned token is also captured into the session.
    pub async fn login(&self, params: &LoginParams) -> Result<AuthResponse, ApiError> {
        self.post("/auth/login", params).await
    }

    /// POST /auth/register, which logs the new user in as well
    pub async fn register(&self, params: &RegisterParams) -> Result<AuthResponse, ApiError> {
        self.post("/auth/register", params).await
    }

    /// GET /auth/me
    pub async fn current_user(&self) -> Result<User, ApiError> {
        let envelope: MeEnvelope = self.get("/auth/me", NO_QUERY).await?;
        Ok(envelope.user)
    }
}
