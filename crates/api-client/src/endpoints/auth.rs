//! Authentication endpoints
//!
//! Login trades credentials for a Sanctum personal access token. The token,
//! the user's roles and id come back together and become a [`Session`].

use crate::client::AdminClient;
use crate::endpoints::{acknowledgement, check};
use crate::error::ApiResult;
use crate::models::de;
use comercio_core::session::{RoleRef, Session};
use comercio_core::validation::Validator;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, instrument};

/// Device name recorded with every token issued to this tool
pub const DEVICE_NAME: &str = "WEB";

/// Authentication API interface
#[derive(Clone)]
pub struct AuthApi {
    client: AdminClient,
}

impl AuthApi {
    /// Create a new authentication API interface
    pub(crate) fn new(client: AdminClient) -> Self {
        Self { client }
    }

    /// Exchange credentials for a session
    ///
    /// POST /api/sanctum/token
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> ApiResult<Session> {
        check(
            Validator::new()
                .required("email", email)
                .email("email", email)
                .required("password", password)
                .validate(),
        )?;

        let request = LoginRequest {
            email: email.trim(),
            password,
            device_name: DEVICE_NAME,
        };
        let response: LoginResponse = self
            .client
            .post_public("/api/sanctum/token", &request)
            .await?;

        let session = Session::new(
            response.token,
            response.user.roles,
            Some(response.user.id.to_string()),
        );
        info!(user_id = response.user.id, roles = ?session.role_ids(), "Logged in");
        Ok(session)
    }

    /// Ask for a password reset link
    ///
    /// POST /api/forgot-password
    #[instrument(skip(self))]
    pub async fn forgot_password(&self, email: &str) -> ApiResult<String> {
        check(
            Validator::new()
                .required("email", email)
                .email("email", email)
                .validate(),
        )?;

        let body: Value = self
            .client
            .post_public("/api/forgot-password", &serde_json::json!({ "email": email.trim() }))
            .await?;
        Ok(acknowledgement(&body))
    }

    /// Set a new password with the token from the reset e-mail
    ///
    /// POST /api/reset-password
    #[instrument(skip(self, request))]
    pub async fn reset_password(&self, request: &ResetPassword) -> ApiResult<String> {
        check(request.validate())?;
        let body: Value = self
            .client
            .post_public("/api/reset-password", request)
            .await?;
        Ok(acknowledgement(&body))
    }
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
    device_name: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    token: String,
    user: LoginUser,
}

#[derive(Deserialize)]
struct LoginUser {
    #[serde(deserialize_with = "de::id")]
    id: i64,
    #[serde(default, deserialize_with = "de::roles")]
    roles: Vec<RoleRef>,
}

/// Password reset form
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResetPassword {
    /// Token from the reset e-mail
    pub token: String,
    /// Account e-mail
    pub email: String,
    /// New password
    pub password: String,
    /// New password, typed again
    pub password_confirmation: String,
}

impl ResetPassword {
    /// Check the form before sending it
    #[must_use]
    pub fn validate(&self) -> comercio_core::validation::ValidationResult {
        Validator::new()
            .required("token", &self.token)
            .required("email", &self.email)
            .email("email", &self.email)
            .required("password", &self.password)
            .min_length("password", &self.password, 8)
            .custom("password_confirmation", || {
                (self.password != self.password_confirmation)
                    .then(|| "Passwords do not match".to_string())
            })
            .validate()
    }
}
