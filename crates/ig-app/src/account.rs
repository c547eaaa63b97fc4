use tracing::{info, warn};
use ig_core::{RequestError, SessionProvider};
use crate::error::AppError;
use crate::generator::backend::GenBackend;
use crate::generator::backend::schemas::{ApiResponse, RegisterRequest, UserProfile};

#[derive(Debug, Clone, PartialEq)]
pub enum Verification {
    Verified(UserProfile),
    /// The backend wants the user elsewhere first, e.g. to pick a username
    Redirect(String),
    LoginRequired,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Registration {
    Registered,
    Redirect(String),
    Rejected(String),
    LoginRequired,
}

impl GenBackend {
    /// `GET /user/me`. Anything short of a verified profile or an explicit
    /// redirect sends the user back to login.
    pub async fn verify_user(&self, sessions: &dyn SessionProvider) -> Verification {
        let Some(session) = sessions.current_session() else {
            return Verification::LoginRequired;
        };

        let response = match self.client
            .get(self.url("user/me"))
            .bearer_auth(session.access_token())
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "user verification request failed");
                return Verification::LoginRequired;
            }
        };

        let body: ApiResponse<UserProfile> = match response.json().await {
            Ok(body) => body,
            Err(e) => {
                warn!(error = %e, "unreadable user verification response");
                return Verification::LoginRequired;
            }
        };

        if let Some(path) = body.redirect_to {
            return Verification::Redirect(path);
        }
        match body.data {
            Some(profile) if body.success => {
                info!(user_id = %profile.user_id, "user verified");
                Verification::Verified(profile)
            }
            _ => Verification::LoginRequired,
        }
    }

    /// `POST /user/register` to complete an account with a username
    pub async fn register_username(
        &self,
        sessions: &dyn SessionProvider,
        username: &str,
    ) -> Result<Registration, AppError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(RequestError::EmptyUsername.into());
        }

        let Some(session) = sessions.current_session() else {
            return Ok(Registration::LoginRequired);
        };

        let body: ApiResponse<serde_json::Value> = self.client
            .post(self.url("user/register"))
            .bearer_auth(session.access_token())
            .json(&RegisterRequest { username: username.to_string() })
            .send()
            .await
            .map_err(|e| AppError::BackendError(e.to_string()))?
            .json()
            .await
            .map_err(|e| AppError::BackendError(format!("Failed to parse response: {}", e)))?;

        if let Some(path) = body.redirect_to {
            return Ok(Registration::Redirect(path));
        }
        if !body.success {
            let message = body
                .message
                .unwrap_or_else(|| "Registration failed, please try again".to_string());
            return Ok(Registration::Rejected(message));
        }

        info!(%username, "username registered");
        Ok(Registration::Registered)
    }
}
