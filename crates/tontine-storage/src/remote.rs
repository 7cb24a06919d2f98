use crate::error::{StorageError, StorageResult};
use crate::tasks::TaskBackend;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tontine_core::TaskRecord;

/// Remote backend connection settings.
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    /// Project base URL, e.g. `https://example.supabase.co`.
    pub base_url: String,
    /// Publishable API key sent with every request.
    pub api_key: String,
    pub timeout: Duration,
}

impl RemoteConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// An authenticated session. Persisted in the session slot so the account
/// survives process restarts, the way a browser session would.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub user_id: String,
    pub email: String,
}

/// What account creation produced. Backends that require email
/// confirmation answer without a token; the session only exists once the
/// address is confirmed and the user signs in.
#[derive(Debug, Clone)]
pub enum SignUpOutcome {
    Active(Session),
    ConfirmationPending,
}

#[derive(Debug, Deserialize)]
struct AuthUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AuthResponse {
    access_token: String,
    user: AuthUser,
}

#[derive(Debug, Deserialize)]
struct SignUpResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    user: Option<AuthUser>,
}

impl SignUpResponse {
    fn into_outcome(self, email: &str) -> SignUpOutcome {
        match (self.access_token, self.user) {
            (Some(access_token), Some(user)) => SignUpOutcome::Active(Session {
                access_token,
                user_id: user.id,
                email: user.email.unwrap_or_else(|| email.to_string()),
            }),
            _ => SignUpOutcome::ConfirmationPending,
        }
    }
}

#[derive(Debug, Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

/// HTTP client for the account-scoped task table and its auth endpoints.
pub struct RemoteTaskClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl RemoteTaskClient {
    pub fn new(config: &RemoteConfig) -> StorageResult<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    /// Sign in with email and password. An invalid-credentials response
    /// maps to [`StorageError::InvalidCredentials`] so callers can offer
    /// account creation instead.
    pub async fn sign_in(&self, email: &str, password: &str) -> StorageResult<Session> {
        let response = self
            .post_credentials(
                &format!("{}/auth/v1/token?grant_type=password", self.base_url),
                email,
                password,
            )
            .await?;
        let auth: AuthResponse = response.json().await?;
        Ok(Session {
            access_token: auth.access_token,
            user_id: auth.user.id,
            email: auth.user.email.unwrap_or_else(|| email.to_string()),
        })
    }

    /// Create an account. A backend that requires email confirmation
    /// answers without a token; that maps to
    /// [`SignUpOutcome::ConfirmationPending`], not an error.
    pub async fn sign_up(&self, email: &str, password: &str) -> StorageResult<SignUpOutcome> {
        let response = self
            .post_credentials(&format!("{}/auth/v1/signup", self.base_url), email, password)
            .await?;
        let signup: SignUpResponse = response.json().await?;
        Ok(signup.into_outcome(email))
    }

    async fn post_credentials(
        &self,
        url: &str,
        email: &str,
        password: &str,
    ) -> StorageResult<reqwest::Response> {
        let response = self
            .client
            .post(url)
            .header("apikey", &self.api_key)
            .json(&Credentials { email, password })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            if status.is_client_error() && message.contains("Invalid login credentials") {
                return Err(StorageError::InvalidCredentials);
            }
            return Err(StorageError::Remote {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl TaskBackend for RemoteTaskClient {
    /// Full result set for the session's owner, newest first.
    async fn fetch_tasks(&self, session: &Session) -> StorageResult<Vec<TaskRecord>> {
        let response = self
            .client
            .get(format!(
                "{}/rest/v1/todos?select=*&order=created_at.desc",
                self.base_url
            ))
            .header("apikey", &self.api_key)
            .bearer_auth(&session.access_token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(StorageError::Remote {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }
        Ok(response.json().await?)
    }

    /// Upsert one row keyed by id, matching the per-record save loop of
    /// the task view.
    async fn upsert_task(&self, session: &Session, task: &TaskRecord) -> StorageResult<()> {
        let response = self
            .client
            .post(format!("{}/rest/v1/todos", self.base_url))
            .header("apikey", &self.api_key)
            .header("Prefer", "resolution=merge-duplicates")
            .bearer_auth(&session.access_token)
            .json(&[task])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(StorageError::Remote {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signup_response_with_token_yields_an_active_session() {
        let response: SignUpResponse = serde_json::from_value(serde_json::json!({
            "access_token": "token-1",
            "user": { "id": "user-1", "email": "treasurer@example.org" }
        }))
        .unwrap();

        match response.into_outcome("fallback@example.org") {
            SignUpOutcome::Active(session) => {
                assert_eq!(session.access_token, "token-1");
                assert_eq!(session.user_id, "user-1");
                assert_eq!(session.email, "treasurer@example.org");
            }
            SignUpOutcome::ConfirmationPending => panic!("expected an active session"),
        }
    }

    #[test]
    fn signup_response_without_token_is_confirmation_pending() {
        // Backends with email confirmation enabled return the user record
        // but no token until the address is confirmed.
        let response: SignUpResponse = serde_json::from_value(serde_json::json!({
            "user": { "id": "user-1", "email": "treasurer@example.org" }
        }))
        .unwrap();
        assert!(matches!(
            response.into_outcome("treasurer@example.org"),
            SignUpOutcome::ConfirmationPending
        ));
    }
}
