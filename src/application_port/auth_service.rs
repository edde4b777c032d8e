use crate::application_port::SessionError;
use crate::domain_model::*;
use crate::domain_port::{RequestContext, StoreError};
use serde::Serialize;
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("email already registered")]
    EmailTaken,
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("invalid or expired token")]
    InvalidToken,
    #[error("user not found")]
    UserNotFound,
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("request cancelled")]
    Cancelled,
    #[error("internal error: {0}")]
    InternalError(String),
}

impl From<StoreError> for AuthError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::Cancelled => AuthError::Cancelled,
            StoreError::DeadlineExceeded => AuthError::Unavailable("deadline exceeded".into()),
            StoreError::Unavailable(e) => AuthError::Unavailable(e),
            StoreError::Conflict => AuthError::InternalError("unexpected conflict".into()),
        }
    }
}

// Every token-side rejection looks the same to callers; the reason only reaches the log.
impl From<SessionError> for AuthError {
    fn from(error: SessionError) -> Self {
        match error {
            SessionError::Store(e) => AuthError::from(e),
            SessionError::Token(crate::application_port::TokenError::Signing(e)) => {
                AuthError::InternalError(e)
            }
            rejected => {
                debug!(reason = %rejected, "token rejected");
                AuthError::InvalidToken
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct RegisterInput {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthSession {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserProfile>,
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
}

impl AuthSession {
    pub fn bearer(user: Option<UserProfile>, tokens: AuthTokens, expires_in: i64) -> Self {
        AuthSession {
            user,
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            token_type: "Bearer",
            expires_in,
        }
    }
}

#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    async fn register(
        &self,
        ctx: &RequestContext,
        request: RegisterInput,
    ) -> Result<AuthSession, AuthError>;

    async fn login(&self, ctx: &RequestContext, request: LoginInput)
    -> Result<AuthSession, AuthError>;

    async fn refresh(
        &self,
        ctx: &RequestContext,
        refresh_token: &str,
    ) -> Result<AuthSession, AuthError>;

    /// Validate an access token and resolve the user it was issued for.
    async fn validate(&self, ctx: &RequestContext, access_token: &str)
    -> Result<UserProfile, AuthError>;

    async fn logout(&self, ctx: &RequestContext, subject_id: &SubjectId) -> Result<(), AuthError>;

    /// Out-of-band revocation of a single token for whatever lifetime it has left.
    async fn invalidate(
        &self,
        ctx: &RequestContext,
        token: &str,
        kind: TokenKind,
    ) -> Result<(), AuthError>;
}
