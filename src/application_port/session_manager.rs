use crate::application_port::TokenError;
use crate::domain_model::*;
use crate::domain_port::{RequestContext, StoreError};
use chrono::TimeDelta;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Token(#[from] TokenError),
    #[error("token has been revoked")]
    Revoked,
    #[error("wrong token type: expected {expected}, got {actual}")]
    WrongKind {
        expected: TokenKind,
        actual: TokenKind,
    },
    #[error("refresh token superseded or session ended")]
    Superseded,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Stateful token lifecycle: issuance, validation, rotation and revocation.
///
/// Each subject owns at most one authoritative pair, recorded under
/// `access:<id>` and `refresh:<id>`. Revoked tokens live under
/// `blacklist:<token>` until they would have expired anyway.
#[async_trait::async_trait]
pub trait SessionManager: Send + Sync {
    async fn issue_pair(
        &self,
        ctx: &RequestContext,
        subject: &Subject,
    ) -> Result<AuthTokens, SessionError>;

    async fn validate(
        &self,
        ctx: &RequestContext,
        token: &str,
        expected: TokenKind,
    ) -> Result<Claims, SessionError>;

    /// Exchange the authoritative refresh token for a brand-new pair.
    async fn refresh(
        &self,
        ctx: &RequestContext,
        refresh_token: &str,
    ) -> Result<AuthTokens, SessionError>;

    /// Blacklist the current refresh token (if any) and drop both session keys. Idempotent.
    async fn logout(&self, ctx: &RequestContext, subject_id: &SubjectId)
    -> Result<(), SessionError>;

    /// Blacklist a literal token string for `remaining`, independent of session records.
    async fn invalidate(
        &self,
        ctx: &RequestContext,
        token: &str,
        kind: TokenKind,
        remaining: TimeDelta,
    ) -> Result<(), SessionError>;
}
