use crate::domain_model::*;
use chrono::TimeDelta;

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// Bad signature, unexpected algorithm, undecodable structure or foreign issuer.
    #[error("token malformed: {0}")]
    Malformed(String),
    #[error("token expired")]
    Expired,
    #[error("token signing failed: {0}")]
    Signing(String),
}

/// Signs and verifies claims-bearing tokens. Pure CPU work, never touches the store.
pub trait TokenCodec: Send + Sync {
    /// Sign a token of `kind` for `subject`, valid from now for `lifetime`.
    /// A negative lifetime yields a token that is already expired.
    fn issue(
        &self,
        subject: &Subject,
        kind: TokenKind,
        lifetime: TimeDelta,
    ) -> Result<IssuedToken, TokenError>;

    fn parse_and_verify(&self, token: &str) -> Result<Claims, TokenError>;
}
