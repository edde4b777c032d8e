use crate::application_impl::JwtConfig;
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, TimeDelta, Utc};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

const ACCESS_PREFIX: &str = "access:";
const REFRESH_PREFIX: &str = "refresh:";
const BLACKLIST_PREFIX: &str = "blacklist:";
const REVOKED_SENTINEL: &str = "1";

pub fn access_key(subject_id: &SubjectId) -> String {
    format!("{ACCESS_PREFIX}{subject_id}")
}

pub fn refresh_key(subject_id: &SubjectId) -> String {
    format!("{REFRESH_PREFIX}{subject_id}")
}

pub fn blacklist_key(token: &str) -> String {
    format!("{BLACKLIST_PREFIX}{token}")
}

/// Short stable handle for a token in logs.
pub fn fingerprint(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    hex::encode(&digest[..6])
}

pub struct RealSessionManager {
    codec: Arc<dyn TokenCodec>,
    store: Arc<dyn KvStore>,
    clock: Arc<dyn Clock>,
    access_ttl: TimeDelta,
    refresh_ttl: TimeDelta,
}

impl RealSessionManager {
    pub fn new(
        cfg: &JwtConfig,
        codec: Arc<dyn TokenCodec>,
        store: Arc<dyn KvStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        RealSessionManager {
            codec,
            store,
            clock,
            access_ttl: cfg.access_ttl,
            refresh_ttl: cfg.refresh_ttl,
        }
    }

    /// Store TTL for something that dies at `until`, never below one second.
    fn ttl_until(&self, until: DateTime<Utc>) -> Duration {
        let secs = (until - self.clock.now()).num_seconds();
        Duration::from_secs(secs.max(1) as u64)
    }

    /// How long a revocation entry for `token` has to live.
    /// `None` when the token has already expired on its own.
    fn blacklist_ttl(&self, token: &str) -> Option<Duration> {
        match self.codec.parse_and_verify(token) {
            Ok(claims) => Some(self.ttl_until(claims.expires_at())),
            Err(TokenError::Expired) => None,
            Err(_) => Some(self.ttl_until(self.clock.now() + self.refresh_ttl)),
        }
    }
}

#[async_trait::async_trait]
impl SessionManager for RealSessionManager {
    async fn issue_pair(
        &self,
        ctx: &RequestContext,
        subject: &Subject,
    ) -> Result<AuthTokens, SessionError> {
        let access = self
            .codec
            .issue(subject, TokenKind::Access, self.access_ttl)?;
        let refresh = self
            .codec
            .issue(subject, TokenKind::Refresh, self.refresh_ttl)?;

        let access_expires_at = access.claims.expires_at();
        let refresh_expires_at = refresh.claims.expires_at();

        ctx.run(self.store.set_with_ttl(
            &refresh_key(&subject.id),
            &refresh.token,
            self.ttl_until(refresh_expires_at),
        ))
        .await?;
        ctx.run(self.store.set_with_ttl(
            &access_key(&subject.id),
            &access.token,
            self.ttl_until(access_expires_at),
        ))
        .await?;

        debug!(
            subject = %subject.id,
            access = %fingerprint(&access.token),
            refresh = %fingerprint(&refresh.token),
            "issued token pair"
        );

        Ok(AuthTokens {
            access_token: access.token,
            refresh_token: refresh.token,
            access_token_expires_at: access_expires_at,
            refresh_token_expires_at: refresh_expires_at,
        })
    }

    async fn validate(
        &self,
        ctx: &RequestContext,
        token: &str,
        expected: TokenKind,
    ) -> Result<Claims, SessionError> {
        if ctx.run(self.store.exists(&blacklist_key(token))).await? {
            debug!(token = %fingerprint(token), "rejected blacklisted token");
            return Err(SessionError::Revoked);
        }

        let claims = self.codec.parse_and_verify(token).map_err(|e| {
            match &e {
                TokenError::Expired => debug!(token = %fingerprint(token), "rejected expired token"),
                other => debug!(token = %fingerprint(token), error = %other, "rejected malformed token"),
            }
            e
        })?;

        if claims.kind != expected {
            debug!(token = %fingerprint(token), %expected, actual = %claims.kind, "rejected wrong token type");
            return Err(SessionError::WrongKind {
                expected,
                actual: claims.kind,
            });
        }

        if expected == TokenKind::Refresh {
            let current = ctx.run(self.store.get(&refresh_key(&claims.user_id))).await?;
            if current.as_deref() != Some(token) {
                debug!(subject = %claims.user_id, token = %fingerprint(token), "rejected superseded refresh token");
                return Err(SessionError::Superseded);
            }
        }

        Ok(claims)
    }

    async fn refresh(
        &self,
        ctx: &RequestContext,
        refresh_token: &str,
    ) -> Result<AuthTokens, SessionError> {
        let claims = self.validate(ctx, refresh_token, TokenKind::Refresh).await?;
        let subject = Subject::new(claims.user_id, claims.email);

        // Overwriting refresh:<id> is what retires the presented token.
        let tokens = self.issue_pair(ctx, &subject).await?;
        info!(
            subject = %subject.id,
            retired = %fingerprint(refresh_token),
            "rotated refresh token"
        );
        Ok(tokens)
    }

    async fn logout(
        &self,
        ctx: &RequestContext,
        subject_id: &SubjectId,
    ) -> Result<(), SessionError> {
        let refresh = refresh_key(subject_id);
        let access = access_key(subject_id);

        if let Some(current) = ctx.run(self.store.get(&refresh)).await? {
            match self.blacklist_ttl(&current) {
                Some(ttl) => {
                    ctx.run(self.store.set_with_ttl(
                        &blacklist_key(&current),
                        REVOKED_SENTINEL,
                        ttl,
                    ))
                    .await?;
                    debug!(subject = %subject_id, token = %fingerprint(&current), ttl_secs = ttl.as_secs(), "blacklisted refresh token");
                }
                None => debug!(subject = %subject_id, "stored refresh token already expired"),
            }
        }

        let removed = ctx.run(self.store.delete(&[access.as_str(), refresh.as_str()])).await?;
        info!(subject = %subject_id, removed, "session ended");
        Ok(())
    }

    async fn invalidate(
        &self,
        ctx: &RequestContext,
        token: &str,
        kind: TokenKind,
        remaining: TimeDelta,
    ) -> Result<(), SessionError> {
        if remaining <= TimeDelta::zero() {
            debug!(%kind, token = %fingerprint(token), "token already past its lifetime, not blacklisted");
            return Ok(());
        }

        let ttl = Duration::from_secs(remaining.num_seconds().max(1) as u64);
        ctx.run(self.store.set_with_ttl(&blacklist_key(token), REVOKED_SENTINEL, ttl))
            .await?;
        info!(%kind, token = %fingerprint(token), ttl_secs = ttl.as_secs(), "token invalidated");
        Ok(())
    }
}
