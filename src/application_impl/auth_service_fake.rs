use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::RequestContext;
use chrono::{Duration, Utc};

const FAKE_ACCESS_PREFIX: &str = "fake-access-token:";
const FAKE_REFRESH_PREFIX: &str = "fake-refresh-token:";

/// Accepts everyone. Tokens are `fake-access-token:<email>` / `fake-refresh-token:<email>`.
#[derive(Debug, Default)]
pub struct FakeAuthService;

impl FakeAuthService {
    pub fn new() -> Self {
        Self
    }
}

// Minimal fake for front-end work without a store or a directory.
// Extend to simulate more error cases and configurable responses when needed.
#[async_trait::async_trait]
impl AuthService for FakeAuthService {
    async fn register(
        &self,
        _ctx: &RequestContext,
        request: RegisterInput,
    ) -> Result<AuthSession, AuthError> {
        Ok(fake_session(&request.email, &request.name))
    }

    async fn login(
        &self,
        _ctx: &RequestContext,
        request: LoginInput,
    ) -> Result<AuthSession, AuthError> {
        Ok(fake_session(&request.email, "fake user"))
    }

    async fn refresh(
        &self,
        _ctx: &RequestContext,
        refresh_token: &str,
    ) -> Result<AuthSession, AuthError> {
        match refresh_token.strip_prefix(FAKE_REFRESH_PREFIX) {
            Some(email) => {
                let mut session = fake_session(email, "fake user");
                session.user = None;
                Ok(session)
            }
            None => Err(AuthError::InvalidToken),
        }
    }

    async fn validate(
        &self,
        _ctx: &RequestContext,
        access_token: &str,
    ) -> Result<UserProfile, AuthError> {
        match access_token.strip_prefix(FAKE_ACCESS_PREFIX) {
            Some(email) => Ok(fake_profile(email, "fake user")),
            None => Err(AuthError::InvalidToken),
        }
    }

    async fn logout(&self, _ctx: &RequestContext, _subject_id: &SubjectId) -> Result<(), AuthError> {
        Ok(())
    }

    async fn invalidate(
        &self,
        _ctx: &RequestContext,
        _token: &str,
        _kind: TokenKind,
    ) -> Result<(), AuthError> {
        Ok(())
    }
}

fn fake_id(email: &str) -> SubjectId {
    SubjectId(uuid::Uuid::new_v5(&uuid::Uuid::NAMESPACE_OID, email.as_bytes()).to_string())
}

fn fake_profile(email: &str, name: &str) -> UserProfile {
    UserProfile {
        id: fake_id(email),
        email: email.to_string(),
        name: name.to_string(),
    }
}

fn fake_session(email: &str, name: &str) -> AuthSession {
    let now = Utc::now();
    let tokens = AuthTokens {
        access_token: format!("{FAKE_ACCESS_PREFIX}{email}"),
        access_token_expires_at: now + Duration::days(1),
        refresh_token: format!("{FAKE_REFRESH_PREFIX}{email}"),
        refresh_token_expires_at: now + Duration::days(7),
    };
    AuthSession::bearer(Some(fake_profile(email, name)), tokens, Duration::days(1).num_seconds())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fake_tokens_round_trip() {
        let auth = FakeAuthService::new();
        let ctx = RequestContext::background();
        let session = auth
            .login(
                &ctx,
                LoginInput {
                    email: "dev@example.com".into(),
                    password: "whatever".into(),
                },
            )
            .await
            .unwrap();

        let profile = auth.validate(&ctx, &session.access_token).await.unwrap();
        assert_eq!(profile.email, "dev@example.com");
        assert_eq!(profile.id, fake_id("dev@example.com"));

        let refreshed = auth.refresh(&ctx, &session.refresh_token).await.unwrap();
        assert_eq!(refreshed.access_token, session.access_token);
        assert!(refreshed.user.is_none());
    }

    #[tokio::test]
    async fn foreign_tokens_are_rejected() {
        let auth = FakeAuthService::new();
        let ctx = RequestContext::background();
        assert!(matches!(
            auth.validate(&ctx, "eyJ.real.jwt").await,
            Err(AuthError::InvalidToken)
        ));
        assert!(matches!(
            auth.refresh(&ctx, "fake-access-token:x@y.io").await,
            Err(AuthError::InvalidToken)
        ));
    }
}
