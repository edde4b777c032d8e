use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::TimeDelta;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info};

/// Hashed once, then verified against whenever a login names an unknown email.
const DUMMY_PASSWORD: &str = "user-session-dummy-password";

pub struct RealAuthService {
    directory: Arc<dyn UserDirectory>,
    credential_hasher: Arc<dyn CredentialHasher>,
    sessions: Arc<dyn SessionManager>,
    token_codec: Arc<dyn TokenCodec>,
    clock: Arc<dyn Clock>,
    access_ttl: TimeDelta,
    min_password_len: usize,
    min_name_len: usize,
    dummy_hash: OnceCell<String>,
}

impl RealAuthService {
    pub fn new(
        directory: Arc<dyn UserDirectory>,
        credential_hasher: Arc<dyn CredentialHasher>,
        sessions: Arc<dyn SessionManager>,
        token_codec: Arc<dyn TokenCodec>,
        clock: Arc<dyn Clock>,
        access_ttl: TimeDelta,
    ) -> Self {
        Self {
            directory,
            credential_hasher,
            sessions,
            token_codec,
            clock,
            access_ttl,
            min_password_len: 6,
            min_name_len: 2,
            dummy_hash: OnceCell::new(),
        }
    }

    fn normalize_email(email: &str) -> String {
        email.trim().to_ascii_lowercase()
    }

    fn validate_register(&self, input: &RegisterInput) -> Result<(), AuthError> {
        if input.email.trim().is_empty() {
            return Err(AuthError::InvalidInput("email is required".into()));
        }
        if !is_email(input.email.trim()) {
            return Err(AuthError::InvalidInput("invalid email format".into()));
        }
        if input.password.chars().count() < self.min_password_len {
            return Err(AuthError::InvalidInput(format!(
                "password must be at least {} characters long",
                self.min_password_len
            )));
        }
        if input.name.trim().chars().count() < self.min_name_len {
            return Err(AuthError::InvalidInput(format!(
                "name must be at least {} characters long",
                self.min_name_len
            )));
        }
        Ok(())
    }

    fn validate_login(input: &LoginInput) -> Result<(), AuthError> {
        if !is_email(input.email.trim()) {
            return Err(AuthError::InvalidInput("invalid email format".into()));
        }
        if input.password.is_empty() {
            return Err(AuthError::InvalidInput("password is required".into()));
        }
        Ok(())
    }

    /// Pay for one verification without a real account behind it.
    async fn verify_against_dummy(&self, password: &str) {
        let dummy = self
            .dummy_hash
            .get_or_try_init(|| self.credential_hasher.hash_password(DUMMY_PASSWORD))
            .await;
        match dummy {
            Ok(hash) => {
                let _ = self.credential_hasher.verify_password(password, hash).await;
            }
            Err(e) => debug!(error = %e, "dummy hash unavailable"),
        }
    }

    fn session(&self, user: Option<UserProfile>, tokens: AuthTokens) -> AuthSession {
        AuthSession::bearer(user, tokens, self.access_ttl.num_seconds())
    }
}

/// Shape check only: `local@domain.tld`, no whitespace, alphabetic TLD of two or more.
fn is_email(s: &str) -> bool {
    let Some((local, domain)) = s.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') || s.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((host, tld)) = domain.rsplit_once('.') else {
        return false;
    };
    !host.is_empty() && tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic())
}

#[async_trait::async_trait]
impl AuthService for RealAuthService {
    async fn register(
        &self,
        ctx: &RequestContext,
        request: RegisterInput,
    ) -> Result<AuthSession, AuthError> {
        self.validate_register(&request)?;
        let RegisterInput {
            email,
            password,
            name,
        } = request;
        let email = Self::normalize_email(&email);

        if ctx.run(self.directory.email_exists(&email)).await? {
            return Err(AuthError::EmailTaken);
        }

        let password_hash = self.credential_hasher.hash_password(&password).await?;
        let record = ctx
            .run(self.directory.create(NewUser {
                email,
                name: name.trim().to_string(),
                password_hash,
            }))
            .await
            .map_err(|e| match e {
                StoreError::Conflict => AuthError::EmailTaken,
                other => AuthError::from(other),
            })?;

        let tokens = self.sessions.issue_pair(ctx, &record.subject()).await?;
        info!(user_id = %record.id, "user registered");
        Ok(self.session(Some(record.profile()), tokens))
    }

    async fn login(
        &self,
        ctx: &RequestContext,
        request: LoginInput,
    ) -> Result<AuthSession, AuthError> {
        Self::validate_login(&request)?;
        let email = Self::normalize_email(&request.email);

        let Some(record) = ctx.run(self.directory.find_by_email(&email)).await? else {
            self.verify_against_dummy(&request.password).await;
            return Err(AuthError::InvalidCredentials);
        };

        let ok = self
            .credential_hasher
            .verify_password(&request.password, &record.password_hash)
            .await?;
        if !ok {
            return Err(AuthError::InvalidCredentials);
        }

        if !record.is_active {
            debug!(user_id = %record.id, "login refused for inactive user");
            return Err(AuthError::InvalidCredentials);
        }

        let tokens = self.sessions.issue_pair(ctx, &record.subject()).await?;
        info!(user_id = %record.id, "user logged in");
        Ok(self.session(Some(record.profile()), tokens))
    }

    async fn refresh(
        &self,
        ctx: &RequestContext,
        refresh_token: &str,
    ) -> Result<AuthSession, AuthError> {
        if refresh_token.trim().is_empty() {
            return Err(AuthError::InvalidInput("refresh token is required".into()));
        }
        let tokens = self.sessions.refresh(ctx, refresh_token.trim()).await?;
        Ok(self.session(None, tokens))
    }

    async fn validate(
        &self,
        ctx: &RequestContext,
        access_token: &str,
    ) -> Result<UserProfile, AuthError> {
        let claims = self
            .sessions
            .validate(ctx, access_token, TokenKind::Access)
            .await?;

        let record = ctx
            .run(self.directory.find_by_id(&claims.user_id))
            .await?
            .ok_or(AuthError::UserNotFound)?;
        if !record.is_active {
            return Err(AuthError::UserNotFound);
        }
        Ok(record.profile())
    }

    async fn logout(&self, ctx: &RequestContext, subject_id: &SubjectId) -> Result<(), AuthError> {
        self.sessions.logout(ctx, subject_id).await?;
        Ok(())
    }

    async fn invalidate(
        &self,
        ctx: &RequestContext,
        token: &str,
        kind: TokenKind,
    ) -> Result<(), AuthError> {
        let claims = match self.token_codec.parse_and_verify(token) {
            Ok(claims) => claims,
            // Nothing left to revoke.
            Err(TokenError::Expired) => return Ok(()),
            Err(e) => return Err(SessionError::from(e).into()),
        };
        if claims.kind != kind {
            return Err(SessionError::WrongKind {
                expected: kind,
                actual: claims.kind,
            }
            .into());
        }

        let remaining = claims.expires_at() - self.clock.now();
        self.sessions.invalidate(ctx, token, kind, remaining).await?;
        Ok(())
    }
}
