use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::Clock;
use anyhow::bail;
use chrono::TimeDelta;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Signing key and lifetimes, fixed for the life of the process.
#[derive(Clone)]
pub struct JwtConfig {
    pub signing_key: Vec<u8>,
    pub access_ttl: TimeDelta,
    pub refresh_ttl: TimeDelta,
}

impl JwtConfig {
    pub fn new(
        signing_key: impl Into<Vec<u8>>,
        access_ttl: TimeDelta,
        refresh_ttl: TimeDelta,
    ) -> anyhow::Result<Self> {
        let signing_key = signing_key.into();
        if signing_key.is_empty() {
            bail!("JWT signing key is required");
        }
        if access_ttl <= TimeDelta::zero() || refresh_ttl <= TimeDelta::zero() {
            bail!("token lifetimes must be positive");
        }
        Ok(JwtConfig {
            signing_key,
            access_ttl,
            refresh_ttl,
        })
    }
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("signing_key", &"<redacted>")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish()
    }
}

pub struct JwtHs256Codec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    clock: Arc<dyn Clock>,
}

impl JwtHs256Codec {
    pub fn new(cfg: &JwtConfig, clock: Arc<dyn Clock>) -> Self {
        // Expiry and not-before are checked against the injected clock below,
        // so the library's wall-clock checks are switched off.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.leeway = 0;
        validation.set_issuer(&[ISSUER]);
        validation.set_required_spec_claims(&["exp", "iat", "nbf", "iss", "sub"]);

        JwtHs256Codec {
            encoding_key: EncodingKey::from_secret(&cfg.signing_key),
            decoding_key: DecodingKey::from_secret(&cfg.signing_key),
            validation,
            clock,
        }
    }
}

impl TokenCodec for JwtHs256Codec {
    fn issue(
        &self,
        subject: &Subject,
        kind: TokenKind,
        lifetime: TimeDelta,
    ) -> Result<IssuedToken, TokenError> {
        let now = self.clock.now();
        let claims = Claims {
            user_id: subject.id.clone(),
            email: subject.email.clone(),
            kind,
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            nbf: now.timestamp(),
            exp: (now + lifetime).timestamp(),
            jti: Uuid::new_v4().to_string(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))?;
        Ok(IssuedToken { token, claims })
    }

    fn parse_and_verify(&self, token: &str) -> Result<Claims, TokenError> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| TokenError::Malformed(e.to_string()))?
            .claims;

        let now = self.clock.now().timestamp();
        if claims.exp <= now {
            return Err(TokenError::Expired);
        }
        if claims.nbf > now {
            return Err(TokenError::Malformed("token not yet valid".to_string()));
        }
        Ok(claims)
    }
}
