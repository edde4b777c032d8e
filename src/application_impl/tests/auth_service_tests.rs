use super::support::*;
use crate::application_impl::*;
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use crate::infra_memory::*;
use chrono::TimeDelta;
use std::sync::Arc;
use std::sync::atomic::Ordering;

struct Fixture {
    service: RealAuthService,
    directory: Arc<MemoryUserDirectory>,
    clock: Arc<ManualClock>,
    codec: Arc<JwtHs256Codec>,
}

fn fixture() -> Fixture {
    fixture_with(None, Arc::new(PlainHasher))
}

fn fixture_with_store(store: Option<Arc<dyn KvStore>>) -> Fixture {
    fixture_with(store, Arc::new(PlainHasher))
}

fn fixture_with(store: Option<Arc<dyn KvStore>>, hasher: Arc<dyn CredentialHasher>) -> Fixture {
    let clock = Arc::new(ManualClock::new(start_time()));
    let memory = Arc::new(MemoryKvStore::new(clock.clone()));
    let store: Arc<dyn KvStore> = match store {
        Some(store) => store,
        None => memory.clone(),
    };
    let h = harness_over(clock.clone(), memory, store);
    let directory = Arc::new(MemoryUserDirectory::new());

    let service = RealAuthService::new(
        directory.clone(),
        hasher,
        h.sessions.clone(),
        h.codec.clone(),
        clock.clone(),
        jwt_config().access_ttl,
    );
    Fixture {
        service,
        directory,
        clock,
        codec: h.codec,
    }
}

fn register_input(email: &str) -> RegisterInput {
    RegisterInput {
        email: email.into(),
        password: "hunter22".into(),
        name: "Ada Lovelace".into(),
    }
}

fn login_input(email: &str, password: &str) -> LoginInput {
    LoginInput {
        email: email.into(),
        password: password.into(),
    }
}

#[tokio::test]
async fn register_returns_profile_and_bearer_pair() {
    let f = fixture();
    let ctx = RequestContext::background();

    let session = f
        .service
        .register(&ctx, register_input("ada@example.com"))
        .await
        .unwrap();

    let user = session.user.clone().unwrap();
    assert_eq!(user.email, "ada@example.com");
    assert_eq!(user.name, "Ada Lovelace");
    assert_eq!(session.token_type, "Bearer");
    assert_eq!(session.expires_in, 900);

    let profile = f.service.validate(&ctx, &session.access_token).await.unwrap();
    assert_eq!(profile, user);

    let stored = f.directory.find_by_id(&user.id).await.unwrap().unwrap();
    assert_eq!(stored.password_hash, "plain:hunter22");
}

#[tokio::test]
async fn register_normalizes_email_and_rejects_duplicates() {
    let f = fixture();
    let ctx = RequestContext::background();

    let session = f
        .service
        .register(&ctx, register_input("  Ada@Example.COM "))
        .await
        .unwrap();
    assert_eq!(session.user.unwrap().email, "ada@example.com");

    let r = f
        .service
        .register(&ctx, register_input("ADA@example.com"))
        .await;
    assert!(matches!(r, Err(AuthError::EmailTaken)));
}

#[tokio::test]
async fn register_validates_input() {
    let f = fixture();
    let ctx = RequestContext::background();

    let cases = [
        RegisterInput {
            email: "".into(),
            ..register_input("x")
        },
        register_input("not-an-email"),
        RegisterInput {
            password: "12345".into(),
            ..register_input("ada@example.com")
        },
        RegisterInput {
            name: " A ".into(),
            ..register_input("ada@example.com")
        },
    ];
    for input in cases {
        let r = f.service.register(&ctx, input).await;
        assert!(matches!(r, Err(AuthError::InvalidInput(_))), "{r:?}");
    }
    assert!(
        !f.directory
            .email_exists("ada@example.com")
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn login_issues_fresh_session() {
    let f = fixture();
    let ctx = RequestContext::background();
    let registered = f
        .service
        .register(&ctx, register_input("ada@example.com"))
        .await
        .unwrap();

    let session = f
        .service
        .login(&ctx, login_input("ADA@example.com", "hunter22"))
        .await
        .unwrap();
    assert_eq!(session.user.unwrap().id, registered.user.unwrap().id);
    assert_ne!(session.refresh_token, registered.refresh_token);

    // Logging in again supersedes the registration refresh token.
    let r = f.service.refresh(&ctx, &registered.refresh_token).await;
    assert!(matches!(r, Err(AuthError::InvalidToken)));
}

#[tokio::test]
async fn login_failures_are_indistinguishable() {
    let f = fixture();
    let ctx = RequestContext::background();
    f.service
        .register(&ctx, register_input("ada@example.com"))
        .await
        .unwrap();

    let wrong_password = f
        .service
        .login(&ctx, login_input("ada@example.com", "wrong-password"))
        .await
        .unwrap_err();
    let unknown_user = f
        .service
        .login(&ctx, login_input("bob@example.com", "hunter22"))
        .await
        .unwrap_err();

    assert!(matches!(wrong_password, AuthError::InvalidCredentials));
    assert!(matches!(unknown_user, AuthError::InvalidCredentials));
    assert_eq!(wrong_password.to_string(), unknown_user.to_string());
}

#[tokio::test]
async fn unknown_email_still_pays_for_a_verification() {
    let hasher = Arc::new(CountingHasher::default());
    let f = fixture_with(None, hasher.clone());
    let ctx = RequestContext::background();
    f.service
        .register(&ctx, register_input("ada@example.com"))
        .await
        .unwrap();
    assert_eq!(hasher.verifies.load(Ordering::SeqCst), 0);

    f.service
        .login(&ctx, login_input("ada@example.com", "wrong-password"))
        .await
        .unwrap_err();
    assert_eq!(hasher.verifies.load(Ordering::SeqCst), 1);

    for _ in 0..2 {
        let r = f
            .service
            .login(&ctx, login_input("bob@example.com", "hunter22"))
            .await;
        assert!(matches!(r, Err(AuthError::InvalidCredentials)));
    }
    assert_eq!(hasher.verifies.load(Ordering::SeqCst), 3);
    // Registration plus one dummy hash, reused across misses.
    assert_eq!(hasher.hashes.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn inactive_user_cannot_login_or_validate() {
    let f = fixture();
    let ctx = RequestContext::background();
    let session = f
        .service
        .register(&ctx, register_input("ada@example.com"))
        .await
        .unwrap();
    let id = session.user.unwrap().id;

    f.directory.set_active(&id, false);

    let r = f
        .service
        .login(&ctx, login_input("ada@example.com", "hunter22"))
        .await;
    assert!(matches!(r, Err(AuthError::InvalidCredentials)));

    let r = f.service.validate(&ctx, &session.access_token).await;
    assert!(matches!(r, Err(AuthError::UserNotFound)));
}

#[tokio::test]
async fn validate_rejects_refresh_token_and_garbage() {
    let f = fixture();
    let ctx = RequestContext::background();
    let session = f
        .service
        .register(&ctx, register_input("ada@example.com"))
        .await
        .unwrap();

    let r = f.service.validate(&ctx, &session.refresh_token).await;
    assert!(matches!(r, Err(AuthError::InvalidToken)));
    let r = f.service.validate(&ctx, "abc.def.ghi").await;
    assert!(matches!(r, Err(AuthError::InvalidToken)));
}

#[tokio::test]
async fn validate_unknown_subject_is_user_not_found() {
    let f = fixture();
    let ctx = RequestContext::background();
    let token = f
        .codec
        .issue(
            &Subject::new("ghost", "ghost@example.com"),
            TokenKind::Access,
            TimeDelta::minutes(5),
        )
        .unwrap()
        .token;

    let r = f.service.validate(&ctx, &token).await;
    assert!(matches!(r, Err(AuthError::UserNotFound)));
}

#[tokio::test]
async fn refresh_returns_tokens_without_user() {
    let f = fixture();
    let ctx = RequestContext::background();
    let session = f
        .service
        .register(&ctx, register_input("ada@example.com"))
        .await
        .unwrap();

    let renewed = f.service.refresh(&ctx, &session.refresh_token).await.unwrap();
    assert!(renewed.user.is_none());
    assert_eq!(renewed.token_type, "Bearer");
    f.service.validate(&ctx, &renewed.access_token).await.unwrap();

    let r = f.service.refresh(&ctx, "   ").await;
    assert!(matches!(r, Err(AuthError::InvalidInput(_))));
}

#[tokio::test]
async fn logout_ends_refresh_capability() {
    let f = fixture();
    let ctx = RequestContext::background();
    let session = f
        .service
        .register(&ctx, register_input("ada@example.com"))
        .await
        .unwrap();
    let id = session.user.unwrap().id;

    f.service.logout(&ctx, &id).await.unwrap();
    f.service.logout(&ctx, &id).await.unwrap();

    let r = f.service.refresh(&ctx, &session.refresh_token).await;
    assert!(matches!(r, Err(AuthError::InvalidToken)));
}

#[tokio::test]
async fn invalidate_revokes_a_live_access_token() {
    let f = fixture();
    let ctx = RequestContext::background();
    let session = f
        .service
        .register(&ctx, register_input("ada@example.com"))
        .await
        .unwrap();

    f.service
        .invalidate(&ctx, &session.access_token, TokenKind::Access)
        .await
        .unwrap();
    let r = f.service.validate(&ctx, &session.access_token).await;
    assert!(matches!(r, Err(AuthError::InvalidToken)));
}

#[tokio::test]
async fn invalidate_edge_cases() {
    let f = fixture();
    let ctx = RequestContext::background();
    let session = f
        .service
        .register(&ctx, register_input("ada@example.com"))
        .await
        .unwrap();

    let r = f
        .service
        .invalidate(&ctx, &session.access_token, TokenKind::Refresh)
        .await;
    assert!(matches!(r, Err(AuthError::InvalidToken)));

    let r = f.service.invalidate(&ctx, "junk", TokenKind::Access).await;
    assert!(matches!(r, Err(AuthError::InvalidToken)));

    // Already expired: nothing to do.
    f.clock.advance(TimeDelta::minutes(20));
    f.service
        .invalidate(&ctx, &session.access_token, TokenKind::Access)
        .await
        .unwrap();
}

#[tokio::test]
async fn store_outage_surfaces_as_unavailable() {
    let f = fixture_with_store(Some(Arc::new(DownStore)));
    let ctx = RequestContext::background();

    let r = f
        .service
        .register(&ctx, register_input("ada@example.com"))
        .await;
    assert!(matches!(r, Err(AuthError::Unavailable(_))));

    let r = f
        .service
        .login(&ctx, login_input("ada@example.com", "hunter22"))
        .await;
    assert!(matches!(r, Err(AuthError::Unavailable(_))));
}

#[tokio::test]
async fn cancelled_request_is_reported_as_such() {
    let f = fixture();
    let ctx = RequestContext::background();
    ctx.cancel();

    let r = f
        .service
        .login(&ctx, login_input("ada@example.com", "hunter22"))
        .await;
    assert!(matches!(r, Err(AuthError::Cancelled)));
}
