use crate::application_impl::*;
use crate::application_port::*;
use crate::domain_port::*;
use crate::infra_memory::*;
use crate::infra_mysql::*;
use crate::infra_redis::*;
use crate::logger::*;
use crate::settings::{self, Settings};
use chrono::TimeDelta;
use sqlx::MySqlPool;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub struct Server {
    pub auth_service: Arc<dyn AuthService>,
    pub internal_service: String,
    request_timeout: Duration,
    cancel: CancellationToken,
    pool: Option<MySqlPool>,
}

impl Server {
    pub async fn try_new(settings: &Settings) -> anyhow::Result<Self> {
        let (auth_service, pool): (Arc<dyn AuthService>, Option<MySqlPool>) =
            match settings.auth.backend.as_str() {
                "fake" => {
                    warn!("fake auth backend: every credential is accepted");
                    (Arc::new(FakeAuthService::new()), None)
                }
                "real" => build_real_auth(settings).await?,
                other => return Err(anyhow::anyhow!("Unknown auth backend: {}", other)),
            };

        info!("server started");

        Ok(Self {
            auth_service,
            internal_service: settings.http.internal_service.clone(),
            request_timeout: settings.http.request_timeout(),
            cancel: CancellationToken::new(),
            pool,
        })
    }

    /// Assemble around an already-built auth service.
    pub fn from_parts(
        auth_service: Arc<dyn AuthService>,
        internal_service: impl Into<String>,
        request_timeout: Duration,
    ) -> Self {
        Self {
            auth_service,
            internal_service: internal_service.into(),
            request_timeout,
            cancel: CancellationToken::new(),
            pool: None,
        }
    }

    /// Context for one inbound request: bounded by the request timeout, cancelled on shutdown.
    pub fn request_context(&self) -> RequestContext {
        RequestContext::with_timeout(&self.cancel, self.request_timeout)
    }

    pub async fn shutdown(&self) {
        info!("server shutting down...");

        self.cancel.cancel();

        if let Some(pool) = &self.pool {
            pool.close().await;
        }
    }
}

pub fn jwt_config(auth: &settings::Auth) -> anyhow::Result<JwtConfig> {
    JwtConfig::new(
        auth.signing_key.as_bytes(),
        TimeDelta::seconds(auth.access_ttl_secs),
        TimeDelta::seconds(auth.refresh_ttl_secs),
    )
}

async fn build_real_auth(
    settings: &Settings,
) -> anyhow::Result<(Arc<dyn AuthService>, Option<MySqlPool>)> {
    let jwt = jwt_config(&settings.auth)?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let store: Arc<dyn KvStore> = match settings.store.backend.as_str() {
        "memory" => {
            warn!("in-memory session store: sessions are lost on restart and not shared");
            Arc::new(MemoryKvStore::new(clock.clone()))
        }
        "redis" => Arc::new(
            RedisKvStore::connect(&RedisOptions {
                url: settings.store.url.clone(),
                connection_timeout: Duration::from_millis(settings.store.connection_timeout_ms),
                response_timeout: Duration::from_millis(settings.store.response_timeout_ms),
                retries: settings.store.retries,
            })
            .await?,
        ),
        other => return Err(anyhow::anyhow!("Unknown store backend: {}", other)),
    };

    let (directory, pool): (Arc<dyn UserDirectory>, Option<MySqlPool>) =
        match settings.directory.backend.as_str() {
            "memory" => (Arc::new(MemoryUserDirectory::new()), None),
            "mysql" => {
                let pool = MySqlUserDirectory::connect(
                    &settings.directory.url,
                    settings.directory.max_connections,
                )
                .await?;
                (Arc::new(MySqlUserDirectory::new(pool.clone())), Some(pool))
            }
            other => return Err(anyhow::anyhow!("Unknown directory backend: {}", other)),
        };

    let token_codec: Arc<dyn TokenCodec> = Arc::new(JwtHs256Codec::new(&jwt, clock.clone()));
    let sessions: Arc<dyn SessionManager> = Arc::new(RealSessionManager::new(
        &jwt,
        token_codec.clone(),
        store,
        clock.clone(),
    ));
    let credential_hasher: Arc<dyn CredentialHasher> = Arc::new(Argon2PasswordHasher);

    let auth_service: Arc<dyn AuthService> = Arc::new(RealAuthService::new(
        directory,
        credential_hasher,
        sessions,
        token_codec,
        clock,
        jwt.access_ttl,
    ));

    Ok((auth_service, pool))
}
