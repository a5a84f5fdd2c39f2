use crate::application_impl::*;
use crate::application_port::*;
use crate::domain_port::*;
use crate::infra_memory::*;
use crate::infra_mysql::*;
use crate::logger::*;
use crate::server::*;
use crate::settings::Settings;
use anyhow::anyhow;
use nanoid::nanoid;
use sqlx::MySqlPool;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

const DEV_SIGNING_KEY: &str = "tripline-dev-signing-key";

pub struct Server {
    pub auth_service: Arc<dyn AuthService>,
    housekeeper_handle: Mutex<Option<JoinHandle<()>>>,
    cancel: CancellationToken,
    pool: Option<MySqlPool>,
}

impl Server {
    pub async fn try_new(settings: &Settings) -> anyhow::Result<Self> {
        let alphabet: [char; 16] = [
            '1', '2', '3', '4', '5', '6', '7', '8', '9', '0', 'a', 'b', 'c', 'd', 'e', 'f',
        ];
        let run_id = nanoid!(10, &alphabet);

        let (stores, pool) = match settings.store.backend.as_str() {
            "memory" => {
                warn!("using the in-memory store; sessions are lost on restart");
                let db = MemoryDatabase::new();
                let stores = AuthStores {
                    users: Arc::new(MemoryUserStore::new(db.clone())),
                    refresh_tokens: Arc::new(MemoryRefreshTokenStore::new(db.clone())),
                    revoked_tokens: Arc::new(MemoryRevokedTokenStore::new(db.clone())),
                    tx_manager: Arc::new(db),
                };
                (stores, None)
            }
            "mysql" => {
                let dsn = settings
                    .store
                    .mysql_dsn
                    .as_deref()
                    .ok_or_else(|| anyhow!("store.mysql_dsn is required for the mysql backend"))?;
                let pool = MySqlPool::connect(dsn).await?;
                let tx_manager: Arc<dyn TxManager> = Arc::new(MySqlTxManager::new(pool.clone()));
                let stores = AuthStores {
                    users: Arc::new(MySqlUserStore::new(pool.clone())),
                    refresh_tokens: Arc::new(MySqlRefreshTokenStore::new(pool.clone())),
                    revoked_tokens: Arc::new(MySqlRevokedTokenStore::new(pool.clone())),
                    tx_manager,
                };
                (stores, Some(pool))
            }
            other => return Err(anyhow!("Unknown store backend: {}", other)),
        };

        let token_issuer: Arc<dyn TokenIssuer> = Arc::new(JwtHs256Issuer::new(JwtConfig {
            issuer: settings.auth.issuer.clone(),
            audience: settings.auth.audience.clone(),
            access_ttl: chrono::Duration::seconds(i64::try_from(settings.auth.access_ttl_secs)?),
            refresh_ttl: chrono::Duration::seconds(i64::try_from(settings.auth.refresh_ttl_secs)?),
            signing_key: load_signing_key(&settings.auth.signing_key_env)?,
        }));
        let credential_hasher: Arc<dyn CredentialHasher> = Arc::new(Argon2PasswordHasher);
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        let cancel = CancellationToken::new();
        let housekeeper = Housekeeper::new(
            stores.refresh_tokens.clone(),
            stores.revoked_tokens.clone(),
            clock.clone(),
            Duration::from_secs(settings.housekeeping.interval_secs.max(1)),
            cancel.clone(),
        );

        let auth_service: Arc<dyn AuthService> = Arc::new(RealAuthService::new(
            stores,
            credential_hasher,
            token_issuer,
            clock,
            Arc::new(UuidIdGenerator),
        ));

        let housekeeper_handle = tokio::spawn(async move {
            let _ = housekeeper.run().await;
        });

        info!(%run_id, backend = %settings.store.backend, "server started");

        Ok(Self {
            auth_service,
            housekeeper_handle: Mutex::new(Some(housekeeper_handle)),
            cancel,
            pool,
        })
    }

    pub async fn shutdown(&self) {
        info!("server shutting down...");

        self.cancel.cancel();

        let handle = self
            .housekeeper_handle
            .lock()
            .ok()
            .and_then(|mut lock| lock.take());
        if let Some(handle) = handle {
            let r = handle.await;
            info!("housekeeper handle dropped: {:?}", r);
        }

        if let Some(pool) = &self.pool {
            pool.close().await;
        }
    }
}

fn load_signing_key(env_name: &str) -> anyhow::Result<Vec<u8>> {
    match std::env::var(env_name) {
        Ok(key) if !key.is_empty() => Ok(key.into_bytes()),
        _ if cfg!(debug_assertions) => {
            warn!("{} is not set, falling back to the development signing key", env_name);
            Ok(DEV_SIGNING_KEY.as_bytes().to_vec())
        }
        _ => Err(anyhow!("signing key variable {} is not set", env_name)),
    }
}
