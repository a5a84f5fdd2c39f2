#![allow(dead_code)]

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::Barrier;
use tripline::application_impl::*;
use tripline::application_port::*;
use tripline::domain_model::*;
use tripline::domain_port::*;
use tripline::infra_memory::*;

pub const PASSWORD: &str = "correct horse battery";

/// Stands in for Argon2 so flow tests stay fast; Argon2 has its own tests.
pub struct PlainHasher;

#[async_trait::async_trait]
impl CredentialHasher for PlainHasher {
    async fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        Ok(format!("plain${password}"))
    }

    async fn verify_password(
        &self,
        password: &str,
        password_hash: &str,
    ) -> Result<bool, AuthError> {
        Ok(password_hash.strip_prefix("plain$") == Some(password))
    }
}

pub struct Harness {
    pub db: MemoryDatabase,
    pub clock: Arc<ManualClock>,
    pub service: Arc<RealAuthService>,
}

impl Harness {
    pub fn new() -> Self {
        let db = MemoryDatabase::new();
        let refresh_tokens = Arc::new(MemoryRefreshTokenStore::new(db.clone()));
        let revoked_tokens = Arc::new(MemoryRevokedTokenStore::new(db.clone()));
        Self::with_stores(db, refresh_tokens, revoked_tokens)
    }

    pub fn with_stores(
        db: MemoryDatabase,
        refresh_tokens: Arc<dyn RefreshTokenStore>,
        revoked_tokens: Arc<dyn RevokedTokenStore>,
    ) -> Self {
        let users: Arc<dyn UserStore> = Arc::new(MemoryUserStore::new(db.clone()));
        Self::with_all_stores(db, users, refresh_tokens, revoked_tokens)
    }

    pub fn with_all_stores(
        db: MemoryDatabase,
        users: Arc<dyn UserStore>,
        refresh_tokens: Arc<dyn RefreshTokenStore>,
        revoked_tokens: Arc<dyn RevokedTokenStore>,
    ) -> Self {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let service = Arc::new(RealAuthService::new(
            AuthStores {
                users,
                refresh_tokens,
                revoked_tokens,
                tx_manager: Arc::new(db.clone()),
            },
            Arc::new(PlainHasher),
            Arc::new(JwtHs256Issuer::new(JwtConfig {
                issuer: "tripline.auth".to_string(),
                audience: "tripline-test".to_string(),
                access_ttl: chrono::Duration::minutes(15),
                refresh_ttl: chrono::Duration::days(14),
                signing_key: b"integration-test-key".to_vec(),
            })),
            clock.clone(),
            Arc::new(UuidIdGenerator),
        ));
        Self { db, clock, service }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub async fn register(&self, username: &str, email: &str) -> UserId {
        self.service
            .register(RegisterInput {
                username: username.to_string(),
                email: email.to_string(),
                password: PASSWORD.to_string(),
            })
            .await
            .unwrap()
    }

    pub async fn login(&self, email: &str) -> AuthTokens {
        self.service
            .login(LoginInput {
                email: email.to_string(),
                password: PASSWORD.to_string(),
            })
            .await
            .unwrap()
            .tokens
    }

    pub async fn active_sessions(&self) -> usize {
        self.db.snapshot().await.refresh_token_count()
    }

    pub async fn tombstones(&self) -> usize {
        self.db.snapshot().await.revoked_token_count()
    }
}

/// Refresh token store with switchable faults.
pub struct FlakyRefreshTokenStore {
    inner: MemoryRefreshTokenStore,
    pub fail_create: AtomicBool,
    pub report_zero_deletes: AtomicBool,
    pub fail_delete_all: AtomicBool,
}

impl FlakyRefreshTokenStore {
    pub fn new(db: MemoryDatabase) -> Self {
        Self {
            inner: MemoryRefreshTokenStore::new(db),
            fail_create: AtomicBool::new(false),
            report_zero_deletes: AtomicBool::new(false),
            fail_delete_all: AtomicBool::new(false),
        }
    }
}

#[async_trait::async_trait]
impl RefreshTokenStore for FlakyRefreshTokenStore {
    async fn create_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        record: &RefreshTokenRecord,
    ) -> Result<(), StoreError> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("injected insert failure".into()));
        }
        self.inner.create_in_tx(tx, record).await
    }

    async fn find_by_token(&self, token_value: &str) -> Result<RefreshTokenRecord, StoreError> {
        self.inner.find_by_token(token_value).await
    }

    async fn delete_by_id(&self, id: &RefreshTokenId) -> Result<u64, StoreError> {
        self.inner.delete_by_id(id).await
    }

    async fn delete_by_token_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        token_value: &str,
    ) -> Result<u64, StoreError> {
        if self.report_zero_deletes.load(Ordering::SeqCst) {
            return Ok(0);
        }
        self.inner.delete_by_token_in_tx(tx, token_value).await
    }

    async fn delete_all_by_user_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        user_id: &UserId,
    ) -> Result<u64, StoreError> {
        if self.fail_delete_all.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("injected delete failure".into()));
        }
        self.inner.delete_all_by_user_in_tx(tx, user_id).await
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        self.inner.delete_expired(now).await
    }
}

/// Holds the first `gated` tombstone lookups at a barrier so concurrent
/// refreshes all pass the reuse check before any of them rotates.
pub struct GatedRevokedTokenStore {
    inner: MemoryRevokedTokenStore,
    barrier: Barrier,
    gated: AtomicUsize,
}

impl GatedRevokedTokenStore {
    pub fn new(db: MemoryDatabase, gated: usize) -> Self {
        Self {
            inner: MemoryRevokedTokenStore::new(db),
            barrier: Barrier::new(gated),
            gated: AtomicUsize::new(gated),
        }
    }
}

#[async_trait::async_trait]
impl RevokedTokenStore for GatedRevokedTokenStore {
    async fn create_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        record: &RevokedTokenRecord,
    ) -> Result<(), StoreError> {
        self.inner.create_in_tx(tx, record).await
    }

    async fn find_by_token(&self, token_value: &str) -> Result<RevokedTokenRecord, StoreError> {
        let gated = self
            .gated
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if gated {
            self.barrier.wait().await;
        }
        self.inner.find_by_token(token_value).await
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        self.inner.delete_expired(now).await
    }
}

/// A user store whose lookups never see existing rows, as if a concurrent
/// registration committed between the pre-checks and the insert.
pub struct StaleReadUserStore {
    inner: MemoryUserStore,
}

impl StaleReadUserStore {
    pub fn new(db: MemoryDatabase) -> Self {
        Self {
            inner: MemoryUserStore::new(db),
        }
    }
}

#[async_trait::async_trait]
impl UserStore for StaleReadUserStore {
    async fn create(&self, user: &User) -> Result<(), StoreError> {
        self.inner.create(user).await
    }

    async fn find_by_id(&self, user_id: &UserId) -> Result<User, StoreError> {
        self.inner.find_by_id(user_id).await
    }

    async fn find_by_username(&self, _username: &str) -> Result<User, StoreError> {
        Err(StoreError::NotFound)
    }

    async fn find_by_email(&self, _email: &str) -> Result<User, StoreError> {
        Err(StoreError::NotFound)
    }
}
