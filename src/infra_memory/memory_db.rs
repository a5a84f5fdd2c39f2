use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Every table of the in-memory backend. Uniqueness is checked on insert the
/// way the SQL schema's unique indexes would.
#[derive(Debug, Default, Clone)]
pub struct MemoryTables {
    users: HashMap<UserId, User>,
    refresh_tokens: HashMap<RefreshTokenId, RefreshTokenRecord>,
    revoked_tokens: HashMap<RevokedTokenId, RevokedTokenRecord>,
}

impl MemoryTables {
    pub fn insert_user(&mut self, user: &User) -> Result<(), StoreError> {
        if self.users.values().any(|u| u.username == user.username) {
            return Err(StoreError::Duplicate(UniqueField::Username));
        }
        if self.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Duplicate(UniqueField::Email));
        }
        self.users.insert(user.id.clone(), user.clone());
        Ok(())
    }

    pub fn find_user(&self, pred: impl Fn(&User) -> bool) -> Result<User, StoreError> {
        self.users
            .values()
            .find(|&u| pred(u))
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    pub fn insert_refresh_token(&mut self, record: &RefreshTokenRecord) -> Result<(), StoreError> {
        if !self.users.contains_key(&record.user_id) {
            return Err(StoreError::Backend(format!(
                "refresh token references unknown user {}",
                record.user_id
            )));
        }
        if self
            .refresh_tokens
            .values()
            .any(|r| r.token_value == record.token_value)
        {
            return Err(StoreError::Duplicate(UniqueField::TokenValue));
        }
        self.refresh_tokens.insert(record.id.clone(), record.clone());
        Ok(())
    }

    pub fn find_refresh_token(&self, token_value: &str) -> Result<RefreshTokenRecord, StoreError> {
        self.refresh_tokens
            .values()
            .find(|r| r.token_value == token_value)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    pub fn delete_refresh_tokens(&mut self, pred: impl Fn(&RefreshTokenRecord) -> bool) -> u64 {
        let before = self.refresh_tokens.len();
        self.refresh_tokens.retain(|_, r| !pred(&*r));
        (before - self.refresh_tokens.len()) as u64
    }

    pub fn insert_revoked_token(&mut self, record: &RevokedTokenRecord) -> Result<(), StoreError> {
        if self
            .revoked_tokens
            .values()
            .any(|r| r.token_value == record.token_value)
        {
            return Err(StoreError::Duplicate(UniqueField::TokenValue));
        }
        self.revoked_tokens.insert(record.id.clone(), record.clone());
        Ok(())
    }

    pub fn find_revoked_token(&self, token_value: &str) -> Result<RevokedTokenRecord, StoreError> {
        self.revoked_tokens
            .values()
            .find(|r| r.token_value == token_value)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    pub fn delete_expired_revoked_tokens(&mut self, now: DateTime<Utc>) -> u64 {
        let before = self.revoked_tokens.len();
        self.revoked_tokens.retain(|_, r| r.expires_at > now);
        (before - self.revoked_tokens.len()) as u64
    }

    pub fn refresh_token_count(&self) -> usize {
        self.refresh_tokens.len()
    }

    pub fn revoked_token_count(&self) -> usize {
        self.revoked_tokens.len()
    }
}

/// Shared handle to the in-memory tables. Transactions hold the table lock
/// from `begin` until commit or rollback, so they run one at a time.
#[derive(Debug, Clone, Default)]
pub struct MemoryDatabase {
    tables: Arc<Mutex<MemoryTables>>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) async fn read<T>(&self, f: impl FnOnce(&MemoryTables) -> T) -> T {
        let tables = self.tables.lock().await;
        f(&tables)
    }

    pub(crate) async fn write<T>(&self, f: impl FnOnce(&mut MemoryTables) -> T) -> T {
        let mut tables = self.tables.lock().await;
        f(&mut tables)
    }

    /// A copy of the committed state.
    pub async fn snapshot(&self) -> MemoryTables {
        self.tables.lock().await.clone()
    }
}

#[async_trait::async_trait]
impl TxManager for MemoryDatabase {
    async fn begin(&self) -> anyhow::Result<Box<dyn StorageTx>> {
        let guard = self.tables.clone().lock_owned().await;
        let staged = guard.clone();
        Ok(Box::new(MemoryTx { guard, staged }))
    }
}

pub struct MemoryTx {
    guard: OwnedMutexGuard<MemoryTables>,
    staged: MemoryTables,
}

impl MemoryTx {
    pub fn tables(&mut self) -> &mut MemoryTables {
        &mut self.staged
    }
}

#[async_trait::async_trait]
impl StorageTx for MemoryTx {
    async fn commit(self: Box<Self>) -> anyhow::Result<()> {
        let MemoryTx { mut guard, staged } = *self;
        *guard = staged;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> anyhow::Result<()> {
        Ok(())
    }

    fn as_any_mut(&mut self) -> &mut (dyn Any + Send) {
        self
    }
}

pub(crate) fn downcast(tx: &mut dyn StorageTx) -> Result<&mut MemoryTx, StoreError> {
    tx.as_any_mut()
        .downcast_mut::<MemoryTx>()
        .ok_or_else(|| StoreError::Backend("transaction does not belong to the memory store".into()))
}
