use super::MemoryDatabase;
use super::memory_db::downcast;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};

pub struct MemoryRefreshTokenStore {
    db: MemoryDatabase,
}

impl MemoryRefreshTokenStore {
    pub fn new(db: MemoryDatabase) -> Self {
        MemoryRefreshTokenStore { db }
    }
}

#[async_trait::async_trait]
impl RefreshTokenStore for MemoryRefreshTokenStore {
    async fn create_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        record: &RefreshTokenRecord,
    ) -> Result<(), StoreError> {
        downcast(tx)?.tables().insert_refresh_token(record)
    }

    async fn find_by_token(&self, token_value: &str) -> Result<RefreshTokenRecord, StoreError> {
        self.db.read(|t| t.find_refresh_token(token_value)).await
    }

    async fn delete_by_id(&self, id: &RefreshTokenId) -> Result<u64, StoreError> {
        Ok(self.db.write(|t| t.delete_refresh_tokens(|r| &r.id == id)).await)
    }

    async fn delete_by_token_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        token_value: &str,
    ) -> Result<u64, StoreError> {
        Ok(downcast(tx)?
            .tables()
            .delete_refresh_tokens(|r| r.token_value == token_value))
    }

    async fn delete_all_by_user_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        user_id: &UserId,
    ) -> Result<u64, StoreError> {
        Ok(downcast(tx)?
            .tables()
            .delete_refresh_tokens(|r| &r.user_id == user_id))
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        Ok(self
            .db
            .write(|t| t.delete_refresh_tokens(|r| r.is_expired_at(now)))
            .await)
    }
}
