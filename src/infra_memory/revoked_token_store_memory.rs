use super::MemoryDatabase;
use super::memory_db::downcast;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};

pub struct MemoryRevokedTokenStore {
    db: MemoryDatabase,
}

impl MemoryRevokedTokenStore {
    pub fn new(db: MemoryDatabase) -> Self {
        MemoryRevokedTokenStore { db }
    }
}

#[async_trait::async_trait]
impl RevokedTokenStore for MemoryRevokedTokenStore {
    async fn create_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        record: &RevokedTokenRecord,
    ) -> Result<(), StoreError> {
        downcast(tx)?.tables().insert_revoked_token(record)
    }

    async fn find_by_token(&self, token_value: &str) -> Result<RevokedTokenRecord, StoreError> {
        self.db.read(|t| t.find_revoked_token(token_value)).await
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        Ok(self.db.write(|t| t.delete_expired_revoked_tokens(now)).await)
    }
}
