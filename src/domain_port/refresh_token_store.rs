use crate::domain_model::*;
use crate::domain_port::{StorageTx, StoreError};
use chrono::{DateTime, Utc};

#[async_trait::async_trait]
pub trait RefreshTokenStore: Send + Sync {
    async fn create_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        record: &RefreshTokenRecord,
    ) -> Result<(), StoreError>;

    async fn find_by_token(&self, token_value: &str) -> Result<RefreshTokenRecord, StoreError>;

    /// Returns the number of rows removed; 0 means there was nothing to delete.
    async fn delete_by_id(&self, id: &RefreshTokenId) -> Result<u64, StoreError>;

    /// Returns the number of rows removed. Concurrent callers deleting the same
    /// token must see exactly one of them report 1.
    async fn delete_by_token_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        token_value: &str,
    ) -> Result<u64, StoreError>;

    async fn delete_all_by_user_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        user_id: &UserId,
    ) -> Result<u64, StoreError>;

    /// Removes rows whose `expires_at <= now`.
    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError>;
}
