use crate::domain_model::*;
use crate::domain_port::{StorageTx, StoreError};
use chrono::{DateTime, Utc};

#[async_trait::async_trait]
pub trait RevokedTokenStore: Send + Sync {
    /// Fails with `StoreError::Duplicate(UniqueField::TokenValue)` if the
    /// token already has a tombstone.
    async fn create_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        record: &RevokedTokenRecord,
    ) -> Result<(), StoreError>;

    async fn find_by_token(&self, token_value: &str) -> Result<RevokedTokenRecord, StoreError>;

    /// Prunes tombstones whose original expiry has passed.
    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError>;
}
