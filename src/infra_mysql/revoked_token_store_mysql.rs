use super::util::{downcast, store_err};
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};

pub struct MySqlRevokedTokenStore {
    pool: MySqlPool,
}

impl MySqlRevokedTokenStore {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlRevokedTokenStore { pool }
    }

    fn row_to_record(row: MySqlRow) -> Result<RevokedTokenRecord, StoreError> {
        let id: String = row.try_get("id").map_err(StoreError::backend)?;
        let user_id: String = row.try_get("user_id").map_err(StoreError::backend)?;
        let token_value: String = row.try_get("token_value").map_err(StoreError::backend)?;
        let expires_at: DateTime<Utc> = row.try_get("expires_at").map_err(StoreError::backend)?;
        let revoked_at: DateTime<Utc> = row.try_get("revoked_at").map_err(StoreError::backend)?;

        Ok(RevokedTokenRecord {
            id: RevokedTokenId(id),
            user_id: UserId(user_id),
            token_value,
            expires_at,
            revoked_at,
        })
    }
}

#[async_trait::async_trait]
impl RevokedTokenStore for MySqlRevokedTokenStore {
    async fn create_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        record: &RevokedTokenRecord,
    ) -> Result<(), StoreError> {
        let tx = downcast(tx)?;

        sqlx::query(
            r#"
INSERT INTO revoked_token (id, user_id, token_value, expires_at, revoked_at)
VALUES (?, ?, ?, ?, ?)
"#,
        )
        .bind(&record.id.0)
        .bind(&record.user_id.0)
        .bind(&record.token_value)
        .bind(record.expires_at)
        .bind(record.revoked_at)
        .execute(tx.conn())
        .await
        .map_err(store_err)?;

        Ok(())
    }

    async fn find_by_token(&self, token_value: &str) -> Result<RevokedTokenRecord, StoreError> {
        let row_opt: Option<MySqlRow> = sqlx::query(
            r#"
SELECT id, user_id, token_value, expires_at, revoked_at
FROM revoked_token
WHERE token_value = ?
"#,
        )
        .bind(token_value)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::backend)?;

        row_opt
            .map(Self::row_to_record)
            .transpose()?
            .ok_or(StoreError::NotFound)
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM revoked_token WHERE expires_at <= ?")
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(StoreError::backend)?;

        Ok(result.rows_affected())
    }
}
