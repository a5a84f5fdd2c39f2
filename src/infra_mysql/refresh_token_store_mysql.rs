use super::util::{downcast, store_err};
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};

pub struct MySqlRefreshTokenStore {
    pool: MySqlPool,
}

impl MySqlRefreshTokenStore {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlRefreshTokenStore { pool }
    }

    fn row_to_record(row: MySqlRow) -> Result<RefreshTokenRecord, StoreError> {
        let id: String = row.try_get("id").map_err(StoreError::backend)?;
        let user_id: String = row.try_get("user_id").map_err(StoreError::backend)?;
        let token_value: String = row.try_get("token_value").map_err(StoreError::backend)?;
        let expires_at: DateTime<Utc> = row.try_get("expires_at").map_err(StoreError::backend)?;
        let created_at: DateTime<Utc> = row.try_get("created_at").map_err(StoreError::backend)?;

        Ok(RefreshTokenRecord {
            id: RefreshTokenId(id),
            user_id: UserId(user_id),
            token_value,
            expires_at,
            created_at,
        })
    }
}

#[async_trait::async_trait]
impl RefreshTokenStore for MySqlRefreshTokenStore {
    async fn create_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        record: &RefreshTokenRecord,
    ) -> Result<(), StoreError> {
        let tx = downcast(tx)?;

        sqlx::query(
            r#"
INSERT INTO refresh_token (id, user_id, token_value, expires_at, created_at)
VALUES (?, ?, ?, ?, ?)
"#,
        )
        .bind(&record.id.0)
        .bind(&record.user_id.0)
        .bind(&record.token_value)
        .bind(record.expires_at)
        .bind(record.created_at)
        .execute(tx.conn())
        .await
        .map_err(store_err)?;

        Ok(())
    }

    async fn find_by_token(&self, token_value: &str) -> Result<RefreshTokenRecord, StoreError> {
        let row_opt: Option<MySqlRow> = sqlx::query(
            r#"
SELECT id, user_id, token_value, expires_at, created_at
FROM refresh_token
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

    async fn delete_by_id(&self, id: &RefreshTokenId) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM refresh_token WHERE id = ?")
            .bind(&id.0)
            .execute(&self.pool)
            .await
            .map_err(StoreError::backend)?;

        Ok(result.rows_affected())
    }

    async fn delete_by_token_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        token_value: &str,
    ) -> Result<u64, StoreError> {
        let tx = downcast(tx)?;

        // InnoDB row lock: a concurrent delete blocks here and then sees 0 rows.
        let result = sqlx::query("DELETE FROM refresh_token WHERE token_value = ?")
            .bind(token_value)
            .execute(tx.conn())
            .await
            .map_err(StoreError::backend)?;

        Ok(result.rows_affected())
    }

    async fn delete_all_by_user_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        user_id: &UserId,
    ) -> Result<u64, StoreError> {
        let tx = downcast(tx)?;

        let result = sqlx::query("DELETE FROM refresh_token WHERE user_id = ?")
            .bind(&user_id.0)
            .execute(tx.conn())
            .await
            .map_err(StoreError::backend)?;

        Ok(result.rows_affected())
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM refresh_token WHERE expires_at <= ?")
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(StoreError::backend)?;

        Ok(result.rows_affected())
    }
}
