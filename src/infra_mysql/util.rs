use super::repo_tx_mysql::MySqlTx;
use crate::domain_port::*;
use sqlx::mysql::MySqlDatabaseError;

pub fn downcast(tx: &mut dyn StorageTx) -> Result<&mut MySqlTx, StoreError> {
    tx.as_any_mut()
        .downcast_mut::<MySqlTx>()
        .ok_or_else(|| StoreError::Backend("transaction does not belong to the MySQL store".into()))
}

pub fn is_dup_key(err: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db) = err {
        if let Some(mysql_err) = db.try_downcast_ref::<MySqlDatabaseError>() {
            return mysql_err.number() == 1062; // ER_DUP_ENTRY
        }
    }

    false
}

/// Which unique index a duplicate-key error tripped, judged by the index
/// names in `sql/schema.sql`.
pub fn dup_key_field(err: &sqlx::Error) -> Option<UniqueField> {
    if !is_dup_key(err) {
        return None;
    }
    let message = err.to_string();
    if message.contains("uk_user_username") {
        Some(UniqueField::Username)
    } else if message.contains("uk_user_email") {
        Some(UniqueField::Email)
    } else if message.contains("token_value") {
        Some(UniqueField::TokenValue)
    } else {
        None
    }
}

pub fn store_err(err: sqlx::Error) -> StoreError {
    match dup_key_field(&err) {
        Some(field) => StoreError::Duplicate(field),
        None => StoreError::backend(err),
    }
}
