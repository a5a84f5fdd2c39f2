use super::util::store_err;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};

const USER_COLUMNS: &str = "user_id, username, email, password_hash, created_at, updated_at";

pub struct MySqlUserStore {
    pool: MySqlPool,
}

impl MySqlUserStore {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlUserStore { pool }
    }

    fn row_to_user(row: MySqlRow) -> Result<User, StoreError> {
        let user_id: String = row.try_get("user_id").map_err(StoreError::backend)?;
        let username: String = row.try_get("username").map_err(StoreError::backend)?;
        let email: String = row.try_get("email").map_err(StoreError::backend)?;
        let password_hash: String = row.try_get("password_hash").map_err(StoreError::backend)?;
        let created_at: DateTime<Utc> = row.try_get("created_at").map_err(StoreError::backend)?;
        let updated_at: DateTime<Utc> = row.try_get("updated_at").map_err(StoreError::backend)?;

        Ok(User {
            id: UserId(user_id),
            username,
            email,
            password_hash,
            created_at,
            updated_at,
        })
    }

    async fn find_one(&self, column: &str, value: &str) -> Result<User, StoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM user_account WHERE {column} = ?");
        let row_opt: Option<MySqlRow> = sqlx::query(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(StoreError::backend)?;

        row_opt
            .map(Self::row_to_user)
            .transpose()?
            .ok_or(StoreError::NotFound)
    }
}

#[async_trait::async_trait]
impl UserStore for MySqlUserStore {
    async fn create(&self, user: &User) -> Result<(), StoreError> {
        sqlx::query(
            r#"
INSERT INTO user_account (user_id, username, email, password_hash, created_at, updated_at)
VALUES (?, ?, ?, ?, ?, ?)
"#,
        )
        .bind(&user.id.0)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(store_err)?;

        Ok(())
    }

    async fn find_by_id(&self, user_id: &UserId) -> Result<User, StoreError> {
        self.find_one("user_id", &user_id.0).await
    }

    async fn find_by_username(&self, username: &str) -> Result<User, StoreError> {
        self.find_one("username", username).await
    }

    async fn find_by_email(&self, email: &str) -> Result<User, StoreError> {
        self.find_one("email", email).await
    }
}
