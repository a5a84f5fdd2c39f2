use crate::domain_model::*;
use crate::domain_port::StoreError;

#[async_trait::async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with `StoreError::Duplicate` if the username or email is taken.
    async fn create(&self, user: &User) -> Result<(), StoreError>;

    async fn find_by_id(&self, user_id: &UserId) -> Result<User, StoreError>;

    async fn find_by_username(&self, username: &str) -> Result<User, StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<User, StoreError>;
}
