use super::MemoryDatabase;
use crate::domain_model::*;
use crate::domain_port::*;

pub struct MemoryUserStore {
    db: MemoryDatabase,
}

impl MemoryUserStore {
    pub fn new(db: MemoryDatabase) -> Self {
        MemoryUserStore { db }
    }
}

#[async_trait::async_trait]
impl UserStore for MemoryUserStore {
    async fn create(&self, user: &User) -> Result<(), StoreError> {
        self.db.write(|t| t.insert_user(user)).await
    }

    async fn find_by_id(&self, user_id: &UserId) -> Result<User, StoreError> {
        self.db.read(|t| t.find_user(|u| &u.id == user_id)).await
    }

    async fn find_by_username(&self, username: &str) -> Result<User, StoreError> {
        self.db.read(|t| t.find_user(|u| u.username == username)).await
    }

    async fn find_by_email(&self, email: &str) -> Result<User, StoreError> {
        self.db.read(|t| t.find_user(|u| u.email == email)).await
    }
}
