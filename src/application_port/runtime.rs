use crate::domain_model::*;
use chrono::{DateTime, Utc};

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub trait IdGenerator: Send + Sync {
    fn new_user_id(&self) -> UserId;
    fn new_refresh_token_id(&self) -> RefreshTokenId;
    fn new_revoked_token_id(&self) -> RevokedTokenId;
}
