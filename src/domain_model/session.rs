use super::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct RefreshTokenId(pub String);

impl fmt::Display for RefreshTokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct RevokedTokenId(pub String);

impl fmt::Display for RevokedTokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An active session credential. `token_value` is what the client holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshTokenRecord {
    pub id: RefreshTokenId,
    pub user_id: UserId,
    pub token_value: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl RefreshTokenRecord {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// The tombstone written when this token is spent by a rotation.
    pub fn retire(&self, id: RevokedTokenId, now: DateTime<Utc>) -> RevokedTokenRecord {
        RevokedTokenRecord {
            id,
            user_id: self.user_id.clone(),
            token_value: self.token_value.clone(),
            expires_at: self.expires_at,
            revoked_at: now,
        }
    }
}

/// Tombstone for a spent refresh token. Never updated; pruned once
/// `expires_at` has passed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevokedTokenRecord {
    pub id: RevokedTokenId,
    pub user_id: UserId,
    pub token_value: String,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: DateTime<Utc>,
}
