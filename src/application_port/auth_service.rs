use crate::domain_model::UserId;
use crate::domain_port::StoreError;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("username already exists")]
    UsernameTaken,
    #[error("email already exists")]
    EmailTaken,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("not found")]
    NotFound,
    #[error("token invalid")]
    TokenInvalid,
    #[error("internal error: {0}")]
    Internal(String),
}

/// Coarse classification callers branch on, so wrapping an error with more
/// context never changes how it is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthErrorKind {
    Validation,
    Conflict,
    InvalidCredentials,
    NotFound,
    TokenInvalid,
    Internal,
}

impl AuthError {
    pub fn kind(&self) -> AuthErrorKind {
        match self {
            AuthError::Validation(_) => AuthErrorKind::Validation,
            AuthError::UsernameTaken | AuthError::EmailTaken => AuthErrorKind::Conflict,
            AuthError::InvalidCredentials => AuthErrorKind::InvalidCredentials,
            AuthError::NotFound => AuthErrorKind::NotFound,
            AuthError::TokenInvalid => AuthErrorKind::TokenInvalid,
            AuthError::Internal(_) => AuthErrorKind::Internal,
        }
    }

    pub fn is_conflict(&self) -> bool {
        self.kind() == AuthErrorKind::Conflict
    }

    pub fn is_invalid_credentials(&self) -> bool {
        self.kind() == AuthErrorKind::InvalidCredentials
    }

    pub fn is_internal(&self) -> bool {
        self.kind() == AuthErrorKind::Internal
    }

    pub fn internal<E: std::fmt::Display>(error: E) -> Self {
        AuthError::Internal(error.to_string())
    }
}

impl From<StoreError> for AuthError {
    fn from(error: StoreError) -> Self {
        AuthError::Internal(format!("store: {error}"))
    }
}

#[derive(Debug, Clone)]
pub struct RegisterInput {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginResult {
    pub user_id: UserId,
    pub tokens: AuthTokens,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AccessToken(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RefreshToken(pub String);

#[derive(Debug, Clone, Serialize)]
pub struct AuthTokens {
    pub access_token: AccessToken,
    pub refresh_token: RefreshToken,
    pub access_token_expires_at: DateTime<Utc>,
    pub refresh_token_expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct TokenVerifyResult {
    pub user_id: UserId,
    pub jti: String,
}

#[async_trait::async_trait]
pub trait TokenIssuer: Send + Sync {
    async fn issue_access_token(
        &self,
        user: &UserId,
        now: DateTime<Utc>,
    ) -> Result<(AccessToken, DateTime<Utc>), AuthError>;

    /// A fresh opaque refresh token and the expiry its session row should carry.
    async fn issue_refresh_token(
        &self,
        now: DateTime<Utc>,
    ) -> Result<(RefreshToken, DateTime<Utc>), AuthError>;

    /// Any problem with the token yields `AuthError::TokenInvalid`.
    async fn verify_access_token(
        &self,
        token: &AccessToken,
    ) -> Result<TokenVerifyResult, AuthError>;
}

#[async_trait::async_trait]
pub trait CredentialHasher: Send + Sync {
    async fn hash_password(&self, password: &str) -> Result<String, AuthError>;
    async fn verify_password(&self, password: &str, password_hash: &str)
    -> Result<bool, AuthError>;
}

#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    async fn register(&self, request: RegisterInput) -> Result<UserId, AuthError>;
    async fn login(&self, request: LoginInput) -> Result<LoginResult, AuthError>;
    async fn refresh_session(&self, refresh_token: &str) -> Result<AuthTokens, AuthError>;
    async fn revoke_session(&self, refresh_token: &str) -> Result<(), AuthError>;
    async fn verify_access_token(&self, token: &str) -> Result<UserId, AuthError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflicts_share_one_kind() {
        assert!(AuthError::UsernameTaken.is_conflict());
        assert!(AuthError::EmailTaken.is_conflict());
        assert!(!AuthError::InvalidCredentials.is_conflict());
    }

    #[test]
    fn store_errors_become_internal() {
        let err: AuthError = StoreError::backend("pool timed out").into();
        assert!(err.is_internal());
        assert_eq!(err.kind(), AuthErrorKind::Internal);
    }
}
