use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// The persistence ports the auth flows write through.
#[derive(Clone)]
pub struct AuthStores {
    pub users: Arc<dyn UserStore>,
    pub refresh_tokens: Arc<dyn RefreshTokenStore>,
    pub revoked_tokens: Arc<dyn RevokedTokenStore>,
    pub tx_manager: Arc<dyn TxManager>,
}

pub struct RealAuthService {
    user_store: Arc<dyn UserStore>,
    refresh_token_store: Arc<dyn RefreshTokenStore>,
    revoked_token_store: Arc<dyn RevokedTokenStore>,
    tx_manager: Arc<dyn TxManager>,
    credential_hasher: Arc<dyn CredentialHasher>,
    token_issuer: Arc<dyn TokenIssuer>,
    clock: Arc<dyn Clock>,
    id_generator: Arc<dyn IdGenerator>,
}

impl RealAuthService {
    pub fn new(
        stores: AuthStores,
        credential_hasher: Arc<dyn CredentialHasher>,
        token_issuer: Arc<dyn TokenIssuer>,
        clock: Arc<dyn Clock>,
        id_generator: Arc<dyn IdGenerator>,
    ) -> Self {
        Self {
            user_store: stores.users,
            refresh_token_store: stores.refresh_tokens,
            revoked_token_store: stores.revoked_tokens,
            tx_manager: stores.tx_manager,
            credential_hasher,
            token_issuer,
            clock,
            id_generator,
        }
    }

    fn require_non_empty(fields: &[(&str, &str)]) -> Result<(), AuthError> {
        for (name, value) in fields {
            if value.is_empty() {
                return Err(AuthError::Validation(format!("{name} must not be empty")));
            }
        }
        Ok(())
    }

    async fn begin_tx(&self) -> Result<Box<dyn StorageTx>, AuthError> {
        self.tx_manager
            .begin()
            .await
            .map_err(|e| AuthError::Internal(format!("begin tx: {e:#}")))
    }

    /// Commits on `Ok`, rolls back on `Err`.
    async fn finish_tx<T>(
        tx: Box<dyn StorageTx>,
        result: Result<T, AuthError>,
    ) -> Result<T, AuthError> {
        match result {
            Ok(value) => {
                tx.commit()
                    .await
                    .map_err(|e| AuthError::Internal(format!("commit tx: {e:#}")))?;
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback_err) = tx.rollback().await {
                    warn!("rollback failed: {:#}", rollback_err);
                }
                Err(e)
            }
        }
    }

    async fn find_active(&self, token_value: &str) -> Result<RefreshTokenRecord, AuthError> {
        self.refresh_token_store
            .find_by_token(token_value)
            .await
            .map_err(|e| {
                if e.is_not_found() {
                    AuthError::NotFound
                } else {
                    e.into()
                }
            })
    }

    /// Persists a new refresh token row for `user_id` and signs a matching
    /// access token.
    async fn open_session_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        user_id: &UserId,
        now: DateTime<Utc>,
    ) -> Result<AuthTokens, AuthError> {
        let (refresh_token, refresh_exp) = self.token_issuer.issue_refresh_token(now).await?;

        let record = RefreshTokenRecord {
            id: self.id_generator.new_refresh_token_id(),
            user_id: user_id.clone(),
            token_value: refresh_token.0.clone(),
            expires_at: refresh_exp,
            created_at: now,
        };
        self.refresh_token_store.create_in_tx(tx, &record).await?;

        let (access_token, access_exp) =
            self.token_issuer.issue_access_token(user_id, now).await?;

        Ok(AuthTokens {
            access_token,
            refresh_token,
            access_token_expires_at: access_exp,
            refresh_token_expires_at: refresh_exp,
        })
    }

    /// Retires `active` and opens its successor. Only the caller whose
    /// tombstone insert and row delete both land may mint new tokens.
    async fn rotate_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        active: &RefreshTokenRecord,
        now: DateTime<Utc>,
    ) -> Result<AuthTokens, AuthError> {
        let tombstone = active.retire(self.id_generator.new_revoked_token_id(), now);
        match self.revoked_token_store.create_in_tx(tx, &tombstone).await {
            Ok(()) => {}
            Err(e) if e.is_duplicate() => {
                debug!(user_id = %active.user_id, "refresh token already spent by a concurrent rotation");
                return Err(AuthError::InvalidCredentials);
            }
            Err(e) => return Err(e.into()),
        }

        let deleted = self
            .refresh_token_store
            .delete_by_token_in_tx(tx, &active.token_value)
            .await?;
        if deleted != 1 {
            debug!(user_id = %active.user_id, deleted, "refresh token already consumed");
            return Err(AuthError::InvalidCredentials);
        }

        self.open_session_in_tx(tx, &active.user_id, now).await
    }

    async fn delete_families_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        user_ids: &[UserId],
    ) -> Result<u64, AuthError> {
        let mut revoked = 0;
        for user_id in user_ids {
            revoked += self
                .refresh_token_store
                .delete_all_by_user_in_tx(tx, user_id)
                .await?;
        }
        Ok(revoked)
    }

    /// Reaction to a spent token being presented again. Failures here are
    /// logged only; the caller has already decided to reject the request.
    async fn revoke_family(&self, tombstone: &RevokedTokenRecord) {
        warn!(
            user_id = %tombstone.user_id,
            revoked_at = %tombstone.revoked_at,
            "refresh token reuse detected, revoking session family"
        );

        let mut user_ids = vec![tombstone.user_id.clone()];
        match self.find_active(&tombstone.token_value).await {
            Ok(raced) if raced.user_id != tombstone.user_id => user_ids.push(raced.user_id),
            Ok(_) => {}
            Err(e) if e.kind() == AuthErrorKind::NotFound => {}
            Err(e) => warn!("lookup of reused token failed: {}", e),
        }

        let result: Result<u64, AuthError> = async {
            let mut tx = self.begin_tx().await?;
            let result = self.delete_families_in_tx(tx.as_mut(), &user_ids).await;
            Self::finish_tx(tx, result).await
        }
        .await;

        match result {
            Ok(revoked) => info!(user_id = %tombstone.user_id, revoked, "session family revoked"),
            Err(e) => error!(user_id = %tombstone.user_id, "session family revocation failed: {}", e),
        }
    }
}

#[async_trait::async_trait]
impl AuthService for RealAuthService {
    #[tracing::instrument(skip_all, fields(username = %request.username))]
    async fn register(&self, request: RegisterInput) -> Result<UserId, AuthError> {
        let RegisterInput {
            username,
            email,
            password,
        } = request;

        Self::require_non_empty(&[
            ("username", username.as_str()),
            ("email", email.as_str()),
            ("password", password.as_str()),
        ])?;

        // Advisory only; the store's unique constraints decide races below.
        if self
            .user_store
            .find_by_username(&username)
            .await
            .optional()?
            .is_some()
        {
            return Err(AuthError::UsernameTaken);
        }
        if self
            .user_store
            .find_by_email(&email)
            .await
            .optional()?
            .is_some()
        {
            return Err(AuthError::EmailTaken);
        }

        let password_hash = self.credential_hasher.hash_password(&password).await?;
        let user = User::new(
            self.id_generator.new_user_id(),
            username,
            email,
            password_hash,
            self.clock.now(),
        );

        match self.user_store.create(&user).await {
            Ok(()) => {}
            Err(e) => {
                return Err(match e.duplicate_field() {
                    Some(UniqueField::Username) => AuthError::UsernameTaken,
                    Some(UniqueField::Email) => AuthError::EmailTaken,
                    _ => e.into(),
                });
            }
        }

        info!(user_id = %user.id, "user registered");
        Ok(user.id)
    }

    #[tracing::instrument(skip_all)]
    async fn login(&self, request: LoginInput) -> Result<LoginResult, AuthError> {
        let LoginInput { email, password } = request;

        Self::require_non_empty(&[("email", email.as_str()), ("password", password.as_str())])?;

        // TODO: verify against a fixed dummy hash when the email is unknown so
        // both rejection paths take comparable time.
        let user = self
            .user_store
            .find_by_email(&email)
            .await
            .optional()?
            .ok_or(AuthError::InvalidCredentials)?;

        let ok = self
            .credential_hasher
            .verify_password(&password, &user.password_hash)
            .await?;
        if !ok {
            return Err(AuthError::InvalidCredentials);
        }

        let now = self.clock.now();
        let mut tx = self.begin_tx().await?;
        let result = self.open_session_in_tx(tx.as_mut(), &user.id, now).await;
        let tokens = Self::finish_tx(tx, result).await?;

        info!(user_id = %user.id, "login succeeded");
        Ok(LoginResult {
            user_id: user.id,
            tokens,
        })
    }

    #[tracing::instrument(skip_all)]
    async fn refresh_session(&self, refresh_token: &str) -> Result<AuthTokens, AuthError> {
        if refresh_token.is_empty() {
            return Err(AuthError::InvalidCredentials);
        }

        // A tombstone hit is terminal whatever a concurrent rotation does.
        if let Some(tombstone) = self
            .revoked_token_store
            .find_by_token(refresh_token)
            .await
            .optional()?
        {
            self.revoke_family(&tombstone).await;
            return Err(AuthError::InvalidCredentials);
        }

        let active = match self.find_active(refresh_token).await {
            Ok(active) => active,
            Err(e) if e.kind() == AuthErrorKind::NotFound => {
                debug!("refresh token not found");
                return Err(AuthError::InvalidCredentials);
            }
            Err(e) => return Err(e),
        };

        let now = self.clock.now();
        if active.is_expired_at(now) {
            if let Err(e) = self.refresh_token_store.delete_by_id(&active.id).await {
                warn!(user_id = %active.user_id, "failed to delete expired refresh token: {}", e);
            }
            debug!(user_id = %active.user_id, "refresh token expired");
            return Err(AuthError::InvalidCredentials);
        }

        let mut tx = self.begin_tx().await?;
        let result = self.rotate_in_tx(tx.as_mut(), &active, now).await;
        let tokens = Self::finish_tx(tx, result).await?;

        info!(user_id = %active.user_id, "refresh token rotated");
        Ok(tokens)
    }

    #[tracing::instrument(skip_all)]
    async fn revoke_session(&self, refresh_token: &str) -> Result<(), AuthError> {
        let active = match self.find_active(refresh_token).await {
            Ok(active) => active,
            Err(e) if e.kind() == AuthErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e),
        };

        let deleted = self.refresh_token_store.delete_by_id(&active.id).await?;
        info!(user_id = %active.user_id, deleted, "session revoked");
        Ok(())
    }

    async fn verify_access_token(&self, token: &str) -> Result<UserId, AuthError> {
        let verified = self
            .token_issuer
            .verify_access_token(&AccessToken(token.to_string()))
            .await?;

        match self.user_store.find_by_id(&verified.user_id).await {
            Ok(user) => Ok(user.id),
            Err(e) if e.is_not_found() => Err(AuthError::TokenInvalid),
            Err(e) => Err(e.into()),
        }
    }
}
