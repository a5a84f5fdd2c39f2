use crate::application_port::*;
use crate::domain_model::UserId;
use argon2::password_hash::rand_core::{OsRng, RngCore};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

const REFRESH_TOKEN_BYTES: usize = 32;

#[derive(Clone)]
pub struct JwtConfig {
    pub issuer: String,
    pub audience: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
    pub signing_key: Vec<u8>,
}

// Hand-written so the key never lands in logs.
impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct AccessClaims {
    sub: String,
    exp: i64,
    iat: i64,
    iss: String,
    aud: String,
    jti: String,
}

pub struct JwtHs256Issuer {
    cfg: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtHs256Issuer {
    pub fn new(cfg: JwtConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.set_audience(&[cfg.audience.as_str()]);
        validation.set_issuer(&[cfg.issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(&cfg.signing_key),
            decoding_key: DecodingKey::from_secret(&cfg.signing_key),
            validation,
            cfg,
        }
    }

    #[inline]
    fn gen_jti() -> String {
        Uuid::new_v4().to_string()
    }
}

#[async_trait::async_trait]
impl TokenIssuer for JwtHs256Issuer {
    async fn issue_access_token(
        &self,
        user: &UserId,
        now: DateTime<Utc>,
    ) -> Result<(AccessToken, DateTime<Utc>), AuthError> {
        let exp_dt = now + self.cfg.access_ttl;
        let claims = AccessClaims {
            sub: user.0.clone(),
            exp: exp_dt.timestamp(),
            iat: now.timestamp(),
            iss: self.cfg.issuer.clone(),
            aud: self.cfg.audience.clone(),
            jti: Self::gen_jti(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Internal(format!("sign access token: {e}")))?;
        Ok((AccessToken(token), exp_dt))
    }

    async fn issue_refresh_token(
        &self,
        now: DateTime<Utc>,
    ) -> Result<(RefreshToken, DateTime<Utc>), AuthError> {
        let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|e| AuthError::Internal(format!("entropy source: {e}")))?;
        Ok((RefreshToken(hex::encode(bytes)), now + self.cfg.refresh_ttl))
    }

    async fn verify_access_token(
        &self,
        token: &AccessToken,
    ) -> Result<TokenVerifyResult, AuthError> {
        let data = decode::<AccessClaims>(&token.0, &self.decoding_key, &self.validation)
            .map_err(|e| {
                debug!("access token rejected: {}", e);
                AuthError::TokenInvalid
            })?;

        let claims = data.claims;
        if claims.sub.is_empty() {
            return Err(AuthError::TokenInvalid);
        }
        Ok(TokenVerifyResult {
            user_id: UserId(claims.sub),
            jti: claims.jti,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(audience: &str, key: &[u8]) -> JwtConfig {
        JwtConfig {
            issuer: "tripline.auth".to_string(),
            audience: audience.to_string(),
            access_ttl: Duration::minutes(15),
            refresh_ttl: Duration::days(14),
            signing_key: key.to_vec(),
        }
    }

    fn issuer() -> JwtHs256Issuer {
        JwtHs256Issuer::new(config("tripline-api", b"test-signing-key"))
    }

    #[tokio::test]
    async fn access_token_round_trips_subject() {
        let issuer = issuer();
        let user = UserId("user-42".to_string());
        let now = Utc::now();

        let (token, exp) = issuer.issue_access_token(&user, now).await.unwrap();
        assert_eq!(exp, now + Duration::minutes(15));

        let verified = issuer.verify_access_token(&token).await.unwrap();
        assert_eq!(verified.user_id, user);
        assert!(!verified.jti.is_empty());
    }

    #[tokio::test]
    async fn tampered_token_is_invalid() {
        let issuer = issuer();
        let (token, _) = issuer
            .issue_access_token(&UserId("u".into()), Utc::now())
            .await
            .unwrap();

        let (signed, signature) = token.0.rsplit_once('.').unwrap();
        let mut signature: Vec<char> = signature.chars().collect();
        signature[0] = if signature[0] == 'A' { 'Q' } else { 'A' };
        let forged = format!("{}.{}", signed, signature.into_iter().collect::<String>());

        let err = issuer
            .verify_access_token(&AccessToken(forged))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::TokenInvalid));
    }

    #[tokio::test]
    async fn foreign_audience_or_key_is_invalid() {
        let (token, _) = issuer()
            .issue_access_token(&UserId("u".into()), Utc::now())
            .await
            .unwrap();

        let other_audience = JwtHs256Issuer::new(config("admin-console", b"test-signing-key"));
        assert!(matches!(
            other_audience.verify_access_token(&token).await,
            Err(AuthError::TokenInvalid)
        ));

        let other_key = JwtHs256Issuer::new(config("tripline-api", b"another-key"));
        assert!(matches!(
            other_key.verify_access_token(&token).await,
            Err(AuthError::TokenInvalid)
        ));
    }

    #[tokio::test]
    async fn expired_token_is_invalid() {
        let issuer = issuer();
        let issued_at = Utc::now() - Duration::hours(2);
        let (token, _) = issuer
            .issue_access_token(&UserId("u".into()), issued_at)
            .await
            .unwrap();

        assert!(matches!(
            issuer.verify_access_token(&token).await,
            Err(AuthError::TokenInvalid)
        ));
    }

    #[tokio::test]
    async fn garbage_is_invalid() {
        assert!(matches!(
            issuer()
                .verify_access_token(&AccessToken("not.a.jwt".into()))
                .await,
            Err(AuthError::TokenInvalid)
        ));
    }

    #[tokio::test]
    async fn refresh_tokens_are_opaque_and_unique() {
        let issuer = issuer();
        let now = Utc::now();
        let (a, exp) = issuer.issue_refresh_token(now).await.unwrap();
        let (b, _) = issuer.issue_refresh_token(now).await.unwrap();

        assert_eq!(exp, now + Duration::days(14));
        assert_eq!(a.0.len(), REFRESH_TOKEN_BYTES * 2);
        assert!(a.0.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[test]
    fn debug_output_hides_signing_key() {
        let rendered = format!("{:?}", config("aud", b"super-secret"));
        assert!(!rendered.contains("super-secret"));
        assert!(!rendered.contains("signing_key"));
    }
}
