//! Walks one account through register, login, rotation and a replayed
//! refresh token against the in-memory backend.
//!
//! $ cargo run --bin auth_demo

use std::sync::Arc;
use tripline::application_impl::*;
use tripline::application_port::*;
use tripline::infra_memory::*;
use tripline::logger::*;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _logger = Logger::new_bootstrap();

    let db = MemoryDatabase::new();
    let auth_service = RealAuthService::new(
        AuthStores {
            users: Arc::new(MemoryUserStore::new(db.clone())),
            refresh_tokens: Arc::new(MemoryRefreshTokenStore::new(db.clone())),
            revoked_tokens: Arc::new(MemoryRevokedTokenStore::new(db.clone())),
            tx_manager: Arc::new(db.clone()),
        },
        Arc::new(Argon2PasswordHasher),
        Arc::new(JwtHs256Issuer::new(JwtConfig {
            issuer: "tripline.auth".to_string(),
            audience: "tripline-demo".to_string(),
            access_ttl: chrono::Duration::minutes(15),
            refresh_ttl: chrono::Duration::days(14),
            signing_key: b"demo-only-signing-key".to_vec(),
        })),
        Arc::new(SystemClock),
        Arc::new(UuidIdGenerator),
    );

    let user_id = auth_service
        .register(RegisterInput {
            username: "alice".to_string(),
            email: "a@x.com".to_string(),
            password: "pw".to_string(),
        })
        .await?;
    info!(%user_id, "registered");

    let login = auth_service
        .login(LoginInput {
            email: "a@x.com".to_string(),
            password: "pw".to_string(),
        })
        .await?;
    let r1 = login.tokens.refresh_token.0;

    let rotated = auth_service.refresh_session(&r1).await?;
    let r2 = rotated.refresh_token.0;
    info!("rotated: r1 != r2 is {}", r1 != r2);

    let replay = auth_service.refresh_session(&r1).await;
    info!("replaying r1: {:?}", replay.map(|_| ()));

    let sibling = auth_service.refresh_session(&r2).await;
    info!("using r2 after the replay: {:?}", sibling.map(|_| ()));

    let tables = db.snapshot().await;
    info!(
        active = tables.refresh_token_count(),
        tombstones = tables.revoked_token_count(),
        "final store state"
    );

    Ok(())
}
