use crate::application_port::Clock;
use crate::domain_port::*;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Prunes refresh tokens and tombstones whose expiry has passed.
pub struct Housekeeper {
    refresh_token_store: Arc<dyn RefreshTokenStore>,
    revoked_token_store: Arc<dyn RevokedTokenStore>,
    clock: Arc<dyn Clock>,
    interval: Duration,
    cancellation_token: CancellationToken,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    pub refresh_tokens: u64,
    pub revoked_tokens: u64,
}

impl Housekeeper {
    pub fn new(
        refresh_token_store: Arc<dyn RefreshTokenStore>,
        revoked_token_store: Arc<dyn RevokedTokenStore>,
        clock: Arc<dyn Clock>,
        interval: Duration,
        cancellation_token: CancellationToken,
    ) -> Self {
        Self {
            refresh_token_store,
            revoked_token_store,
            clock,
            interval,
            cancellation_token,
        }
    }

    pub async fn tick_once(&self) -> anyhow::Result<SweepReport> {
        let now = self.clock.now();
        let report = SweepReport {
            refresh_tokens: self.refresh_token_store.delete_expired(now).await?,
            revoked_tokens: self.revoked_token_store.delete_expired(now).await?,
        };

        if report == SweepReport::default() {
            tracing::debug!("housekeeping: nothing expired");
        } else {
            tracing::info!(
                refresh_tokens = report.refresh_tokens,
                revoked_tokens = report.revoked_tokens,
                "housekeeping: pruned expired rows"
            );
        }
        Ok(report)
    }

    pub async fn run(&self) -> anyhow::Result<()> {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = self.cancellation_token.cancelled() => {
                    tracing::info!("Housekeeper shutting down...");
                    break;
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.tick_once().await {
                        tracing::error!("Housekeeper error: {:#}", e);
                    }
                }
            }
        }
        Ok(())
    }
}
