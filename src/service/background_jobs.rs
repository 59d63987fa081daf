// service/background_jobs.rs
use std::sync::Arc;

use chrono::Utc;
use tokio::time::{interval, Duration};

use crate::AppState;

/// Periodic Discord membership re-verification over all verified wallets.
pub async fn start_membership_sweep_job(app_state: Arc<AppState>) {
    let hours = app_state.env.reconcile.membership_sweep_hours;
    let mut interval = interval(Duration::from_secs(hours * 3600));

    loop {
        interval.tick().await;

        tracing::info!("Running membership sweep at {}", Utc::now());
        match app_state.reconciliation.reconcile_all_memberships().await {
            Ok(report) => tracing::info!(
                "Membership sweep completed: checked={} revoked={} errors={}",
                report.checked,
                report.revoked,
                report.errors
            ),
            Err(e) => tracing::error!("Membership sweep failed: {}", e),
        }
    }
}

/// Periodic tweet-existence check over active daily-post completions.
pub async fn start_tweet_sweep_job(app_state: Arc<AppState>) {
    let hours = app_state.env.reconcile.tweet_sweep_hours;
    let mut interval = interval(Duration::from_secs(hours * 3600));

    loop {
        interval.tick().await;

        tracing::info!("Running tweet sweep at {}", Utc::now());
        match app_state.reconciliation.reconcile_active_tweets(None).await {
            Ok(report) => tracing::info!(
                "Tweet sweep completed: checked={} revoked={} errors={}",
                report.checked,
                report.revoked,
                report.errors
            ),
            Err(e) => tracing::error!("Tweet sweep failed: {}", e),
        }
    }
}
