// service/reconciliation.rs
//
// Sweeps re-verify external state and push revocations through the same
// ledger paths the user-facing operations use. One bad row never aborts a
// sweep; it lands in the error counter and the sweep moves on.
use std::sync::Arc;

use serde::Serialize;
use tokio::time::{sleep, Duration};

use crate::{
    config::{DiscordSettings, PointsConfig, ReconcileConfig},
    db::store::LedgerStore,
    models::{
        pointsmodel::TransactionType,
        taskmodel::{TaskMetadata, TaskType},
    },
    service::{
        error::ServiceError,
        points_engine::PointsEngine,
        task_service::TaskService,
        verify::{MembershipStatus, MembershipVerifier, TweetStatus, TweetVerifier},
    },
};

#[derive(Debug, Default, Clone, Copy, Serialize)]
pub struct SweepReport {
    pub checked: u32,
    pub revoked: u32,
    pub errors: u32,
}

#[derive(Clone)]
pub struct ReconciliationService {
    store: Arc<dyn LedgerStore>,
    points: Arc<PointsEngine>,
    tasks: Arc<TaskService>,
    membership: Arc<dyn MembershipVerifier>,
    tweets: Arc<dyn TweetVerifier>,
    points_config: PointsConfig,
    config: ReconcileConfig,
    discord: DiscordSettings,
}

impl ReconciliationService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Arc<dyn LedgerStore>,
        points: Arc<PointsEngine>,
        tasks: Arc<TaskService>,
        membership: Arc<dyn MembershipVerifier>,
        tweets: Arc<dyn TweetVerifier>,
        points_config: PointsConfig,
        config: ReconcileConfig,
        discord: DiscordSettings,
    ) -> Self {
        Self {
            store,
            points,
            tasks,
            membership,
            tweets,
            points_config,
            config,
            discord,
        }
    }

    /// Returns true when the wallet's verification was revoked. Anything
    /// short of a confirmed-absent answer leaves the wallet untouched.
    pub async fn reconcile_wallet_membership(&self, wallet: &str) -> Result<bool, ServiceError> {
        let profile = match self.store.get_profile(wallet).await? {
            Some(profile) => profile,
            None => return Ok(false),
        };

        let discord_id = match (&profile.discord_verified, &profile.discord_id) {
            (true, Some(id)) => id.clone(),
            _ => return Ok(false),
        };

        match self
            .membership
            .check_member(&self.discord.guild_id, &discord_id)
            .await
        {
            MembershipStatus::Present | MembershipStatus::Indeterminate => Ok(false),
            MembershipStatus::Absent => {
                self.store.set_discord_verified(wallet, false).await?;

                let refund = self
                    .points
                    .original_bonus_amount(
                        wallet,
                        TransactionType::DiscordVerify,
                        self.points_config.discord_verify,
                    )
                    .await?;

                self.points
                    .add_points(
                        wallet,
                        -refund,
                        TransactionType::DiscordVerifyRevoked,
                        "Discord server membership no longer verified",
                    )
                    .await?;

                tracing::info!("membership revoked for {}", wallet);
                Ok(true)
            }
        }
    }

    pub async fn reconcile_all_memberships(&self) -> Result<SweepReport, ServiceError> {
        let wallets = self.store.list_discord_verified().await?;
        let mut report = SweepReport::default();

        for (i, profile) in wallets.iter().enumerate() {
            if i > 0 && i % self.config.batch_size == 0 {
                sleep(Duration::from_secs(self.config.batch_pause_secs)).await;
            }

            report.checked += 1;
            match self
                .reconcile_wallet_membership(&profile.wallet_address)
                .await
            {
                Ok(true) => report.revoked += 1,
                Ok(false) => {}
                Err(err) => {
                    tracing::warn!(
                        "membership sweep error for {}: {}",
                        profile.wallet_address,
                        err
                    );
                    report.errors += 1;
                }
            }
        }

        tracing::info!(
            "membership sweep done: checked={} revoked={} errors={}",
            report.checked,
            report.revoked,
            report.errors
        );
        Ok(report)
    }

    pub async fn reconcile_active_tweets(
        &self,
        wallet: Option<&str>,
    ) -> Result<SweepReport, ServiceError> {
        let completions = self
            .store
            .list_active_with_metadata(wallet, TaskType::DailyPost)
            .await?;
        let mut report = SweepReport::default();

        for (i, completion) in completions.iter().enumerate() {
            if i > 0 {
                sleep(Duration::from_millis(self.config.tweet_pause_ms)).await;
            }

            let url = match completion.parsed_metadata() {
                TaskMetadata::Tweet(url) => url,
                TaskMetadata::Malformed => {
                    tracing::warn!("malformed metadata on completion {}", completion.id);
                    report.errors += 1;
                    continue;
                }
                TaskMetadata::None => continue,
            };

            report.checked += 1;
            match self.tweets.tweet_exists(&url).await {
                TweetStatus::Exists | TweetStatus::Indeterminate => {}
                TweetStatus::Deleted => {
                    match self.tasks.revoke_task_points(completion.id).await {
                        Ok(_) => report.revoked += 1,
                        // Another run got there first; fine for the sweep.
                        Err(ServiceError::AlreadyInState(_)) => {}
                        Err(err) => {
                            tracing::warn!(
                                "tweet sweep revoke error for {}: {}",
                                completion.id,
                                err
                            );
                            report.errors += 1;
                        }
                    }
                }
            }
        }

        tracing::info!(
            "tweet sweep done: checked={} revoked={} errors={}",
            report.checked,
            report.revoked,
            report.errors
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::MemStore;
    use crate::db::store::{NewCompletion, PointsStore, ProfileStore, TaskStore};
    use crate::models::profilemodel::{ChainType, Platform, PlatformIdentity};
    use crate::models::taskmodel::TaskStatus;
    use crate::service::referral_service::ReferralService;
    use crate::service::verify::stubs::{StaticMembership, StaticTweets};
    use chrono::Utc;

    const WALLET: &str = "0x3333333333333333333333333333333333333333";

    fn recon(
        store: Arc<MemStore>,
        membership: MembershipStatus,
        tweets: TweetStatus,
    ) -> ReconciliationService {
        let points = Arc::new(PointsEngine::new(store.clone()));
        let referrals = Arc::new(ReferralService::new(
            store.clone(),
            points.clone(),
            PointsConfig::default(),
        ));
        let tasks = Arc::new(TaskService::new(
            store.clone(),
            points.clone(),
            referrals,
            PointsConfig::default(),
        ));
        let mut config = ReconcileConfig::default();
        config.batch_pause_secs = 0;
        config.tweet_pause_ms = 0;
        ReconciliationService::new(
            store,
            points,
            tasks,
            Arc::new(StaticMembership::new(membership)),
            Arc::new(StaticTweets::new(tweets)),
            PointsConfig::default(),
            config,
            DiscordSettings {
                bot_token: "token".into(),
                guild_id: "guild".into(),
                invite_url: "https://discord.gg/example".into(),
            },
        )
    }

    async fn verified_wallet(store: &MemStore, wallet: &str) {
        store
            .get_or_create_profile(wallet, ChainType::Evm)
            .await
            .unwrap();
        store
            .set_platform_connection(
                wallet,
                Platform::Discord,
                Some(PlatformIdentity {
                    username: "user#1".into(),
                    external_id: "d-1".into(),
                }),
            )
            .await
            .unwrap();
        store.set_discord_verified(wallet, true).await.unwrap();
        store
            .adjust_points(wallet, 50, TransactionType::DiscordConnect, "connect")
            .await
            .unwrap();
        store
            .adjust_points(wallet, 50, TransactionType::DiscordVerify, "verify")
            .await
            .unwrap();
    }

    async fn active_tweet_completion(store: &MemStore, wallet: &str, url: &str) -> uuid::Uuid {
        store
            .get_or_create_profile(wallet, ChainType::Evm)
            .await
            .unwrap();
        store
            .adjust_points(wallet, 100, TransactionType::DailyPost, "post")
            .await
            .unwrap();
        store
            .insert_completion(NewCompletion {
                wallet_address: wallet.to_string(),
                task_type: TaskType::DailyPost,
                points_awarded: 100,
                completion_date: Utc::now().date_naive(),
                metadata: Some(serde_json::json!({ "tweet_url": url })),
            })
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn membership_absent_unverifies_and_refunds() {
        let store = Arc::new(MemStore::new());
        verified_wallet(&store, WALLET).await;
        let svc = recon(store.clone(), MembershipStatus::Absent, TweetStatus::Exists);

        assert!(svc.reconcile_wallet_membership(WALLET).await.unwrap());

        let profile = store.get_profile(WALLET).await.unwrap().unwrap();
        assert!(!profile.discord_verified);
        assert_eq!(profile.total_points, 50); // verify bonus reversed, connect kept
        assert_eq!(store.history_sum(WALLET).await.unwrap(), 50);

        // A second pass is a no-op: no longer verified.
        assert!(!svc.reconcile_wallet_membership(WALLET).await.unwrap());
        assert_eq!(store.history_sum(WALLET).await.unwrap(), 50);
    }

    #[tokio::test]
    async fn membership_indeterminate_fails_open() {
        let store = Arc::new(MemStore::new());
        verified_wallet(&store, WALLET).await;
        let svc = recon(
            store.clone(),
            MembershipStatus::Indeterminate,
            TweetStatus::Exists,
        );

        assert!(!svc.reconcile_wallet_membership(WALLET).await.unwrap());
        let profile = store.get_profile(WALLET).await.unwrap().unwrap();
        assert!(profile.discord_verified);
        assert_eq!(profile.total_points, 100);
    }

    #[tokio::test]
    async fn membership_check_skips_unverified_wallets() {
        let store = Arc::new(MemStore::new());
        store
            .get_or_create_profile(WALLET, ChainType::Evm)
            .await
            .unwrap();
        let svc = recon(store, MembershipStatus::Absent, TweetStatus::Exists);

        assert!(!svc.reconcile_wallet_membership(WALLET).await.unwrap());
    }

    #[tokio::test]
    async fn membership_sweep_aggregates_counts() {
        let store = Arc::new(MemStore::new());
        verified_wallet(&store, "0xaaaa111111111111111111111111111111111111").await;
        verified_wallet(&store, "0xbbbb222222222222222222222222222222222222").await;
        let svc = recon(store.clone(), MembershipStatus::Absent, TweetStatus::Exists);

        let report = svc.reconcile_all_memberships().await.unwrap();
        assert_eq!(report.checked, 2);
        assert_eq!(report.revoked, 2);
        assert_eq!(report.errors, 0);
    }

    #[tokio::test]
    async fn deleted_tweet_is_revoked_once() {
        let store = Arc::new(MemStore::new());
        let id = active_tweet_completion(&store, WALLET, "https://x.com/p/status/1").await;
        let svc = recon(store.clone(), MembershipStatus::Present, TweetStatus::Deleted);

        let report = svc.reconcile_active_tweets(None).await.unwrap();
        assert_eq!(report.checked, 1);
        assert_eq!(report.revoked, 1);
        assert_eq!(report.errors, 0);

        let completion = store.get_completion(id).await.unwrap().unwrap();
        assert_eq!(completion.status, TaskStatus::Revoked);
        assert_eq!(store.history_sum(WALLET).await.unwrap(), 0);

        // Second sweep finds nothing active and deducts nothing further.
        let report = svc.reconcile_active_tweets(None).await.unwrap();
        assert_eq!(report.checked, 0);
        assert_eq!(report.revoked, 0);
        assert_eq!(store.history_sum(WALLET).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn indeterminate_tweet_never_revokes() {
        let store = Arc::new(MemStore::new());
        let id = active_tweet_completion(&store, WALLET, "https://x.com/p/status/1").await;
        let svc = recon(
            store.clone(),
            MembershipStatus::Present,
            TweetStatus::Indeterminate,
        );

        let report = svc.reconcile_active_tweets(None).await.unwrap();
        assert_eq!(report.checked, 1);
        assert_eq!(report.revoked, 0);

        let completion = store.get_completion(id).await.unwrap().unwrap();
        assert_eq!(completion.status, TaskStatus::Active);
        assert_eq!(store.history_sum(WALLET).await.unwrap(), 100);
    }

    #[tokio::test]
    async fn malformed_metadata_counts_as_error_and_continues() {
        let store = Arc::new(MemStore::new());
        store
            .get_or_create_profile(WALLET, ChainType::Evm)
            .await
            .unwrap();
        store
            .insert_completion(NewCompletion {
                wallet_address: WALLET.to_string(),
                task_type: TaskType::DailyPost,
                points_awarded: 100,
                completion_date: Utc::now().date_naive(),
                metadata: Some(serde_json::json!("not an object")),
            })
            .await
            .unwrap();
        active_tweet_completion(&store, WALLET, "https://x.com/p/status/2").await;
        let svc = recon(store, MembershipStatus::Present, TweetStatus::Exists);

        let report = svc.reconcile_active_tweets(None).await.unwrap();
        assert_eq!(report.errors, 1);
        assert_eq!(report.checked, 1);
    }

    #[tokio::test]
    async fn tweet_sweep_can_be_scoped_to_one_wallet() {
        let store = Arc::new(MemStore::new());
        active_tweet_completion(&store, WALLET, "https://x.com/p/status/1").await;
        active_tweet_completion(
            &store,
            "0xother444444444444444444444444444444444444",
            "https://x.com/p/status/2",
        )
        .await;
        let svc = recon(store, MembershipStatus::Present, TweetStatus::Deleted);

        let report = svc.reconcile_active_tweets(Some(WALLET)).await.unwrap();
        assert_eq!(report.checked, 1);
        assert_eq!(report.revoked, 1);
    }
}
