// service/connection_service.rs
use std::sync::Arc;

use crate::{
    config::{DiscordSettings, PointsConfig},
    db::store::{LedgerStore, StoreError},
    models::{
        pointsmodel::TransactionType,
        profilemodel::{Platform, PlatformIdentity, WalletProfile},
    },
    service::{
        error::ServiceError,
        points_engine::PointsEngine,
        referral_service::ReferralService,
        verify::{MembershipStatus, MembershipVerifier},
    },
    utils::{referral_code::generate_referral_code, wallet::infer_chain},
};

const CODE_ISSUE_ATTEMPTS: usize = 5;

#[derive(Clone)]
pub struct ConnectionService {
    store: Arc<dyn LedgerStore>,
    points: Arc<PointsEngine>,
    referrals: Arc<ReferralService>,
    membership: Arc<dyn MembershipVerifier>,
    config: PointsConfig,
    discord: DiscordSettings,
}

impl ConnectionService {
    pub fn new(
        store: Arc<dyn LedgerStore>,
        points: Arc<PointsEngine>,
        referrals: Arc<ReferralService>,
        membership: Arc<dyn MembershipVerifier>,
        config: PointsConfig,
        discord: DiscordSettings,
    ) -> Self {
        Self {
            store,
            points,
            referrals,
            membership,
            config,
            discord,
        }
    }

    pub async fn connect_platform(
        &self,
        wallet: &str,
        platform: Platform,
        identity: PlatformIdentity,
    ) -> Result<(WalletProfile, i64), ServiceError> {
        let profile = self
            .store
            .get_or_create_profile(wallet, infer_chain(wallet))
            .await?;

        if profile.is_connected(platform) {
            return Err(ServiceError::AlreadyInState(format!(
                "{} account already connected",
                platform.to_str()
            )));
        }

        let username = identity.username.clone();
        self.store
            .set_platform_connection(wallet, platform, Some(identity))
            .await?;

        let (amount, tx_type) = match platform {
            Platform::X => (self.config.x_connect, TransactionType::XConnect),
            Platform::Discord => (self.config.discord_connect, TransactionType::DiscordConnect),
        };

        let balance = self
            .points
            .add_points(
                wallet,
                amount,
                tx_type,
                &format!("Connected {} account @{}", platform.to_str(), username),
            )
            .await?;

        self.after_qualifying_action(wallet).await;

        let profile = self
            .store
            .get_profile(wallet)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Wallet profile not found".to_string()))?;

        Ok((profile, balance))
    }

    pub async fn disconnect_platform(
        &self,
        wallet: &str,
        platform: Platform,
    ) -> Result<(WalletProfile, i64), ServiceError> {
        let profile = self
            .store
            .get_profile(wallet)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Wallet profile not found".to_string()))?;

        if !profile.is_connected(platform) {
            return Err(ServiceError::AlreadyInState(format!(
                "{} account is not connected",
                platform.to_str()
            )));
        }

        // Look up the historical grants before touching profile state; the
        // refund is what was actually awarded, not the current config.
        let (connect_refund, disconnect_tx) = match platform {
            Platform::X => (
                self.points
                    .original_bonus_amount(wallet, TransactionType::XConnect, self.config.x_connect)
                    .await?,
                TransactionType::XDisconnect,
            ),
            Platform::Discord => (
                self.points
                    .original_bonus_amount(
                        wallet,
                        TransactionType::DiscordConnect,
                        self.config.discord_connect,
                    )
                    .await?,
                TransactionType::DiscordDisconnect,
            ),
        };

        let verify_refund = if platform == Platform::Discord && profile.discord_verified {
            Some(
                self.points
                    .original_bonus_amount(
                        wallet,
                        TransactionType::DiscordVerify,
                        self.config.discord_verify,
                    )
                    .await?,
            )
        } else {
            None
        };

        self.store
            .set_platform_connection(wallet, platform, None)
            .await?;

        let mut balance = self
            .points
            .add_points(
                wallet,
                -connect_refund,
                disconnect_tx,
                &format!("Disconnected {} account", platform.to_str()),
            )
            .await?;

        // Verification reversal is its own ledger entry even when it rides
        // along with the disconnect.
        if let Some(refund) = verify_refund {
            balance = self
                .points
                .add_points(
                    wallet,
                    -refund,
                    TransactionType::DiscordVerifyRevoked,
                    "Discord server verification reversed on disconnect",
                )
                .await?;
        }

        let profile = self
            .store
            .get_profile(wallet)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Wallet profile not found".to_string()))?;

        Ok((profile, balance))
    }

    pub async fn verify_discord_membership(
        &self,
        wallet: &str,
    ) -> Result<(WalletProfile, i64), ServiceError> {
        let profile = self
            .store
            .get_profile(wallet)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Wallet profile not found".to_string()))?;

        if !profile.discord_connected {
            return Err(ServiceError::Ineligible(
                "Discord account is not connected".to_string(),
            ));
        }
        if profile.discord_verified {
            return Err(ServiceError::AlreadyInState(
                "Discord server membership already verified".to_string(),
            ));
        }
        let discord_id = profile.discord_id.clone().ok_or_else(|| {
            ServiceError::Ineligible("No Discord account id on file".to_string())
        })?;

        match self
            .membership
            .check_member(&self.discord.guild_id, &discord_id)
            .await
        {
            MembershipStatus::Present => {}
            MembershipStatus::Absent => {
                return Err(ServiceError::Ineligible(format!(
                    "Not a member of the Discord server. Join here: {}",
                    self.discord.invite_url
                )));
            }
            MembershipStatus::Indeterminate => {
                return Err(ServiceError::ExternalUnavailable(
                    "Discord membership check is unavailable, try again later".to_string(),
                ));
            }
        }

        self.store.set_discord_verified(wallet, true).await?;

        let balance = self
            .points
            .add_points(
                wallet,
                self.config.discord_verify,
                TransactionType::DiscordVerify,
                "Verified Discord server membership",
            )
            .await?;

        self.after_qualifying_action(wallet).await;

        let profile = self
            .store
            .get_profile(wallet)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Wallet profile not found".to_string()))?;

        Ok((profile, balance))
    }

    pub async fn claim_connect_bonus(
        &self,
        wallet: &str,
    ) -> Result<(WalletProfile, i64), ServiceError> {
        let profile = self
            .store
            .get_or_create_profile(wallet, infer_chain(wallet))
            .await?;

        if profile.connect_bonus_claimed {
            return Err(ServiceError::AlreadyInState(
                "One-time connect bonus already claimed".to_string(),
            ));
        }

        self.store.set_connect_bonus_claimed(wallet).await?;

        let balance = self
            .points
            .add_points(
                wallet,
                self.config.connect_bonus,
                TransactionType::ConnectBonus,
                "One-time wallet connect bonus",
            )
            .await?;

        let profile = self
            .store
            .get_profile(wallet)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Wallet profile not found".to_string()))?;

        Ok((profile, balance))
    }

    /// The two cascades every qualifying action triggers, in order: code
    /// issuance, then referral auto-claim. Neither may fail the action
    /// that triggered them.
    async fn after_qualifying_action(&self, wallet: &str) {
        if let Err(err) = self.maybe_issue_referral_code(wallet).await {
            tracing::warn!("referral code issuance failed for {}: {}", wallet, err);
        }
        if let Err(err) = self.referrals.maybe_auto_claim(wallet).await {
            tracing::warn!("referral auto-claim failed for {}: {}", wallet, err);
        }
    }

    async fn maybe_issue_referral_code(&self, wallet: &str) -> Result<(), ServiceError> {
        let profile = match self.store.get_profile(wallet).await? {
            Some(profile) => profile,
            None => return Ok(()),
        };

        if !profile.referral_eligible() || profile.referral_code.is_some() {
            return Ok(());
        }

        for _ in 0..CODE_ISSUE_ATTEMPTS {
            let code = generate_referral_code();
            match self.store.assign_referral_code(wallet, &code).await {
                Ok(_) => {
                    tracing::info!("referral code {} issued to {}", code, wallet);
                    return Ok(());
                }
                // Collision with someone else's code, or a concurrent
                // issuance already won; re-check and retry.
                Err(StoreError::Conflict) => {
                    if self
                        .store
                        .get_profile(wallet)
                        .await?
                        .is_some_and(|p| p.referral_code.is_some())
                    {
                        return Ok(());
                    }
                }
                Err(other) => return Err(ServiceError::Store(other)),
            }
        }

        Err(ServiceError::ExternalUnavailable(
            "Could not issue a unique referral code".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PointsConfig;
    use crate::db::memory::MemStore;
    use crate::db::store::{PointsStore, ProfileStore};
    use crate::service::verify::stubs::StaticMembership;

    const WALLET: &str = "0x1111111111111111111111111111111111111111";

    fn discord_settings() -> DiscordSettings {
        DiscordSettings {
            bot_token: "token".to_string(),
            guild_id: "guild".to_string(),
            invite_url: "https://discord.gg/example".to_string(),
        }
    }

    fn service_with(
        store: Arc<MemStore>,
        membership: MembershipStatus,
        config: PointsConfig,
    ) -> ConnectionService {
        let points = Arc::new(PointsEngine::new(store.clone()));
        let referrals = Arc::new(ReferralService::new(store.clone(), points.clone(), config));
        ConnectionService::new(
            store,
            points,
            referrals,
            Arc::new(StaticMembership::new(membership)),
            config,
            discord_settings(),
        )
    }

    fn service(store: Arc<MemStore>) -> ConnectionService {
        service_with(store, MembershipStatus::Present, PointsConfig::default())
    }

    fn x_identity() -> PlatformIdentity {
        PlatformIdentity {
            username: "poster".to_string(),
            external_id: "x-123".to_string(),
        }
    }

    fn discord_identity() -> PlatformIdentity {
        PlatformIdentity {
            username: "poster#1".to_string(),
            external_id: "d-123".to_string(),
        }
    }

    #[tokio::test]
    async fn connect_awards_and_double_connect_fails() {
        let store = Arc::new(MemStore::new());
        let svc = service(store.clone());

        let (profile, balance) = svc
            .connect_platform(WALLET, Platform::X, x_identity())
            .await
            .unwrap();
        assert!(profile.x_connected);
        assert_eq!(balance, 100);

        let err = svc
            .connect_platform(WALLET, Platform::X, x_identity())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::AlreadyInState(_)));
        assert_eq!(store.history_sum(WALLET).await.unwrap(), 100);
    }

    #[tokio::test]
    async fn connect_then_disconnect_nets_zero() {
        let store = Arc::new(MemStore::new());
        let svc = service(store.clone());

        svc.connect_platform(WALLET, Platform::X, x_identity())
            .await
            .unwrap();
        let (profile, balance) = svc.disconnect_platform(WALLET, Platform::X).await.unwrap();

        assert_eq!(balance, 0);
        assert!(!profile.x_connected);
        assert!(profile.x_username.is_none());
        assert_eq!(store.history_sum(WALLET).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn refund_uses_historical_grant_not_current_config() {
        let store = Arc::new(MemStore::new());
        let svc = service(store.clone());
        svc.connect_platform(WALLET, Platform::X, x_identity())
            .await
            .unwrap();

        // Config changes between connect and disconnect.
        let mut bumped = PointsConfig::default();
        bumped.x_connect = 500;
        let svc2 = service_with(store.clone(), MembershipStatus::Present, bumped);

        let (_, balance) = svc2.disconnect_platform(WALLET, Platform::X).await.unwrap();
        assert_eq!(balance, 0);
        assert_eq!(store.history_sum(WALLET).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn disconnect_without_connection_fails() {
        let store = Arc::new(MemStore::new());
        store
            .get_or_create_profile(WALLET, crate::models::profilemodel::ChainType::Evm)
            .await
            .unwrap();
        let svc = service(store);

        let err = svc.disconnect_platform(WALLET, Platform::X).await.unwrap_err();
        assert!(matches!(err, ServiceError::AlreadyInState(_)));
    }

    #[tokio::test]
    async fn verify_awards_and_gates() {
        let store = Arc::new(MemStore::new());
        let svc = service(store.clone());

        svc.connect_platform(WALLET, Platform::Discord, discord_identity())
            .await
            .unwrap();
        let (profile, balance) = svc.verify_discord_membership(WALLET).await.unwrap();
        assert!(profile.discord_verified);
        assert_eq!(balance, 100); // 50 connect + 50 verify

        let err = svc.verify_discord_membership(WALLET).await.unwrap_err();
        assert!(matches!(err, ServiceError::AlreadyInState(_)));
    }

    #[tokio::test]
    async fn verify_requires_discord_connection() {
        let store = Arc::new(MemStore::new());
        store
            .get_or_create_profile(WALLET, crate::models::profilemodel::ChainType::Evm)
            .await
            .unwrap();
        let svc = service(store);

        let err = svc.verify_discord_membership(WALLET).await.unwrap_err();
        assert!(matches!(err, ServiceError::Ineligible(_)));
    }

    #[tokio::test]
    async fn verify_absent_carries_invite_and_changes_nothing() {
        let store = Arc::new(MemStore::new());
        let svc = service_with(store.clone(), MembershipStatus::Absent, PointsConfig::default());

        svc.connect_platform(WALLET, Platform::Discord, discord_identity())
            .await
            .unwrap();
        let err = svc.verify_discord_membership(WALLET).await.unwrap_err();
        match err {
            ServiceError::Ineligible(msg) => assert!(msg.contains("discord.gg/example")),
            other => panic!("unexpected error: {other:?}"),
        }

        let profile = store.get_profile(WALLET).await.unwrap().unwrap();
        assert!(!profile.discord_verified);
        assert_eq!(profile.total_points, 50);
    }

    #[tokio::test]
    async fn verify_indeterminate_fails_open() {
        let store = Arc::new(MemStore::new());
        let svc = service_with(
            store.clone(),
            MembershipStatus::Indeterminate,
            PointsConfig::default(),
        );

        svc.connect_platform(WALLET, Platform::Discord, discord_identity())
            .await
            .unwrap();
        let err = svc.verify_discord_membership(WALLET).await.unwrap_err();
        assert!(matches!(err, ServiceError::ExternalUnavailable(_)));

        let profile = store.get_profile(WALLET).await.unwrap().unwrap();
        assert!(!profile.discord_verified);
    }

    #[tokio::test]
    async fn disconnect_after_verify_reverses_both_grants() {
        let store = Arc::new(MemStore::new());
        let svc = service(store.clone());

        svc.connect_platform(WALLET, Platform::Discord, discord_identity())
            .await
            .unwrap();
        svc.verify_discord_membership(WALLET).await.unwrap();
        assert_eq!(
            store.get_profile(WALLET).await.unwrap().unwrap().total_points,
            100
        );

        let (profile, balance) = svc
            .disconnect_platform(WALLET, Platform::Discord)
            .await
            .unwrap();

        assert_eq!(balance, 0);
        assert!(!profile.discord_connected);
        assert!(!profile.discord_verified);
        assert!(profile.discord_verified_at.is_none());
        assert!(profile.discord_username.is_none());
        assert_eq!(store.history_sum(WALLET).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn connect_bonus_claims_once() {
        let store = Arc::new(MemStore::new());
        let svc = service(store.clone());

        let (profile, balance) = svc.claim_connect_bonus(WALLET).await.unwrap();
        assert!(profile.connect_bonus_claimed);
        assert_eq!(balance, 300);

        let err = svc.claim_connect_bonus(WALLET).await.unwrap_err();
        assert!(matches!(err, ServiceError::AlreadyInState(_)));
        assert_eq!(store.history_sum(WALLET).await.unwrap(), 300);
    }

    #[tokio::test]
    async fn code_issued_only_after_verify_and_survives_disconnect() {
        let store = Arc::new(MemStore::new());
        let svc = service(store.clone());

        svc.connect_platform(WALLET, Platform::X, x_identity())
            .await
            .unwrap();
        svc.connect_platform(WALLET, Platform::Discord, discord_identity())
            .await
            .unwrap();

        // Connected both, but not verified: no code yet.
        let profile = store.get_profile(WALLET).await.unwrap().unwrap();
        assert!(profile.referral_code.is_none());

        svc.verify_discord_membership(WALLET).await.unwrap();
        let profile = store.get_profile(WALLET).await.unwrap().unwrap();
        let code = profile.referral_code.clone().expect("code issued on verify");
        assert_eq!(code.len(), 8);

        // Disconnecting later neither revokes nor reissues the code.
        svc.disconnect_platform(WALLET, Platform::Discord)
            .await
            .unwrap();
        let profile = store.get_profile(WALLET).await.unwrap().unwrap();
        assert_eq!(profile.referral_code.as_deref(), Some(code.as_str()));
    }

    #[tokio::test]
    async fn ledger_identity_holds_across_connect_cycles() {
        let store = Arc::new(MemStore::new());
        let svc = service(store.clone());

        svc.claim_connect_bonus(WALLET).await.unwrap();
        svc.connect_platform(WALLET, Platform::X, x_identity())
            .await
            .unwrap();
        svc.connect_platform(WALLET, Platform::Discord, discord_identity())
            .await
            .unwrap();
        svc.verify_discord_membership(WALLET).await.unwrap();
        svc.disconnect_platform(WALLET, Platform::X).await.unwrap();
        svc.connect_platform(WALLET, Platform::X, x_identity())
            .await
            .unwrap();

        let profile = store.get_profile(WALLET).await.unwrap().unwrap();
        assert_eq!(
            profile.total_points,
            store.history_sum(WALLET).await.unwrap()
        );
        assert!(store.ledger_drift().await.unwrap().is_empty());
    }
}
