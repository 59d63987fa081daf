// service/referral_service.rs
use std::sync::Arc;

use crate::{
    config::PointsConfig,
    db::store::{LedgerStore, NewReferral, StoreError},
    models::{
        pointsmodel::TransactionType,
        profilemodel::WalletProfile,
        referralmodel::{tier_of, Referral, ReferralTier},
    },
    service::{error::ServiceError, points_engine::PointsEngine},
    utils::wallet::infer_chain,
};

#[derive(Clone)]
pub struct ReferralService {
    store: Arc<dyn LedgerStore>,
    points: Arc<PointsEngine>,
    config: PointsConfig,
}

pub struct ReferralStats {
    pub referral_code: Option<String>,
    pub referral_count: i32,
    pub referral_points_earned: i64,
    pub tier: ReferralTier,
    pub referrals: Vec<Referral>,
}

impl ReferralService {
    pub fn new(store: Arc<dyn LedgerStore>, points: Arc<PointsEngine>, config: PointsConfig) -> Self {
        Self {
            store,
            points,
            config,
        }
    }

    /// Eligibility is the referrer's state right now, not at code issuance.
    /// A referrer who has since disconnected still owns the code string,
    /// but applying it fails.
    pub async fn apply_referral_code(
        &self,
        wallet: &str,
        code: &str,
    ) -> Result<Referral, ServiceError> {
        let profile = self
            .store
            .get_or_create_profile(wallet, infer_chain(wallet))
            .await?;

        if profile.referred_by.is_some() {
            return Err(ServiceError::AlreadyInState(
                "A referral code has already been applied to this wallet".to_string(),
            ));
        }

        let code = code.trim();
        let referrer = self
            .store
            .get_profile_by_referral_code(code)
            .await?
            .ok_or(ServiceError::InvalidCode)?;

        if referrer.wallet_address == profile.wallet_address {
            return Err(ServiceError::SelfReferral);
        }

        if !referrer.referral_eligible() {
            return Err(ServiceError::Ineligible(
                "The owner of this referral code is not currently eligible".to_string(),
            ));
        }

        let referral = self
            .store
            .insert_referral(NewReferral {
                referrer_wallet: referrer.wallet_address.clone(),
                referred_wallet: profile.wallet_address.clone(),
                referral_code: referrer.referral_code.clone().unwrap_or_default(),
                referrer_points: self.config.referral_referrer,
                referred_points: self.config.referral_referred,
            })
            .await
            .map_err(|err| match err {
                StoreError::Conflict => ServiceError::AlreadyInState(
                    "A referral code has already been applied to this wallet".to_string(),
                ),
                other => ServiceError::Store(other),
            })?;

        self.store
            .set_referred_by(&profile.wallet_address, code)
            .await?;

        tracing::info!(
            "referral applied: {} referred by {} via {}",
            profile.wallet_address,
            referrer.wallet_address,
            code
        );

        Ok(referral)
    }

    /// Pays both sides once, then recomputes the referrer's aggregates
    /// from the full edge set rather than incrementing, so a missed update
    /// heals on the next claim.
    pub async fn claim_referral_bonus(
        &self,
        referred_wallet: &str,
    ) -> Result<Referral, ServiceError> {
        let referral = self
            .store
            .get_referral_by_referred(referred_wallet)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound("No referral found for this wallet".to_string())
            })?;

        if referral.is_claimed() {
            return Err(ServiceError::AlreadyInState(
                "Referral bonus already claimed".to_string(),
            ));
        }

        let claimed = self
            .store
            .mark_referral_claimed(referral.id)
            .await?
            .ok_or_else(|| {
                ServiceError::AlreadyInState("Referral bonus already claimed".to_string())
            })?;

        self.points
            .add_points(
                &claimed.referrer_wallet,
                claimed.referrer_points,
                TransactionType::ReferralBonus,
                &format!("Referral bonus for referring {}", claimed.referred_wallet),
            )
            .await?;

        self.points
            .add_points(
                &claimed.referred_wallet,
                claimed.referred_points,
                TransactionType::ReferralBonus,
                &format!("Referral bonus for joining via {}", claimed.referral_code),
            )
            .await?;

        self.recompute_referrer_aggregates(&claimed.referrer_wallet)
            .await?;

        Ok(claimed)
    }

    async fn recompute_referrer_aggregates(&self, referrer: &str) -> Result<(), ServiceError> {
        let edges = self.store.list_referrals_by_referrer(referrer).await?;
        let claimed: Vec<_> = edges.iter().filter(|r| r.is_claimed()).collect();
        let count = claimed.len() as i32;
        let earned: i64 = claimed.iter().map(|r| r.referrer_points).sum();

        self.store
            .set_referral_aggregates(referrer, count, earned)
            .await?;
        Ok(())
    }

    /// Fires the pending bonus on whichever qualifying action the referred
    /// wallet completes first. Returns whether a claim happened; business
    /// rejections are not errors here.
    pub async fn maybe_auto_claim(&self, wallet: &str) -> Result<bool, ServiceError> {
        let profile = match self.store.get_profile(wallet).await? {
            Some(profile) => profile,
            None => return Ok(false),
        };

        if profile.referred_by.is_none() {
            return Ok(false);
        }

        match self.store.get_referral_by_referred(wallet).await? {
            Some(referral) if !referral.is_claimed() => {}
            _ => return Ok(false),
        }

        match self.claim_referral_bonus(wallet).await {
            Ok(_) => Ok(true),
            Err(ServiceError::AlreadyInState(_)) | Err(ServiceError::NotFound(_)) => Ok(false),
            Err(err) => Err(err),
        }
    }

    pub async fn referral_stats(&self, wallet: &str) -> Result<ReferralStats, ServiceError> {
        let profile: WalletProfile = self
            .store
            .get_profile(wallet)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Wallet profile not found".to_string()))?;

        let referrals = self.store.list_referrals_by_referrer(wallet).await?;

        Ok(ReferralStats {
            referral_code: profile.referral_code,
            referral_count: profile.referral_count,
            referral_points_earned: profile.referral_points_earned,
            tier: tier_of(profile.referral_count),
            referrals,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::MemStore;
    use crate::db::store::{ProfileStore, ReferralStore};
    use crate::models::profilemodel::{ChainType, Platform, PlatformIdentity};

    const REFERRER: &str = "0xreferrer00000000000000000000000000000001";
    const REFERRED: &str = "0xreferred00000000000000000000000000000002";

    async fn eligible_referrer(store: &MemStore, wallet: &str, code: &str) {
        store
            .get_or_create_profile(wallet, ChainType::Evm)
            .await
            .unwrap();
        store
            .set_platform_connection(
                wallet,
                Platform::X,
                Some(PlatformIdentity {
                    username: "ref".into(),
                    external_id: "x1".into(),
                }),
            )
            .await
            .unwrap();
        store
            .set_platform_connection(
                wallet,
                Platform::Discord,
                Some(PlatformIdentity {
                    username: "ref#1".into(),
                    external_id: "d1".into(),
                }),
            )
            .await
            .unwrap();
        store.set_discord_verified(wallet, true).await.unwrap();
        store.assign_referral_code(wallet, code).await.unwrap();
    }

    fn service(store: Arc<MemStore>) -> ReferralService {
        let points = Arc::new(PointsEngine::new(store.clone()));
        ReferralService::new(store, points, PointsConfig::default())
    }

    #[tokio::test]
    async fn apply_creates_unclaimed_edge() {
        let store = Arc::new(MemStore::new());
        eligible_referrer(&store, REFERRER, "GOODCODE").await;
        let svc = service(store.clone());

        let referral = svc.apply_referral_code(REFERRED, "GOODCODE").await.unwrap();
        assert!(!referral.is_claimed());
        assert_eq!(referral.referrer_wallet, REFERRER);

        let profile = store.get_profile(REFERRED).await.unwrap().unwrap();
        assert_eq!(profile.referred_by.as_deref(), Some("GOODCODE"));
    }

    #[tokio::test]
    async fn apply_is_case_insensitive() {
        let store = Arc::new(MemStore::new());
        eligible_referrer(&store, REFERRER, "GOODCODE").await;
        let svc = service(store);

        svc.apply_referral_code(REFERRED, "goodcode").await.unwrap();
    }

    #[tokio::test]
    async fn self_referral_always_fails() {
        let store = Arc::new(MemStore::new());
        eligible_referrer(&store, REFERRER, "GOODCODE").await;
        let svc = service(store);

        let err = svc.apply_referral_code(REFERRER, "GOODCODE").await.unwrap_err();
        assert!(matches!(err, ServiceError::SelfReferral));
    }

    #[tokio::test]
    async fn unknown_code_is_rejected() {
        let store = Arc::new(MemStore::new());
        let svc = service(store);

        let err = svc.apply_referral_code(REFERRED, "NOCODE99").await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidCode));
    }

    #[tokio::test]
    async fn second_referral_is_rejected() {
        let store = Arc::new(MemStore::new());
        eligible_referrer(&store, REFERRER, "GOODCODE").await;
        eligible_referrer(&store, "0xother000000000000000000000000000000003", "OTHER123").await;
        let svc = service(store.clone());

        svc.apply_referral_code(REFERRED, "GOODCODE").await.unwrap();
        let err = svc
            .apply_referral_code(REFERRED, "OTHER123")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::AlreadyInState(_)));

        // Exactly one edge per referred wallet.
        let edge = store.get_referral_by_referred(REFERRED).await.unwrap().unwrap();
        assert_eq!(edge.referral_code, "GOODCODE");
    }

    #[tokio::test]
    async fn ineligible_referrer_cannot_be_applied() {
        let store = Arc::new(MemStore::new());
        eligible_referrer(&store, REFERRER, "GOODCODE").await;
        // Referrer disconnects X; the code string survives but applying fails.
        store
            .set_platform_connection(REFERRER, Platform::X, None)
            .await
            .unwrap();
        let svc = service(store.clone());

        let err = svc.apply_referral_code(REFERRED, "GOODCODE").await.unwrap_err();
        assert!(matches!(err, ServiceError::Ineligible(_)));

        let profile = store.get_profile(REFERRER).await.unwrap().unwrap();
        assert_eq!(profile.referral_code.as_deref(), Some("GOODCODE"));
    }

    #[tokio::test]
    async fn claim_pays_both_sides_once() {
        let store = Arc::new(MemStore::new());
        eligible_referrer(&store, REFERRER, "GOODCODE").await;
        let svc = service(store.clone());

        svc.apply_referral_code(REFERRED, "GOODCODE").await.unwrap();
        let referrer_before = store
            .get_profile(REFERRER)
            .await
            .unwrap()
            .unwrap()
            .total_points;

        svc.claim_referral_bonus(REFERRED).await.unwrap();

        let referrer = store.get_profile(REFERRER).await.unwrap().unwrap();
        let referred = store.get_profile(REFERRED).await.unwrap().unwrap();
        assert_eq!(referrer.total_points, referrer_before + 50);
        assert_eq!(referred.total_points, 50);
        assert_eq!(referrer.referral_count, 1);
        assert_eq!(referrer.referral_points_earned, 50);

        let err = svc.claim_referral_bonus(REFERRED).await.unwrap_err();
        assert!(matches!(err, ServiceError::AlreadyInState(_)));

        // No double pay.
        let referrer = store.get_profile(REFERRER).await.unwrap().unwrap();
        assert_eq!(referrer.total_points, referrer_before + 50);
    }

    #[tokio::test]
    async fn auto_claim_is_quiet_when_nothing_pending() {
        let store = Arc::new(MemStore::new());
        let svc = service(store.clone());

        // Unknown wallet, wallet without referral: both no-ops.
        assert!(!svc.maybe_auto_claim("0xnobody0000000000000000000000000000009").await.unwrap());
        store
            .get_or_create_profile(REFERRED, ChainType::Evm)
            .await
            .unwrap();
        assert!(!svc.maybe_auto_claim(REFERRED).await.unwrap());
    }

    #[tokio::test]
    async fn full_happy_path_totals() {
        use crate::config::DiscordSettings;
        use crate::db::store::PointsStore;
        use crate::service::connection_service::ConnectionService;
        use crate::service::task_service::TaskService;
        use crate::service::verify::stubs::StaticMembership;
        use crate::service::verify::MembershipStatus;

        let store = Arc::new(MemStore::new());
        let config = PointsConfig::default();
        let points = Arc::new(PointsEngine::new(store.clone()));
        let referrals = Arc::new(ReferralService::new(store.clone(), points.clone(), config));
        let connections = ConnectionService::new(
            store.clone(),
            points.clone(),
            referrals.clone(),
            Arc::new(StaticMembership::new(MembershipStatus::Present)),
            config,
            DiscordSettings {
                bot_token: "token".into(),
                guild_id: "guild".into(),
                invite_url: "https://discord.gg/example".into(),
            },
        );
        let tasks = TaskService::new(store.clone(), points, referrals.clone(), config);

        // Wallet A: connect X (+100), connect Discord (+50), verify (+50).
        connections
            .connect_platform(
                REFERRER,
                Platform::X,
                PlatformIdentity {
                    username: "a".into(),
                    external_id: "x-a".into(),
                },
            )
            .await
            .unwrap();
        connections
            .connect_platform(
                REFERRER,
                Platform::Discord,
                PlatformIdentity {
                    username: "a#1".into(),
                    external_id: "d-a".into(),
                },
            )
            .await
            .unwrap();
        connections.verify_discord_membership(REFERRER).await.unwrap();

        let a = store.get_profile(REFERRER).await.unwrap().unwrap();
        assert_eq!(a.total_points, 200);
        let code = a.referral_code.clone().expect("code issued");

        // Wallet B applies A's code, connects X, posts; auto-claim fires
        // on B's first qualifying action.
        referrals.apply_referral_code(REFERRED, &code).await.unwrap();
        connections
            .connect_platform(
                REFERRED,
                Platform::X,
                PlatformIdentity {
                    username: "b".into(),
                    external_id: "x-b".into(),
                },
            )
            .await
            .unwrap();
        tasks.complete_daily_post(REFERRED, None).await.unwrap();

        let a = store.get_profile(REFERRER).await.unwrap().unwrap();
        let b = store.get_profile(REFERRED).await.unwrap().unwrap();
        // Auto-claim fired at B's X connect: B = 100 + 50 + 100 post.
        assert_eq!(a.total_points, 250);
        assert_eq!(b.total_points, 250);
        assert_eq!(a.referral_count, 1);

        let edge = store.get_referral_by_referred(REFERRED).await.unwrap().unwrap();
        assert!(edge.referrer_claimed && edge.referred_claimed);

        // Ledger identity after the whole scenario.
        assert_eq!(store.history_sum(REFERRER).await.unwrap(), 250);
        assert_eq!(store.history_sum(REFERRED).await.unwrap(), 250);
        assert!(store.ledger_drift().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn auto_claim_fires_once() {
        let store = Arc::new(MemStore::new());
        eligible_referrer(&store, REFERRER, "GOODCODE").await;
        let svc = service(store.clone());

        svc.apply_referral_code(REFERRED, "GOODCODE").await.unwrap();
        assert!(svc.maybe_auto_claim(REFERRED).await.unwrap());
        assert!(!svc.maybe_auto_claim(REFERRED).await.unwrap());
    }
}
