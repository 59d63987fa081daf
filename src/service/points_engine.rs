// service/points_engine.rs
use std::sync::Arc;

use crate::{
    db::store::LedgerStore,
    models::pointsmodel::TransactionType,
    service::error::ServiceError,
    utils::wallet::infer_chain,
};

/// The one mutation primitive all balance changes funnel through. Atomicity
/// of "increment total + append history" is the store's job; the engine
/// only guarantees the profile exists first.
#[derive(Clone)]
pub struct PointsEngine {
    store: Arc<dyn LedgerStore>,
}

impl PointsEngine {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    pub async fn add_points(
        &self,
        wallet: &str,
        delta: i64,
        transaction_type: TransactionType,
        description: &str,
    ) -> Result<i64, ServiceError> {
        self.store
            .get_or_create_profile(wallet, infer_chain(wallet))
            .await?;

        let balance = self
            .store
            .adjust_points(wallet, delta, transaction_type, description)
            .await?;

        tracing::debug!(
            "points: {} {:+} ({}) -> balance {}",
            wallet,
            delta,
            transaction_type.to_str(),
            balance
        );

        Ok(balance)
    }

    /// What was actually granted for this type, most recently, not what
    /// the current config says. Falls back to `default` when the wallet
    /// has no positive entry of the type.
    pub async fn original_bonus_amount(
        &self,
        wallet: &str,
        transaction_type: TransactionType,
        default: i64,
    ) -> Result<i64, ServiceError> {
        let amount = self
            .store
            .latest_positive_amount(wallet, transaction_type)
            .await?;
        Ok(amount.unwrap_or(default))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::MemStore;
    use crate::db::store::{PointsStore, ProfileStore};

    fn engine() -> (Arc<MemStore>, PointsEngine) {
        let store = Arc::new(MemStore::new());
        let engine = PointsEngine::new(store.clone());
        (store, engine)
    }

    #[tokio::test]
    async fn add_points_creates_profile_and_ledger_entry() {
        let (store, engine) = engine();

        let balance = engine
            .add_points("0xaaa", 100, TransactionType::XConnect, "Connected X")
            .await
            .unwrap();
        assert_eq!(balance, 100);

        let profile = store.get_profile("0xaaa").await.unwrap().unwrap();
        assert_eq!(profile.total_points, 100);
        assert_eq!(store.history_sum("0xaaa").await.unwrap(), 100);
    }

    #[tokio::test]
    async fn balances_may_go_negative() {
        let (store, engine) = engine();

        engine
            .add_points("0xaaa", 50, TransactionType::DiscordConnect, "grant")
            .await
            .unwrap();
        let balance = engine
            .add_points("0xaaa", -80, TransactionType::AdminAdjustment, "correction")
            .await
            .unwrap();

        assert_eq!(balance, -30);
        assert_eq!(store.history_sum("0xaaa").await.unwrap(), -30);
    }

    #[tokio::test]
    async fn original_bonus_prefers_history_over_default() {
        let (_store, engine) = engine();

        engine
            .add_points("0xaaa", 75, TransactionType::XConnect, "old grant")
            .await
            .unwrap();

        let amount = engine
            .original_bonus_amount("0xaaa", TransactionType::XConnect, 100)
            .await
            .unwrap();
        assert_eq!(amount, 75);
    }

    #[tokio::test]
    async fn original_bonus_falls_back_to_default() {
        let (_store, engine) = engine();
        engine
            .add_points("0xaaa", 10, TransactionType::DailyPost, "unrelated")
            .await
            .unwrap();

        let amount = engine
            .original_bonus_amount("0xaaa", TransactionType::XConnect, 100)
            .await
            .unwrap();
        assert_eq!(amount, 100);
    }

    #[tokio::test]
    async fn original_bonus_ignores_negative_entries() {
        let (_store, engine) = engine();

        engine
            .add_points("0xaaa", 100, TransactionType::XConnect, "grant")
            .await
            .unwrap();
        engine
            .add_points("0xaaa", -100, TransactionType::XConnect, "refund")
            .await
            .unwrap();

        let amount = engine
            .original_bonus_amount("0xaaa", TransactionType::XConnect, 40)
            .await
            .unwrap();
        assert_eq!(amount, 100);
    }
}
