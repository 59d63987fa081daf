// db/memory.rs
//
// Fully synchronous in-memory store. Mirrors the Postgres semantics for
// service tests; the single mutex stands in for the database transaction.
use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use super::store::{
    NewCompletion, NewReferral, PointsStore, ProfileStore, ReferralStore, StoreError, TaskStore,
};
use crate::models::{
    pointsmodel::{LedgerDrift, PointsHistory, TransactionType},
    profilemodel::{ChainType, Platform, PlatformIdentity, WalletProfile},
    referralmodel::Referral,
    taskmodel::{TaskCompletion, TaskStatus, TaskType},
};

#[derive(Default)]
struct Inner {
    profiles: HashMap<String, WalletProfile>,
    history: Vec<PointsHistory>,
    completions: Vec<TaskCompletion>,
    referrals: Vec<Referral>,
}

#[derive(Default)]
pub struct MemStore {
    inner: Mutex<Inner>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn blank_profile(wallet: &str, chain: ChainType) -> WalletProfile {
        let now = Utc::now();
        WalletProfile {
            wallet_address: wallet.to_string(),
            chain_type: chain,
            total_points: 0,
            connect_bonus_claimed: false,
            x_connected: false,
            x_username: None,
            x_id: None,
            x_connected_at: None,
            discord_connected: false,
            discord_username: None,
            discord_id: None,
            discord_connected_at: None,
            discord_verified: false,
            discord_verified_at: None,
            referral_code: None,
            referred_by: None,
            referral_count: 0,
            referral_points_earned: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

#[async_trait]
impl ProfileStore for MemStore {
    async fn get_profile(&self, wallet: &str) -> Result<Option<WalletProfile>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.profiles.get(wallet).cloned())
    }

    async fn get_or_create_profile(
        &self,
        wallet: &str,
        chain: ChainType,
    ) -> Result<WalletProfile, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let profile = inner
            .profiles
            .entry(wallet.to_string())
            .or_insert_with(|| Self::blank_profile(wallet, chain));
        Ok(profile.clone())
    }

    async fn set_platform_connection(
        &self,
        wallet: &str,
        platform: Platform,
        identity: Option<PlatformIdentity>,
    ) -> Result<WalletProfile, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let profile = inner.profiles.get_mut(wallet).ok_or(StoreError::NotFound)?;
        let now = Utc::now();

        match platform {
            Platform::X => match identity {
                Some(id) => {
                    profile.x_connected = true;
                    profile.x_username = Some(id.username);
                    profile.x_id = Some(id.external_id);
                    profile.x_connected_at = Some(now);
                }
                None => {
                    profile.x_connected = false;
                    profile.x_username = None;
                    profile.x_id = None;
                    profile.x_connected_at = None;
                }
            },
            Platform::Discord => match identity {
                Some(id) => {
                    profile.discord_connected = true;
                    profile.discord_username = Some(id.username);
                    profile.discord_id = Some(id.external_id);
                    profile.discord_connected_at = Some(now);
                }
                None => {
                    profile.discord_connected = false;
                    profile.discord_username = None;
                    profile.discord_id = None;
                    profile.discord_connected_at = None;
                    profile.discord_verified = false;
                    profile.discord_verified_at = None;
                }
            },
        }
        profile.updated_at = now;
        Ok(profile.clone())
    }

    async fn set_discord_verified(
        &self,
        wallet: &str,
        verified: bool,
    ) -> Result<WalletProfile, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let profile = inner.profiles.get_mut(wallet).ok_or(StoreError::NotFound)?;
        profile.discord_verified = verified;
        profile.discord_verified_at = if verified { Some(Utc::now()) } else { None };
        profile.updated_at = Utc::now();
        Ok(profile.clone())
    }

    async fn set_connect_bonus_claimed(
        &self,
        wallet: &str,
    ) -> Result<WalletProfile, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let profile = inner.profiles.get_mut(wallet).ok_or(StoreError::NotFound)?;
        profile.connect_bonus_claimed = true;
        profile.updated_at = Utc::now();
        Ok(profile.clone())
    }

    async fn assign_referral_code(
        &self,
        wallet: &str,
        code: &str,
    ) -> Result<WalletProfile, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let taken = inner.profiles.values().any(|p| {
            p.referral_code
                .as_deref()
                .is_some_and(|c| c.eq_ignore_ascii_case(code))
        });
        if taken {
            return Err(StoreError::Conflict);
        }
        let profile = inner.profiles.get_mut(wallet).ok_or(StoreError::NotFound)?;
        if profile.referral_code.is_some() {
            return Err(StoreError::Conflict);
        }
        profile.referral_code = Some(code.to_string());
        profile.updated_at = Utc::now();
        Ok(profile.clone())
    }

    async fn set_referred_by(
        &self,
        wallet: &str,
        code: &str,
    ) -> Result<WalletProfile, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let profile = inner.profiles.get_mut(wallet).ok_or(StoreError::NotFound)?;
        if profile.referred_by.is_some() {
            return Err(StoreError::Conflict);
        }
        profile.referred_by = Some(code.to_string());
        profile.updated_at = Utc::now();
        Ok(profile.clone())
    }

    async fn set_referral_aggregates(
        &self,
        wallet: &str,
        count: i32,
        points_earned: i64,
    ) -> Result<WalletProfile, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let profile = inner.profiles.get_mut(wallet).ok_or(StoreError::NotFound)?;
        profile.referral_count = count;
        profile.referral_points_earned = points_earned;
        profile.updated_at = Utc::now();
        Ok(profile.clone())
    }

    async fn get_profile_by_referral_code(
        &self,
        code: &str,
    ) -> Result<Option<WalletProfile>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .profiles
            .values()
            .find(|p| {
                p.referral_code
                    .as_deref()
                    .is_some_and(|c| c.eq_ignore_ascii_case(code))
            })
            .cloned())
    }

    async fn list_profiles(
        &self,
        page: u32,
        limit: usize,
    ) -> Result<Vec<WalletProfile>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let mut profiles: Vec<_> = inner.profiles.values().cloned().collect();
        profiles.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let offset = (page.saturating_sub(1) as usize) * limit;
        Ok(profiles.into_iter().skip(offset).take(limit).collect())
    }

    async fn count_profiles(&self) -> Result<i64, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.profiles.len() as i64)
    }

    async fn list_discord_verified(&self) -> Result<Vec<WalletProfile>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .profiles
            .values()
            .filter(|p| p.discord_verified && p.discord_id.is_some())
            .cloned()
            .collect())
    }

    async fn leaderboard(&self, limit: i64) -> Result<Vec<WalletProfile>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let mut profiles: Vec<_> = inner.profiles.values().cloned().collect();
        profiles.sort_by(|a, b| b.total_points.cmp(&a.total_points));
        profiles.truncate(limit as usize);
        Ok(profiles)
    }
}

#[async_trait]
impl PointsStore for MemStore {
    async fn adjust_points(
        &self,
        wallet: &str,
        delta: i64,
        transaction_type: TransactionType,
        description: &str,
    ) -> Result<i64, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let profile = inner.profiles.get_mut(wallet).ok_or(StoreError::NotFound)?;
        profile.total_points += delta;
        profile.updated_at = Utc::now();
        let balance = profile.total_points;

        inner.history.push(PointsHistory {
            id: Uuid::new_v4(),
            wallet_address: wallet.to_string(),
            transaction_type,
            points_change: delta,
            balance_after: balance,
            description: description.to_string(),
            created_at: Utc::now(),
        });

        Ok(balance)
    }

    async fn latest_positive_amount(
        &self,
        wallet: &str,
        transaction_type: TransactionType,
    ) -> Result<Option<i64>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .history
            .iter()
            .rev()
            .find(|h| {
                h.wallet_address == wallet
                    && h.transaction_type == transaction_type
                    && h.points_change > 0
            })
            .map(|h| h.points_change))
    }

    async fn history_for(
        &self,
        wallet: &str,
        page: u32,
        limit: usize,
    ) -> Result<Vec<PointsHistory>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let offset = (page.saturating_sub(1) as usize) * limit;
        Ok(inner
            .history
            .iter()
            .rev()
            .filter(|h| h.wallet_address == wallet)
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn history_sum(&self, wallet: &str) -> Result<i64, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .history
            .iter()
            .filter(|h| h.wallet_address == wallet)
            .map(|h| h.points_change)
            .sum())
    }

    async fn total_points_outstanding(&self) -> Result<i64, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.profiles.values().map(|p| p.total_points).sum())
    }

    async fn ledger_drift(&self) -> Result<Vec<LedgerDrift>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let mut drift = Vec::new();
        for profile in inner.profiles.values() {
            let sum: i64 = inner
                .history
                .iter()
                .filter(|h| h.wallet_address == profile.wallet_address)
                .map(|h| h.points_change)
                .sum();
            if sum != profile.total_points {
                drift.push(LedgerDrift {
                    wallet_address: profile.wallet_address.clone(),
                    total_points: profile.total_points,
                    history_sum: sum,
                });
            }
        }
        Ok(drift)
    }
}

#[async_trait]
impl TaskStore for MemStore {
    async fn find_active_completion(
        &self,
        wallet: &str,
        task_type: TaskType,
        date: Option<NaiveDate>,
    ) -> Result<Option<TaskCompletion>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .completions
            .iter()
            .rev()
            .find(|c| {
                c.wallet_address == wallet
                    && c.task_type == task_type
                    && c.status == TaskStatus::Active
                    && date.map_or(true, |d| c.completion_date == d)
            })
            .cloned())
    }

    async fn insert_completion(
        &self,
        completion: NewCompletion,
    ) -> Result<TaskCompletion, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let row = TaskCompletion {
            id: Uuid::new_v4(),
            wallet_address: completion.wallet_address,
            task_type: completion.task_type,
            points_awarded: completion.points_awarded,
            completion_date: completion.completion_date,
            metadata: completion.metadata,
            status: TaskStatus::Active,
            completed_at: Utc::now(),
            revoked_at: None,
        };
        inner.completions.push(row.clone());
        Ok(row)
    }

    async fn get_completion(&self, id: Uuid) -> Result<Option<TaskCompletion>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.completions.iter().find(|c| c.id == id).cloned())
    }

    async fn mark_revoked(&self, id: Uuid) -> Result<Option<TaskCompletion>, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let row = inner.completions.iter_mut().find(|c| c.id == id);
        match row {
            Some(c) if c.status == TaskStatus::Active => {
                c.status = TaskStatus::Revoked;
                c.revoked_at = Some(Utc::now());
                Ok(Some(c.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn list_completions(
        &self,
        wallet: &str,
        page: u32,
        limit: usize,
    ) -> Result<Vec<TaskCompletion>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let offset = (page.saturating_sub(1) as usize) * limit;
        Ok(inner
            .completions
            .iter()
            .rev()
            .filter(|c| c.wallet_address == wallet)
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn list_active_with_metadata(
        &self,
        wallet: Option<&str>,
        task_type: TaskType,
    ) -> Result<Vec<TaskCompletion>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .completions
            .iter()
            .filter(|c| {
                c.task_type == task_type
                    && c.status == TaskStatus::Active
                    && c.metadata.is_some()
                    && wallet.map_or(true, |w| c.wallet_address == w)
            })
            .cloned()
            .collect())
    }

    async fn count_active_completions(&self) -> Result<i64, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .completions
            .iter()
            .filter(|c| c.status == TaskStatus::Active)
            .count() as i64)
    }
}

#[async_trait]
impl ReferralStore for MemStore {
    async fn insert_referral(&self, referral: NewReferral) -> Result<Referral, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        if inner
            .referrals
            .iter()
            .any(|r| r.referred_wallet == referral.referred_wallet)
        {
            return Err(StoreError::Conflict);
        }
        let row = Referral {
            id: Uuid::new_v4(),
            referrer_wallet: referral.referrer_wallet,
            referred_wallet: referral.referred_wallet,
            referral_code: referral.referral_code,
            referrer_points: referral.referrer_points,
            referred_points: referral.referred_points,
            referrer_claimed: false,
            referred_claimed: false,
            created_at: Utc::now(),
            claimed_at: None,
        };
        inner.referrals.push(row.clone());
        Ok(row)
    }

    async fn get_referral_by_referred(
        &self,
        wallet: &str,
    ) -> Result<Option<Referral>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .referrals
            .iter()
            .find(|r| r.referred_wallet == wallet)
            .cloned())
    }

    async fn mark_referral_claimed(&self, id: Uuid) -> Result<Option<Referral>, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let row = inner.referrals.iter_mut().find(|r| r.id == id);
        match row {
            Some(r) if !r.referred_claimed => {
                r.referrer_claimed = true;
                r.referred_claimed = true;
                r.claimed_at = Some(Utc::now());
                Ok(Some(r.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn list_referrals_by_referrer(
        &self,
        wallet: &str,
    ) -> Result<Vec<Referral>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .referrals
            .iter()
            .filter(|r| r.referrer_wallet == wallet)
            .cloned()
            .collect())
    }

    async fn count_referrals(&self) -> Result<i64, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.referrals.len() as i64)
    }
}
