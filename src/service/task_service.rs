// service/task_service.rs
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use crate::{
    config::PointsConfig,
    db::store::{LedgerStore, NewCompletion},
    models::{
        pointsmodel::TransactionType,
        taskmodel::{TaskCompletion, TaskStatus, TaskType},
    },
    service::{error::ServiceError, points_engine::PointsEngine, referral_service::ReferralService},
    utils::wallet::infer_chain,
};

#[derive(Clone)]
pub struct TaskService {
    store: Arc<dyn LedgerStore>,
    points: Arc<PointsEngine>,
    referrals: Arc<ReferralService>,
    config: PointsConfig,
}

impl TaskService {
    pub fn new(
        store: Arc<dyn LedgerStore>,
        points: Arc<PointsEngine>,
        referrals: Arc<ReferralService>,
        config: PointsConfig,
    ) -> Self {
        Self {
            store,
            points,
            referrals,
            config,
        }
    }

    /// Active completions only; a revoked completion does not block a
    /// resubmission.
    pub async fn has_completed_task(
        &self,
        wallet: &str,
        task_type: TaskType,
        date: Option<NaiveDate>,
    ) -> Result<bool, ServiceError> {
        let found = self
            .store
            .find_active_completion(wallet, task_type, date)
            .await?;
        Ok(found.is_some())
    }

    pub async fn complete_daily_post(
        &self,
        wallet: &str,
        tweet_url: Option<String>,
    ) -> Result<(TaskCompletion, i64), ServiceError> {
        let profile = self
            .store
            .get_or_create_profile(wallet, infer_chain(wallet))
            .await?;

        if !profile.x_connected {
            return Err(ServiceError::Ineligible(
                "Connect your X account before submitting a daily post".to_string(),
            ));
        }

        let today = Utc::now().date_naive();
        if self
            .has_completed_task(wallet, TaskType::DailyPost, Some(today))
            .await?
        {
            return Err(ServiceError::AlreadyInState(
                "Daily post already submitted today".to_string(),
            ));
        }

        let metadata = tweet_url
            .as_deref()
            .map(TaskCompletion::tweet_metadata);

        let completion = self
            .store
            .insert_completion(NewCompletion {
                wallet_address: wallet.to_string(),
                task_type: TaskType::DailyPost,
                points_awarded: self.config.daily_post,
                completion_date: today,
                metadata,
            })
            .await?;

        let balance = self
            .points
            .add_points(
                wallet,
                self.config.daily_post,
                TransactionType::DailyPost,
                &format!("Daily post completed for {}", today),
            )
            .await?;

        if let Err(err) = self.referrals.maybe_auto_claim(wallet).await {
            tracing::warn!("referral auto-claim failed for {}: {}", wallet, err);
        }

        Ok((completion, balance))
    }

    /// Deducts exactly what this row awarded, taken from the row itself
    /// rather than a type-wide lookup.
    pub async fn revoke_task_points(
        &self,
        completion_id: Uuid,
    ) -> Result<(TaskCompletion, i64), ServiceError> {
        let completion = self
            .store
            .get_completion(completion_id)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound("Task completion not found".to_string())
            })?;

        if completion.status == TaskStatus::Revoked {
            return Err(ServiceError::AlreadyInState(
                "Task completion already revoked".to_string(),
            ));
        }

        let revoked = self
            .store
            .mark_revoked(completion_id)
            .await?
            .ok_or_else(|| {
                // Lost the race to another revoker; nothing was deducted here.
                ServiceError::AlreadyInState("Task completion already revoked".to_string())
            })?;

        let balance = self
            .points
            .add_points(
                &revoked.wallet_address,
                -revoked.points_awarded,
                TransactionType::DailyPostRevoked,
                &format!("Task completion {} revoked", revoked.id),
            )
            .await?;

        Ok((revoked, balance))
    }

    pub async fn completions_for(
        &self,
        wallet: &str,
        page: u32,
        limit: usize,
    ) -> Result<Vec<TaskCompletion>, ServiceError> {
        Ok(self.store.list_completions(wallet, page, limit).await?)
    }
}
