use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Months, Utc};
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::app_error::{AppError, AppResult};
use crate::domain::entities::subscription::{PlanType, Subscription};
use crate::domain::entities::user::User;

// ============================================================================
// Ports
// ============================================================================

#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<User>>;
    /// Reverse lookup: the user whose `current_subscription_id` points at the
    /// given subscription. The ownership pointer lives on the user side.
    async fn find_by_current_subscription(
        &self,
        subscription_id: Uuid,
    ) -> AppResult<Option<User>>;
    async fn set_current_subscription(
        &self,
        user_id: Uuid,
        subscription_id: Option<Uuid>,
    ) -> AppResult<()>;
}

#[async_trait]
pub trait SubscriptionRepo: Send + Sync {
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Subscription>>;
    async fn get_by_stripe_subscription_id(
        &self,
        stripe_subscription_id: &str,
    ) -> AppResult<Option<Subscription>>;
    /// Insert a new record. A unique-index violation on
    /// `stripe_subscription_id` surfaces as `AppError::Conflict`.
    async fn insert(&self, input: &NewSubscription) -> AppResult<Subscription>;
    /// Full-record patch: every field is replaced, including clearing the
    /// period fields when the patch carries `None`.
    async fn overwrite(&self, id: Uuid, patch: &SubscriptionPatch) -> AppResult<Subscription>;
    async fn delete(&self, id: Uuid) -> AppResult<()>;
}

// ============================================================================
// Inputs
// ============================================================================

/// Normalized provider event, as handed over by the webhook delivery layer.
#[derive(Debug, Clone, Deserialize)]
pub struct UpsertSubscriptionInput {
    pub user_id: Uuid,
    pub stripe_subscription_id: String,
    pub status: String,
    pub plan_type: PlanType,
    pub current_period_start: Option<i64>,
    pub current_period_end: Option<i64>,
    pub cancel_at_period_end: bool,
}

/// Insert payload. Period boundaries are mandatory here: the create path
/// fills them in before inserting, so a persisted subscription always starts
/// out with both.
#[derive(Debug, Clone)]
pub struct NewSubscription {
    pub stripe_subscription_id: String,
    pub status: String,
    pub plan_type: PlanType,
    pub current_period_start: i64,
    pub current_period_end: i64,
    pub cancel_at_period_end: bool,
}

#[derive(Debug, Clone)]
pub struct SubscriptionPatch {
    pub status: String,
    pub plan_type: PlanType,
    pub current_period_start: Option<i64>,
    pub current_period_end: Option<i64>,
    pub cancel_at_period_end: bool,
}

impl SubscriptionPatch {
    fn from_input(input: &UpsertSubscriptionInput) -> Self {
        Self {
            status: input.status.clone(),
            plan_type: input.plan_type,
            current_period_start: input.current_period_start,
            current_period_end: input.current_period_end,
            cancel_at_period_end: input.cancel_at_period_end,
        }
    }
}

// ============================================================================
// Use Cases
// ============================================================================

#[derive(Clone)]
pub struct SubscriptionSyncUseCases {
    user_repo: Arc<dyn UserRepo>,
    subscription_repo: Arc<dyn SubscriptionRepo>,
}

impl SubscriptionSyncUseCases {
    pub fn new(user_repo: Arc<dyn UserRepo>, subscription_repo: Arc<dyn SubscriptionRepo>) -> Self {
        Self {
            user_repo,
            subscription_repo,
        }
    }

    /// Fetch a user's current subscription. Missing user, unset reference and
    /// dangling reference all mean "no subscription yet", never an error.
    #[instrument(skip(self))]
    pub async fn get_user_subscription(&self, user_id: Uuid) -> AppResult<Option<Subscription>> {
        let Some(user) = self.user_repo.get_by_id(user_id).await? else {
            return Ok(None);
        };
        let Some(subscription_id) = user.current_subscription_id else {
            return Ok(None);
        };
        self.subscription_repo.get_by_id(subscription_id).await
    }

    /// Reconcile one provider event: update the subscription matching the
    /// provider id, or create it (filling in missing period boundaries) and
    /// link it to the user.
    ///
    /// On update, period fields are taken from the event verbatim: an omitted
    /// field clears the stored one and is never re-derived. Dates are only
    /// derived on creation.
    #[instrument(skip(self, input), fields(stripe_subscription_id = %input.stripe_subscription_id))]
    pub async fn upsert_subscription(&self, input: UpsertSubscriptionInput) -> AppResult<()> {
        let existing = self
            .subscription_repo
            .get_by_stripe_subscription_id(&input.stripe_subscription_id)
            .await?;

        if let Some(existing) = existing {
            self.subscription_repo
                .overwrite(existing.id, &SubscriptionPatch::from_input(&input))
                .await?;
            info!(subscription_id = %existing.id, "Updated subscription from provider event");
            return Ok(());
        }

        let current_period_start = input.current_period_start.unwrap_or_else(now_ms);
        let current_period_end = match input.current_period_end {
            Some(end) => end,
            None => derive_period_end(current_period_start, input.plan_type)?,
        };

        let new = NewSubscription {
            stripe_subscription_id: input.stripe_subscription_id.clone(),
            status: input.status.clone(),
            plan_type: input.plan_type,
            current_period_start,
            current_period_end,
            cancel_at_period_end: input.cancel_at_period_end,
        };

        match self.subscription_repo.insert(&new).await {
            Ok(created) => {
                self.user_repo
                    .set_current_subscription(input.user_id, Some(created.id))
                    .await?;
                info!(subscription_id = %created.id, user_id = %input.user_id, "Created subscription and linked user");
                Ok(())
            }
            // A concurrent upsert for the same provider id won the insert
            // race; the unique index turned ours into an update.
            Err(AppError::Conflict) => {
                let existing = self
                    .subscription_repo
                    .get_by_stripe_subscription_id(&input.stripe_subscription_id)
                    .await?
                    .ok_or_else(|| {
                        AppError::Internal(
                            "subscription vanished after unique-constraint conflict".into(),
                        )
                    })?;
                self.subscription_repo
                    .overwrite(existing.id, &SubscriptionPatch::from_input(&input))
                    .await?;
                info!(subscription_id = %existing.id, "Insert conflicted, updated existing subscription");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Handle a provider cancellation/deletion: unlink the owning user, then
    /// delete the record. Clearing the reference first means an interruption
    /// leaves at worst an orphan row, never a permanent dangling reference.
    #[instrument(skip(self))]
    pub async fn remove_subscription(&self, stripe_subscription_id: &str) -> AppResult<()> {
        let subscription = self
            .subscription_repo
            .get_by_stripe_subscription_id(stripe_subscription_id)
            .await?
            .ok_or(AppError::NotFound)?;

        if let Some(user) = self
            .user_repo
            .find_by_current_subscription(subscription.id)
            .await?
        {
            self.user_repo
                .set_current_subscription(user.id, None)
                .await?;
        }

        self.subscription_repo.delete(subscription.id).await?;
        info!(subscription_id = %subscription.id, "Removed subscription");
        Ok(())
    }
}

// ============================================================================
// Period Derivation
// ============================================================================

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Derive a billing period end from its start by adding one calendar month or
/// one calendar year. Calendar arithmetic, not a fixed 30/365-day offset:
/// chrono clamps the day-of-month on rollover, so Jan 31 + 1 month is Feb 28
/// (Feb 29 in leap years) and Feb 29 + 1 year is Feb 28.
pub fn derive_period_end(start_ms: i64, plan_type: PlanType) -> AppResult<i64> {
    let start = DateTime::<Utc>::from_timestamp_millis(start_ms).ok_or_else(|| {
        AppError::InvalidInput(format!("period start out of range: {start_ms}"))
    })?;

    let months = match plan_type {
        PlanType::Month => 1,
        PlanType::Year => 12,
    };

    let end = start
        .checked_add_months(Months::new(months))
        .ok_or_else(|| AppError::InvalidInput(format!("period end out of range from: {start_ms}")))?;

    Ok(end.timestamp_millis())
}
