//! In-memory mock implementations of the store repository traits.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::use_cases::subscription_sync::{
        NewSubscription, SubscriptionPatch, SubscriptionRepo, UserRepo,
    },
    domain::entities::{subscription::Subscription, user::User},
};

// ============================================================================
// InMemoryUserRepo
// ============================================================================

#[derive(Default)]
pub struct InMemoryUserRepo {
    pub users: Mutex<HashMap<Uuid, User>>,
}

impl InMemoryUserRepo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a user with no subscription and return its id.
    pub fn seed_user(&self, email: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.users.lock().unwrap().insert(
            id,
            User {
                id,
                email: email.to_string(),
                current_subscription_id: None,
            },
        );
        id
    }
}

#[async_trait]
impl UserRepo for InMemoryUserRepo {
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.users.lock().unwrap().get(&id).cloned())
    }

    async fn find_by_current_subscription(
        &self,
        subscription_id: Uuid,
    ) -> AppResult<Option<User>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .find(|u| u.current_subscription_id == Some(subscription_id))
            .cloned())
    }

    async fn set_current_subscription(
        &self,
        user_id: Uuid,
        subscription_id: Option<Uuid>,
    ) -> AppResult<()> {
        let mut users = self.users.lock().unwrap();
        let user = users.get_mut(&user_id).ok_or(AppError::NotFound)?;
        user.current_subscription_id = subscription_id;
        Ok(())
    }
}

// ============================================================================
// InMemorySubscriptionRepo
// ============================================================================

#[derive(Default)]
pub struct InMemorySubscriptionRepo {
    pub subscriptions: Mutex<HashMap<Uuid, Subscription>>,
}

impl InMemorySubscriptionRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.subscriptions.lock().unwrap().len()
    }
}

#[async_trait]
impl SubscriptionRepo for InMemorySubscriptionRepo {
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Subscription>> {
        Ok(self.subscriptions.lock().unwrap().get(&id).cloned())
    }

    async fn get_by_stripe_subscription_id(
        &self,
        stripe_subscription_id: &str,
    ) -> AppResult<Option<Subscription>> {
        Ok(self
            .subscriptions
            .lock()
            .unwrap()
            .values()
            .find(|s| s.stripe_subscription_id == stripe_subscription_id)
            .cloned())
    }

    async fn insert(&self, input: &NewSubscription) -> AppResult<Subscription> {
        let mut subscriptions = self.subscriptions.lock().unwrap();

        // Unique index on stripe_subscription_id, conflict-as-error.
        if subscriptions
            .values()
            .any(|s| s.stripe_subscription_id == input.stripe_subscription_id)
        {
            return Err(AppError::Conflict);
        }

        let subscription = Subscription {
            id: Uuid::new_v4(),
            stripe_subscription_id: input.stripe_subscription_id.clone(),
            status: input.status.clone(),
            plan_type: input.plan_type,
            current_period_start: Some(input.current_period_start),
            current_period_end: Some(input.current_period_end),
            cancel_at_period_end: input.cancel_at_period_end,
        };
        subscriptions.insert(subscription.id, subscription.clone());
        Ok(subscription)
    }

    async fn overwrite(&self, id: Uuid, patch: &SubscriptionPatch) -> AppResult<Subscription> {
        let mut subscriptions = self.subscriptions.lock().unwrap();
        let subscription = subscriptions.get_mut(&id).ok_or(AppError::NotFound)?;

        subscription.status = patch.status.clone();
        subscription.plan_type = patch.plan_type;
        subscription.current_period_start = patch.current_period_start;
        subscription.current_period_end = patch.current_period_end;
        subscription.cancel_at_period_end = patch.cancel_at_period_end;

        Ok(subscription.clone())
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        self.subscriptions
            .lock()
            .unwrap()
            .remove(&id)
            .ok_or(AppError::NotFound)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::subscription::PlanType;

    fn new_subscription(stripe_id: &str) -> NewSubscription {
        NewSubscription {
            stripe_subscription_id: stripe_id.to_string(),
            status: "active".to_string(),
            plan_type: PlanType::Month,
            current_period_start: 1_700_000_000_000,
            current_period_end: 1_702_592_000_000,
            cancel_at_period_end: false,
        }
    }

    #[tokio::test]
    async fn insert_enforces_unique_stripe_subscription_id() {
        let repo = InMemorySubscriptionRepo::new();
        repo.insert(&new_subscription("sub_dup")).await.unwrap();

        let result = repo.insert(&new_subscription("sub_dup")).await;
        assert!(matches!(result, Err(AppError::Conflict)));
        assert_eq!(repo.len(), 1);
    }

    #[tokio::test]
    async fn overwrite_replaces_every_field() {
        let repo = InMemorySubscriptionRepo::new();
        let created = repo.insert(&new_subscription("sub_ow")).await.unwrap();

        let patch = SubscriptionPatch {
            status: "canceled".to_string(),
            plan_type: PlanType::Year,
            current_period_start: None,
            current_period_end: None,
            cancel_at_period_end: true,
        };
        let updated = repo.overwrite(created.id, &patch).await.unwrap();

        assert_eq!(updated.status, "canceled");
        assert_eq!(updated.plan_type, PlanType::Year);
        assert_eq!(updated.current_period_start, None);
        assert_eq!(updated.current_period_end, None);
        assert!(updated.cancel_at_period_end);
        // The provider key is immutable.
        assert_eq!(updated.stripe_subscription_id, "sub_ow");
    }

    #[tokio::test]
    async fn find_by_current_subscription_reverse_lookup() {
        let repo = InMemoryUserRepo::new();
        let user_id = repo.seed_user("a@example.com");
        let subscription_id = Uuid::new_v4();

        assert!(repo
            .find_by_current_subscription(subscription_id)
            .await
            .unwrap()
            .is_none());

        repo.set_current_subscription(user_id, Some(subscription_id))
            .await
            .unwrap();

        let found = repo
            .find_by_current_subscription(subscription_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, user_id);
    }

    #[tokio::test]
    async fn set_current_subscription_requires_existing_user() {
        let repo = InMemoryUserRepo::new();
        let result = repo
            .set_current_subscription(Uuid::new_v4(), None)
            .await;
        assert!(matches!(result, Err(AppError::NotFound)));
    }
}
