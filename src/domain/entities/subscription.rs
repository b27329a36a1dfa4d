use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Billing interval of a provider subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "plan_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PlanType {
    Month,
    Year,
}

impl PlanType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanType::Month => "month",
            PlanType::Year => "year",
        }
    }
}

/// One billing-provider subscription lifecycle.
///
/// `status` is the provider's lifecycle state (active, past_due, canceled,
/// ...). It is opaque to this system and stored as-is.
///
/// The period fields are epoch milliseconds. Both are filled on creation
/// (derived from the plan when the upstream event omits them), but an update
/// that omits them clears them, so they stay optional in the stored record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Subscription {
    pub id: Uuid,
    pub stripe_subscription_id: String,
    pub status: String,
    pub plan_type: PlanType,
    pub current_period_start: Option<i64>,
    pub current_period_end: Option<i64>,
    pub cancel_at_period_end: bool,
}
