use serde::Serialize;
use uuid::Uuid;

/// Identity record. Created and owned elsewhere; this service only reads it
/// and maintains `current_subscription_id`, the sole link to at most one
/// active subscription.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub current_subscription_id: Option<Uuid>,
}
