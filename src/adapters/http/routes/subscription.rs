use axum::{
    Json, Router,
    extract::{Path, State},
    response::IntoResponse,
    routing::{delete, get, post},
};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    adapters::http::app_state::AppState,
    app_error::AppResult,
    application::use_cases::subscription_sync::UpsertSubscriptionInput,
    domain::entities::subscription::Subscription,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users/{user_id}/subscription", get(get_user_subscription))
        .route("/subscriptions", post(upsert_subscription))
        .route(
            "/subscriptions/{stripe_subscription_id}",
            delete(remove_subscription),
        )
}

#[derive(Serialize)]
struct SubscriptionResponse {
    subscription: Option<Subscription>,
}

#[derive(Serialize)]
struct AckResponse {
    success: bool,
}

async fn get_user_subscription(
    State(app_state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let subscription = app_state
        .subscription_sync
        .get_user_subscription(user_id)
        .await?;
    Ok(Json(SubscriptionResponse { subscription }))
}

async fn upsert_subscription(
    State(app_state): State<AppState>,
    Json(input): Json<UpsertSubscriptionInput>,
) -> AppResult<impl IntoResponse> {
    app_state.subscription_sync.upsert_subscription(input).await?;
    Ok(Json(AckResponse { success: true }))
}

async fn remove_subscription(
    State(app_state): State<AppState>,
    Path(stripe_subscription_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    app_state
        .subscription_sync
        .remove_subscription(&stripe_subscription_id)
        .await?;
    Ok(Json(AckResponse { success: true }))
}
