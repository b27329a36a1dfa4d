use async_trait::async_trait;
use sqlx::Row;
use uuid::Uuid;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    application::use_cases::subscription_sync::UserRepo,
    domain::entities::user::User,
};

fn row_to_user(row: &sqlx::postgres::PgRow) -> User {
    User {
        id: row.get("id"),
        email: row.get("email"),
        current_subscription_id: row.get("current_subscription_id"),
    }
}

#[async_trait]
impl UserRepo for PostgresPersistence {
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        let row = sqlx::query(
            "SELECT id, email, current_subscription_id FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row.as_ref().map(row_to_user))
    }

    async fn find_by_current_subscription(
        &self,
        subscription_id: Uuid,
    ) -> AppResult<Option<User>> {
        let row = sqlx::query(
            "SELECT id, email, current_subscription_id FROM users WHERE current_subscription_id = $1",
        )
        .bind(subscription_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row.as_ref().map(row_to_user))
    }

    async fn set_current_subscription(
        &self,
        user_id: Uuid,
        subscription_id: Option<Uuid>,
    ) -> AppResult<()> {
        let result = sqlx::query("UPDATE users SET current_subscription_id = $2 WHERE id = $1")
            .bind(user_id)
            .bind(subscription_id)
            .execute(&self.pool)
            .await
            .map_err(AppError::from)?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }
}
