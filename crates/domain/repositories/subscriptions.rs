use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;

use crate::domain::entities::subscriptions::UpsertSubscriptionEntity;

#[automock]
#[async_trait]
pub trait SubscriptionRepository {
    /// Inserts the row, or overwrites every column but `created_at` when the user
    /// already has one.
    async fn upsert_subscription(&self, subscription: UpsertSubscriptionEntity) -> Result<()>;

    /// Marks every row carrying `payment_session_id` as cancelled and returns how
    /// many rows changed.
    async fn cancel_by_payment_session_id(&self, payment_session_id: &str) -> Result<usize>;
}
