use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use diesel::{RunQueryDsl, insert_into, prelude::*, update};
use std::sync::Arc;

use crate::{
    domain,
    infra::db::postgres::{postgres_connection::PgPoolSquad, schema::subscriptions},
};
use domain::{
    entities::subscriptions::UpsertSubscriptionEntity,
    repositories::subscriptions::SubscriptionRepository,
    value_objects::enums::subscription_statuses::SubscriptionStatus,
};

pub struct SubscriptionPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl SubscriptionPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl SubscriptionRepository for SubscriptionPostgres {
    async fn upsert_subscription(&self, subscription: UpsertSubscriptionEntity) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        insert_into(subscriptions::table)
            .values(&subscription)
            .on_conflict(subscriptions::user_id)
            .do_update()
            .set(&subscription)
            .execute(&mut conn)?;

        Ok(())
    }

    async fn cancel_by_payment_session_id(&self, payment_session_id: &str) -> Result<usize> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let updated = update(subscriptions::table)
            .filter(subscriptions::payment_session_id.eq(payment_session_id))
            .set((
                subscriptions::status.eq(SubscriptionStatus::Cancelled.to_string()),
                subscriptions::updated_at.eq(Utc::now()),
            ))
            .execute(&mut conn)?;

        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    const UP_SQL: &str =
        include_str!("../../../../migrations/2025-01-01-000000_create_subscriptions/up.sql");
    const DOWN_SQL: &str =
        include_str!("../../../../migrations/2025-01-01-000000_create_subscriptions/down.sql");

    #[test]
    fn down_migration_leaves_users_alone() {
        let down = DOWN_SQL.to_ascii_lowercase();

        assert!(down.contains("drop table if exists subscriptions"));
        assert!(!down.contains("users"));
    }

    #[test]
    fn subscriptions_do_not_require_a_local_user_row() {
        assert!(!UP_SQL.to_ascii_uppercase().contains("REFERENCES"));
    }
}
