use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::{
    domain::value_objects::{enums::subscription_statuses::SubscriptionStatus, plans::Plan},
    infra::db::postgres::schema::subscriptions,
};

/// Row written on checkout completion. Used both as the insert and as the
/// `ON CONFLICT (user_id)` changeset, so `created_at` is left to the column default.
#[derive(Debug, Clone, PartialEq, Insertable, AsChangeset)]
#[diesel(table_name = subscriptions, primary_key(user_id), treat_none_as_null = true)]
pub struct UpsertSubscriptionEntity {
    pub user_id: Uuid,
    pub plan_id: String,
    pub plan_name: String,
    pub status: String,
    pub payment_session_id: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl UpsertSubscriptionEntity {
    pub fn active(user_id: Uuid, plan: &Plan, payment_session_id: Option<String>) -> Self {
        Self {
            user_id,
            plan_id: plan.id.to_string(),
            plan_name: plan.name.to_string(),
            status: SubscriptionStatus::Active.to_string(),
            payment_session_id,
            updated_at: Utc::now(),
        }
    }
}
