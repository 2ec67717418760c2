use std::sync::Arc;

use crates::domain::{
    entities::subscriptions::UpsertSubscriptionEntity,
    repositories::{subscriptions::SubscriptionRepository, users::UserRepository},
    value_objects::{
        creem_webhook::{
            CheckoutCompletedData, CreemEvent, CreemWebhookEnvelope, SubscriptionCancelledData,
        },
        plans,
    },
};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::usecases::payments::PaymentGateway;

#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("Invalid webhook signature")]
    InvalidSignature,
    #[error("Invalid webhook payload")]
    InvalidPayload(#[source] serde_json::Error),
}

impl WebhookError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            WebhookError::InvalidSignature => StatusCode::UNAUTHORIZED,
            WebhookError::InvalidPayload(_) => StatusCode::BAD_REQUEST,
        }
    }
}

pub type UseCaseResult<T> = std::result::Result<T, WebhookError>;

/// Why an authenticated delivery left the subscription table untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    MissingPlanOrEmail,
    UnknownPlan,
    UserNotFound,
    MissingPaymentSessionId,
    MalformedPayload,
    UnhandledEventType,
    PersistenceFailed,
}

/// What a delivery did. Every variant is acknowledged to the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    SubscriptionActivated { user_id: Uuid, plan_id: String },
    SubscriptionCancelled { payment_session_id: String, rows: usize },
    CheckoutFailed,
    Skipped(SkipReason),
}

pub struct WebhookUseCase<G, S, U>
where
    G: PaymentGateway + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
{
    gateway: Arc<G>,
    subscription_repo: Arc<S>,
    user_repo: Arc<U>,
}

impl<G, S, U> WebhookUseCase<G, S, U>
where
    G: PaymentGateway + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
{
    pub fn new(gateway: Arc<G>, subscription_repo: Arc<S>, user_repo: Arc<U>) -> Self {
        Self {
            gateway,
            subscription_repo,
            user_repo,
        }
    }

    /// Verifies and applies one Creem delivery. Only an unverifiable or unparseable
    /// body is an error; everything past that point is acknowledged.
    pub async fn handle(
        &self,
        payload: &[u8],
        signature: Option<&str>,
    ) -> UseCaseResult<WebhookOutcome> {
        let signature = signature.ok_or_else(|| {
            warn!("webhooks: creem delivery without signature header");
            WebhookError::InvalidSignature
        })?;

        self.gateway
            .verify_webhook_signature(payload, signature)
            .map_err(|err| {
                let rejected = WebhookError::InvalidSignature;
                warn!(
                    error = %err,
                    status = rejected.status_code().as_u16(),
                    "webhooks: creem signature verification failed"
                );
                rejected
            })?;

        let envelope: CreemWebhookEnvelope = serde_json::from_slice(payload).map_err(|err| {
            warn!(error = %err, "webhooks: creem payload is not a valid envelope");
            WebhookError::InvalidPayload(err)
        })?;

        let event = CreemEvent::from(envelope);
        info!(event_type = event.event_type(), "webhooks: creem event verified");

        let outcome = match event {
            CreemEvent::CheckoutCompleted(data) => self.handle_checkout_completed(data).await,
            CreemEvent::CheckoutFailed(data) => Self::handle_checkout_failed(&data),
            CreemEvent::SubscriptionCancelled(data) => {
                self.handle_subscription_cancelled(data).await
            }
            CreemEvent::Malformed { event_type, reason } => {
                warn!(
                    %event_type,
                    %reason,
                    "webhooks: event data did not match expected shape"
                );
                WebhookOutcome::Skipped(SkipReason::MalformedPayload)
            }
            CreemEvent::Unknown { event_type } => {
                debug!(%event_type, "webhooks: unhandled creem event type");
                WebhookOutcome::Skipped(SkipReason::UnhandledEventType)
            }
        };

        Ok(outcome)
    }

    async fn handle_checkout_completed(&self, data: CheckoutCompletedData) -> WebhookOutcome {
        let (Some(plan_id), Some(customer_email)) = (data.plan_id(), data.customer_email())
        else {
            error!(
                session_id = ?data.id,
                "webhooks: missing plan_id or customer_email in checkout data"
            );
            return WebhookOutcome::Skipped(SkipReason::MissingPlanOrEmail);
        };

        let Some(plan) = plans::find_plan(plan_id) else {
            error!(
                plan_id,
                session_id = ?data.id,
                "webhooks: plan not found for completed checkout"
            );
            return WebhookOutcome::Skipped(SkipReason::UnknownPlan);
        };

        let user_id = match self.user_repo.find_user_id_by_email(customer_email).await {
            Ok(Some(user_id)) => user_id,
            Ok(None) => {
                error!(
                    customer_email,
                    session_id = ?data.id,
                    "webhooks: user not found for checkout email"
                );
                return WebhookOutcome::Skipped(SkipReason::UserNotFound);
            }
            Err(err) => {
                error!(
                    customer_email,
                    db_error = ?err,
                    "webhooks: failed to look up user for checkout email"
                );
                return WebhookOutcome::Skipped(SkipReason::PersistenceFailed);
            }
        };

        let subscription = UpsertSubscriptionEntity::active(user_id, plan, data.id.clone());
        if let Err(err) = self.subscription_repo.upsert_subscription(subscription).await {
            error!(
                %user_id,
                plan_id,
                session_id = ?data.id,
                db_error = ?err,
                "webhooks: failed to upsert subscription after checkout"
            );
            return WebhookOutcome::Skipped(SkipReason::PersistenceFailed);
        }

        info!(
            %user_id,
            plan_id,
            session_id = ?data.id,
            "webhooks: subscription activated from checkout"
        );

        WebhookOutcome::SubscriptionActivated {
            user_id,
            plan_id: plan.id.to_string(),
        }
    }

    fn handle_checkout_failed(data: &Value) -> WebhookOutcome {
        info!(payload = %data, "webhooks: checkout failed");
        WebhookOutcome::CheckoutFailed
    }

    async fn handle_subscription_cancelled(
        &self,
        data: SubscriptionCancelledData,
    ) -> WebhookOutcome {
        let Some(payment_session_id) = data.payment_session_id() else {
            error!("webhooks: missing payment_session_id in cancellation data");
            return WebhookOutcome::Skipped(SkipReason::MissingPaymentSessionId);
        };

        let rows = match self
            .subscription_repo
            .cancel_by_payment_session_id(payment_session_id)
            .await
        {
            Ok(rows) => rows,
            Err(err) => {
                error!(
                    payment_session_id,
                    db_error = ?err,
                    "webhooks: failed to cancel subscription"
                );
                return WebhookOutcome::Skipped(SkipReason::PersistenceFailed);
            }
        };

        if rows == 0 {
            warn!(
                payment_session_id,
                "webhooks: no subscription matched cancelled payment session"
            );
        } else {
            info!(
                payment_session_id,
                rows,
                "webhooks: subscription cancelled"
            );
        }

        WebhookOutcome::SubscriptionCancelled {
            payment_session_id: payment_session_id.to_string(),
            rows,
        }
    }
}
