use std::{collections::HashMap, sync::Arc};

use anyhow::Result as AnyResult;
use async_trait::async_trait;
use crates::{
    domain::{
        entities::subscriptions::UpsertSubscriptionEntity,
        repositories::subscriptions::SubscriptionRepository,
        value_objects::{
            enums::checkout_statuses::CheckoutStatus,
            plans::{self, PRICING_PLANS, Plan},
        },
    },
    payments::creem_client::{CreemCheckoutSession, CreemClient},
};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::usecases::identity::{IdentityProvider, resolve_caller};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_checkout(
        &self,
        product_id: &str,
        customer_email: Option<String>,
        metadata: HashMap<String, String>,
    ) -> AnyResult<CreemCheckoutSession>;

    async fn retrieve_checkout(&self, checkout_id: &str) -> AnyResult<CreemCheckoutSession>;

    fn verify_webhook_signature(&self, payload: &[u8], signature: &str) -> AnyResult<()>;
}

#[async_trait]
impl PaymentGateway for CreemClient {
    async fn create_checkout(
        &self,
        product_id: &str,
        customer_email: Option<String>,
        metadata: HashMap<String, String>,
    ) -> AnyResult<CreemCheckoutSession> {
        CreemClient::create_checkout(self, product_id, customer_email.as_deref(), &metadata).await
    }

    async fn retrieve_checkout(&self, checkout_id: &str) -> AnyResult<CreemCheckoutSession> {
        CreemClient::retrieve_checkout(self, checkout_id).await
    }

    fn verify_webhook_signature(&self, payload: &[u8], signature: &str) -> AnyResult<()> {
        CreemClient::verify_webhook_signature(self, payload, signature)
    }
}

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("{0}")]
    BadRequest(&'static str),
    #[error("Authentication required")]
    Unauthorized,
    #[error("Plan with id {0} not found")]
    PlanNotFound(String),
    #[error("Payment not completed")]
    PaymentNotCompleted,
    #[error("payment provider request failed")]
    UpstreamFailure(#[source] anyhow::Error),
    /// Local write failed after the provider already took the payment. Logged, never
    /// returned to the caller.
    #[error("subscription write failed after successful payment")]
    PersistenceWarning(#[source] anyhow::Error),
}

impl PaymentError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            PaymentError::BadRequest(_) | PaymentError::PaymentNotCompleted => {
                StatusCode::BAD_REQUEST
            }
            PaymentError::Unauthorized => StatusCode::UNAUTHORIZED,
            PaymentError::PlanNotFound(_) => StatusCode::NOT_FOUND,
            PaymentError::UpstreamFailure(_) | PaymentError::PersistenceWarning(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

pub type UseCaseResult<T> = std::result::Result<T, PaymentError>;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum CheckoutOutcome {
    /// Free tier: nothing to pay, no provider call made.
    FreePlanActivated { success: bool, message: &'static str },
    /// Provider session descriptor, relayed verbatim.
    Session(CreemCheckoutSession),
}

impl CheckoutOutcome {
    fn free_plan_activated() -> Self {
        CheckoutOutcome::FreePlanActivated {
            success: true,
            message: "Free plan activated",
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct VerifyPaymentResult {
    pub success: bool,
    pub message: &'static str,
    pub plan: Option<&'static Plan>,
}

pub struct PaymentUseCase<G, S, I>
where
    G: PaymentGateway + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    I: IdentityProvider + 'static,
{
    gateway: Arc<G>,
    subscription_repo: Arc<S>,
    identity: Arc<I>,
}

impl<G, S, I> PaymentUseCase<G, S, I>
where
    G: PaymentGateway + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    I: IdentityProvider + 'static,
{
    pub fn new(gateway: Arc<G>, subscription_repo: Arc<S>, identity: Arc<I>) -> Self {
        Self {
            gateway,
            subscription_repo,
            identity,
        }
    }

    pub fn list_plans(&self) -> &'static [Plan] {
        PRICING_PLANS
    }

    /// Checkout on behalf of the signed-in caller.
    pub async fn checkout_for_caller(
        &self,
        access_token: Option<&str>,
        plan_id: &str,
    ) -> UseCaseResult<CheckoutOutcome> {
        if plan_id.trim().is_empty() {
            warn!("payments: checkout requested without plan id");
            return Err(PaymentError::BadRequest("Plan ID is required"));
        }

        let caller = resolve_caller(self.identity.as_ref(), access_token)
            .await
            .ok_or_else(|| {
                let err = PaymentError::Unauthorized;
                warn!(
                    plan_id,
                    status = err.status_code().as_u16(),
                    "payments: checkout requested without valid identity"
                );
                err
            })?;

        info!(
            user_id = %caller.user_id,
            plan_id,
            "payments: checkout requested"
        );

        self.create_checkout(plan_id, caller.email).await
    }

    pub async fn create_checkout(
        &self,
        plan_id: &str,
        user_email: Option<String>,
    ) -> UseCaseResult<CheckoutOutcome> {
        let plan = plans::find_plan(plan_id).ok_or_else(|| {
            let err = PaymentError::PlanNotFound(plan_id.to_string());
            warn!(
                plan_id,
                status = err.status_code().as_u16(),
                "payments: checkout for unknown plan"
            );
            err
        })?;

        if plan.is_free() {
            info!(plan_id, "payments: free plan activated without checkout");
            return Ok(CheckoutOutcome::free_plan_activated());
        }

        let metadata = HashMap::from([
            ("plan_id".to_string(), plan.id.to_string()),
            ("plan_name".to_string(), plan.name.to_string()),
            ("interval".to_string(), plan.interval.to_string()),
        ]);

        let session = self
            .gateway
            .create_checkout(plan.id, user_email, metadata)
            .await
            .map_err(|err| {
                error!(
                    plan_id,
                    error = ?err,
                    "payments: creem checkout creation failed"
                );
                PaymentError::UpstreamFailure(err)
            })?;

        info!(
            plan_id,
            session_id = %session.id,
            checkout_url = ?session.checkout_url,
            "payments: checkout session created"
        );

        Ok(CheckoutOutcome::Session(session))
    }

    pub async fn verify_payment(
        &self,
        access_token: Option<&str>,
        session_id: &str,
        plan_id: &str,
    ) -> UseCaseResult<VerifyPaymentResult> {
        let caller = resolve_caller(self.identity.as_ref(), access_token)
            .await
            .ok_or_else(|| {
                let err = PaymentError::Unauthorized;
                warn!(
                    session_id,
                    status = err.status_code().as_u16(),
                    "payments: verify requested without valid identity"
                );
                err
            })?;
        let user_id = caller.user_id;

        if session_id.trim().is_empty() || plan_id.trim().is_empty() {
            warn!(%user_id, "payments: verify requested without session or plan id");
            return Err(PaymentError::BadRequest(
                "Session ID and Plan ID are required",
            ));
        }

        let session = self
            .gateway
            .retrieve_checkout(session_id)
            .await
            .map_err(|err| {
                error!(
                    %user_id,
                    session_id,
                    error = ?err,
                    "payments: failed to retrieve checkout from creem"
                );
                PaymentError::UpstreamFailure(err)
            })?;

        let status = CheckoutStatus::from_str(session.status.as_deref().unwrap_or_default());
        if !status.is_completed() {
            let err = PaymentError::PaymentNotCompleted;
            warn!(
                %user_id,
                session_id,
                checkout_status = %status,
                status = err.status_code().as_u16(),
                "payments: checkout not completed"
            );
            return Err(err);
        }

        if let Some(paid_plan_id) = session.metadata_str("plan_id") {
            if paid_plan_id != plan_id {
                warn!(
                    %user_id,
                    session_id,
                    requested_plan_id = plan_id,
                    paid_plan_id,
                    "payments: verified plan differs from the plan the checkout was created for"
                );
            }
        }

        let plan = plans::find_plan(plan_id);
        match plan {
            Some(plan) => {
                let subscription =
                    UpsertSubscriptionEntity::active(user_id, plan, Some(session_id.to_string()));

                if let Err(err) = self.subscription_repo.upsert_subscription(subscription).await {
                    let warning = PaymentError::PersistenceWarning(err);
                    error!(
                        %user_id,
                        plan_id,
                        session_id,
                        error = ?warning,
                        "payments: payment verified but subscription write failed"
                    );
                } else {
                    info!(
                        %user_id,
                        plan_id,
                        session_id,
                        "payments: subscription activated from verified payment"
                    );
                }
            }
            None => {
                warn!(
                    %user_id,
                    plan_id,
                    session_id,
                    "payments: payment verified for unknown plan, nothing stored"
                );
            }
        }

        Ok(VerifyPaymentResult {
            success: true,
            message: "Payment verified successfully",
            plan,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{auth::AuthUser, usecases::identity::MockIdentityProvider};
    use crates::domain::{
        repositories::subscriptions::MockSubscriptionRepository,
        value_objects::plans::FREE_PLAN_ID,
    };
    use serde_json::{Map, json};
    use uuid::Uuid;

    fn session(status: &str) -> CreemCheckoutSession {
        CreemCheckoutSession {
            id: "ch_test".to_string(),
            status: Some(status.to_string()),
            checkout_url: Some("https://checkout.creem.io/ch_test".to_string()),
            extra: Map::new(),
        }
    }

    fn signed_in(user_id: Uuid) -> MockIdentityProvider {
        let mut identity = MockIdentityProvider::new();
        identity.expect_get_user().returning(move |_| {
            Ok(AuthUser {
                user_id,
                email: Some("buyer@example.com".to_string()),
                role: "authenticated".to_string(),
            })
        });
        identity
    }

    fn signed_out() -> MockIdentityProvider {
        let mut identity = MockIdentityProvider::new();
        identity
            .expect_get_user()
            .returning(|_| Err(anyhow::anyhow!("JWT validation failed")));
        identity
    }

    fn usecase(
        gateway: MockPaymentGateway,
        subscription_repo: MockSubscriptionRepository,
        identity: MockIdentityProvider,
    ) -> PaymentUseCase<MockPaymentGateway, MockSubscriptionRepository, MockIdentityProvider> {
        PaymentUseCase::new(
            Arc::new(gateway),
            Arc::new(subscription_repo),
            Arc::new(identity),
        )
    }

    #[tokio::test]
    async fn unknown_plan_is_not_found() {
        let mut gateway = MockPaymentGateway::new();
        gateway.expect_create_checkout().never();

        let usecase = usecase(gateway, MockSubscriptionRepository::new(), signed_out());

        let err = usecase
            .create_checkout("platinum", Some("buyer@example.com".to_string()))
            .await
            .unwrap_err();

        assert!(matches!(err, PaymentError::PlanNotFound(ref id) if id == "platinum"));
        assert_eq!(err.status_code().as_u16(), 404);
    }

    #[tokio::test]
    async fn free_plan_skips_gateway() {
        let mut gateway = MockPaymentGateway::new();
        gateway.expect_create_checkout().never();

        let usecase = usecase(gateway, MockSubscriptionRepository::new(), signed_out());

        let outcome = usecase.create_checkout(FREE_PLAN_ID, None).await.unwrap();

        assert_eq!(
            serde_json::to_value(&outcome).unwrap(),
            json!({ "success": true, "message": "Free plan activated" })
        );
    }

    #[tokio::test]
    async fn paid_plan_passes_plan_metadata_to_gateway() {
        let mut gateway = MockPaymentGateway::new();
        gateway
            .expect_create_checkout()
            .withf(|product_id, email, metadata| {
                product_id == "pro"
                    && email.as_deref() == Some("buyer@example.com")
                    && metadata.get("plan_id").map(String::as_str) == Some("pro")
                    && metadata.get("plan_name").map(String::as_str) == Some("Pro")
                    && metadata.get("interval").map(String::as_str) == Some("month")
            })
            .times(1)
            .returning(|_, _, _| Ok(session("pending")));

        let usecase = usecase(gateway, MockSubscriptionRepository::new(), signed_out());

        let outcome = usecase
            .create_checkout("pro", Some("buyer@example.com".to_string()))
            .await
            .unwrap();

        assert_eq!(outcome, CheckoutOutcome::Session(session("pending")));
    }

    #[tokio::test]
    async fn gateway_failure_is_upstream_failure() {
        let mut gateway = MockPaymentGateway::new();
        gateway
            .expect_create_checkout()
            .returning(|_, _, _| Err(anyhow::anyhow!("status 502")));

        let usecase = usecase(gateway, MockSubscriptionRepository::new(), signed_out());

        let err = usecase.create_checkout("enterprise", None).await.unwrap_err();

        assert!(matches!(err, PaymentError::UpstreamFailure(_)));
        assert_eq!(err.to_string(), "payment provider request failed");
    }

    #[tokio::test]
    async fn checkout_for_caller_requires_identity() {
        let mut gateway = MockPaymentGateway::new();
        gateway.expect_create_checkout().never();

        let usecase = usecase(gateway, MockSubscriptionRepository::new(), signed_out());

        let err = usecase
            .checkout_for_caller(Some("bad-token"), "pro")
            .await
            .unwrap_err();
        assert!(matches!(err, PaymentError::Unauthorized));
    }

    #[tokio::test]
    async fn checkout_for_caller_rejects_blank_plan() {
        let usecase = usecase(
            MockPaymentGateway::new(),
            MockSubscriptionRepository::new(),
            signed_out(),
        );

        let err = usecase.checkout_for_caller(None, "  ").await.unwrap_err();
        assert!(matches!(err, PaymentError::BadRequest(_)));
    }

    #[tokio::test]
    async fn verify_payment_unauthenticated_is_unauthorized() {
        let mut gateway = MockPaymentGateway::new();
        gateway.expect_retrieve_checkout().never();
        let mut subscription_repo = MockSubscriptionRepository::new();
        subscription_repo.expect_upsert_subscription().never();

        let usecase = usecase(gateway, subscription_repo, signed_out());

        for token in [None, Some("expired-token")] {
            let err = usecase
                .verify_payment(token, "ch_test", "pro")
                .await
                .unwrap_err();
            assert!(matches!(err, PaymentError::Unauthorized));
        }
    }

    #[tokio::test]
    async fn verify_payment_identity_is_checked_before_input() {
        let mut gateway = MockPaymentGateway::new();
        gateway.expect_retrieve_checkout().never();

        let usecase = usecase(gateway, MockSubscriptionRepository::new(), signed_out());

        for (session_id, plan_id) in [("", "pro"), ("ch_test", ""), ("", "")] {
            let err = usecase
                .verify_payment(None, session_id, plan_id)
                .await
                .unwrap_err();
            assert!(matches!(err, PaymentError::Unauthorized));
        }
    }

    #[tokio::test]
    async fn verify_payment_blank_ids_after_sign_in_is_bad_request() {
        let mut gateway = MockPaymentGateway::new();
        gateway.expect_retrieve_checkout().never();

        let usecase = usecase(
            gateway,
            MockSubscriptionRepository::new(),
            signed_in(Uuid::new_v4()),
        );

        let err = usecase
            .verify_payment(Some("token"), "", "pro")
            .await
            .unwrap_err();
        assert_eq!(err.status_code().as_u16(), 400);
    }

    #[tokio::test]
    async fn verify_payment_incomplete_session_never_writes() {
        let mut gateway = MockPaymentGateway::new();
        gateway
            .expect_retrieve_checkout()
            .returning(|_| Ok(session("pending")));
        let mut subscription_repo = MockSubscriptionRepository::new();
        subscription_repo.expect_upsert_subscription().never();

        let usecase = usecase(gateway, subscription_repo, signed_in(Uuid::new_v4()));

        let err = usecase
            .verify_payment(Some("token"), "ch_test", "pro")
            .await
            .unwrap_err();

        assert!(matches!(err, PaymentError::PaymentNotCompleted));
        assert_eq!(err.to_string(), "Payment not completed");
        assert_eq!(err.status_code().as_u16(), 400);
    }

    #[tokio::test]
    async fn verify_payment_upserts_for_authenticated_user() {
        let user_id = Uuid::new_v4();
        let mut gateway = MockPaymentGateway::new();
        gateway
            .expect_retrieve_checkout()
            .withf(|id| id == "ch_test")
            .returning(|_| Ok(session("completed")));
        let mut subscription_repo = MockSubscriptionRepository::new();
        subscription_repo
            .expect_upsert_subscription()
            .withf(move |row| {
                row.user_id == user_id
                    && row.plan_id == "pro"
                    && row.plan_name == "Pro"
                    && row.status == "active"
                    && row.payment_session_id.as_deref() == Some("ch_test")
            })
            .times(1)
            .returning(|_| Ok(()));

        let usecase = usecase(gateway, subscription_repo, signed_in(user_id));

        let result = usecase
            .verify_payment(Some("token"), "ch_test", "pro")
            .await
            .unwrap();

        assert!(result.success);
        assert_eq!(result.plan.map(|plan| plan.id), Some("pro"));
    }

    #[tokio::test]
    async fn verify_payment_write_failure_still_succeeds() {
        let mut gateway = MockPaymentGateway::new();
        gateway
            .expect_retrieve_checkout()
            .returning(|_| Ok(session("completed")));
        let mut subscription_repo = MockSubscriptionRepository::new();
        subscription_repo
            .expect_upsert_subscription()
            .returning(|_| Err(anyhow::anyhow!("connection reset")));

        let usecase = usecase(gateway, subscription_repo, signed_in(Uuid::new_v4()));

        let result = usecase
            .verify_payment(Some("token"), "ch_test", "enterprise")
            .await
            .unwrap();

        assert_eq!(result.message, "Payment verified successfully");
    }

    #[tokio::test]
    async fn verify_payment_plan_mismatch_keeps_requested_plan() {
        let mut gateway = MockPaymentGateway::new();
        gateway.expect_retrieve_checkout().returning(|_| {
            let mut paid = session("completed");
            paid.extra
                .insert("metadata".to_string(), json!({ "plan_id": "pro" }));
            Ok(paid)
        });
        let mut subscription_repo = MockSubscriptionRepository::new();
        subscription_repo
            .expect_upsert_subscription()
            .withf(|row| row.plan_id == "enterprise")
            .times(1)
            .returning(|_| Ok(()));

        let usecase = usecase(gateway, subscription_repo, signed_in(Uuid::new_v4()));

        let result = usecase
            .verify_payment(Some("token"), "ch_test", "enterprise")
            .await
            .unwrap();

        assert_eq!(result.plan.map(|plan| plan.id), Some("enterprise"));
    }

    #[tokio::test]
    async fn verify_payment_unknown_plan_returns_null_plan() {
        let mut gateway = MockPaymentGateway::new();
        gateway
            .expect_retrieve_checkout()
            .returning(|_| Ok(session("completed")));
        let mut subscription_repo = MockSubscriptionRepository::new();
        subscription_repo.expect_upsert_subscription().never();

        let usecase = usecase(gateway, subscription_repo, signed_in(Uuid::new_v4()));

        let result = usecase
            .verify_payment(Some("token"), "ch_test", "legacy")
            .await
            .unwrap();

        assert_eq!(serde_json::to_value(&result).unwrap()["plan"], json!(null));
    }
}
