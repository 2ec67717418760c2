use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    routing::{get, post},
};
use crates::{
    domain::{
        repositories::subscriptions::SubscriptionRepository, value_objects::plans::Plan,
    },
    identity::supabase_auth::SupabaseAuthClient,
    infra::db::{
        postgres::postgres_connection::PgPoolSquad,
        repositories::subscriptions::SubscriptionPostgres,
    },
    payments::creem_client::CreemClient,
};
use serde::Deserialize;

use crate::{
    auth::AccessToken,
    axum_http::error_responses::AppError,
    config::config_model::{Creem as CreemConfig, Supabase as SupabaseConfig},
    usecases::{
        identity::IdentityProvider,
        payments::{CheckoutOutcome, PaymentGateway, PaymentUseCase, VerifyPaymentResult},
    },
};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    #[serde(default)]
    pub plan_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPaymentRequest {
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub plan_id: Option<String>,
}

pub fn routes(
    db_pool: Arc<PgPoolSquad>,
    creem: &CreemConfig,
    supabase: &SupabaseConfig,
) -> Router {
    let creem_client = CreemClient::new(
        creem.api_key.clone(),
        creem.api_base_url.clone(),
        creem.webhook_secret.clone(),
        creem.success_url.clone(),
    );
    let supabase_client = SupabaseAuthClient::new(
        supabase.project_url.clone(),
        supabase.anon_key.clone(),
        supabase.jwt_secret.clone(),
    );
    let subscription_repository = SubscriptionPostgres::new(Arc::clone(&db_pool));

    let usecase = PaymentUseCase::new(
        Arc::new(creem_client),
        Arc::new(subscription_repository),
        Arc::new(supabase_client),
    );

    router(Arc::new(usecase))
}

pub fn router<G, S, I>(usecase: Arc<PaymentUseCase<G, S, I>>) -> Router
where
    G: PaymentGateway + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    I: IdentityProvider + 'static,
{
    Router::new()
        .route("/plans", get(list_plans::<G, S, I>))
        .route("/checkout", post(checkout::<G, S, I>))
        .route("/verify-payment", post(verify_payment::<G, S, I>))
        .with_state(usecase)
}

pub async fn list_plans<G, S, I>(
    State(usecase): State<Arc<PaymentUseCase<G, S, I>>>,
) -> Json<&'static [Plan]>
where
    G: PaymentGateway + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    I: IdentityProvider + 'static,
{
    Json(usecase.list_plans())
}

pub async fn checkout<G, S, I>(
    State(usecase): State<Arc<PaymentUseCase<G, S, I>>>,
    access_token: AccessToken,
    payload: Result<Json<CheckoutRequest>, JsonRejection>,
) -> Result<Json<CheckoutOutcome>, AppError>
where
    G: PaymentGateway + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    I: IdentityProvider + 'static,
{
    let Json(request) = payload?;
    let plan_id = request.plan_id.unwrap_or_default();

    let outcome = usecase
        .checkout_for_caller(access_token.as_deref(), &plan_id)
        .await?;

    Ok(Json(outcome))
}

pub async fn verify_payment<G, S, I>(
    State(usecase): State<Arc<PaymentUseCase<G, S, I>>>,
    access_token: AccessToken,
    payload: Result<Json<VerifyPaymentRequest>, JsonRejection>,
) -> Result<Json<VerifyPaymentResult>, AppError>
where
    G: PaymentGateway + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    I: IdentityProvider + 'static,
{
    let Json(request) = payload?;
    let session_id = request.session_id.unwrap_or_default();
    let plan_id = request.plan_id.unwrap_or_default();

    let result = usecase
        .verify_payment(access_token.as_deref(), &session_id, &plan_id)
        .await?;

    Ok(Json(result))
}
