use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::HeaderMap,
    routing::post,
};
use crates::{
    domain::repositories::{subscriptions::SubscriptionRepository, users::UserRepository},
    infra::db::{
        postgres::postgres_connection::PgPoolSquad,
        repositories::{subscriptions::SubscriptionPostgres, users::UserPostgres},
    },
    payments::creem_client::{CreemClient, SIGNATURE_HEADER},
};
use serde::Serialize;
use tracing::debug;

use crate::{
    axum_http::error_responses::AppError,
    config::config_model::Creem as CreemConfig,
    usecases::{payments::PaymentGateway, webhooks::WebhookUseCase},
};

#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub received: bool,
}

pub fn routes(db_pool: Arc<PgPoolSquad>, creem: &CreemConfig) -> Router {
    let creem_client = CreemClient::new(
        creem.api_key.clone(),
        creem.api_base_url.clone(),
        creem.webhook_secret.clone(),
        creem.success_url.clone(),
    );
    let subscription_repository = SubscriptionPostgres::new(Arc::clone(&db_pool));
    let user_repository = UserPostgres::new(Arc::clone(&db_pool));

    let usecase = WebhookUseCase::new(
        Arc::new(creem_client),
        Arc::new(subscription_repository),
        Arc::new(user_repository),
    );

    router(Arc::new(usecase))
}

pub fn router<G, S, U>(usecase: Arc<WebhookUseCase<G, S, U>>) -> Router
where
    G: PaymentGateway + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
{
    Router::new()
        .route("/creem", post(creem_webhook::<G, S, U>))
        .with_state(usecase)
}

/// Signature is checked against the exact bytes received, so the body is taken raw.
pub async fn creem_webhook<G, S, U>(
    State(usecase): State<Arc<WebhookUseCase<G, S, U>>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>, AppError>
where
    G: PaymentGateway + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
{
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());

    let outcome = usecase.handle(&body, signature).await?;
    debug!(?outcome, "webhooks: creem delivery acknowledged");

    Ok(Json(WebhookAck { received: true }))
}
