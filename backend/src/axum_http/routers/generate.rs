use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    routing::post,
};
use crates::inference::openrouter_client::OpenRouterClient;
use serde::Deserialize;

use crate::{
    axum_http::error_responses::AppError,
    config::config_model::OpenRouter as OpenRouterConfig,
    usecases::generate::{GenerateResult, GenerateUseCase, ImageEditGateway},
};

#[derive(Debug, Default, Deserialize)]
pub struct GenerateRequest {
    /// Data URL or public URL of the source image.
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub prompt: Option<String>,
}

pub fn routes(openrouter: &OpenRouterConfig) -> Router {
    let openrouter_client = OpenRouterClient::new(
        openrouter.api_key.clone(),
        openrouter.base_url.clone(),
        openrouter.model.clone(),
        openrouter.site_url.clone(),
        openrouter.site_title.clone(),
    );

    router(Arc::new(GenerateUseCase::new(Arc::new(openrouter_client))))
}

pub fn router<E>(usecase: Arc<GenerateUseCase<E>>) -> Router
where
    E: ImageEditGateway + 'static,
{
    Router::new()
        .route("/generate", post(generate::<E>))
        .with_state(usecase)
}

pub async fn generate<E>(
    State(usecase): State<Arc<GenerateUseCase<E>>>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<Json<GenerateResult>, AppError>
where
    E: ImageEditGateway + 'static,
{
    let Json(request) = payload?;
    let image = request.image.unwrap_or_default();
    let prompt = request.prompt.unwrap_or_default();

    let result = usecase.generate(&image, &prompt).await?;

    Ok(Json(result))
}
