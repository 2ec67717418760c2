use std::sync::Arc;

use anyhow::Result as AnyResult;
use async_trait::async_trait;
use crates::inference::openrouter_client::OpenRouterClient;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{error, info};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ImageEditGateway: Send + Sync {
    async fn edit_image(&self, image: &str, prompt: &str) -> AnyResult<Value>;
}

#[async_trait]
impl ImageEditGateway for OpenRouterClient {
    async fn edit_image(&self, image: &str, prompt: &str) -> AnyResult<Value> {
        self.complete_with_image(image, prompt).await
    }
}

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("Image and prompt are required")]
    BadRequest,
    #[error("inference provider request failed")]
    UpstreamFailure(#[source] anyhow::Error),
}

impl GenerateError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            GenerateError::BadRequest => StatusCode::BAD_REQUEST,
            GenerateError::UpstreamFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type UseCaseResult<T> = std::result::Result<T, GenerateError>;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResult {
    /// The submitted image, echoed back. The model only answers with content parts.
    pub image_url: String,
    pub response: Value,
}

pub struct GenerateUseCase<E>
where
    E: ImageEditGateway + 'static,
{
    gateway: Arc<E>,
}

impl<E> GenerateUseCase<E>
where
    E: ImageEditGateway + 'static,
{
    pub fn new(gateway: Arc<E>) -> Self {
        Self { gateway }
    }

    pub async fn generate(&self, image: &str, prompt: &str) -> UseCaseResult<GenerateResult> {
        if image.trim().is_empty() || prompt.trim().is_empty() {
            return Err(GenerateError::BadRequest);
        }

        let response = self.gateway.edit_image(image, prompt).await.map_err(|err| {
            error!(
                error = ?err,
                prompt_len = prompt.len(),
                "generate: inference request failed"
            );
            GenerateError::UpstreamFailure(err)
        })?;

        info!(prompt_len = prompt.len(), "generate: inference completed");

        Ok(GenerateResult {
            image_url: image.to_string(),
            response,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const IMAGE: &str = "data:image/png;base64,iVBORw0KGgo=";

    #[tokio::test]
    async fn blank_inputs_never_reach_provider() {
        let mut gateway = MockImageEditGateway::new();
        gateway.expect_edit_image().never();

        let usecase = GenerateUseCase::new(Arc::new(gateway));

        for (image, prompt) in [("", "make it pop"), (IMAGE, ""), (IMAGE, "   ")] {
            let err = usecase.generate(image, prompt).await.unwrap_err();
            assert!(matches!(err, GenerateError::BadRequest));
        }
    }

    #[tokio::test]
    async fn returns_input_image_with_raw_model_content() {
        let mut gateway = MockImageEditGateway::new();
        gateway
            .expect_edit_image()
            .withf(|image, prompt| image == IMAGE && prompt == "add a hat")
            .times(1)
            .returning(|_, _| Ok(json!("A cat wearing a hat.")));

        let usecase = GenerateUseCase::new(Arc::new(gateway));

        let result = usecase.generate(IMAGE, "add a hat").await.unwrap();

        assert_eq!(result.image_url, IMAGE);
        assert_eq!(result.response, json!("A cat wearing a hat."));
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({ "imageUrl": IMAGE, "response": "A cat wearing a hat." })
        );
    }

    #[tokio::test]
    async fn provider_failure_is_upstream() {
        let mut gateway = MockImageEditGateway::new();
        gateway
            .expect_edit_image()
            .returning(|_, _| Err(anyhow::anyhow!("OpenRouter request failed (status 429)")));

        let usecase = GenerateUseCase::new(Arc::new(gateway));

        let err = usecase.generate(IMAGE, "add a hat").await.unwrap_err();
        assert_eq!(err.status_code().as_u16(), 500);
    }
}
