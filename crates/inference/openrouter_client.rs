use anyhow::{Context, Result};
use reqwest::header::AUTHORIZATION;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::error;

/// OpenAI-compatible chat completions client pointed at OpenRouter.
pub struct OpenRouterClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    site_url: String,
    site_title: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Value,
}

impl OpenRouterClient {
    pub fn new(
        api_key: String,
        base_url: String,
        model: String,
        site_url: String,
        site_title: String,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            site_url,
            site_title,
        }
    }

    fn request_body(&self, image: &str, prompt: &str) -> Value {
        json!({
            "model": self.model,
            "messages": [
                {
                    "role": "user",
                    "content": [
                        { "type": "text", "text": prompt },
                        { "type": "image_url", "image_url": { "url": image } }
                    ]
                }
            ]
        })
    }

    /// Sends one image-conditioned chat completion and returns the first choice's
    /// message content untouched (string, content-part array or null).
    pub async fn complete_with_image(&self, image: &str, prompt: &str) -> Result<Value> {
        let resp = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .header("HTTP-Referer", &self.site_url)
            .header("X-Title", &self.site_title)
            .json(&self.request_body(image, prompt))
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            error!(
                status = %status,
                model = %self.model,
                response_body = %body,
                "openrouter chat completion failed"
            );
            anyhow::bail!("OpenRouter request failed (status {})", status);
        }

        let completion: ChatCompletion = resp
            .json()
            .await
            .context("failed to decode openrouter completion")?;

        completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| anyhow::anyhow!("OpenRouter completion has no choices"))
    }
}
