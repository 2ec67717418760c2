use std::collections::HashMap;

use anyhow::{Context, Result};
use hmac::{Hmac, Mac};
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::Sha256;
use tracing::error;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the hex HMAC-SHA256 of the raw webhook body.
pub const SIGNATURE_HEADER: &str = "creem-signature";

const API_KEY_HEADER: &str = "x-api-key";

/// Minimal Creem client built on reqwest.
pub struct CreemClient {
    http: reqwest::Client,
    api_key: String,
    api_base_url: String,
    webhook_secret: String,
    success_url: Option<String>,
}

/// Checkout session as returned by Creem. Only the fields this service reads are
/// typed; everything else is kept in `extra` so the descriptor can be relayed as-is.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreemCheckoutSession {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkout_url: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CreemCheckoutSession {
    /// Reads a string the checkout was created with from its `metadata` object.
    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.extra
            .get("metadata")
            .and_then(|metadata| metadata.get(key))
            .and_then(Value::as_str)
            .filter(|value| !value.is_empty())
    }
}

#[derive(Debug, Serialize)]
struct CreateCheckoutBody<'a> {
    product_id: &'a str,
    units: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    customer: Option<CheckoutCustomer<'a>>,
    metadata: &'a HashMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    success_url: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct CheckoutCustomer<'a> {
    email: &'a str,
}

#[derive(Debug, Deserialize)]
struct CreemErrorBody {
    #[serde(default)]
    trace_id: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<Value>,
}

impl CreemClient {
    pub fn new(
        api_key: String,
        api_base_url: String,
        webhook_secret: String,
        success_url: Option<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            webhook_secret,
            success_url,
        }
    }

    async fn ensure_success(
        resp: reqwest::Response,
        context: &str,
    ) -> Result<reqwest::Response> {
        if resp.status().is_success() {
            return Ok(resp);
        }

        let status = resp.status();
        let body = match resp.text().await {
            Ok(text) if !text.is_empty() => text,
            Ok(_) => "<empty response body>".to_string(),
            Err(err) => format!("<failed to read response body: {err}>"),
        };

        let (trace_id, creem_error, creem_message) =
            match serde_json::from_str::<CreemErrorBody>(&body) {
                Ok(parsed) => (parsed.trace_id, parsed.error, parsed.message),
                Err(_) => (None, None, None),
            };

        error!(
            status = %status,
            creem_trace_id = ?trace_id,
            creem_error = ?creem_error,
            creem_message = ?creem_message,
            response_body = %body,
            context = %context,
            "creem api request failed"
        );

        anyhow::bail!(
            "Creem API request failed: {} (status {}, trace_id={:?})",
            context,
            status,
            trace_id
        );
    }

    /// Creates a checkout session for one unit of `product_id`.
    pub async fn create_checkout(
        &self,
        product_id: &str,
        customer_email: Option<&str>,
        metadata: &HashMap<String, String>,
    ) -> Result<CreemCheckoutSession> {
        // https://docs.creem.io/api-reference/endpoint/create-checkout
        let body = CreateCheckoutBody {
            product_id,
            units: 1,
            customer: customer_email.map(|email| CheckoutCustomer { email }),
            metadata,
            success_url: self.success_url.as_deref(),
        };

        let resp = self
            .http
            .post(format!("{}/v1/checkouts", self.api_base_url))
            .header(API_KEY_HEADER, &self.api_key)
            .header(CONTENT_TYPE, "application/json")
            .json(&body)
            .send()
            .await?;
        let resp = Self::ensure_success(resp, "create checkout").await?;

        let session: CreemCheckoutSession = resp
            .json()
            .await
            .context("failed to decode creem checkout session")?;
        Ok(session)
    }

    pub async fn retrieve_checkout(&self, checkout_id: &str) -> Result<CreemCheckoutSession> {
        // https://docs.creem.io/api-reference/endpoint/get-checkout
        let resp = self
            .http
            .get(format!("{}/v1/checkouts", self.api_base_url))
            .header(API_KEY_HEADER, &self.api_key)
            .query(&[("checkout_id", checkout_id)])
            .send()
            .await?;
        let resp = Self::ensure_success(resp, "retrieve checkout").await?;

        let session: CreemCheckoutSession = resp
            .json()
            .await
            .context("failed to decode creem checkout session")?;
        Ok(session)
    }

    /// Checks `signature` (hex) against the HMAC-SHA256 of the raw body.
    pub fn verify_webhook_signature(&self, payload: &[u8], signature: &str) -> Result<()> {
        let provided =
            hex::decode(signature.trim()).context("creem-signature is not valid hex")?;

        let mut mac = HmacSha256::new_from_slice(self.webhook_secret.as_bytes())?;
        mac.update(payload);
        mac.verify_slice(&provided)
            .map_err(|_| anyhow::anyhow!("invalid webhook signature"))
    }
}
