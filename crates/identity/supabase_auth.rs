use anyhow::{Context, Result};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use reqwest::header::AUTHORIZATION;
use serde::{Deserialize, Serialize};
use tracing::error;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize)]
pub struct SupabaseClaims {
    pub sub: String,
    pub role: String,
    pub email: Option<String>,
    pub aud: Option<String>,
    pub exp: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupabaseUser {
    pub id: Uuid,
    pub email: Option<String>,
    pub role: String,
}

pub fn validate_supabase_jwt(token: &str, jwt_secret: &str) -> Result<SupabaseClaims> {
    let decoding_key = DecodingKey::from_secret(jwt_secret.as_bytes());
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&["authenticated", "service_role"]);

    let token_data = decode::<SupabaseClaims>(token, &decoding_key, &validation)
        .map_err(|e| anyhow::anyhow!("JWT validation failed: {}", e))?;

    Ok(token_data.claims)
}

/// Supabase Auth adapter. Access tokens are verified locally against the project's
/// JWT secret; sign-out revokes the session server-side.
pub struct SupabaseAuthClient {
    http: reqwest::Client,
    project_url: String,
    anon_key: String,
    jwt_secret: String,
}

impl SupabaseAuthClient {
    pub fn new(project_url: String, anon_key: String, jwt_secret: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            project_url: project_url.trim_end_matches('/').to_string(),
            anon_key,
            jwt_secret,
        }
    }

    pub fn user_from_token(&self, access_token: &str) -> Result<SupabaseUser> {
        let claims = validate_supabase_jwt(access_token, &self.jwt_secret)?;
        let id = Uuid::parse_str(&claims.sub).context("Invalid user ID in token")?;

        Ok(SupabaseUser {
            id,
            email: claims.email,
            role: claims.role,
        })
    }

    /// Revokes the refresh tokens behind `access_token`.
    pub async fn sign_out(&self, access_token: &str) -> Result<()> {
        // https://supabase.com/docs/reference/api/logout
        let resp = self
            .http
            .post(format!("{}/auth/v1/logout", self.project_url))
            .header("apikey", &self.anon_key)
            .header(AUTHORIZATION, format!("Bearer {}", access_token))
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            error!(
                status = %status,
                response_body = %body,
                "supabase logout request failed"
            );
            anyhow::bail!("Supabase logout failed (status {})", status);
        }

        Ok(())
    }
}
