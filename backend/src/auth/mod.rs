use std::convert::Infallible;

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use axum_extra::{
    TypedHeader,
    extract::CookieJar,
    headers::{Authorization, authorization::Bearer},
};
use serde::Serialize;
use uuid::Uuid;

/// Cookie the Supabase browser client stores the session JWT in.
pub const ACCESS_TOKEN_COOKIE: &str = "sb-access-token";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthUser {
    #[serde(rename = "id")]
    pub user_id: Uuid,
    pub email: Option<String>,
    pub role: String,
}

/// Raw access token sent by the caller, if any. Verification is left to the
/// identity provider so handlers can decide how a missing identity is reported.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessToken(pub Option<String>);

impl AccessToken {
    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AccessToken
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        // 1. "Authorization: Bearer <token>"
        if let Ok(TypedHeader(Authorization(bearer))) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state).await
        {
            return Ok(AccessToken(Some(bearer.token().to_string())));
        }

        // 2. Session cookie
        let jar = CookieJar::from_headers(&parts.headers);
        let token = jar
            .get(ACCESS_TOKEN_COOKIE)
            .map(|cookie| cookie.value().to_string())
            .filter(|value| !value.is_empty());

        Ok(AccessToken(token))
    }
}

#[cfg(test)]
mod tests;
