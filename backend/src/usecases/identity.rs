use std::sync::Arc;

use anyhow::Result as AnyResult;
use async_trait::async_trait;
use crates::identity::supabase_auth::SupabaseAuthClient;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::auth::AuthUser;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Resolves the user behind `access_token`; any error means "not signed in".
    async fn get_user(&self, access_token: &str) -> AnyResult<AuthUser>;

    async fn sign_out(&self, access_token: &str) -> AnyResult<()>;
}

#[async_trait]
impl IdentityProvider for SupabaseAuthClient {
    async fn get_user(&self, access_token: &str) -> AnyResult<AuthUser> {
        let user = self.user_from_token(access_token)?;
        Ok(AuthUser {
            user_id: user.id,
            email: user.email,
            role: user.role,
        })
    }

    async fn sign_out(&self, access_token: &str) -> AnyResult<()> {
        SupabaseAuthClient::sign_out(self, access_token).await
    }
}

/// Returns the caller's identity, or `None` when no token was sent or the
/// provider rejects it.
pub async fn resolve_caller<I>(identity: &I, access_token: Option<&str>) -> Option<AuthUser>
where
    I: IdentityProvider + ?Sized,
{
    let Some(token) = access_token else {
        debug!("identity: no access token on request");
        return None;
    };

    match identity.get_user(token).await {
        Ok(user) => Some(user),
        Err(err) => {
            debug!(error = %err, "identity: access token rejected");
            None
        }
    }
}

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Authentication required")]
    Unauthorized,
    #[error("identity provider request failed")]
    UpstreamFailure(#[source] anyhow::Error),
}

impl IdentityError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            IdentityError::Unauthorized => StatusCode::UNAUTHORIZED,
            IdentityError::UpstreamFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type UseCaseResult<T> = std::result::Result<T, IdentityError>;

pub struct IdentityUseCase<I>
where
    I: IdentityProvider + 'static,
{
    identity: Arc<I>,
}

impl<I> IdentityUseCase<I>
where
    I: IdentityProvider + 'static,
{
    pub fn new(identity: Arc<I>) -> Self {
        Self { identity }
    }

    pub async fn current_user(&self, access_token: Option<&str>) -> UseCaseResult<AuthUser> {
        resolve_caller(self.identity.as_ref(), access_token)
            .await
            .ok_or(IdentityError::Unauthorized)
    }

    pub async fn sign_out(&self, access_token: Option<&str>) -> UseCaseResult<()> {
        let token = access_token.ok_or(IdentityError::Unauthorized)?;
        let user = self.current_user(Some(token)).await?;

        self.identity.sign_out(token).await.map_err(|err| {
            error!(
                user_id = %user.user_id,
                error = ?err,
                "identity: sign out failed at provider"
            );
            IdentityError::UpstreamFailure(err)
        })?;

        info!(user_id = %user.user_id, "identity: user signed out");
        Ok(())
    }
}
