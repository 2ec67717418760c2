use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use crates::identity::supabase_auth::SupabaseAuthClient;
use serde::Serialize;

use crate::{
    auth::{AccessToken, AuthUser},
    axum_http::error_responses::AppError,
    config::config_model::Supabase as SupabaseConfig,
    usecases::identity::{IdentityProvider, IdentityUseCase},
};

#[derive(Debug, Serialize)]
pub struct SignOutResponse {
    pub success: bool,
}

pub fn routes(supabase: &SupabaseConfig) -> Router {
    let supabase_client = SupabaseAuthClient::new(
        supabase.project_url.clone(),
        supabase.anon_key.clone(),
        supabase.jwt_secret.clone(),
    );

    router(Arc::new(IdentityUseCase::new(Arc::new(supabase_client))))
}

pub fn router<I>(usecase: Arc<IdentityUseCase<I>>) -> Router
where
    I: IdentityProvider + 'static,
{
    Router::new()
        .route("/me", get(me::<I>))
        .route("/sign-out", post(sign_out::<I>))
        .with_state(usecase)
}

pub async fn me<I>(
    State(usecase): State<Arc<IdentityUseCase<I>>>,
    access_token: AccessToken,
) -> Result<Json<AuthUser>, AppError>
where
    I: IdentityProvider + 'static,
{
    let user = usecase.current_user(access_token.as_deref()).await?;
    Ok(Json(user))
}

pub async fn sign_out<I>(
    State(usecase): State<Arc<IdentityUseCase<I>>>,
    access_token: AccessToken,
) -> Result<Json<SignOutResponse>, AppError>
where
    I: IdentityProvider + 'static,
{
    usecase.sign_out(access_token.as_deref()).await?;
    Ok(Json(SignOutResponse { success: true }))
}
