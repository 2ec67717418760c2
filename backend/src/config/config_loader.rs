use anyhow::{Context, Result};
use url::Url;

use super::{
    config_model::{BackendServer, Creem, Database, DotEnvyConfig, OpenRouter, Supabase},
    stage::Stage,
};

const DEFAULT_OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";
const DEFAULT_OPENROUTER_MODEL: &str = "google/gemini-2.5-flash-image-preview";
const DEFAULT_SITE_TITLE: &str = "Nano Banana";

pub fn load() -> Result<DotEnvyConfig> {
    dotenvy::dotenv().ok();

    let stage = get_stage();

    let backend_server = BackendServer {
        port: required("SERVER_PORT_BACKEND")?
            .parse()
            .context("SERVER_PORT_BACKEND is invalid")?,
        body_limit: required("SERVER_BODY_LIMIT")?
            .parse()
            .context("SERVER_BODY_LIMIT is invalid")?,
        timeout: required("SERVER_TIMEOUT")?
            .parse()
            .context("SERVER_TIMEOUT is invalid")?,
    };

    let database = Database {
        url: required("DATABASE_URL")?,
        max_connections: optional("DATABASE_MAX_CONNECTIONS")
            .map(|value| value.parse())
            .transpose()
            .context("DATABASE_MAX_CONNECTIONS is invalid")?
            .unwrap_or(10),
    };

    let supabase = Supabase {
        project_url: required_url("SUPABASE_PROJECT_URL")?,
        anon_key: required("SUPABASE_ANON_KEY")?,
        jwt_secret: required("SUPABASE_JWT_SECRET")?,
    };

    let creem = Creem {
        api_key: required("CREEM_API_KEY")?,
        api_base_url: match optional("CREEM_API_BASE_URL") {
            Some(raw) => validate_url("CREEM_API_BASE_URL", raw)?,
            None => stage.default_creem_api_base_url().to_string(),
        },
        webhook_secret: required("CREEM_WEBHOOK_SECRET")?,
        success_url: optional("CREEM_SUCCESS_URL")
            .map(|raw| validate_url("CREEM_SUCCESS_URL", raw))
            .transpose()?,
    };

    let openrouter = OpenRouter {
        api_key: required("OPENROUTER_API_KEY")?,
        base_url: optional("OPENROUTER_BASE_URL")
            .map(|raw| validate_url("OPENROUTER_BASE_URL", raw))
            .transpose()?
            .unwrap_or_else(|| DEFAULT_OPENROUTER_BASE_URL.to_string()),
        model: optional("OPENROUTER_MODEL")
            .unwrap_or_else(|| DEFAULT_OPENROUTER_MODEL.to_string()),
        site_url: required_url("SITE_URL")?,
        site_title: optional("SITE_TITLE").unwrap_or_else(|| DEFAULT_SITE_TITLE.to_string()),
    };

    Ok(DotEnvyConfig {
        stage,
        backend_server,
        database,
        supabase,
        creem,
        openrouter,
    })
}

pub fn get_stage() -> Stage {
    dotenvy::dotenv().ok();

    let stage_str = std::env::var("STAGE").unwrap_or("".to_string());
    Stage::try_from(&stage_str).unwrap_or_default()
}

fn required(key: &str) -> Result<String> {
    optional(key).with_context(|| format!("{key} is invalid"))
}

fn optional(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn required_url(key: &str) -> Result<String> {
    validate_url(key, required(key)?)
}

fn validate_url(key: &str, raw: String) -> Result<String> {
    Url::parse(&raw).with_context(|| format!("{key} is not a valid URL"))?;
    Ok(raw)
}
