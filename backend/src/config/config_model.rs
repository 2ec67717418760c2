use super::stage::Stage;

#[derive(Debug, Clone)]
pub struct DotEnvyConfig {
    pub stage: Stage,
    pub backend_server: BackendServer,
    pub database: Database,
    pub supabase: Supabase,
    pub creem: Creem,
    pub openrouter: OpenRouter,
}

#[derive(Debug, Clone)]
pub struct BackendServer {
    pub port: u16,
    /// Megabytes; uploads arrive as base64 data URLs inside JSON.
    pub body_limit: u64,
    /// Seconds.
    pub timeout: u64,
}

#[derive(Debug, Clone)]
pub struct Database {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone)]
pub struct Supabase {
    pub project_url: String,
    pub anon_key: String,
    pub jwt_secret: String,
}

#[derive(Debug, Clone)]
pub struct Creem {
    pub api_key: String,
    pub api_base_url: String,
    pub webhook_secret: String,
    pub success_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct OpenRouter {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub site_url: String,
    pub site_title: String,
}
