use super::RequestsLoggingLevel;
use crate::config::AppConfig;

#[derive(Clone)]
pub struct ServerConfig {
    pub requests_logging_level: RequestsLoggingLevel,
    pub port: u16,
    /// Prefix of every API route, e.g. "/api/v1". Empty mounts them at the root.
    pub api_prefix: String,
    /// "*" allows any origin.
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            requests_logging_level: RequestsLoggingLevel::Path,
            port: 8000,
            api_prefix: "/api/v1".to_string(),
            allowed_origins: vec!["*".to_string()],
        }
    }
}

impl From<&AppConfig> for ServerConfig {
    fn from(config: &AppConfig) -> Self {
        ServerConfig {
            requests_logging_level: config.logging_level.clone(),
            port: config.port,
            api_prefix: config.api_prefix.clone(),
            allowed_origins: config.allowed_origins.clone(),
        }
    }
}
