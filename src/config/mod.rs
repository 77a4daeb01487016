mod file_config;

pub use file_config::{AuthConfig, FileConfig, SpotifyConfig};

use crate::server::RequestsLoggingLevel;
use crate::spotify::SpotifyCredentials;
use anyhow::{anyhow, bail, Result};
use clap::ValueEnum;
use std::path::PathBuf;

pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_API_PREFIX: &str = "/api/v1";
pub const DEFAULT_AUDIO_STORAGE_DIR: &str = "audio_storage";
pub const DEFAULT_ACCESS_TOKEN_EXPIRE_MINUTES: i64 = 30;
pub const DEFAULT_REFRESH_TOKEN_EXPIRE_DAYS: i64 = 7;

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub data_dir: Option<PathBuf>,
    pub audio_storage_dir: Option<String>,
    pub port: Option<u16>,
    pub logging_level: RequestsLoggingLevel,
    pub api_prefix: Option<String>,
    pub allowed_origins: Option<String>,
    pub jwt_secret: Option<String>,
    pub access_token_expire_minutes: Option<i64>,
    pub refresh_token_expire_days: Option<i64>,
    pub spotify_client_id: Option<String>,
    pub spotify_client_secret: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub audio_storage_dir: String,
    pub port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub api_prefix: String,
    pub allowed_origins: Vec<String>,

    pub jwt_secret: String,
    pub access_token_expire_minutes: i64,
    pub refresh_token_expire_days: i64,

    pub spotify: Option<SpotifyCredentials>,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();
        let auth = file.auth.unwrap_or_default();
        let spotify = file.spotify.unwrap_or_default();

        let data_dir = file
            .data_dir
            .map(PathBuf::from)
            .or_else(|| cli.data_dir.clone())
            .ok_or_else(|| anyhow!("data_dir must be specified via --data-dir or in config file"))?;
        if !data_dir.exists() {
            bail!("Data directory does not exist: {:?}", data_dir);
        }
        if !data_dir.is_dir() {
            bail!("data_dir is not a directory: {:?}", data_dir);
        }

        let audio_storage_dir = file
            .audio_storage_dir
            .or_else(|| cli.audio_storage_dir.clone())
            .unwrap_or_else(|| DEFAULT_AUDIO_STORAGE_DIR.to_string());
        if audio_storage_dir.is_empty()
            || audio_storage_dir.contains("..")
            || PathBuf::from(&audio_storage_dir).is_absolute()
        {
            bail!(
                "audio_storage_dir must be a relative directory name, got {:?}",
                audio_storage_dir
            );
        }

        let port = file.port.or(cli.port).unwrap_or(DEFAULT_PORT);

        let logging_level = match file.logging_level {
            Some(level) => parse_logging_level(&level)
                .ok_or_else(|| anyhow!("Unknown logging_level {:?}", level))?,
            None => cli.logging_level.clone(),
        };

        let api_prefix = normalize_api_prefix(
            file.api_prefix
                .or_else(|| cli.api_prefix.clone())
                .as_deref()
                .unwrap_or(DEFAULT_API_PREFIX),
        )?;

        let allowed_origins = parse_allowed_origins(
            file.allowed_origins
                .or_else(|| cli.allowed_origins.clone())
                .as_deref()
                .unwrap_or("*"),
        );

        let jwt_secret = auth
            .jwt_secret
            .or_else(|| cli.jwt_secret.clone())
            .filter(|secret| !secret.is_empty())
            .ok_or_else(|| {
                anyhow!("jwt_secret must be specified via --jwt-secret, JWT_SECRET or in config file")
            })?;

        let access_token_expire_minutes = auth
            .access_token_expire_minutes
            .or(cli.access_token_expire_minutes)
            .unwrap_or(DEFAULT_ACCESS_TOKEN_EXPIRE_MINUTES);
        let refresh_token_expire_days = auth
            .refresh_token_expire_days
            .or(cli.refresh_token_expire_days)
            .unwrap_or(DEFAULT_REFRESH_TOKEN_EXPIRE_DAYS);
        if access_token_expire_minutes <= 0 || refresh_token_expire_days <= 0 {
            bail!("Token lifetimes must be positive");
        }

        let client_id = spotify
            .client_id
            .or_else(|| cli.spotify_client_id.clone());
        let client_secret = spotify
            .client_secret
            .or_else(|| cli.spotify_client_secret.clone());
        let spotify = match (client_id, client_secret) {
            (Some(client_id), Some(client_secret)) => Some(SpotifyCredentials {
                client_id,
                client_secret,
            }),
            (None, None) => None,
            _ => bail!("Both the Spotify client id and secret must be provided together"),
        };

        Ok(Self {
            data_dir,
            audio_storage_dir,
            port,
            logging_level,
            api_prefix,
            allowed_origins,
            jwt_secret,
            access_token_expire_minutes,
            refresh_token_expire_days,
            spotify,
        })
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("catalog.db")
    }
}

/// Parses a logging level string into RequestsLoggingLevel.
/// Uses clap's ValueEnum trait for parsing.
fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(s, true).ok()
}

fn normalize_api_prefix(prefix: &str) -> Result<String> {
    let trimmed = prefix.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Ok(String::new());
    }
    if !trimmed.starts_with('/') {
        bail!("api_prefix must start with '/', got {:?}", prefix);
    }
    Ok(trimmed.to_string())
}

fn parse_allowed_origins(origins: &str) -> Vec<String> {
    origins
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}
