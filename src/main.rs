use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use music_catalog_server::config::{AppConfig, CliConfig, FileConfig};
use music_catalog_server::{
    run_server, AudioCache, RequestsLoggingLevel, ServerConfig, SpotifyClient,
    SqliteCatalogStore, SqliteUserStore, TokenIssuer, UserManager,
};

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Directory holding the SQLite database and the audio storage directory.
    #[clap(long, value_parser = parse_path)]
    pub data_dir: Option<PathBuf>,

    /// Optional TOML config file. Its values override the command line.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Name of the directory under data_dir where preview audio is cached.
    #[clap(long)]
    pub audio_storage_dir: Option<String>,

    /// The port to listen on.
    #[clap(short, long)]
    pub port: Option<u16>,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// Prefix of every API route.
    #[clap(long)]
    pub api_prefix: Option<String>,

    /// Comma separated list of allowed CORS origins, "*" for any.
    #[clap(long)]
    pub allowed_origins: Option<String>,

    /// Secret used to sign bearer tokens.
    #[clap(long, env = "JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: Option<String>,

    #[clap(long)]
    pub access_token_expire_minutes: Option<i64>,

    #[clap(long)]
    pub refresh_token_expire_days: Option<i64>,

    #[clap(long, env = "SPOTIFY_CLIENT_ID")]
    pub spotify_client_id: Option<String>,

    #[clap(long, env = "SPOTIFY_CLIENT_SECRET", hide_env_values = true)]
    pub spotify_client_secret: Option<String>,
}

impl CliArgs {
    fn to_cli_config(&self) -> CliConfig {
        CliConfig {
            data_dir: self.data_dir.clone(),
            audio_storage_dir: self.audio_storage_dir.clone(),
            port: self.port,
            logging_level: self.logging_level.clone(),
            api_prefix: self.api_prefix.clone(),
            allowed_origins: self.allowed_origins.clone(),
            jwt_secret: self.jwt_secret.clone(),
            access_token_expire_minutes: self.access_token_expire_minutes,
            refresh_token_expire_days: self.refresh_token_expire_days,
            spotify_client_id: self.spotify_client_id.clone(),
            spotify_client_secret: self.spotify_client_secret.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .context("Failed to initialize logging")?;

    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading config file {:?}", path);
            Some(FileConfig::load(path)?)
        }
        None => None,
    };
    let config = AppConfig::resolve(&cli_args.to_cli_config(), file_config)?;

    info!("Opening SQLite database at {:?}...", config.db_path());
    let catalog_store = Arc::new(SqliteCatalogStore::new(config.db_path())?);
    let user_store = Arc::new(SqliteUserStore::from_connection(
        catalog_store.connection(),
    ));
    let tokens = TokenIssuer::new(
        &config.jwt_secret,
        chrono::Duration::minutes(config.access_token_expire_minutes),
        chrono::Duration::days(config.refresh_token_expire_days),
    );
    let user_manager = Arc::new(UserManager::new(user_store, tokens));

    let audio_cache = Arc::new(AudioCache::new(
        &config.data_dir,
        config.audio_storage_dir.clone(),
    )?);
    info!("Caching preview audio in {:?}", audio_cache.storage_dir());

    if config.spotify.is_none() {
        info!("Spotify credentials not configured, imports are disabled");
    }
    let spotify = Arc::new(SpotifyClient::new(config.spotify.clone())?);

    info!("Starting server on port {}...", config.port);
    run_server(
        ServerConfig::from(&config),
        catalog_store,
        audio_cache,
        spotify,
        user_manager,
    )
    .await
}
