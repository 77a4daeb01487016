//! Music Catalog Server Library
//!
//! Songs, albums, playlists and likes over SQLite, with a Spotify import
//! path and a local cache of preview audio.

pub mod audio_cache;
pub mod catalog_store;
pub mod config;
pub mod errors;
pub mod likes;
pub mod server;
pub mod songs;
pub mod spotify;
pub mod sqlite_persistence;
pub mod user;

// Re-export commonly used types for convenience
pub use audio_cache::AudioCache;
pub use catalog_store::{CatalogStore, SqliteCatalogStore};
pub use errors::{ServiceError, ServiceResult};
pub use server::{make_app, run_server, RequestsLoggingLevel, ServerConfig};
pub use spotify::{SpotifyClient, TrackSearchProvider};
pub use user::{SqliteUserStore, TokenIssuer, UserManager, UserStore};
