//! Catalog storage: songs, albums, playlists and likes.

mod models;
mod schema;
mod store;
mod trait_def;

pub use models::*;
pub use schema::{USERS_TABLE, VERSIONED_SCHEMAS};
pub use store::{SharedConnection, SqliteCatalogStore};
pub use trait_def::CatalogStore;
