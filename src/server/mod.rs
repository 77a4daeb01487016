mod album_routes;
mod api_models;
mod auth_routes;
pub mod config;
mod errors;
mod http_layers;
mod like_routes;
mod playlist_routes;
pub mod server;
mod session;
mod song_routes;
pub mod state;
mod stream_song;

pub use api_models::MessageResponse;
pub use config::ServerConfig;
pub use http_layers::*;
pub use server::{make_app, run_server};
pub use session::Session;
pub use state::ServerState;
