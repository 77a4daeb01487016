//! Spotify track search and import.

mod client;
mod importer;
mod models;

pub use client::{
    SpotifyClient, SpotifyCredentials, SpotifyError, TrackSearchProvider, MAX_SEARCH_LIMIT,
};
pub use importer::{pick_preferred, track_to_draft, SpotifyImporter, DEFAULT_BULK_LIMIT};
pub use models::{ExternalUrls, SpotifyAlbum, SpotifyArtist, SpotifyImage, SpotifyTrack};
