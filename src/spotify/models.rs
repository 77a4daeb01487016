//! Spotify Web API response types (only the fields we read).

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(super) struct TokenResponse {
    pub access_token: String,
    #[serde(default = "default_expires_in")]
    pub expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

#[derive(Debug, Deserialize)]
pub(super) struct SearchResponse {
    pub tracks: TrackPage,
}

#[derive(Debug, Deserialize)]
pub(super) struct TrackPage {
    #[serde(default)]
    pub items: Vec<SpotifyTrack>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SpotifyTrack {
    pub name: String,
    #[serde(default)]
    pub artists: Vec<SpotifyArtist>,
    #[serde(default)]
    pub album: Option<SpotifyAlbum>,
    #[serde(default)]
    pub duration_ms: u64,
    #[serde(default)]
    pub preview_url: Option<String>,
    #[serde(default)]
    pub external_urls: ExternalUrls,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SpotifyArtist {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SpotifyAlbum {
    pub name: String,
    #[serde(default)]
    pub images: Vec<SpotifyImage>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SpotifyImage {
    pub url: String,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct ExternalUrls {
    #[serde(default)]
    pub spotify: Option<String>,
}

impl SpotifyTrack {
    pub fn has_preview(&self) -> bool {
        self.preview_url.as_deref().is_some_and(|url| !url.is_empty())
    }
}
