//! Test fixtures: a canned Spotify provider and request payloads.

use super::constants::*;
use async_trait::async_trait;
use music_catalog_server::spotify::{
    ExternalUrls, SpotifyAlbum, SpotifyArtist, SpotifyError, SpotifyImage, SpotifyTrack,
    TrackSearchProvider,
};
use serde_json::{json, Value};

/// Answers every search with `SPOTIFY_TRACKS`, except `SPOTIFY_EMPTY_QUERY`
/// (nothing) and `SPOTIFY_UNLIMITED_QUERY` (`limit` generated tracks).
/// No track has a preview clip, so imports never touch the network.
pub struct FakeSpotify;

fn fake_track(name: &str) -> SpotifyTrack {
    SpotifyTrack {
        name: name.to_string(),
        artists: vec![SpotifyArtist {
            name: SPOTIFY_ARTIST.to_string(),
        }],
        album: Some(SpotifyAlbum {
            name: SPOTIFY_ALBUM.to_string(),
            images: vec![SpotifyImage {
                url: SPOTIFY_IMAGE_URL.to_string(),
            }],
        }),
        duration_ms: 200_000,
        preview_url: None,
        external_urls: ExternalUrls {
            spotify: Some(format!(
                "https://open.spotify.com/track/{}",
                name.replace(' ', "-")
            )),
        },
    }
}

#[async_trait]
impl TrackSearchProvider for FakeSpotify {
    async fn search_tracks(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<SpotifyTrack>, SpotifyError> {
        if query == SPOTIFY_EMPTY_QUERY {
            return Ok(vec![]);
        }
        if query == SPOTIFY_UNLIMITED_QUERY {
            return Ok((0..limit)
                .map(|i| fake_track(&format!("Generated {}", i)))
                .collect());
        }
        Ok(SPOTIFY_TRACKS
            .iter()
            .take(limit)
            .map(|name| fake_track(name))
            .collect())
    }

    async fn check_connection(&self) -> Result<(), SpotifyError> {
        Ok(())
    }
}

/// Body of a song creation request with a URL that is never fetched.
pub fn song_payload(title: &str, artist: &str) -> Value {
    json!({
        "title": title,
        "artist": artist,
        "album": "Test Album",
        "genre": "Rock",
        "duration": 180.5,
        "url": format!("https://music.example.com/{}", title.replace(' ', "-")),
    })
}
