//! Turns Spotify search results into catalog songs.

use super::client::{TrackSearchProvider, MAX_SEARCH_LIMIT};
use super::models::SpotifyTrack;
use crate::audio_cache::AudioCache;
use crate::catalog_store::{CatalogStore, LikeViewer, Song, SongDraft, SongView};
use crate::errors::{ServiceError, ServiceResult};
use crate::likes::{compose_view, compose_views};
use crate::songs::prefetch_audio;
use std::sync::Arc;
use tracing::info;

pub const SINGLE_IMPORT_CANDIDATES: usize = 10;
pub const DEFAULT_BULK_LIMIT: usize = 20;

/// Duration reported for songs whose url is the 30 second preview clip.
const PREVIEW_DURATION_SECS: f64 = 30.0;

pub fn track_to_draft(track: &SpotifyTrack) -> SongDraft {
    let artist = track
        .artists
        .first()
        .map(|a| a.name.clone())
        .unwrap_or_else(|| "Unknown Artist".to_string());
    let album = track
        .album
        .as_ref()
        .map(|a| a.name.clone())
        .unwrap_or_else(|| "Unknown Album".to_string());
    let image_url = track
        .album
        .as_ref()
        .and_then(|a| a.images.first())
        .map(|image| image.url.clone());

    let (url, duration) = match track.preview_url.as_deref() {
        Some(preview) if !preview.is_empty() => (preview.to_string(), PREVIEW_DURATION_SECS),
        _ => (
            track.external_urls.spotify.clone().unwrap_or_default(),
            track.duration_ms as f64 / 1000.0,
        ),
    };

    SongDraft {
        title: track.name.clone(),
        artist,
        album,
        genre: "Unknown".to_string(),
        duration,
        url,
        local_file_path: None,
        album_id: None,
        image_url,
    }
}

/// First track with a playable preview, else the first track.
pub fn pick_preferred(tracks: &[SpotifyTrack]) -> Option<&SpotifyTrack> {
    tracks
        .iter()
        .find(|t| t.has_preview())
        .or_else(|| tracks.first())
}

pub struct SpotifyImporter {
    provider: Arc<dyn TrackSearchProvider>,
    store: Arc<dyn CatalogStore>,
    audio_cache: Arc<AudioCache>,
}

impl SpotifyImporter {
    pub fn new(
        provider: Arc<dyn TrackSearchProvider>,
        store: Arc<dyn CatalogStore>,
        audio_cache: Arc<AudioCache>,
    ) -> Self {
        SpotifyImporter {
            provider,
            store,
            audio_cache,
        }
    }

    pub fn provider(&self) -> &dyn TrackSearchProvider {
        self.provider.as_ref()
    }

    async fn materialize(&self, draft: &SongDraft) -> ServiceResult<Song> {
        let song = self.store.create_song(draft)?;
        info!(
            "Imported song {} '{}' by {}",
            song.id, song.title, song.artist
        );
        prefetch_audio(self.store.as_ref(), &self.audio_cache, song).await
    }

    /// Imports the best match for `query`, preferring tracks with a preview.
    pub async fn import_one(&self, query: &str, viewer: LikeViewer) -> ServiceResult<SongView> {
        let query = validate_query(query)?;
        let tracks = self
            .provider
            .search_tracks(query, SINGLE_IMPORT_CANDIDATES)
            .await?;
        let track = pick_preferred(&tracks)
            .ok_or_else(|| ServiceError::not_found("No songs found on Spotify"))?;

        let song = self.materialize(&track_to_draft(track)).await?;
        compose_view(self.store.as_ref(), song, viewer)
    }

    /// Imports up to `limit` matches. Tracks already in the catalog (same
    /// title and artist) are not created again; if they lack a cover image
    /// they get the one from Spotify.
    pub async fn import_bulk(
        &self,
        query: &str,
        limit: usize,
        viewer: LikeViewer,
    ) -> ServiceResult<Vec<SongView>> {
        let query = validate_query(query)?;
        if !(1..=MAX_SEARCH_LIMIT).contains(&limit) {
            return Err(ServiceError::validation(format!(
                "limit must be between 1 and {}",
                MAX_SEARCH_LIMIT
            )));
        }

        let tracks = self.provider.search_tracks(query, limit).await?;
        if tracks.is_empty() {
            return Err(ServiceError::not_found("No songs found on Spotify"));
        }

        let mut songs = Vec::with_capacity(tracks.len());
        for track in &tracks {
            let draft = track_to_draft(track);
            let existing = self
                .store
                .find_song_by_title_and_artist(&draft.title, &draft.artist)?;
            let song = match existing {
                Some(mut song) => {
                    if let (None, Some(image_url)) = (&song.image_url, &draft.image_url) {
                        self.store.set_song_image_url(song.id, image_url)?;
                        info!("Added cover image to existing song {}", song.id);
                        song.image_url = Some(image_url.clone());
                    }
                    song
                }
                None => self.materialize(&draft).await?,
            };
            songs.push(song);
        }

        compose_views(self.store.as_ref(), songs, viewer)
    }
}

fn validate_query(query: &str) -> ServiceResult<&str> {
    let query = query.trim();
    if query.is_empty() {
        return Err(ServiceError::validation("query must not be empty"));
    }
    Ok(query)
}
