//! Song operations that span the catalog store and the audio cache.

use crate::audio_cache::{is_preview_url, AudioCache};
use crate::catalog_store::{CatalogStore, Song, SongDeletion, SongId};
use crate::errors::ServiceResult;
use tracing::debug;

/// Caches the song's preview audio if it has a preview URL and no local file
/// yet, recording the cached path on the song. Cache misses leave the song as
/// it is.
pub async fn prefetch_audio(
    store: &dyn CatalogStore,
    cache: &AudioCache,
    song: Song,
) -> ServiceResult<Song> {
    if song.local_file_path.is_some() || !is_preview_url(&song.url) {
        return Ok(song);
    }
    match cache.fetch(&song.url).await {
        Some(path) => {
            store.set_song_local_file_path(song.id, Some(&path))?;
            Ok(Song {
                local_file_path: Some(path),
                ..song
            })
        }
        None => {
            debug!("No cached audio for song {}", song.id);
            Ok(song)
        }
    }
}

/// Deletes the song and, when no other song shares its URL, its cached audio.
pub async fn delete_song(
    store: &dyn CatalogStore,
    cache: &AudioCache,
    id: SongId,
) -> ServiceResult<SongDeletion> {
    let deletion = store.delete_song(id)?;
    let song = &deletion.song;
    if song.local_file_path.is_some() && store.count_songs_with_url(&song.url)? == 0 {
        cache.delete(&song.url).await;
    }
    Ok(deletion)
}
