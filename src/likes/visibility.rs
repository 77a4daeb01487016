//! Resolution of the per-caller `liked` field.
//!
//! An authenticated caller sees their own like rows. An anonymous caller sees
//! a song as liked while at least one like row exists for it. The stored
//! one-way flag never feeds into `liked`; it is reported as `ever_liked`.

use crate::catalog_store::{CatalogStore, LikeViewer, Song, SongId, SongView};
use crate::errors::ServiceResult;

pub fn compose_view(
    store: &dyn CatalogStore,
    song: Song,
    viewer: LikeViewer,
) -> ServiceResult<SongView> {
    let liked = store.liked_song_ids(viewer, &[song.id])?.contains(&song.id);
    Ok(SongView::new(song, liked))
}

/// Batch variant of [`compose_view`], one like lookup for the whole slice.
pub fn compose_views(
    store: &dyn CatalogStore,
    songs: Vec<Song>,
    viewer: LikeViewer,
) -> ServiceResult<Vec<SongView>> {
    let ids: Vec<SongId> = songs.iter().map(|s| s.id).collect();
    let liked = store.liked_song_ids(viewer, &ids)?;
    Ok(songs
        .into_iter()
        .map(|song| {
            let is_liked = liked.contains(&song.id);
            SongView::new(song, is_liked)
        })
        .collect())
}
