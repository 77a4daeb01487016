//! CatalogStore trait definition.
//!
//! Storage contract for songs, albums, playlists and likes. Every mutating
//! method commits atomically: either all of its rows change or none do.

use super::models::*;
use crate::errors::ServiceResult;
use std::collections::HashSet;

pub trait CatalogStore: Send + Sync {
    // =========================================================================
    // Songs
    // =========================================================================

    /// Inserts a song. Fails with NotFound when `album_id` does not resolve.
    fn create_song(&self, draft: &SongDraft) -> ServiceResult<Song>;

    fn get_song(&self, id: SongId) -> ServiceResult<Option<Song>>;

    /// Exact (title, artist) lookup, used for deduplication.
    fn find_song_by_title_and_artist(&self, title: &str, artist: &str)
        -> ServiceResult<Option<Song>>;

    /// Songs ordered by id.
    fn list_songs(&self, page: Page) -> ServiceResult<Vec<Song>>;

    /// Case-insensitive substring match over title, artist, album and genre.
    fn search_songs(&self, query: &str, page: Page) -> ServiceResult<Vec<Song>>;

    /// Applies the given fields. Setting `album_id` also rewrites the album
    /// name unless `album` is given explicitly.
    fn update_song(&self, id: SongId, update: &SongUpdate) -> ServiceResult<Song>;

    /// Removes a song together with its likes and playlist memberships.
    fn delete_song(&self, id: SongId) -> ServiceResult<SongDeletion>;

    fn set_song_image_url(&self, id: SongId, image_url: &str) -> ServiceResult<()>;

    fn set_song_local_file_path(&self, id: SongId, path: Option<&str>) -> ServiceResult<()>;

    /// Number of songs whose source URL is `url`.
    fn count_songs_with_url(&self, url: &str) -> ServiceResult<usize>;

    // =========================================================================
    // Albums
    // =========================================================================

    fn create_album(&self, draft: &AlbumDraft) -> ServiceResult<Album>;

    fn list_albums(&self, page: Page) -> ServiceResult<Vec<Album>>;

    fn get_album(&self, id: AlbumId) -> ServiceResult<Option<Album>>;

    fn get_album_songs(&self, id: AlbumId) -> ServiceResult<Vec<Song>>;

    fn update_album(&self, id: AlbumId, update: &AlbumUpdate) -> ServiceResult<Album>;

    /// Removes an album and every song attached to it, cascading as
    /// `delete_song` does. Returns the number of songs removed.
    fn delete_album(&self, id: AlbumId) -> ServiceResult<usize>;

    /// Points the song at the album and copies the album title into the
    /// song's denormalized album name.
    fn attach_song_to_album(&self, album_id: AlbumId, song_id: SongId) -> ServiceResult<Song>;

    // =========================================================================
    // Playlists
    // =========================================================================

    fn create_playlist(&self, owner_id: UserId, draft: &PlaylistDraft) -> ServiceResult<Playlist>;

    fn list_user_playlists(&self, owner_id: UserId, page: Page) -> ServiceResult<Vec<Playlist>>;

    fn get_playlist(&self, id: PlaylistId) -> ServiceResult<Option<Playlist>>;

    /// Member songs in insertion order.
    fn get_playlist_songs(&self, id: PlaylistId) -> ServiceResult<Vec<Song>>;

    /// Fails with Forbidden unless `user_id` owns the playlist.
    fn update_playlist(
        &self,
        id: PlaylistId,
        user_id: UserId,
        update: &PlaylistUpdate,
    ) -> ServiceResult<Playlist>;

    fn delete_playlist(&self, id: PlaylistId, user_id: UserId) -> ServiceResult<()>;

    /// Fails with Conflict when the song is already a member.
    fn add_song_to_playlist(
        &self,
        id: PlaylistId,
        song_id: SongId,
        user_id: UserId,
    ) -> ServiceResult<()>;

    /// Fails with NotFound when the song is not a member.
    fn remove_song_from_playlist(
        &self,
        id: PlaylistId,
        song_id: SongId,
        user_id: UserId,
    ) -> ServiceResult<()>;

    // =========================================================================
    // Likes
    // =========================================================================

    /// Records the like and raises the song's one-way flag in one transaction.
    fn like_song(&self, user_id: UserId, song_id: SongId) -> ServiceResult<Song>;

    /// Deletes the like row. The song's one-way flag is left as is.
    fn unlike_song(&self, user_id: UserId, song_id: SongId) -> ServiceResult<()>;

    /// Songs liked by the user, most recent like first.
    fn list_liked_songs(&self, user_id: UserId, page: Page) -> ServiceResult<Vec<Song>>;

    /// Which of `song_ids` currently count as liked for `viewer`.
    fn liked_song_ids(
        &self,
        viewer: LikeViewer,
        song_ids: &[SongId],
    ) -> ServiceResult<HashSet<SongId>>;
}
