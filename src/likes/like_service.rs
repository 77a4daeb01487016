use super::visibility::compose_views;
use crate::audio_cache::AudioCache;
use crate::catalog_store::{CatalogStore, LikeViewer, Page, SongDraft, SongId, SongView, UserId};
use crate::errors::ServiceResult;
use crate::songs::prefetch_audio;
use std::sync::Arc;
use tracing::info;

/// Like and unlike actions on behalf of a user.
pub struct LikeService {
    store: Arc<dyn CatalogStore>,
    audio_cache: Arc<AudioCache>,
}

impl LikeService {
    pub fn new(store: Arc<dyn CatalogStore>, audio_cache: Arc<AudioCache>) -> Self {
        LikeService { store, audio_cache }
    }

    /// Conflict if the user already likes the song, NotFound if the song does
    /// not exist.
    pub fn like(&self, song_id: SongId, user_id: UserId) -> ServiceResult<SongView> {
        let song = self.store.like_song(user_id, song_id)?;
        info!("User {} liked song {}", user_id, song_id);
        Ok(SongView::new(song, true))
    }

    /// Likes the song matching the payload's exact title and artist, creating
    /// it first when there is none.
    pub async fn like_with_data(
        &self,
        draft: &SongDraft,
        user_id: UserId,
    ) -> ServiceResult<SongView> {
        let existing = self
            .store
            .find_song_by_title_and_artist(&draft.title, &draft.artist)?;
        let song = match existing {
            Some(song) => song,
            None => {
                let song = self.store.create_song(draft)?;
                info!("Created song {} from like payload", song.id);
                prefetch_audio(self.store.as_ref(), &self.audio_cache, song).await?
            }
        };
        self.like(song.id, user_id)
    }

    /// NotFound if there is no like to remove. The song keeps its ever-liked flag.
    pub fn unlike(&self, song_id: SongId, user_id: UserId) -> ServiceResult<()> {
        self.store.unlike_song(user_id, song_id)?;
        info!("User {} unliked song {}", user_id, song_id);
        Ok(())
    }

    pub fn list_likes(&self, user_id: UserId, page: Page) -> ServiceResult<Vec<SongView>> {
        let songs = self.store.list_liked_songs(user_id, page)?;
        compose_views(self.store.as_ref(), songs, LikeViewer::User(user_id))
    }
}
