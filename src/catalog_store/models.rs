use crate::errors::{ServiceError, ServiceResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type SongId = usize;
pub type AlbumId = usize;
pub type PlaylistId = usize;
pub type UserId = usize;

pub(crate) fn timestamp_to_datetime(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or_default()
}

/// Pagination window shared by every listing operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub skip: usize,
    pub limit: usize,
}

impl Page {
    pub const DEFAULT_LIMIT: usize = 20;
    pub const MAX_LIMIT: usize = 100;
    /// Largest offset SQLite accepts.
    pub const MAX_SKIP: usize = i64::MAX as usize;

    pub fn new(skip: Option<usize>, limit: Option<usize>) -> ServiceResult<Page> {
        let limit = limit.unwrap_or(Self::DEFAULT_LIMIT);
        if !(1..=Self::MAX_LIMIT).contains(&limit) {
            return Err(ServiceError::validation(format!(
                "limit must be between 1 and {}",
                Self::MAX_LIMIT
            )));
        }
        let skip = skip.unwrap_or(0);
        if skip > Self::MAX_SKIP {
            return Err(ServiceError::validation(format!(
                "skip must be at most {}",
                Self::MAX_SKIP
            )));
        }
        Ok(Page { skip, limit })
    }
}

impl Default for Page {
    fn default() -> Self {
        Page {
            skip: 0,
            limit: Self::DEFAULT_LIMIT,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Song {
    pub id: SongId,
    pub title: String,
    pub artist: String,
    /// Album name as shown to clients, kept alongside `album_id`.
    pub album: String,
    pub album_id: Option<AlbumId>,
    pub genre: String,
    pub duration: f64,
    pub url: String,
    pub local_file_path: Option<String>,
    pub image_url: Option<String>,
    /// Set once the song receives its first like, never cleared.
    pub liked: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SongDraft {
    pub title: String,
    pub artist: String,
    pub album: String,
    pub genre: String,
    pub duration: f64,
    pub url: String,
    #[serde(default)]
    pub local_file_path: Option<String>,
    #[serde(default)]
    pub album_id: Option<AlbumId>,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl SongDraft {
    pub fn validate(&self) -> ServiceResult<()> {
        if self.title.trim().is_empty() {
            return Err(ServiceError::validation("title must not be empty"));
        }
        if self.artist.trim().is_empty() {
            return Err(ServiceError::validation("artist must not be empty"));
        }
        if !self.duration.is_finite() || self.duration < 0.0 {
            return Err(ServiceError::validation(
                "duration must be a non-negative number of seconds",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SongUpdate {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub genre: Option<String>,
    pub album_id: Option<AlbumId>,
}

#[derive(Debug, Clone)]
pub struct SongDeletion {
    pub song: Song,
    pub deleted_likes_count: usize,
}

/// A song as presented to one caller, with `liked` resolved for that caller.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SongView {
    pub id: SongId,
    pub title: String,
    pub artist: String,
    pub album: String,
    pub album_id: Option<AlbumId>,
    pub genre: String,
    pub duration: f64,
    pub url: String,
    pub local_file_path: Option<String>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub liked: bool,
    pub ever_liked: bool,
}

impl SongView {
    pub fn new(song: Song, liked: bool) -> SongView {
        SongView {
            id: song.id,
            title: song.title,
            artist: song.artist,
            album: song.album,
            album_id: song.album_id,
            genre: song.genre,
            duration: song.duration,
            url: song.url,
            local_file_path: song.local_file_path,
            image_url: song.image_url,
            created_at: song.created_at,
            liked,
            ever_liked: song.liked,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Album {
    pub id: AlbumId,
    pub title: String,
    pub artist: String,
    pub image_url: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AlbumDraft {
    pub title: String,
    pub artist: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AlbumUpdate {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub image_url: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Playlist {
    pub id: PlaylistId,
    pub name: String,
    pub description: String,
    pub owner_id: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistDraft {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlaylistUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Whose likes decide the `liked` field of a song view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeViewer {
    User(UserId),
    /// No authenticated caller: a song counts as liked while anyone likes it.
    Anonymous,
}

impl From<Option<UserId>> for LikeViewer {
    fn from(user_id: Option<UserId>) -> Self {
        match user_id {
            Some(id) => LikeViewer::User(id),
            None => LikeViewer::Anonymous,
        }
    }
}
