//! SQLite-backed catalog store.

use super::models::*;
use super::schema::VERSIONED_SCHEMAS;
use super::trait_def::CatalogStore;
use crate::errors::{ServiceError, ServiceResult};
use crate::sqlite_persistence::open_versioned;
use anyhow::Result;
use rusqlite::{
    functions::FunctionFlags, params, params_from_iter, Connection, OptionalExtension, Row,
};
use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, Mutex};

pub type SharedConnection = Arc<Mutex<Connection>>;

const SONG_COLUMNS: &str = "s.id, s.title, s.artist, s.album, s.album_id, s.genre, s.duration, \
     s.url, s.local_file_path, s.image_url, s.liked, s.created";

const ALBUM_COLUMNS: &str = "id, title, artist, image_url, description, created";

const PLAYLIST_COLUMNS: &str = "id, name, description, owner_id, created, updated";

const NOW: &str = "cast(strftime('%s','now') as int)";

/// SQL name of the Unicode-aware lowercase function used by search.
const UNICODE_LOWER: &str = "ulower";

/// SQLite's LOWER and LIKE only fold ASCII.
fn register_functions(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        UNICODE_LOWER,
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let value: Option<String> = ctx.get(0)?;
            Ok(value.map(|v| v.to_lowercase()))
        },
    )
}

fn song_from_row(row: &Row) -> rusqlite::Result<Song> {
    Ok(Song {
        id: row.get(0)?,
        title: row.get(1)?,
        artist: row.get(2)?,
        album: row.get(3)?,
        album_id: row.get(4)?,
        genre: row.get(5)?,
        duration: row.get(6)?,
        url: row.get(7)?,
        local_file_path: row.get(8)?,
        image_url: row.get(9)?,
        liked: row.get(10)?,
        created_at: timestamp_to_datetime(row.get(11)?),
    })
}

fn album_from_row(row: &Row) -> rusqlite::Result<Album> {
    Ok(Album {
        id: row.get(0)?,
        title: row.get(1)?,
        artist: row.get(2)?,
        image_url: row.get(3)?,
        description: row.get(4)?,
        created_at: timestamp_to_datetime(row.get(5)?),
    })
}

fn playlist_from_row(row: &Row) -> rusqlite::Result<Playlist> {
    Ok(Playlist {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        owner_id: row.get(3)?,
        created_at: timestamp_to_datetime(row.get(4)?),
        updated_at: timestamp_to_datetime(row.get(5)?),
    })
}

/// Escapes LIKE wildcards so user input only ever matches literally.
fn like_pattern(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len() + 2);
    escaped.push('%');
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

fn fetch_song(conn: &Connection, id: SongId) -> rusqlite::Result<Option<Song>> {
    conn.query_row(
        &format!("SELECT {} FROM songs s WHERE s.id = ?1", SONG_COLUMNS),
        params![id],
        song_from_row,
    )
    .optional()
}

fn require_song(conn: &Connection, id: SongId) -> ServiceResult<Song> {
    fetch_song(conn, id)?.ok_or_else(|| ServiceError::not_found("Song not found"))
}

fn fetch_album(conn: &Connection, id: AlbumId) -> rusqlite::Result<Option<Album>> {
    conn.query_row(
        &format!("SELECT {} FROM albums WHERE id = ?1", ALBUM_COLUMNS),
        params![id],
        album_from_row,
    )
    .optional()
}

fn require_album(conn: &Connection, id: AlbumId) -> ServiceResult<Album> {
    fetch_album(conn, id)?.ok_or_else(|| ServiceError::not_found("Album not found"))
}

fn fetch_playlist(conn: &Connection, id: PlaylistId) -> rusqlite::Result<Option<Playlist>> {
    conn.query_row(
        &format!("SELECT {} FROM playlists WHERE id = ?1", PLAYLIST_COLUMNS),
        params![id],
        playlist_from_row,
    )
    .optional()
}

fn require_owned_playlist(
    conn: &Connection,
    id: PlaylistId,
    user_id: UserId,
) -> ServiceResult<Playlist> {
    let playlist =
        fetch_playlist(conn, id)?.ok_or_else(|| ServiceError::not_found("Playlist not found"))?;
    if playlist.owner_id != user_id {
        return Err(ServiceError::Forbidden(
            "Not authorized to modify this playlist".to_string(),
        ));
    }
    Ok(playlist)
}

fn touch_playlist(conn: &Connection, id: PlaylistId) -> rusqlite::Result<()> {
    conn.execute(
        &format!("UPDATE playlists SET updated = {} WHERE id = ?1", NOW),
        params![id],
    )?;
    Ok(())
}

/// Deletes a song and its dependent rows, returning how many likes went with it.
/// Callers run this inside a transaction.
fn delete_song_rows(conn: &Connection, id: SongId) -> rusqlite::Result<usize> {
    let deleted_likes = conn.execute("DELETE FROM likes WHERE song_id = ?1", params![id])?;
    conn.execute("DELETE FROM playlist_songs WHERE song_id = ?1", params![id])?;
    conn.execute("DELETE FROM songs WHERE id = ?1", params![id])?;
    Ok(deleted_likes)
}

fn query_songs<P: rusqlite::Params>(
    conn: &Connection,
    sql: &str,
    params: P,
) -> rusqlite::Result<Vec<Song>> {
    let mut stmt = conn.prepare(sql)?;
    let songs = stmt
        .query_map(params, song_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(songs)
}

#[derive(Clone)]
pub struct SqliteCatalogStore {
    conn: SharedConnection,
}

impl SqliteCatalogStore {
    /// Opens (or creates) the database at `db_path`, migrating it to the
    /// latest schema version.
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = open_versioned(db_path, VERSIONED_SCHEMAS)?;
        register_functions(&conn)?;
        Ok(Self::from_connection(Arc::new(Mutex::new(conn))))
    }

    pub fn from_connection(conn: SharedConnection) -> Self {
        SqliteCatalogStore { conn }
    }

    /// Handle to the underlying connection, for stores sharing the database.
    pub fn connection(&self) -> SharedConnection {
        self.conn.clone()
    }
}

impl CatalogStore for SqliteCatalogStore {
    // =========================================================================
    // Songs
    // =========================================================================

    fn create_song(&self, draft: &SongDraft) -> ServiceResult<Song> {
        draft.validate()?;
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        if let Some(album_id) = draft.album_id {
            require_album(&tx, album_id)?;
        }
        tx.execute(
            "INSERT INTO songs (title, artist, album, album_id, genre, duration, url, \
             local_file_path, image_url) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                draft.title,
                draft.artist,
                draft.album,
                draft.album_id,
                draft.genre,
                draft.duration,
                draft.url,
                draft.local_file_path,
                draft.image_url,
            ],
        )?;
        let song = require_song(&tx, tx.last_insert_rowid() as SongId)?;
        tx.commit()?;
        Ok(song)
    }

    fn get_song(&self, id: SongId) -> ServiceResult<Option<Song>> {
        let conn = self.conn.lock().unwrap();
        Ok(fetch_song(&conn, id)?)
    }

    fn find_song_by_title_and_artist(
        &self,
        title: &str,
        artist: &str,
    ) -> ServiceResult<Option<Song>> {
        let conn = self.conn.lock().unwrap();
        let song = conn
            .query_row(
                &format!(
                    "SELECT {} FROM songs s WHERE s.title = ?1 AND s.artist = ?2 ORDER BY s.id LIMIT 1",
                    SONG_COLUMNS
                ),
                params![title, artist],
                song_from_row,
            )
            .optional()?;
        Ok(song)
    }

    fn list_songs(&self, page: Page) -> ServiceResult<Vec<Song>> {
        let conn = self.conn.lock().unwrap();
        Ok(query_songs(
            &conn,
            &format!(
                "SELECT {} FROM songs s ORDER BY s.id LIMIT ?1 OFFSET ?2",
                SONG_COLUMNS
            ),
            params![page.limit, page.skip],
        )?)
    }

    fn search_songs(&self, query: &str, page: Page) -> ServiceResult<Vec<Song>> {
        let conn = self.conn.lock().unwrap();
        Ok(query_songs(
            &conn,
            &format!(
                "SELECT {} FROM songs s \
                 WHERE {f}(s.title) LIKE ?1 ESCAPE '\\' OR {f}(s.artist) LIKE ?1 ESCAPE '\\' \
                 OR {f}(s.album) LIKE ?1 ESCAPE '\\' OR {f}(s.genre) LIKE ?1 ESCAPE '\\' \
                 ORDER BY s.id LIMIT ?2 OFFSET ?3",
                SONG_COLUMNS,
                f = UNICODE_LOWER
            ),
            params![like_pattern(&query.to_lowercase()), page.limit, page.skip],
        )?)
    }

    fn update_song(&self, id: SongId, update: &SongUpdate) -> ServiceResult<Song> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        let mut song = require_song(&tx, id)?;

        if let Some(title) = &update.title {
            song.title = title.clone();
        }
        if let Some(artist) = &update.artist {
            song.artist = artist.clone();
        }
        if let Some(genre) = &update.genre {
            song.genre = genre.clone();
        }
        if let Some(album_id) = update.album_id {
            let album = require_album(&tx, album_id)?;
            song.album_id = Some(album.id);
            song.album = album.title;
        }
        if let Some(album) = &update.album {
            song.album = album.clone();
        }

        tx.execute(
            "UPDATE songs SET title = ?1, artist = ?2, album = ?3, album_id = ?4, genre = ?5 \
             WHERE id = ?6",
            params![
                song.title,
                song.artist,
                song.album,
                song.album_id,
                song.genre,
                id
            ],
        )?;
        tx.commit()?;
        Ok(song)
    }

    fn delete_song(&self, id: SongId) -> ServiceResult<SongDeletion> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        let song = require_song(&tx, id)?;
        let deleted_likes_count = delete_song_rows(&tx, id)?;
        tx.commit()?;
        Ok(SongDeletion {
            song,
            deleted_likes_count,
        })
    }

    fn set_song_image_url(&self, id: SongId, image_url: &str) -> ServiceResult<()> {
        let conn = self.conn.lock().unwrap();
        let updated = conn.execute(
            "UPDATE songs SET image_url = ?1 WHERE id = ?2",
            params![image_url, id],
        )?;
        if updated == 0 {
            return Err(ServiceError::not_found("Song not found"));
        }
        Ok(())
    }

    fn set_song_local_file_path(&self, id: SongId, path: Option<&str>) -> ServiceResult<()> {
        let conn = self.conn.lock().unwrap();
        let updated = conn.execute(
            "UPDATE songs SET local_file_path = ?1 WHERE id = ?2",
            params![path, id],
        )?;
        if updated == 0 {
            return Err(ServiceError::not_found("Song not found"));
        }
        Ok(())
    }

    fn count_songs_with_url(&self, url: &str) -> ServiceResult<usize> {
        let conn = self.conn.lock().unwrap();
        Ok(conn.query_row(
            "SELECT COUNT(*) FROM songs WHERE url = ?1",
            params![url],
            |row| row.get(0),
        )?)
    }

    // =========================================================================
    // Albums
    // =========================================================================

    fn create_album(&self, draft: &AlbumDraft) -> ServiceResult<Album> {
        if draft.title.trim().is_empty() {
            return Err(ServiceError::validation("title must not be empty"));
        }
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO albums (title, artist, image_url, description) VALUES (?1, ?2, ?3, ?4)",
            params![draft.title, draft.artist, draft.image_url, draft.description],
        )?;
        require_album(&conn, conn.last_insert_rowid() as AlbumId)
    }

    fn list_albums(&self, page: Page) -> ServiceResult<Vec<Album>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM albums ORDER BY id LIMIT ?1 OFFSET ?2",
            ALBUM_COLUMNS
        ))?;
        let albums = stmt
            .query_map(params![page.limit, page.skip], album_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(albums)
    }

    fn get_album(&self, id: AlbumId) -> ServiceResult<Option<Album>> {
        let conn = self.conn.lock().unwrap();
        Ok(fetch_album(&conn, id)?)
    }

    fn get_album_songs(&self, id: AlbumId) -> ServiceResult<Vec<Song>> {
        let conn = self.conn.lock().unwrap();
        Ok(query_songs(
            &conn,
            &format!(
                "SELECT {} FROM songs s WHERE s.album_id = ?1 ORDER BY s.id",
                SONG_COLUMNS
            ),
            params![id],
        )?)
    }

    fn update_album(&self, id: AlbumId, update: &AlbumUpdate) -> ServiceResult<Album> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        let mut album = require_album(&tx, id)?;
        if let Some(title) = &update.title {
            album.title = title.clone();
        }
        if let Some(artist) = &update.artist {
            album.artist = artist.clone();
        }
        if update.image_url.is_some() {
            album.image_url = update.image_url.clone();
        }
        if update.description.is_some() {
            album.description = update.description.clone();
        }
        tx.execute(
            "UPDATE albums SET title = ?1, artist = ?2, image_url = ?3, description = ?4 \
             WHERE id = ?5",
            params![
                album.title,
                album.artist,
                album.image_url,
                album.description,
                id
            ],
        )?;
        tx.commit()?;
        Ok(album)
    }

    fn delete_album(&self, id: AlbumId) -> ServiceResult<usize> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        require_album(&tx, id)?;
        let song_ids = {
            let mut stmt = tx.prepare("SELECT id FROM songs WHERE album_id = ?1")?;
            let ids = stmt
                .query_map(params![id], |row| row.get::<_, SongId>(0))?
                .collect::<Result<Vec<_>, _>>()?;
            ids
        };
        for song_id in &song_ids {
            delete_song_rows(&tx, *song_id)?;
        }
        tx.execute("DELETE FROM albums WHERE id = ?1", params![id])?;
        tx.commit()?;
        Ok(song_ids.len())
    }

    fn attach_song_to_album(&self, album_id: AlbumId, song_id: SongId) -> ServiceResult<Song> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        let album = require_album(&tx, album_id)?;
        require_song(&tx, song_id)?;
        tx.execute(
            "UPDATE songs SET album_id = ?1, album = ?2 WHERE id = ?3",
            params![album.id, album.title, song_id],
        )?;
        let song = require_song(&tx, song_id)?;
        tx.commit()?;
        Ok(song)
    }

    // =========================================================================
    // Playlists
    // =========================================================================

    fn create_playlist(&self, owner_id: UserId, draft: &PlaylistDraft) -> ServiceResult<Playlist> {
        if draft.name.trim().is_empty() {
            return Err(ServiceError::validation("name must not be empty"));
        }
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO playlists (name, description, owner_id) VALUES (?1, ?2, ?3)",
            params![
                draft.name,
                draft.description.clone().unwrap_or_default(),
                owner_id
            ],
        )?;
        fetch_playlist(&conn, conn.last_insert_rowid() as PlaylistId)?
            .ok_or_else(|| ServiceError::not_found("Playlist not found"))
    }

    fn list_user_playlists(&self, owner_id: UserId, page: Page) -> ServiceResult<Vec<Playlist>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM playlists WHERE owner_id = ?1 ORDER BY id LIMIT ?2 OFFSET ?3",
            PLAYLIST_COLUMNS
        ))?;
        let playlists = stmt
            .query_map(params![owner_id, page.limit, page.skip], playlist_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(playlists)
    }

    fn get_playlist(&self, id: PlaylistId) -> ServiceResult<Option<Playlist>> {
        let conn = self.conn.lock().unwrap();
        Ok(fetch_playlist(&conn, id)?)
    }

    fn get_playlist_songs(&self, id: PlaylistId) -> ServiceResult<Vec<Song>> {
        let conn = self.conn.lock().unwrap();
        Ok(query_songs(
            &conn,
            &format!(
                "SELECT {} FROM playlist_songs ps JOIN songs s ON s.id = ps.song_id \
                 WHERE ps.playlist_id = ?1 ORDER BY ps.id",
                SONG_COLUMNS
            ),
            params![id],
        )?)
    }

    fn update_playlist(
        &self,
        id: PlaylistId,
        user_id: UserId,
        update: &PlaylistUpdate,
    ) -> ServiceResult<Playlist> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        let mut playlist = require_owned_playlist(&tx, id, user_id)?;
        if let Some(name) = &update.name {
            if name.trim().is_empty() {
                return Err(ServiceError::validation("name must not be empty"));
            }
            playlist.name = name.clone();
        }
        if let Some(description) = &update.description {
            playlist.description = description.clone();
        }
        tx.execute(
            &format!(
                "UPDATE playlists SET name = ?1, description = ?2, updated = {} WHERE id = ?3",
                NOW
            ),
            params![playlist.name, playlist.description, id],
        )?;
        let playlist =
            fetch_playlist(&tx, id)?.ok_or_else(|| ServiceError::not_found("Playlist not found"))?;
        tx.commit()?;
        Ok(playlist)
    }

    fn delete_playlist(&self, id: PlaylistId, user_id: UserId) -> ServiceResult<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        require_owned_playlist(&tx, id, user_id)?;
        tx.execute(
            "DELETE FROM playlist_songs WHERE playlist_id = ?1",
            params![id],
        )?;
        tx.execute("DELETE FROM playlists WHERE id = ?1", params![id])?;
        tx.commit()?;
        Ok(())
    }

    fn add_song_to_playlist(
        &self,
        id: PlaylistId,
        song_id: SongId,
        user_id: UserId,
    ) -> ServiceResult<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        require_owned_playlist(&tx, id, user_id)?;
        require_song(&tx, song_id)?;

        let already_member = tx
            .query_row(
                "SELECT 1 FROM playlist_songs WHERE playlist_id = ?1 AND song_id = ?2",
                params![id, song_id],
                |_| Ok(()),
            )
            .optional()?
            .is_some();
        if already_member {
            return Err(ServiceError::Conflict("Song already in playlist".to_string()));
        }

        tx.execute(
            "INSERT INTO playlist_songs (playlist_id, song_id) VALUES (?1, ?2)",
            params![id, song_id],
        )?;
        touch_playlist(&tx, id)?;
        tx.commit()?;
        Ok(())
    }

    fn remove_song_from_playlist(
        &self,
        id: PlaylistId,
        song_id: SongId,
        user_id: UserId,
    ) -> ServiceResult<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        require_owned_playlist(&tx, id, user_id)?;
        let removed = tx.execute(
            "DELETE FROM playlist_songs WHERE playlist_id = ?1 AND song_id = ?2",
            params![id, song_id],
        )?;
        if removed == 0 {
            return Err(ServiceError::not_found("Song not in playlist"));
        }
        touch_playlist(&tx, id)?;
        tx.commit()?;
        Ok(())
    }

    // =========================================================================
    // Likes
    // =========================================================================

    fn like_song(&self, user_id: UserId, song_id: SongId) -> ServiceResult<Song> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        require_song(&tx, song_id)?;

        let already_liked = tx
            .query_row(
                "SELECT 1 FROM likes WHERE user_id = ?1 AND song_id = ?2",
                params![user_id, song_id],
                |_| Ok(()),
            )
            .optional()?
            .is_some();
        if already_liked {
            return Err(ServiceError::Conflict("Song already liked".to_string()));
        }

        tx.execute(
            "INSERT INTO likes (user_id, song_id) VALUES (?1, ?2)",
            params![user_id, song_id],
        )?;
        tx.execute("UPDATE songs SET liked = 1 WHERE id = ?1", params![song_id])?;
        let song = require_song(&tx, song_id)?;
        tx.commit()?;
        Ok(song)
    }

    fn unlike_song(&self, user_id: UserId, song_id: SongId) -> ServiceResult<()> {
        let conn = self.conn.lock().unwrap();
        let removed = conn.execute(
            "DELETE FROM likes WHERE user_id = ?1 AND song_id = ?2",
            params![user_id, song_id],
        )?;
        if removed == 0 {
            return Err(ServiceError::not_found("Like not found"));
        }
        Ok(())
    }

    fn list_liked_songs(&self, user_id: UserId, page: Page) -> ServiceResult<Vec<Song>> {
        let conn = self.conn.lock().unwrap();
        Ok(query_songs(
            &conn,
            &format!(
                "SELECT {} FROM likes l JOIN songs s ON s.id = l.song_id \
                 WHERE l.user_id = ?1 ORDER BY l.created DESC, l.id DESC LIMIT ?2 OFFSET ?3",
                SONG_COLUMNS
            ),
            params![user_id, page.limit, page.skip],
        )?)
    }

    fn liked_song_ids(
        &self,
        viewer: LikeViewer,
        song_ids: &[SongId],
    ) -> ServiceResult<HashSet<SongId>> {
        if song_ids.is_empty() {
            return Ok(HashSet::new());
        }

        let (filter, mut values) = match viewer {
            LikeViewer::User(user_id) => ("user_id = ? AND ", vec![user_id]),
            LikeViewer::Anonymous => ("", Vec::with_capacity(song_ids.len())),
        };
        values.extend_from_slice(song_ids);
        let placeholders = vec!["?"; song_ids.len()].join(", ");

        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT DISTINCT song_id FROM likes WHERE {}song_id IN ({})",
            filter, placeholders
        ))?;
        let ids = stmt
            .query_map(params_from_iter(values.iter()), |row| row.get::<_, SongId>(0))?
            .collect::<Result<HashSet<_>, _>>()?;
        Ok(ids)
    }
}
