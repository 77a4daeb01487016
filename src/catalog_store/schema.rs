//! Database schema for users, songs, albums, playlists and likes.
//!
//! All tables live in one database so that deleting a song or an album can
//! take its likes and playlist memberships with it in a single transaction.

use crate::sqlite_column;
use crate::sqlite_persistence::{
    ForeignKey, ForeignKeyOnChange, SqlType, Table, VersionedSchema, DEFAULT_TIMESTAMP,
};
use anyhow::Result;
use rusqlite::Connection;

const USER_FK: ForeignKey = ForeignKey {
    foreign_table: "users",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::Cascade,
};

const ALBUM_FK: ForeignKey = ForeignKey {
    foreign_table: "albums",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::Cascade,
};

const SONG_FK: ForeignKey = ForeignKey {
    foreign_table: "songs",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::Cascade,
};

const PLAYLIST_FK: ForeignKey = ForeignKey {
    foreign_table: "playlists",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::Cascade,
};

pub const USERS_TABLE: Table = Table {
    name: "users",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("email", &SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!("username", &SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!("password_hash", &SqlType::Text, non_null = true),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[],
};

pub const ALBUMS_TABLE: Table = Table {
    name: "albums",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("title", &SqlType::Text, non_null = true),
        sqlite_column!("artist", &SqlType::Text, non_null = true),
        sqlite_column!("image_url", &SqlType::Text),
        sqlite_column!("description", &SqlType::Text),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[],
};

const SONGS_TABLE_V_0: Table = Table {
    name: "songs",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("title", &SqlType::Text, non_null = true),
        sqlite_column!("artist", &SqlType::Text, non_null = true),
        sqlite_column!("album", &SqlType::Text, non_null = true),
        sqlite_column!("album_id", &SqlType::Integer, foreign_key = Some(&ALBUM_FK)),
        sqlite_column!("genre", &SqlType::Text, non_null = true),
        sqlite_column!("duration", &SqlType::Real, non_null = true),
        sqlite_column!("url", &SqlType::Text, non_null = true),
        sqlite_column!("image_url", &SqlType::Text),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[
        ("idx_songs_title", "title"),
        ("idx_songs_artist", "artist"),
        ("idx_songs_album_id", "album_id"),
    ],
};

/// V1 appends the cached audio path and the one-way liked flag.
pub const SONGS_TABLE_V_1: Table = Table {
    name: "songs",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("title", &SqlType::Text, non_null = true),
        sqlite_column!("artist", &SqlType::Text, non_null = true),
        sqlite_column!("album", &SqlType::Text, non_null = true),
        sqlite_column!("album_id", &SqlType::Integer, foreign_key = Some(&ALBUM_FK)),
        sqlite_column!("genre", &SqlType::Text, non_null = true),
        sqlite_column!("duration", &SqlType::Real, non_null = true),
        sqlite_column!("url", &SqlType::Text, non_null = true),
        sqlite_column!("image_url", &SqlType::Text),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
        sqlite_column!("local_file_path", &SqlType::Text),
        sqlite_column!(
            "liked",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("0")
        ),
    ],
    indices: &[
        ("idx_songs_title", "title"),
        ("idx_songs_artist", "artist"),
        ("idx_songs_album_id", "album_id"),
    ],
};

pub const PLAYLISTS_TABLE: Table = Table {
    name: "playlists",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("name", &SqlType::Text, non_null = true),
        sqlite_column!(
            "description",
            &SqlType::Text,
            non_null = true,
            default_value = Some("''")
        ),
        sqlite_column!(
            "owner_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&USER_FK)
        ),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
        sqlite_column!(
            "updated",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[("idx_playlists_owner", "owner_id")],
};

pub const PLAYLIST_SONGS_TABLE: Table = Table {
    name: "playlist_songs",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!(
            "playlist_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&PLAYLIST_FK)
        ),
        sqlite_column!(
            "song_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&SONG_FK)
        ),
        sqlite_column!(
            "added",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[
        ("idx_playlist_songs_playlist", "playlist_id"),
        ("idx_playlist_songs_song", "song_id"),
    ],
};

pub const LIKES_TABLE: Table = Table {
    name: "likes",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!(
            "user_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&USER_FK)
        ),
        sqlite_column!(
            "song_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&SONG_FK)
        ),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[("idx_likes_user", "user_id"), ("idx_likes_song", "song_id")],
};

fn migrate_v0_to_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "ALTER TABLE songs ADD COLUMN local_file_path TEXT;
         ALTER TABLE songs ADD COLUMN liked INTEGER NOT NULL DEFAULT 0;
         UPDATE songs SET liked = 1 WHERE id IN (SELECT DISTINCT song_id FROM likes);",
    )?;
    Ok(())
}

pub const VERSIONED_SCHEMAS: &[VersionedSchema] = &[
    VersionedSchema {
        version: 0,
        tables: &[
            USERS_TABLE,
            ALBUMS_TABLE,
            SONGS_TABLE_V_0,
            PLAYLISTS_TABLE,
            PLAYLIST_SONGS_TABLE,
            LIKES_TABLE,
        ],
        migration: None,
    },
    VersionedSchema {
        version: 1,
        tables: &[
            USERS_TABLE,
            ALBUMS_TABLE,
            SONGS_TABLE_V_1,
            PLAYLISTS_TABLE,
            PLAYLIST_SONGS_TABLE,
            LIKES_TABLE,
        ],
        migration: Some(migrate_v0_to_v1),
    },
];
