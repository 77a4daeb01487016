//! End-to-end tests for song catalog endpoints
//!
//! Tests CRUD, pagination, search and the Spotify import endpoints.

mod common;

use common::{
    song_payload, TestClient, TestServer, SPOTIFY_ARTIST, SPOTIFY_EMPTY_QUERY, SPOTIFY_IMAGE_URL,
    SPOTIFY_TRACKS, SPOTIFY_UNLIMITED_QUERY,
};
use reqwest::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn test_create_and_get_song() {
    let server = TestServer::spawn().await;
    let client = TestClient::authenticated(server.base_url.clone()).await;

    let response = client.create_song(&song_payload("X", "Y")).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created: Value = response.json().await.unwrap();
    assert_eq!(created["title"], "X");
    assert_eq!(created["liked"], false);
    assert_eq!(created["ever_liked"], false);

    let id = created["id"].as_i64().unwrap();
    let response = client.get_song(id).await;
    assert_eq!(response.status(), StatusCode::OK);
    let fetched: Value = response.json().await.unwrap();
    assert_eq!(fetched["artist"], "Y");
    assert_eq!(fetched["duration"], 180.5);
}

#[tokio::test]
async fn test_create_song_requires_authentication() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.create_song(&song_payload("X", "Y")).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_get_missing_song_is_not_found() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.get_song(12345).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["detail"], "Song not found");
}

#[tokio::test]
async fn test_list_songs_is_paginated() {
    let server = TestServer::spawn().await;
    let client = TestClient::authenticated(server.base_url.clone()).await;

    for i in 0..5 {
        client
            .create_song_id(&song_payload(&format!("Song {}", i), "Artist"))
            .await;
    }

    let all: Vec<Value> = client.list_songs().await.json().await.unwrap();
    assert_eq!(all.len(), 5);

    let page: Vec<Value> = client.list_songs_page(1, 2).await.json().await.unwrap();
    assert_eq!(page.len(), 2);
    assert_eq!(page[0]["title"], "Song 1");
    assert_eq!(page[1]["title"], "Song 2");

    let response = client.list_songs_page(0, 0).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let response = client.list_songs_page(0, 101).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_update_song() {
    let server = TestServer::spawn().await;
    let client = TestClient::authenticated(server.base_url.clone()).await;
    let id = client.create_song_id(&song_payload("Old", "Artist")).await;

    let response = client
        .update_song(id, &json!({ "title": "New", "genre": "Jazz" }))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let song: Value = response.json().await.unwrap();
    assert_eq!(song["title"], "New");
    assert_eq!(song["genre"], "Jazz");
    assert_eq!(song["artist"], "Artist");

    let response = client.update_song(999, &json!({ "title": "Nope" })).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_song_removes_likes() {
    let server = TestServer::spawn().await;
    let client = TestClient::authenticated(server.base_url.clone()).await;
    let id = client.create_song_id(&song_payload("Doomed", "Artist")).await;
    assert_eq!(client.like_song(id).await.status(), StatusCode::CREATED);

    let response = client.delete_song(id).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Song deleted successfully");
    assert_eq!(body["deleted_likes_count"], 1);
    assert_eq!(body["song_title"], "Doomed");

    assert_eq!(client.get_song(id).await.status(), StatusCode::NOT_FOUND);
    let likes: Vec<Value> = client.list_likes().await.json().await.unwrap();
    assert!(likes.is_empty());

    assert_eq!(client.delete_song(id).await.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_search_is_case_insensitive_across_fields() {
    let server = TestServer::spawn().await;
    let client = TestClient::authenticated(server.base_url.clone()).await;
    client.create_song_id(&song_payload("Blue Monday", "New Order")).await;
    client.create_song_id(&song_payload("Yellow", "Coldplay")).await;

    let response = client.search_songs("blue").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["query"], "blue");
    assert_eq!(body["count"], 1);
    assert_eq!(body["results"][0]["title"], "Blue Monday");

    let body: Value = client.search_songs("COLDPLAY").await.json().await.unwrap();
    assert_eq!(body["count"], 1);

    let body: Value = client.search_songs("rock").await.json().await.unwrap();
    assert_eq!(body["count"], 2);

    let response = client.search_songs("   ").await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_import_from_spotify_creates_song() {
    let server = TestServer::spawn().await;
    let client = TestClient::authenticated(server.base_url.clone()).await;

    let response = client.import_from_spotify("hit").await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let song: Value = response.json().await.unwrap();
    assert_eq!(song["title"], SPOTIFY_TRACKS[0]);
    assert_eq!(song["artist"], SPOTIFY_ARTIST);
    assert_eq!(song["image_url"], SPOTIFY_IMAGE_URL);
    assert_eq!(song["genre"], "Unknown");
    assert!(song["local_file_path"].is_null());
}

#[tokio::test]
async fn test_import_with_no_results_is_not_found() {
    let server = TestServer::spawn().await;
    let client = TestClient::authenticated(server.base_url.clone()).await;

    let response = client.import_from_spotify(SPOTIFY_EMPTY_QUERY).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = client.import_from_spotify("").await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_bulk_import_skips_existing_songs() {
    let server = TestServer::spawn().await;
    let client = TestClient::authenticated(server.base_url.clone()).await;

    let response = client.bulk_import_from_spotify("hit", Some(2)).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let first: Vec<Value> = response.json().await.unwrap();
    assert_eq!(first.len(), 2);

    let response = client.bulk_import_from_spotify("hit", None).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let second: Vec<Value> = response.json().await.unwrap();
    assert_eq!(second.len(), SPOTIFY_TRACKS.len());
    assert_eq!(second[0]["id"], first[0]["id"]);
    assert_eq!(second[1]["id"], first[1]["id"]);

    let all: Vec<Value> = client.list_songs().await.json().await.unwrap();
    assert_eq!(all.len(), SPOTIFY_TRACKS.len());

    let response = client.bulk_import_from_spotify("hit", Some(0)).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_import_requires_authentication() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.import_from_spotify("hit").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_spotify_connection_check() {
    let server = TestServer::spawn().await;
    let client = TestClient::authenticated(server.base_url.clone()).await;

    let response = client.test_spotify().await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "connected");
}

#[tokio::test]
async fn test_bulk_import_defaults_to_twenty_tracks() {
    let server = TestServer::spawn().await;
    let client = TestClient::authenticated(server.base_url.clone()).await;

    let response = client
        .bulk_import_from_spotify(SPOTIFY_UNLIMITED_QUERY, None)
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let songs: Vec<Value> = response.json().await.unwrap();
    assert_eq!(songs.len(), 20);

    let response = client
        .bulk_import_from_spotify(SPOTIFY_UNLIMITED_QUERY, Some(50))
        .await;
    let songs: Vec<Value> = response.json().await.unwrap();
    assert_eq!(songs.len(), 50);

    let response = client
        .bulk_import_from_spotify(SPOTIFY_UNLIMITED_QUERY, Some(51))
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_search_folds_non_ascii_case() {
    let server = TestServer::spawn().await;
    let client = TestClient::authenticated(server.base_url.clone()).await;
    client.create_song_id(&song_payload("Éclair Über", "Ørjan")).await;

    for query in ["éclair", "ÜBER", "øRJAN"] {
        let body: Value = client.search_songs(query).await.json().await.unwrap();
        assert_eq!(body["count"], 1, "{}", query);
        assert_eq!(body["results"][0]["title"], "Éclair Über");
    }
}

#[tokio::test]
async fn test_list_songs_rejects_huge_skip() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.list_songs_page(usize::MAX, 10).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "validation");
}
