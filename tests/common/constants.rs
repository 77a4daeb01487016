//! Shared constants for end-to-end tests
//!
//! When test data changes (user credentials, fake Spotify results, etc.),
//! update only this file.

// ============================================================================
// Test User Credentials
// ============================================================================

/// Default test user email
pub const TEST_EMAIL: &str = "testuser@example.com";

/// Default test user name
pub const TEST_USERNAME: &str = "testuser";

/// Default test user password
pub const TEST_PASS: &str = "testpass123";

/// Second user, for visibility checks across users
pub const OTHER_EMAIL: &str = "other@example.com";

/// Second user name
pub const OTHER_USERNAME: &str = "otheruser";

// ============================================================================
// Server Layout
// ============================================================================

/// Prefix all API routes are mounted under
pub const API_PREFIX: &str = "/api/v1";

/// Directory under the data dir holding cached audio
pub const AUDIO_STORAGE_DIR: &str = "audio_storage";

// ============================================================================
// Fake Spotify Catalog
// ============================================================================

/// Artist of every track the fake Spotify provider returns
pub const SPOTIFY_ARTIST: &str = "Spotify Band";

/// Album of every track the fake Spotify provider returns
pub const SPOTIFY_ALBUM: &str = "Spotify Album";

/// Track titles the fake provider returns, in search order
pub const SPOTIFY_TRACKS: [&str; 3] = ["First Hit", "Second Hit", "Third Hit"];

/// Cover image of the fake tracks
pub const SPOTIFY_IMAGE_URL: &str = "https://images.example.com/cover.jpg";

/// Query the fake provider answers with no results
pub const SPOTIFY_EMPTY_QUERY: &str = "nothing matches this";

/// Query the fake provider answers with exactly as many tracks as requested
pub const SPOTIFY_UNLIMITED_QUERY: &str = "give me everything";

// ============================================================================
// Test Timeouts and Configuration
// ============================================================================

/// Maximum time to wait for server to become ready (milliseconds)
pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;

/// Timeout for individual HTTP requests (seconds)
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Polling interval when waiting for server ready (milliseconds)
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 50;

/// Size of the generated audio file served by streaming tests (bytes)
pub const TEST_AUDIO_SIZE_BYTES: usize = 8400;
