mod cache;

pub use cache::{cache_key, is_preview_url, AudioCache, CACHED_AUDIO_EXTENSION, DOWNLOAD_TIMEOUT};
