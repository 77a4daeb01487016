//! Audio streaming: cached preview files first, then a proxy to the source URL.

use super::state::ServerState;
use crate::audio_cache::is_preview_url;
use crate::catalog_store::{Song, SongId};
use crate::errors::{ServiceError, ServiceResult};
use axum::{
    body::Body,
    extract::{OptionalFromRequestParts, Path, State},
    http::{header, HeaderValue, StatusCode},
    response::Response,
};
use std::convert::Infallible;
use std::path::Path as FsPath;
use tokio::{
    fs::File,
    io::{AsyncReadExt, AsyncSeekExt, BufReader, SeekFrom},
};
use tokio_util::io::ReaderStream;
use tracing::{debug, error};

const HEADER_BYTE_RANGE: &str = "Range";
const DEFAULT_AUDIO_CONTENT_TYPE: &str = "audio/mpeg";
const SNIFF_LENGTH: usize = 8192;
const STREAM_BUFFER_SIZE: usize = 4096 * 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    start_inclusive: Option<u64>,
    end_inclusive: Option<u64>,
}

/// What a `ByteRange` selects within a file of known length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RangeSelection {
    Full,
    Partial { start: u64, end: u64 },
    Unsatisfiable,
}

impl ByteRange {
    pub fn new(start_inclusive: Option<u64>, end_inclusive: Option<u64>) -> ByteRange {
        ByteRange {
            start_inclusive,
            end_inclusive,
        }
    }

    fn parse<S: AsRef<str>>(s: S) -> Option<ByteRange> {
        let v = s.as_ref().strip_prefix("bytes=")?;
        let parts: Vec<&str> = v.split('-').collect();
        if parts.len() != 2 {
            return None;
        }

        Some(ByteRange {
            start_inclusive: parts[0].parse::<u64>().ok(),
            end_inclusive: parts[1].parse::<u64>().ok(),
        })
    }

    /// `bytes=-N` is the last N bytes; an end past the file is clamped.
    fn select(&self, file_length: u64) -> RangeSelection {
        if file_length == 0 {
            return match (self.start_inclusive, self.end_inclusive) {
                (None, None) => RangeSelection::Full,
                _ => RangeSelection::Unsatisfiable,
            };
        }
        let last = file_length - 1;
        match (self.start_inclusive, self.end_inclusive) {
            (None, None) => RangeSelection::Full,
            (Some(start), None) if start <= last => RangeSelection::Partial { start, end: last },
            (Some(start), Some(end)) if start <= end && start <= last => RangeSelection::Partial {
                start,
                end: end.min(last),
            },
            (None, Some(suffix)) if suffix > 0 => RangeSelection::Partial {
                start: file_length.saturating_sub(suffix),
                end: last,
            },
            _ => RangeSelection::Unsatisfiable,
        }
    }
}

impl OptionalFromRequestParts<ServerState> for ByteRange {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &ServerState,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(parts
            .headers
            .get(HEADER_BYTE_RANGE)
            .and_then(|x| x.to_str().ok())
            .and_then(ByteRange::parse))
    }
}

/// Header-safe download name derived from the song title.
fn audio_file_name(song: &Song) -> String {
    let stem: String = song
        .title
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("{}.mp3", stem)
}

fn content_disposition(song: &Song) -> String {
    format!("inline; filename=\"{}\"", audio_file_name(song))
}

fn build_response(builder: axum::http::response::Builder, body: Body) -> ServiceResult<Response> {
    builder
        .body(body)
        .map_err(|err| ServiceError::Internal(err.into()))
}

async fn serve_file(
    path: &FsPath,
    byte_range: Option<ByteRange>,
    song: &Song,
) -> ServiceResult<Response> {
    let io_error = |err: std::io::Error| ServiceError::Internal(err.into());
    let mut file = File::open(path).await.map_err(io_error)?;
    let file_length = file.metadata().await.map_err(io_error)?.len();

    let mut head = vec![0u8; SNIFF_LENGTH];
    let read = file.read(&mut head).await.map_err(io_error)?;
    let content_type = infer::get(&head[..read])
        .map(|kind| kind.mime_type())
        .unwrap_or(DEFAULT_AUDIO_CONTENT_TYPE);

    let selection = byte_range
        .map(|range| range.select(file_length))
        .unwrap_or(RangeSelection::Full);
    let (status_code, start, length) = match selection {
        RangeSelection::Full => (StatusCode::OK, 0, file_length),
        RangeSelection::Partial { start, end } => {
            (StatusCode::PARTIAL_CONTENT, start, end - start + 1)
        }
        RangeSelection::Unsatisfiable => {
            debug!("Unsatisfiable range {:?} for song {}", byte_range, song.id);
            let builder = Response::builder()
                .status(StatusCode::RANGE_NOT_SATISFIABLE)
                .header(header::CONTENT_RANGE, format!("bytes */{}", file_length));
            return build_response(builder, Body::empty());
        }
    };

    file.seek(SeekFrom::Start(start)).await.map_err(io_error)?;
    let file_reader = BufReader::with_capacity(STREAM_BUFFER_SIZE, file.take(length));
    let stream = ReaderStream::with_capacity(file_reader, STREAM_BUFFER_SIZE);

    let mut builder = Response::builder()
        .status(status_code)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::ACCEPT_RANGES, "bytes")
        .header(header::CONTENT_LENGTH, length)
        .header(header::CONTENT_DISPOSITION, content_disposition(song));
    if status_code == StatusCode::PARTIAL_CONTENT {
        builder = builder.header(
            header::CONTENT_RANGE,
            format!("bytes {}-{}/{}", start, start + length - 1, file_length),
        );
    }
    build_response(builder, Body::from_stream(stream))
}

async fn proxy_stream(client: &reqwest::Client, song: &Song) -> ServiceResult<Response> {
    let response = client.get(&song.url).send().await.map_err(|err| {
        error!("Error streaming from URL {}: {}", song.url, err);
        ServiceError::Streaming(err.to_string())
    })?;
    let status = response.status();
    if !status.is_success() {
        error!("Error streaming from URL {}: status {}", song.url, status);
        return Err(ServiceError::Streaming(format!(
            "upstream responded with {}",
            status
        )));
    }

    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .cloned()
        .unwrap_or(HeaderValue::from_static(DEFAULT_AUDIO_CONTENT_TYPE));
    let builder = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_DISPOSITION, content_disposition(song));
    build_response(builder, Body::from_stream(response.bytes_stream()))
}

pub async fn stream_song(
    byte_range: Option<ByteRange>,
    State(state): State<ServerState>,
    Path(id): Path<SongId>,
) -> ServiceResult<Response> {
    let song = state
        .catalog_store
        .get_song(id)?
        .ok_or_else(|| ServiceError::not_found("Song not found"))?;

    if let Some(relative) = song.local_file_path.as_deref() {
        match state.audio_cache.resolve(relative) {
            Some(path) if tokio::fs::try_exists(&path).await.unwrap_or(false) => {
                debug!("Streaming song {} from {:?}", song.id, path);
                return serve_file(&path, byte_range, &song).await;
            }
            _ => debug!("Cached audio {} of song {} is missing", relative, song.id),
        }
    }

    if is_preview_url(&song.url) {
        debug!("Proxying song {} from {}", song.id, song.url);
        return proxy_stream(&state.http_client, &song).await;
    }

    Err(ServiceError::not_found(
        "This song doesn't have a playable preview",
    ))
}
