//! Direct file streaming with HTTP range requests.
//!
//! [`resolve_stream`] turns a file path and an optional `Range` header into
//! a [`StreamPlan`]: the status, headers and a lazily-read body. Nothing is
//! read from the file until the body is polled.

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use futures::Stream;
use mediaforge_common::{Error, Result};
use std::io::{self, SeekFrom};
use std::path::Path;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt, Take};
use tokio_util::io::ReaderStream;
use tracing::debug;

use super::range::{resolve_range, ByteRange};

/// Upper bound on the size of each body chunk.
pub const CHUNK_SIZE: usize = 512 * 1024;

/// Body of a [`StreamPlan`]: at most `length` bytes of the file, read in
/// chunks of up to [`CHUNK_SIZE`].
///
/// Ends early, without error, if the file shrinks while being read.
#[derive(Debug)]
pub struct ChunkStream {
    inner: ReaderStream<Take<File>>,
    length: u64,
}

impl ChunkStream {
    fn new(file: File, length: u64) -> Self {
        Self {
            inner: ReaderStream::with_capacity(file.take(length), CHUNK_SIZE),
            length,
        }
    }

    /// Number of bytes the stream will yield if the file is unchanged.
    pub fn expected_len(&self) -> u64 {
        self.length
    }
}

impl Stream for ChunkStream {
    type Item = io::Result<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

/// Everything needed to answer a streaming request.
#[derive(Debug)]
pub struct StreamPlan {
    status: StatusCode,
    headers: HeaderMap,
    range: Option<ByteRange>,
    file_size: u64,
    body: ChunkStream,
}

impl StreamPlan {
    /// `200 OK` for whole-file responses, `206 Partial Content` for ranges.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// The resolved window, if a `Range` header was honored.
    pub fn range(&self) -> Option<ByteRange> {
        self.range
    }

    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    /// Value of the `Content-Length` header.
    pub fn content_length(&self) -> u64 {
        self.body.expected_len()
    }

    /// Replace the `Content-Type` chosen at resolution time.
    pub fn with_content_type(mut self, content_type: &'static str) -> Self {
        self.headers
            .insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
        self
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn into_body(self) -> ChunkStream {
        self.body
    }
}

impl IntoResponse for StreamPlan {
    fn into_response(self) -> Response {
        (self.status, self.headers, Body::from_stream(self.body)).into_response()
    }
}

fn open_error(err: io::Error, path: &Path) -> Error {
    if err.kind() == io::ErrorKind::NotFound {
        Error::not_found("file", path.display())
    } else {
        Error::from(err)
    }
}

/// Open `path` and plan a response for it.
///
/// Without a `range_header` the whole file is served with `200`. With one,
/// the resolved window is served with `206` and a `Content-Range` header.
///
/// # Errors
///
/// * [`Error::NotFound`] if `path` is missing or is not a regular file
/// * [`Error::MalformedRange`] / [`Error::RangeNotSatisfiable`] from range resolution
/// * [`Error::Io`] if the file cannot be opened or positioned
pub async fn resolve_stream(
    path: &Path,
    range_header: Option<&str>,
    content_type: &'static str,
) -> Result<StreamPlan> {
    let mut file = File::open(path).await.map_err(|e| open_error(e, path))?;
    let metadata = file.metadata().await?;
    if !metadata.is_file() {
        return Err(Error::not_found("file", path.display()));
    }
    let file_size = metadata.len();

    let range = range_header
        .map(|value| resolve_range(value, file_size))
        .transpose()?;

    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    headers.insert(header::ACCEPT_RANGES, HeaderValue::from_static("bytes"));

    let (status, start, length) = match range {
        Some(r) => {
            let content_range = HeaderValue::from_str(&r.content_range(file_size))
                .map_err(|e| Error::internal(format!("invalid Content-Range: {e}")))?;
            headers.insert(header::CONTENT_RANGE, content_range);
            (StatusCode::PARTIAL_CONTENT, r.start, r.len())
        }
        None => (StatusCode::OK, 0, file_size),
    };
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(length));

    if start > 0 {
        file.seek(SeekFrom::Start(start)).await?;
    }

    debug!(
        path = %path.display(),
        status = status.as_u16(),
        start,
        length,
        file_size,
        "Resolved stream"
    );

    Ok(StreamPlan {
        status,
        headers,
        range,
        file_size,
        body: ChunkStream::new(file, length),
    })
}
