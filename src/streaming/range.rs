//! HTTP `Range` header parsing and resolution against a file size.
//!
//! Only the first range of a comma-separated list is honored. An omitted
//! start means 0 (so `bytes=-500` is `0-500`, not a suffix range) and an
//! end past the file is clamped to the last byte.

use mediaforge_common::{Error, Result};

/// An inclusive, non-empty byte window inside a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    /// Number of bytes covered (`end - start + 1`).
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// Always `false`; a resolved range covers at least one byte.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// `Content-Range` value for a resource of `total` bytes.
    pub fn content_range(&self, total: u64) -> String {
        format!("bytes {}-{}/{}", self.start, self.end, total)
    }
}

fn parse_bound(raw: &str, header: &str) -> Result<Option<u64>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    if !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::malformed_range(format!("non-numeric bound in {header:?}")));
    }
    raw.parse::<u64>()
        .map(Some)
        .map_err(|_| Error::malformed_range(format!("bound out of range in {header:?}")))
}

/// Parse a `Range: bytes=START-END` header value.
///
/// Returns `(start, end)` with `None` for omitted bounds.
///
/// # Errors
///
/// [`Error::MalformedRange`] for a missing `bytes=` unit, missing dash,
/// non-numeric bounds, or both bounds omitted.
pub fn parse_range_header(value: &str) -> Result<(Option<u64>, Option<u64>)> {
    let trimmed = value.trim();
    let ranges = match trimmed.split_once('=') {
        Some((unit, ranges)) if unit.trim().eq_ignore_ascii_case("bytes") => ranges,
        _ => {
            return Err(Error::malformed_range(format!(
                "expected bytes unit in {value:?}"
            )))
        }
    };

    let first = ranges.split(',').next().unwrap_or_default();
    let (start, end) = first
        .split_once('-')
        .ok_or_else(|| Error::malformed_range(format!("missing dash in {value:?}")))?;

    let start = parse_bound(start, value)?;
    let end = parse_bound(end, value)?;

    if start.is_none() && end.is_none() {
        return Err(Error::malformed_range(format!("no bounds in {value:?}")));
    }

    Ok((start, end))
}

/// Resolve a raw header value into a concrete window of a `file_size` file.
///
/// # Errors
///
/// * [`Error::MalformedRange`] as for [`parse_range_header`]
/// * [`Error::RangeNotSatisfiable`] if `start >= file_size` or `start > end`
pub fn resolve_range(value: &str, file_size: u64) -> Result<ByteRange> {
    let (start, end) = parse_range_header(value)?;
    let start = start.unwrap_or(0);

    if start >= file_size {
        return Err(Error::RangeNotSatisfiable { size: file_size });
    }

    let last = file_size - 1;
    let end = end.map_or(last, |e| e.min(last));
    if end < start {
        return Err(Error::RangeNotSatisfiable { size: file_size });
    }

    Ok(ByteRange { start, end })
}
