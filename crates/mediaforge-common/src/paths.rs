//! Path utilities for detecting media files and inferring MIME types.
//!
//! These are used by the media library listing, the range streamer, and the
//! conversion boundary to keep caller-supplied names inside their library.

use crate::MediaKind;
use std::path::Path;

/// List of supported audio file extensions.
const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "flac", "ogg", "m4a", "aac"];

/// List of supported video file extensions.
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mkv", "mov", "avi", "webm", "m4v"];

fn lowercase_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
}

/// Check if a path has an audio file extension.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use mediaforge_common::paths::is_audio_file;
///
/// assert!(is_audio_file(Path::new("theme.mp3")));
/// assert!(is_audio_file(Path::new("/library/LIVE.FLAC")));
/// assert!(!is_audio_file(Path::new("intro.mp4")));
/// ```
pub fn is_audio_file(path: &Path) -> bool {
    lowercase_extension(path)
        .map(|ext| AUDIO_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

/// Check if a path has a video file extension.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use mediaforge_common::paths::is_video_file;
///
/// assert!(is_video_file(Path::new("intro.mp4")));
/// assert!(!is_video_file(Path::new("theme.mp3")));
/// ```
pub fn is_video_file(path: &Path) -> bool {
    lowercase_extension(path)
        .map(|ext| VIDEO_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

/// Check if a path is a playable file for the given library.
pub fn is_media_file(path: &Path, kind: MediaKind) -> bool {
    match kind {
        MediaKind::Audio => is_audio_file(path),
        MediaKind::Video => is_video_file(path),
    }
}

/// Infer the MIME type from a file name, falling back per media kind.
///
/// # Examples
///
/// ```
/// use mediaforge_common::{paths::guess_content_type, MediaKind};
///
/// assert_eq!(guess_content_type("clip.webm", MediaKind::Video), "video/webm");
/// assert_eq!(guess_content_type("track.xyz", MediaKind::Audio), "audio/mpeg");
/// ```
pub fn guess_content_type(file_name: &str, kind: MediaKind) -> &'static str {
    let ext = lowercase_extension(Path::new(file_name)).unwrap_or_default();

    match ext.as_str() {
        "mp4" | "m4v" => "video/mp4",
        "mkv" => "video/x-matroska",
        "webm" => "video/webm",
        "avi" => "video/x-msvideo",
        "mov" => "video/quicktime",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "flac" => "audio/flac",
        "ogg" => "audio/ogg",
        "m4a" => "audio/mp4",
        "aac" => "audio/aac",
        _ => kind.fallback_content_type(),
    }
}

/// Check that a caller-supplied file name stays inside its directory.
///
/// Rejects empty names, path separators, NUL, and names that are exactly
/// `.` or `..`. Dots elsewhere in the name are allowed.
pub fn is_safe_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains('/')
        && !name.contains('\\')
        && !name.contains('\0')
}

/// Check that a target format is a bare extension token such as `mp3`.
pub fn is_format_token(format: &str) -> bool {
    !format.is_empty() && format.chars().all(|c| c.is_ascii_alphanumeric())
}
