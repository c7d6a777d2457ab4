//! Source libraries and the converted-output directory.

use crate::config::StorageConfig;
use mediaforge_common::paths::{is_format_token, is_media_file, is_safe_file_name};
use mediaforge_common::{Error, MediaKind, Result};
use std::path::{Path, PathBuf};

/// The three filesystem roots the server works against.
#[derive(Debug, Clone)]
pub struct MediaLibrary {
    audio_dir: PathBuf,
    video_dir: PathBuf,
    output_dir: PathBuf,
}

impl MediaLibrary {
    pub fn new(audio_dir: PathBuf, video_dir: PathBuf, output_dir: PathBuf) -> Self {
        Self {
            audio_dir,
            video_dir,
            output_dir,
        }
    }

    pub fn from_config(storage: &StorageConfig) -> Self {
        Self::new(
            storage.audio_dir(),
            storage.video_dir(),
            storage.output_dir(),
        )
    }

    /// Create all three directories if they are missing.
    pub fn ensure_dirs(&self) -> Result<()> {
        for dir in [&self.audio_dir, &self.video_dir, &self.output_dir] {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }

    pub fn dir(&self, kind: MediaKind) -> &Path {
        match kind {
            MediaKind::Audio => &self.audio_dir,
            MediaKind::Video => &self.video_dir,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Resolve `filename` inside the library for `kind`.
    ///
    /// # Errors
    ///
    /// * [`Error::InvalidInput`] if the name would escape the library
    /// * [`Error::NotFound`] if no such regular file exists
    /// * [`Error::Io`] if the file exists but cannot be inspected
    pub async fn source_path(&self, kind: MediaKind, filename: &str) -> Result<PathBuf> {
        if !is_safe_file_name(filename) {
            return Err(Error::invalid_input(format!(
                "Invalid file name: {filename:?}"
            )));
        }

        let path = self.dir(kind).join(filename);
        let is_file = match tokio::fs::metadata(&path).await {
            Ok(metadata) => metadata.is_file(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
            Err(e) => return Err(e.into()),
        };
        if !is_file {
            return Err(Error::not_found(
                "file",
                format!("{} in {}", filename, self.dir(kind).display()),
            ));
        }

        Ok(path)
    }

    /// Deterministic destination: `<stem>_converted.<format>` in the output dir.
    ///
    /// Repeated conversions of the same source to the same format share a
    /// path and overwrite each other.
    pub fn output_path(&self, source: &Path, format: &str) -> Result<PathBuf> {
        if !is_format_token(format) {
            return Err(Error::invalid_input(format!(
                "Invalid target format: {format:?}"
            )));
        }

        let stem = source
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| {
                Error::invalid_input(format!("Source has no usable stem: {}", source.display()))
            })?;

        Ok(self.output_dir.join(format!("{stem}_converted.{format}")))
    }

    /// Playable files in the library for `kind`, sorted by name.
    ///
    /// Symlinks are followed; dangling ones are skipped.
    pub async fn list(&self, kind: MediaKind) -> Result<Vec<String>> {
        let mut entries = tokio::fs::read_dir(self.dir(kind)).await?;
        let mut files = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if !is_media_file(&path, kind) {
                continue;
            }
            match tokio::fs::metadata(&path).await {
                Ok(metadata) if metadata.is_file() => {}
                _ => continue,
            }
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                files.push(name.to_string());
            }
        }

        files.sort();
        Ok(files)
    }
}
