use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub conversion: ConversionConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Filesystem roots for the two source libraries and converted output.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Base content directory
    #[serde(default = "default_storage_root")]
    pub root: PathBuf,

    /// Audio library (default: `<root>/audios`)
    #[serde(default)]
    pub audio_dir: Option<PathBuf>,

    /// Video library (default: `<root>/videos`)
    #[serde(default)]
    pub video_dir: Option<PathBuf>,

    /// Converted output (default: `<root>/converted`)
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
}

fn default_storage_root() -> PathBuf {
    PathBuf::from("./content")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: default_storage_root(),
            audio_dir: None,
            video_dir: None,
            output_dir: None,
        }
    }
}

impl StorageConfig {
    pub fn audio_dir(&self) -> PathBuf {
        self.audio_dir
            .clone()
            .unwrap_or_else(|| self.root.join("audios"))
    }

    pub fn video_dir(&self) -> PathBuf {
        self.video_dir
            .clone()
            .unwrap_or_else(|| self.root.join("videos"))
    }

    pub fn output_dir(&self) -> PathBuf {
        self.output_dir
            .clone()
            .unwrap_or_else(|| self.root.join("converted"))
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConversionConfig {
    /// Explicit codec tool location; otherwise looked up on PATH
    #[serde(default)]
    pub ffmpeg_path: Option<PathBuf>,

    /// Kill the codec tool after this many seconds (unset = wait forever)
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// Maximum conversions running at once (unset = unbounded)
    #[serde(default)]
    pub max_concurrent: Option<usize>,

    /// Target formats accepted by the API
    #[serde(default = "default_allowed_formats")]
    pub allowed_formats: Vec<String>,
}

fn default_allowed_formats() -> Vec<String> {
    [
        "mp3", "wav", "flac", "ogg", "m4a", "aac", "mp4", "mkv", "mov", "avi", "webm",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: None,
            timeout_secs: None,
            max_concurrent: None,
            allowed_formats: default_allowed_formats(),
        }
    }
}

impl ConversionConfig {
    /// Check a requested target format against the whitelist (case-insensitive).
    pub fn allows_format(&self, format: &str) -> bool {
        self.allowed_formats
            .iter()
            .any(|f| f.eq_ignore_ascii_case(format))
    }
}
