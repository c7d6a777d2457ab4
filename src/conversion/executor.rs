//! Codec tool invocation.
//!
//! The manager only sees the [`Transcoder`] trait; [`FfmpegTranscoder`] is
//! the production implementation and tests substitute their own.

use async_trait::async_trait;
use mediaforge_common::{Error, Result};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// Trailing stderr lines kept in a failure diagnostic.
const STDERR_TAIL_LINES: usize = 20;

/// Converts one input file into one output file.
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Run the conversion to completion.
    ///
    /// Returns `Ok(())` only if `output` was produced.
    async fn transcode(&self, input: &Path, output: &Path) -> Result<()>;
}

/// Availability of the codec tool, as reported by `-version`.
#[derive(Debug, Clone)]
pub struct ToolInfo {
    pub name: String,
    pub available: bool,
    /// First line of the version banner.
    pub version: Option<String>,
    pub path: Option<PathBuf>,
}

/// Runs `<program> -y -i <input> <output>`.
#[derive(Debug, Clone)]
pub struct FfmpegTranscoder {
    program: PathBuf,
    timeout: Option<Duration>,
}

impl FfmpegTranscoder {
    pub fn new(program: PathBuf) -> Self {
        Self {
            program,
            timeout: None,
        }
    }

    /// Kill the tool and fail the conversion after `timeout`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Use the configured path if it exists, else PATH lookup, else `ffmpeg`.
    pub fn locate(configured: Option<&Path>) -> Self {
        if let Some(path) = configured {
            if path.exists() {
                return Self::new(path.to_path_buf());
            }
        }
        Self::new(which::which("ffmpeg").unwrap_or_else(|_| PathBuf::from("ffmpeg")))
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Run `<program> -version` and report whether the tool is usable.
    pub fn check(&self) -> ToolInfo {
        let name = self.tool_name();
        match std::process::Command::new(&self.program)
            .arg("-version")
            .output()
        {
            Ok(output) if output.status.success() => ToolInfo {
                version: String::from_utf8_lossy(&output.stdout)
                    .lines()
                    .next()
                    .map(|s| s.to_string()),
                path: which::which(&self.program).ok(),
                available: true,
                name,
            },
            _ => ToolInfo {
                name,
                available: false,
                version: None,
                path: None,
            },
        }
    }

    fn tool_name(&self) -> String {
        self.program
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.program.to_string_lossy().to_string())
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    async fn transcode(&self, input: &Path, output: &Path) -> Result<()> {
        let tool = self.tool_name();

        let mut cmd = Command::new(&self.program);
        cmd.arg("-y")
            .arg("-i")
            .arg(input)
            .arg(output)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!(program = %self.program.display(), input = %input.display(), output = %output.display(), "Spawning codec tool");

        let child = cmd
            .spawn()
            .map_err(|e| Error::tool(&tool, format!("failed to spawn: {e}")))?;

        // Dropping the future on timeout drops the child, which kills it.
        let waited = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, child.wait_with_output())
                .await
                .map_err(|_| Error::tool(&tool, format!("timed out after {limit:?}")))?,
            None => child.wait_with_output().await,
        };
        let result =
            waited.map_err(|e| Error::tool(&tool, format!("I/O error waiting for process: {e}")))?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(Error::tool(
                tool,
                format!("exited with {}: {}", result.status, stderr_tail(&stderr)),
            ));
        }

        if !tokio::fs::try_exists(output).await.unwrap_or(false) {
            return Err(Error::tool(
                tool,
                format!("exited successfully but {} was not created", output.display()),
            ));
        }

        Ok(())
    }
}

fn stderr_tail(stderr: &str) -> String {
    let lines: Vec<&str> = stderr.trim().lines().collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_stderr_tail_keeps_last_lines() {
        let stderr: String = (0..50).map(|i| format!("line {i}\n")).collect();
        let tail = stderr_tail(&stderr);
        assert!(tail.starts_with("line 30"));
        assert!(tail.ends_with("line 49"));
        assert_eq!(tail.lines().count(), STDERR_TAIL_LINES);
    }

    #[test]
    fn test_stderr_tail_short() {
        assert_eq!(stderr_tail("  only line \n"), "only line");
        assert_eq!(stderr_tail(""), "");
    }

    #[test]
    fn test_locate_prefers_existing_configured_path() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let t = FfmpegTranscoder::locate(Some(file.path()));
        assert_eq!(t.program(), file.path());
    }

    #[test]
    fn test_locate_ignores_missing_configured_path() {
        let t = FfmpegTranscoder::locate(Some(Path::new("/nonexistent/ffmpeg")));
        assert_ne!(t.program(), Path::new("/nonexistent/ffmpeg"));
    }

    #[test]
    fn test_check_missing_tool() {
        let info = FfmpegTranscoder::new(PathBuf::from("nonexistent_codec_tool_xyz_12345")).check();
        assert!(!info.available);
        assert!(info.version.is_none());
        assert!(info.path.is_none());
        assert_eq!(info.name, "nonexistent_codec_tool_xyz_12345");
    }

    #[tokio::test]
    async fn test_missing_program_is_tool_error() {
        let dir = tempfile::tempdir().unwrap();
        let t = FfmpegTranscoder::new(PathBuf::from("nonexistent_codec_tool_xyz_12345"));
        let err = t
            .transcode(&dir.path().join("in.wav"), &dir.path().join("out.mp3"))
            .await
            .unwrap_err();
        assert_matches!(err, Error::Tool { .. });
        assert!(err.to_string().contains("failed to spawn"));
    }

    #[cfg(unix)]
    mod unix {
        use super::*;
        use std::os::unix::fs::PermissionsExt;

        /// Write an executable shell script standing in for the codec tool.
        /// Arguments arrive as `-y -i <in> <out>`, so `$4` is the output.
        fn fake_tool(dir: &Path, body: &str) -> PathBuf {
            let path = dir.join("fake-ffmpeg");
            std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
            path
        }

        #[test]
        fn test_check_reports_version_line() {
            let dir = tempfile::tempdir().unwrap();
            let tool = fake_tool(dir.path(), "echo 'ffmpeg version 6.1'\necho 'built with gcc'");

            let info = FfmpegTranscoder::new(tool).check();
            assert!(info.available);
            assert_eq!(info.version.as_deref(), Some("ffmpeg version 6.1"));
            assert!(info.path.is_some());
        }

        #[tokio::test]
        async fn test_success_writes_output() {
            let dir = tempfile::tempdir().unwrap();
            let tool = fake_tool(dir.path(), r#"cp "$3" "$4""#);
            let input = dir.path().join("in.wav");
            let output = dir.path().join("out.mp3");
            std::fs::write(&input, b"pcm").unwrap();

            FfmpegTranscoder::new(tool)
                .transcode(&input, &output)
                .await
                .unwrap();
            assert_eq!(std::fs::read(&output).unwrap(), b"pcm");
        }

        #[tokio::test]
        async fn test_nonzero_exit_captures_stderr() {
            let dir = tempfile::tempdir().unwrap();
            let tool = fake_tool(
                dir.path(),
                "echo 'in.wav: Invalid data found when processing input' >&2\nexit 1",
            );

            let err = FfmpegTranscoder::new(tool)
                .transcode(&dir.path().join("in.wav"), &dir.path().join("out.mp3"))
                .await
                .unwrap_err();
            assert_matches!(err, Error::Tool { .. });
            assert!(
                err.to_string().contains("Invalid data found"),
                "unexpected error: {err}"
            );
        }

        #[tokio::test]
        async fn test_zero_exit_without_output_fails() {
            let dir = tempfile::tempdir().unwrap();
            let tool = fake_tool(dir.path(), "exit 0");

            let err = FfmpegTranscoder::new(tool)
                .transcode(&dir.path().join("in.wav"), &dir.path().join("out.mp3"))
                .await
                .unwrap_err();
            assert!(err.to_string().contains("was not created"));
        }

        #[tokio::test]
        async fn test_timeout_fires() {
            let dir = tempfile::tempdir().unwrap();
            let tool = fake_tool(dir.path(), "sleep 10");

            let started = std::time::Instant::now();
            let err = FfmpegTranscoder::new(tool)
                .with_timeout(Some(Duration::from_millis(100)))
                .transcode(&dir.path().join("in.wav"), &dir.path().join("out.mp3"))
                .await
                .unwrap_err();
            assert!(err.to_string().contains("timed out"), "unexpected error: {err}");
            assert!(started.elapsed() < Duration::from_secs(5));
        }
    }
}
