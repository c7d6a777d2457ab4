//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`], which lays out the three library directories
//! in a temp dir and builds a full [`AppContext`] around a fake transcoder.
//! The [`TestHarness::with_server`] constructor starts Axum on a random port
//! for HTTP-level testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, Response},
    Router,
};
use http_body_util::BodyExt;
use mediaforge::config::Config;
use mediaforge::conversion::{ConversionManager, ConversionTask, MediaLibrary, Transcoder};
use mediaforge::server::{create_router, AppContext};
use mediaforge_common::{Error, Result, TaskId};
use tempfile::TempDir;
use tokio::sync::Notify;
use tower::ServiceExt;

/// Writes the input bytes to the output path.
pub struct CopyTranscoder;

#[async_trait]
impl Transcoder for CopyTranscoder {
    async fn transcode(&self, input: &Path, output: &Path) -> Result<()> {
        tokio::fs::copy(input, output).await?;
        Ok(())
    }
}

/// Always fails with a tool error carrying `message`.
pub struct FailingTranscoder(pub &'static str);

#[async_trait]
impl Transcoder for FailingTranscoder {
    async fn transcode(&self, _input: &Path, _output: &Path) -> Result<()> {
        Err(Error::tool("ffmpeg", self.0))
    }
}

/// Blocks until the gate is opened, then copies.
pub struct GatedTranscoder {
    pub gate: Arc<Notify>,
}

#[async_trait]
impl Transcoder for GatedTranscoder {
    async fn transcode(&self, input: &Path, output: &Path) -> Result<()> {
        self.gate.notified().await;
        tokio::fs::copy(input, output).await?;
        Ok(())
    }
}

/// Bytes with a recognizable pattern so slices can be checked.
pub fn sample_bytes(len: usize) -> Vec<u8> {
    (0..=255u8).cycle().take(len).collect()
}

pub struct TestHarness {
    pub ctx: AppContext,
    pub dir: TempDir,
}

impl TestHarness {
    /// Harness whose conversions copy the source unchanged.
    pub fn new() -> Self {
        Self::with_transcoder(Arc::new(CopyTranscoder))
    }

    pub fn with_transcoder(transcoder: Arc<dyn Transcoder>) -> Self {
        let dir = tempfile::tempdir().expect("failed to create temp dir");

        let mut config = Config::default();
        config.storage.root = dir.path().to_path_buf();

        let library = MediaLibrary::from_config(&config.storage);
        library.ensure_dirs().expect("failed to create library dirs");

        let manager = ConversionManager::new(library, transcoder);
        let ctx = AppContext::new(config, manager);

        Self { ctx, dir }
    }

    /// Start an Axum server on a random port and return the harness together
    /// with the bound socket address.
    pub async fn with_server() -> (Self, SocketAddr) {
        let harness = Self::new();
        let app = harness.router();

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind random port");
        let addr = listener.local_addr().expect("failed to get local addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        (harness, addr)
    }

    pub fn router(&self) -> Router {
        create_router(self.ctx.clone())
    }

    pub fn audio_dir(&self) -> PathBuf {
        self.dir.path().join("audios")
    }

    pub fn video_dir(&self) -> PathBuf {
        self.dir.path().join("videos")
    }

    pub fn output_dir(&self) -> PathBuf {
        self.dir.path().join("converted")
    }

    pub fn write_audio(&self, name: &str, data: &[u8]) -> PathBuf {
        let path = self.audio_dir().join(name);
        std::fs::write(&path, data).unwrap();
        path
    }

    pub fn write_video(&self, name: &str, data: &[u8]) -> PathBuf {
        let path = self.video_dir().join(name);
        std::fs::write(&path, data).unwrap();
        path
    }

    /// Send one request through a fresh router.
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str) -> Response<Body> {
        self.send(Request::get(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn get_with_range(&self, uri: &str, range: &str) -> Response<Body> {
        self.send(
            Request::get(uri)
                .header("range", range)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    pub async fn post(&self, uri: &str) -> Response<Body> {
        self.send(Request::post(uri).body(Body::empty()).unwrap())
            .await
    }

    /// Poll the engine until the task reaches `ready` or `error`.
    pub async fn wait_terminal(&self, task_id: TaskId) -> ConversionTask {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        loop {
            let task = self.ctx.manager.get_task(task_id).unwrap();
            if task.state().is_terminal() {
                return task;
            }
            assert!(
                tokio::time::Instant::now() < deadline,
                "task {task_id} stuck in {}",
                task.state()
            );
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

pub fn header<'a>(response: &'a Response<Body>, name: &str) -> &'a str {
    response
        .headers()
        .get(name)
        .unwrap_or_else(|| panic!("missing header {name}"))
        .to_str()
        .unwrap()
}
