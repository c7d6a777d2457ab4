//! Media conversion module.
//!
//! Converts files from the audio or video library into another container
//! format using an external codec tool. It includes:
//!
//! - The task record and its `preparing -> processing -> ready | error`
//!   state machine
//! - The in-memory task registry and background execution
//! - The codec tool seam ([`Transcoder`]) and its ffmpeg implementation
//! - Source/output path resolution
//!
//! Tasks live only in memory and are never evicted.

mod executor;
mod library;
mod manager;
mod task;

pub use executor::{FfmpegTranscoder, ToolInfo, Transcoder};
pub use library::MediaLibrary;
pub use manager::ConversionManager;
pub use task::{ConversionTask, IllegalTransition, TaskEvent, TaskState};
