//! Mediaforge-Common: Shared types, constants, and utilities.
//!
//! This crate provides functionality used across mediaforge:
//!
//! - **Typed IDs**: Type-safe UUID wrapper for conversion tasks
//! - **Core Types**: The [`MediaKind`] enum selecting a source library
//! - **Path Utilities**: Extension checks and MIME type inference
//! - **Error Handling**: The unified error type and result alias
//!
//! # Examples
//!
//! ```
//! use mediaforge_common::{Error, MediaKind, Result, TaskId};
//! use mediaforge_common::paths::is_audio_file;
//! use std::path::Path;
//!
//! let task_id = TaskId::new();
//! let kind: MediaKind = "audio".parse().unwrap();
//!
//! assert_eq!(kind, MediaKind::Audio);
//! assert!(is_audio_file(Path::new("theme.mp3")));
//!
//! fn example(id: TaskId) -> Result<()> {
//!     Err(Error::not_found("task", id))
//! }
//! assert!(example(task_id).is_err());
//! ```

pub mod error;
pub mod ids;
pub mod paths;
pub mod types;

pub use error::{Error, Result};
pub use ids::*;
pub use types::*;
