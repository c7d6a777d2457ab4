//! Mediaforge - media conversion tasks and HTTP range streaming
//!
//! This library crate exposes the core functionality for integration testing.

pub mod config;
pub mod conversion;
pub mod server;
pub mod streaming;
