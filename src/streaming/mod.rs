//! Media streaming module.
//!
//! Serves library files and conversion outputs over HTTP with `Range`
//! support. Bodies are read lazily in bounded chunks, so many concurrent
//! streams interleave on the runtime without buffering whole files.

mod direct;
mod range;

pub use direct::{resolve_stream, ChunkStream, StreamPlan, CHUNK_SIZE};
pub use range::{parse_range_header, resolve_range, ByteRange};
