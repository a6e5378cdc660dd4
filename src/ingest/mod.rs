//! Frame ingestion.
//!
//! The engine consumes frames that are already decoded and in memory. This
//! module covers the two ways they get there:
//! - `normalize`: packed buffers in RGB24, BGR24, RGBA32 or NV12 layout
//! - `file`: still images decoded from local disk (or `stub://` synthetic frames)
//!
//! Ingestion never fetches remote URLs.

pub mod file;
pub mod normalize;

pub use file::{load_frame, FileConfig, FileSource};
pub use normalize::PixelFormat;
