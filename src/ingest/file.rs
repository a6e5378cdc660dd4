//! Local image file source.
//!
//! `FileSource` decodes still images (PNG, JPEG) from local disk into `Frame`s.
//! Paths with a `stub://` scheme produce a synthetic gradient frame instead,
//! which keeps demos and tests independent of fixture files.

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use image::{Rgb, RgbImage};

use crate::frame::Frame;

/// Configuration for a local file source.
#[derive(Clone, Debug)]
pub struct FileConfig {
    /// Local file path (e.g., "captures/entrance.jpg") or `stub://<name>`.
    pub path: String,
    /// Dimensions of synthetic frames. Ignored for real files.
    pub synthetic_width: u32,
    pub synthetic_height: u32,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            path: String::new(),
            synthetic_width: 640,
            synthetic_height: 480,
        }
    }
}

/// Local file frame source.
pub struct FileSource {
    config: FileConfig,
    frames_read: u64,
}

impl FileSource {
    pub fn new(config: FileConfig) -> Result<Self> {
        if !is_local_file_path(&config.path) {
            return Err(anyhow!(
                "file ingestion only supports local paths (no URL schemes)"
            ));
        }
        Ok(Self {
            config,
            frames_read: 0,
        })
    }

    /// Decode the configured file into a frame.
    pub fn next_frame(&mut self) -> Result<Frame> {
        let frame = if self.config.path.starts_with("stub://") {
            synthetic_frame(self.config.synthetic_width, self.config.synthetic_height)
        } else {
            load_frame(Path::new(&self.config.path))?
        };
        self.frames_read += 1;
        log::info!(
            "FileSource: read {}x{} frame from {}",
            frame.width(),
            frame.height(),
            self.config.path
        );
        Ok(frame)
    }

    /// Get frame statistics.
    pub fn stats(&self) -> FileStats {
        FileStats {
            frames_read: self.frames_read,
            path: self.config.path.clone(),
        }
    }
}

/// Statistics for a file source.
#[derive(Clone, Debug)]
pub struct FileStats {
    pub frames_read: u64,
    pub path: String,
}

/// Decode an image file from disk into an RGB frame.
pub fn load_frame(path: &Path) -> Result<Frame> {
    let decoded = image::open(path)
        .with_context(|| format!("failed to decode image {}", path.display()))?;
    Ok(Frame::from_image(decoded.to_rgb8()))
}

fn synthetic_frame(width: u32, height: u32) -> Frame {
    Frame::from_image(RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    }))
}

fn is_local_file_path(path: &str) -> bool {
    if path.trim().is_empty() {
        return false;
    }
    if path.starts_with("stub://") {
        return true;
    }
    !path.contains("://")
}
