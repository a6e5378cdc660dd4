//! mask_scan - classify mask usage for the persons in one image
//!
//! Reads an image, takes person detections from a recorded JSON file (or
//! treats the whole image as one person), runs the mask pipeline and prints
//! the per-region diagnostic table.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use mask_kernel::detect::{FullFrameBackend, NoFaceFinder, ReplayBackend, ReplayFaceFinder};
use mask_kernel::{
    diagnostic_table, draw_overlay, BackendRegistry, EngineConfig, FaceFinder, FileConfig,
    FileSource, FramePipeline,
};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Local image file (PNG or JPEG), or `stub://<name>` for a synthetic frame.
    #[arg(long)]
    image: String,
    /// JSON detections file: `[{"bbox": [x1, y1, x2, y2], "class_id": 0, "confidence": 0.9}]`.
    /// Without it the whole image is one person.
    #[arg(long)]
    detections: Option<PathBuf>,
    /// JSON face boxes in image coordinates: `[[x1, y1, x2, y2], ...]`.
    #[arg(long)]
    faces: Option<PathBuf>,
    /// Engine config file (JSON, or TOML by extension). Defaults to MASK_KERNEL_CONFIG.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Write the frame report as JSON to this path.
    #[arg(long)]
    json_out: Option<PathBuf>,
    /// Write a copy of the image with region boxes drawn on it.
    #[arg(long)]
    overlay_out: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => EngineConfig::from_path(path)?,
        None => EngineConfig::load()?,
    };
    let pipeline = FramePipeline::new(config)?;

    let mut source = FileSource::new(FileConfig {
        path: args.image.clone(),
        ..FileConfig::default()
    })?;
    let frame = source.next_frame()?;
    let stats = source.stats();
    log::debug!("read {} frame(s) from {}", stats.frames_read, stats.path);

    let mut registry = BackendRegistry::new();
    registry.register(FullFrameBackend::new());
    if let Some(path) = &args.detections {
        registry.register(ReplayBackend::from_path(path)?);
        registry.set_default("replay")?;
    }

    registry.warm_up_default()?;

    let mut finder: Box<dyn FaceFinder> = match &args.faces {
        Some(path) => Box::new(ReplayFaceFinder::from_path(path)?),
        None => Box::new(NoFaceFinder),
    };

    let report = pipeline.run_with_registry(&frame, &registry, finder.as_mut())?;
    print!("{}", diagnostic_table(&report));

    if let Some(path) = &args.json_out {
        let json = serde_json::to_vec_pretty(&report)?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report {}", path.display()))?;
        println!("report written to {}", path.display());
    }
    if let Some(path) = &args.overlay_out {
        let mut image = frame.into_image();
        draw_overlay(&mut image, &report);
        image
            .save(path)
            .with_context(|| format!("failed to write overlay {}", path.display()))?;
        println!("overlay written to {}", path.display());
    }
    Ok(())
}
