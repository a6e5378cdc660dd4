use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

/// Pixel layouts a caller may hand in. Everything is normalized to packed RGB24.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PixelFormat {
    Rgb24,
    /// Blue-green-red byte order, as OpenCV-style cameras deliver frames.
    Bgr24,
    Rgba32,
    Nv12,
}

pub fn normalize_to_rgb(
    pixels: &[u8],
    width: u32,
    height: u32,
    format: PixelFormat,
) -> Result<Vec<u8>> {
    match format {
        PixelFormat::Rgb24 => {
            check_packed_len(pixels, width, height, 3, "RGB")?;
            Ok(pixels.to_vec())
        }
        PixelFormat::Bgr24 => {
            check_packed_len(pixels, width, height, 3, "BGR")?;
            Ok(pixels
                .chunks_exact(3)
                .flat_map(|bgr| [bgr[2], bgr[1], bgr[0]])
                .collect())
        }
        PixelFormat::Rgba32 => {
            check_packed_len(pixels, width, height, 4, "RGBA")?;
            Ok(pixels
                .chunks_exact(4)
                .flat_map(|rgba| [rgba[0], rgba[1], rgba[2]])
                .collect())
        }
        PixelFormat::Nv12 => nv12_to_rgb(pixels, width, height),
    }
}

fn check_packed_len(
    pixels: &[u8],
    width: u32,
    height: u32,
    channels: u32,
    label: &str,
) -> Result<()> {
    let expected = width
        .checked_mul(height)
        .and_then(|v| v.checked_mul(channels))
        .ok_or_else(|| anyhow!("{} frame dimensions overflow", label))? as usize;
    if pixels.len() != expected {
        return Err(anyhow!(
            "{} frame length mismatch: expected {}, got {}",
            label,
            expected,
            pixels.len()
        ));
    }
    Ok(())
}

fn nv12_to_rgb(pixels: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
    if width % 2 != 0 || height % 2 != 0 {
        return Err(anyhow!(
            "NV12 frames need even dimensions, got {}x{}",
            width,
            height
        ));
    }
    let w = width as usize;
    let h = height as usize;
    let y_plane = w
        .checked_mul(h)
        .ok_or_else(|| anyhow!("NV12 frame dimensions overflow"))?;
    let expected = y_plane
        .checked_add(y_plane / 2)
        .ok_or_else(|| anyhow!("NV12 frame dimensions overflow"))?;
    if pixels.len() != expected {
        return Err(anyhow!(
            "NV12 frame length mismatch: expected {}, got {}",
            expected,
            pixels.len()
        ));
    }

    let mut rgb = vec![0u8; y_plane * 3];
    for j in 0..h {
        for i in 0..w {
            let y = pixels[j * w + i] as f32;
            let uv_index = y_plane + (j / 2) * w + (i / 2) * 2;
            let u = pixels[uv_index] as f32 - 128.0;
            let v = pixels[uv_index + 1] as f32 - 128.0;

            let r = y + 1.402_f32 * v;
            let g = y - 0.344_136_f32 * u - 0.714_136_f32 * v;
            let b = y + 1.772_f32 * u;

            let offset = (j * w + i) * 3;
            rgb[offset] = clamp_to_u8(r);
            rgb[offset + 1] = clamp_to_u8(g);
            rgb[offset + 2] = clamp_to_u8(b);
        }
    }

    Ok(rgb)
}

fn clamp_to_u8(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}
