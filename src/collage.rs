// SPDX-License-Identifier: GPL-3.0-only

//! Collage composition
//!
//! Assembles the shots of a collage session onto a 2x2 grid and
//! flattens the result to an opaque RGB image. The grid step is a pure
//! function over decoded images; [`compose_files`] wraps it with the
//! file I/O the session needs.

use crate::errors::ComposeError;
use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbImage, Rgba, RgbaImage};
use std::path::Path;
use tracing::{debug, error};

/// Quadrant origins of the 2x2 grid, in shot order
const QUADRANTS: [(u32, u32); 4] = [(0, 0), (1, 0), (0, 1), (1, 1)];

/// Compose up to four shots of uniform size `(w, h)` into one opaque
/// `(2w, 2h)` image
///
/// Quadrants without a shot (the 3-shot configuration) stay blank. When
/// a foreground is given it is resized to the full canvas, composited on
/// top, and the result is flattened to 3 channels.
pub fn compose(
    shots: &[RgbaImage],
    shot_size: (u32, u32),
    foreground: Option<&RgbaImage>,
) -> RgbImage {
    let (w, h) = shot_size;
    let mut canvas = RgbaImage::from_pixel(w * 2, h * 2, Rgba([0, 0, 0, 255]));

    for (shot, (col, row)) in shots.iter().zip(QUADRANTS) {
        imageops::replace(&mut canvas, shot, (col * w) as i64, (row * h) as i64);
    }

    if let Some(front) = foreground {
        let front = imageops::resize(front, w * 2, h * 2, FilterType::Triangle);
        imageops::overlay(&mut canvas, &front, 0, 0);
    }

    // flatten: drop the alpha channel for an opaque save
    DynamicImage::ImageRgba8(canvas).to_rgb8()
}

/// Load the shot files, compose them, and write the result to `output`
///
/// A missing or unreadable foreground degrades the collage (logged,
/// skipped); an unreadable shot is a composition failure.
pub fn compose_files(
    shot_files: &[impl AsRef<Path>],
    shot_size: (u32, u32),
    foreground_path: Option<&Path>,
    output: &Path,
) -> Result<(), ComposeError> {
    let mut shots = Vec::with_capacity(shot_files.len());
    for file in shot_files {
        let file = file.as_ref();
        let img = image::open(file)
            .map_err(|e| ComposeError::ShotUnreadable(format!("{}: {}", file.display(), e)))?;
        shots.push(img.to_rgba8());
    }

    let foreground = foreground_path.and_then(|path| match image::open(path) {
        Ok(img) => Some(img.to_rgba8()),
        Err(e) => {
            error!(path = %path.display(), error = %e, "Unable to paste collage cover");
            None
        }
    });

    let composed = compose(&shots, shot_size, foreground.as_ref());
    composed
        .save(output)
        .map_err(|e| ComposeError::SaveFailed(e.to_string()))?;

    debug!(
        output = %output.display(),
        shots = shots.len(),
        "Collage assembled"
    );
    Ok(())
}
