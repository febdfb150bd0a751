use std::fs;
use std::path::PathBuf;

use colors_transform::{Color, Hsl};
use image::{Rgb, RgbImage};
use log::debug;

use crate::error::SimError;
use crate::world::Frame;

const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
/// Largest image side the PNG output will allocate.
pub const MAX_IMAGE_SIDE: u32 = 16_384;
pub const MAX_DRAW_RADIUS: i32 = 256;

/// Anything that consumes the frames produced by a run.
pub trait FrameSink {
    fn present(&mut self, frame: &Frame<'_>) -> Result<(), SimError>;

    /// Called once when the run ends, whether it stopped cleanly or not.
    fn close(&mut self) {}
}

/// Colour for a particle type, with hues spread evenly around the wheel.
pub fn type_colour(type_id: usize, num_types: usize) -> Rgb<u8> {
    let hue = 360.0 * type_id as f32 / num_types.max(1) as f32;
    let rgb = Hsl::from(hue, 90.0, 55.0).to_rgb();
    Rgb([
        rgb.get_red().round() as u8,
        rgb.get_green().round() as u8,
        rgb.get_blue().round() as u8,
    ])
}

fn image_side(extent: f64) -> Result<u32, SimError> {
    let side = extent.ceil();
    if !(side >= 1.0 && side <= MAX_IMAGE_SIDE as f64) {
        return Err(SimError::Render(format!(
            "world extent {extent} cannot be rasterized (limit {MAX_IMAGE_SIDE} pixels)"
        )));
    }
    Ok(side as u32)
}

/// Draws every particle as a filled disc, wrapping discs that overlap an edge.
/// `draw_radius` is clamped to `[0, MAX_DRAW_RADIUS]`.
pub fn draw_frame(frame: &Frame<'_>, draw_radius: i32) -> Result<RgbImage, SimError> {
    let width = image_side(frame.width)?;
    let height = image_side(frame.height)?;
    let mut img = RgbImage::from_pixel(width, height, BLACK);
    let draw_radius = i64::from(draw_radius.clamp(0, MAX_DRAW_RADIUS));
    let radius_squared = draw_radius * draw_radius;
    for (x, y, type_id) in frame.points() {
        let colour = type_colour(type_id, frame.num_types);
        let cx = x as i64;
        let cy = y as i64;
        for dy in -draw_radius..=draw_radius {
            for dx in -draw_radius..=draw_radius {
                if dx * dx + dy * dy > radius_squared {
                    continue;
                }
                let px = (cx + dx).rem_euclid(i64::from(width)) as u32;
                let py = (cy + dy).rem_euclid(i64::from(height)) as u32;
                img.put_pixel(px, py, colour);
            }
        }
    }
    Ok(img)
}

/// Writes each frame as `frames_{:08}.png` into a directory.
pub struct PngSink {
    dir: PathBuf,
    draw_radius: i32,
    written: u64,
}

impl PngSink {
    pub fn new(dir: impl Into<PathBuf>, draw_radius: i32) -> Result<Self, SimError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(PngSink {
            dir,
            draw_radius: draw_radius.clamp(0, MAX_DRAW_RADIUS),
            written: 0,
        })
    }

    pub fn written(&self) -> u64 {
        self.written
    }
}

impl FrameSink for PngSink {
    fn present(&mut self, frame: &Frame<'_>) -> Result<(), SimError> {
        let img = draw_frame(frame, self.draw_radius)?;
        img.save(self.dir.join(format!("frames_{:0>8}.png", frame.tick)))?;
        self.written += 1;
        Ok(())
    }

    fn close(&mut self) {
        debug!("wrote {} frames to {}", self.written, self.dir.display());
    }
}
