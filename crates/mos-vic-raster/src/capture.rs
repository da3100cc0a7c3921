//! Headless capture: PNG screenshots of a frame buffer.

use std::error::Error;
use std::fs;
use std::io::BufWriter;
use std::path::Path;

use crate::frame::FrameBuffer;

/// Save a frame as a PNG file.
///
/// The frame is ARGB32 (`u32` array); this converts to RGBA bytes for the
/// PNG encoder.
pub fn save_screenshot(frame: &FrameBuffer, path: &Path) -> Result<(), Box<dyn Error>> {
    let width = frame.width() as u32;
    let height = frame.height() as u32;

    let file = fs::File::create(path)?;
    let w = BufWriter::new(file);
    let mut encoder = png::Encoder::new(w, width, height);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header()?;

    // Convert ARGB32 → RGBA bytes
    let mut rgba = Vec::with_capacity(frame.pixels().len() * 4);
    for &pixel in frame.pixels() {
        rgba.push(((pixel >> 16) & 0xFF) as u8);
        rgba.push(((pixel >> 8) & 0xFF) as u8);
        rgba.push((pixel & 0xFF) as u8);
        rgba.push(0xFF);
    }

    writer.write_image_data(&rgba)?;
    Ok(())
}
