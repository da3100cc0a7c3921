//! Sprite compositing contract.
//!
//! Sprite pixel generation lives outside this crate; the engine only cares
//! about the two-phase layering. On every content line it calls
//! [`raster_back_into`](SpriteCompositor::raster_back_into) *before* the mode
//! content (sprites behind the foreground) and
//! [`raster_front_into`](SpriteCompositor::raster_front_into) *after* it
//! (everything else). `sprite_line` is the line in the sprite coordinate
//! system: content line plus the fixed vertical offset.

use crate::frame::FrameBuffer;

/// Two-phase sprite layer renderer, driven once per content line.
pub trait SpriteCompositor: Send {
    /// Composite the background-priority sprite layer.
    ///
    /// `matrix_addr` locates the sprite pointers; `line_offset` is the index
    /// of the line's first pixel in the framebuffer.
    fn raster_back_into(
        &mut self,
        matrix_addr: u16,
        line_offset: usize,
        sprite_line: usize,
        fb: &mut FrameBuffer,
    );

    /// Composite the remaining sprites over the mode content.
    fn raster_front_into(&mut self, line_offset: usize, sprite_line: usize, fb: &mut FrameBuffer);
}

/// Compositor with no sprites: both phases are no-ops.
pub struct NoSprites;

impl SpriteCompositor for NoSprites {
    fn raster_back_into(
        &mut self,
        _matrix_addr: u16,
        _line_offset: usize,
        _sprite_line: usize,
        _fb: &mut FrameBuffer,
    ) {
    }

    fn raster_front_into(
        &mut self,
        _line_offset: usize,
        _sprite_line: usize,
        _fb: &mut FrameBuffer,
    ) {
    }
}
