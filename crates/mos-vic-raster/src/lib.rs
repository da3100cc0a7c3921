//! Scanline raster engine for a MOS VIC-II class video chip.
//!
//! Reconstructs the chip's display output line by line: 302 scanlines per
//! frame at 64 CPU cycles each, with the content window, border geometry and
//! bad-line timing of the real chip. The engine runs on its own thread,
//! paced only by a shared virtual cycle clock ([`emu_clock`]) it shares with
//! the CPU emulation, and publishes each completed 384x248 frame through a
//! narrow [`FrameSink`] boundary.
//!
//! The hardware quirks raster-effect code depends on are reproduced exactly:
//! a staged video-mode switch commits only at a bad-line boundary, bad lines
//! charge the CPU a 40-cycle bus-contention penalty, and the raster register
//! reads back the current line while writes arm the interrupt target.

pub mod capture;
mod engine;
mod frame;
pub mod geometry;
mod memory;
mod modes;
pub mod palette;
pub mod registers;
mod sprites;
mod state;

pub use engine::{EngineConfig, InterruptLine, NoInterrupt, RasterEngine, RasterHandle};
pub use frame::{FrameBuffer, FrameSink, NullSink};
pub use memory::{COLOUR_RAM_SIZE, SimpleRam, VideoMemory};
pub use modes::ModeVariant;
pub use registers::RegisterFile;
pub use sprites::{NoSprites, SpriteCompositor};
pub use state::{BITMAP_ADDRESS_MASK, RasterState};

use thiserror::Error;

/// Fatal failure inside the per-line render loop.
///
/// Never recovered locally: the rendering thread stops and the failure is
/// surfaced to the host process, since rendering on would desynchronise the
/// shared clock and corrupt every subsequent frame.
#[derive(Debug, Error)]
pub enum RasterError {
    /// An address computation left the 16-bit bus: a malformed register
    /// combination programmed by the CPU side.
    #[error("video address ${0:05X} is outside the 16-bit bus")]
    AddressOutOfRange(u32),
}
