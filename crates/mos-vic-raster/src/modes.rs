//! The five video-mode rasterers.
//!
//! Each variant maps one content row plus the shared address registers to
//! pixel colours: character-cell lookup with 1, 3 or 4 colours per cell, or
//! bitmap lookup with 1 or 3 colours per pixel pair. The set is closed:
//! dispatch goes through [`ModeRasterer`], a tagged union, and no variant
//! knows about another.
//!
//! # Line composition contract
//!
//! `backfill` pre-fills the content span with the variant's resolved
//! background; `raster_content` then paints *only* foreground pixels over
//! it. The gap between the two passes is where background-priority sprites
//! are composited, so a content pass that repainted background pixels would
//! erase them.
//!
//! # Row latch
//!
//! All variants latch the 40 matrix codes and 40 colour RAM cells of the
//! current text row in `on_bad_line`, the fetch the bad-line cycle penalty
//! pays for. Rendering reads the latch, so matrix writes become visible at
//! the next bad line, as on hardware.

use crate::RasterError;
use crate::frame::FrameBuffer;
use crate::geometry::{CONTENT_WIDTH, TEXT_COLUMNS, TEXT_ROWS, WINDOW_FIRST_LINE};
use crate::memory::VideoMemory;
use crate::palette::argb;
use crate::registers::RegisterFile;

/// Closed set of video modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeVariant {
    TextNormal,
    TextMulti,
    TextExtended,
    BitmapNormal,
    BitmapMulti,
}

impl ModeVariant {
    /// Resolve the three mode-select flags to exactly one variant.
    ///
    /// Fixed precedence: bitmap ignores the extended flag; within bitmap,
    /// multi beats normal; within text, multi beats extended beats normal.
    /// Every flag combination resolves; none is an error.
    #[must_use]
    pub fn resolve(bitmap: bool, extended: bool, multi: bool) -> Self {
        if bitmap {
            if multi {
                Self::BitmapMulti
            } else {
                Self::BitmapNormal
            }
        } else if multi {
            Self::TextMulti
        } else if extended {
            Self::TextExtended
        } else {
            Self::TextNormal
        }
    }
}

impl Default for ModeVariant {
    fn default() -> Self {
        Self::TextNormal
    }
}

/// Compose a bus address, failing when the combination leaves the 16-bit bus.
fn bus_address(base: u16, offset: u32) -> Result<u16, RasterError> {
    let address = u32::from(base) + offset;
    u16::try_from(address).map_err(|_| RasterError::AddressOutOfRange(address))
}

/// The 40 matrix codes + colour cells of the current text row.
#[derive(Debug, Clone, Copy)]
struct RowLatch {
    codes: [u8; TEXT_COLUMNS],
    colours: [u8; TEXT_COLUMNS],
}

impl Default for RowLatch {
    fn default() -> Self {
        Self {
            codes: [0; TEXT_COLUMNS],
            colours: [0; TEXT_COLUMNS],
        }
    }
}

impl RowLatch {
    /// Re-fetch from the matrix for the text row containing `line`.
    ///
    /// Bad lines outside the content window clamp to the edge rows; the
    /// fetch still happens (the bus penalty was already charged).
    fn fetch(
        &mut self,
        mem: &dyn VideoMemory,
        matrix: u16,
        line: usize,
    ) -> Result<(), RasterError> {
        let row = (line.saturating_sub(WINDOW_FIRST_LINE) / 8).min(TEXT_ROWS - 1);
        for col in 0..TEXT_COLUMNS {
            let cell = (row * TEXT_COLUMNS + col) as u32;
            self.codes[col] = mem.read(bus_address(matrix, cell)?);
            self.colours[col] = mem.colour_read(cell as u16);
        }
        Ok(())
    }
}

/// Capability set every mode implements.
pub(crate) trait ScanlineRasterer {
    /// Prime the shared address registers; invalidates any latched row.
    fn start_frame(&mut self, charset: u16, matrix: u16, bitmap: u16);

    /// Bad-line hook: latch the current text row.
    fn on_bad_line(&mut self, line: usize, mem: &dyn VideoMemory) -> Result<(), RasterError>;

    /// Pre-fill the content span at `offset` with the resolved background.
    fn backfill(&self, regs: &RegisterFile, fb: &mut FrameBuffer, offset: usize);

    /// Paint the foreground pixels of `content_row` over the span at
    /// `offset`. Background pixels are left to `backfill`.
    fn raster_content(
        &self,
        regs: &RegisterFile,
        mem: &dyn VideoMemory,
        fb: &mut FrameBuffer,
        offset: usize,
        content_row: usize,
    ) -> Result<(), RasterError>;

    /// Palette index identifying this mode in the diagnostic overlay.
    fn debug_colour(&self) -> u8;
}

/// Paint the set bits of one glyph/cell byte.
fn paint_bits(fb: &mut FrameBuffer, cell_offset: usize, byte: u8, fg: u32) {
    for px in 0..8 {
        if byte & (0x80 >> px) != 0 {
            fb.set(cell_offset + px, fg);
        }
    }
}

/// Paint the non-background bit pairs of one glyph/cell byte, double-wide.
/// `colours[0]` is ignored; pair 00 belongs to the backfill.
fn paint_pairs(fb: &mut FrameBuffer, cell_offset: usize, byte: u8, colours: [u32; 4]) {
    for pair in 0..4 {
        let bits = usize::from((byte >> (6 - pair * 2)) & 0x03);
        if bits != 0 {
            let px = cell_offset + pair * 2;
            fb.set(px, colours[bits]);
            fb.set(px + 1, colours[bits]);
        }
    }
}

// ---------------------------------------------------------------------------
// Text modes
// ---------------------------------------------------------------------------

/// Standard text: one foreground colour per cell from colour RAM.
#[derive(Debug, Default)]
pub(crate) struct TextNormal {
    charset: u16,
    matrix: u16,
    latch: RowLatch,
}

impl ScanlineRasterer for TextNormal {
    fn start_frame(&mut self, charset: u16, matrix: u16, _bitmap: u16) {
        self.charset = charset;
        self.matrix = matrix;
        self.latch = RowLatch::default();
    }

    fn on_bad_line(&mut self, line: usize, mem: &dyn VideoMemory) -> Result<(), RasterError> {
        self.latch.fetch(mem, self.matrix, line)
    }

    fn backfill(&self, regs: &RegisterFile, fb: &mut FrameBuffer, offset: usize) {
        fb.fill(offset..offset + CONTENT_WIDTH, argb(regs.background(0)));
    }

    fn raster_content(
        &self,
        _regs: &RegisterFile,
        mem: &dyn VideoMemory,
        fb: &mut FrameBuffer,
        offset: usize,
        content_row: usize,
    ) -> Result<(), RasterError> {
        let glyph_line = (content_row & 7) as u32;
        for col in 0..TEXT_COLUMNS {
            let code = u32::from(self.latch.codes[col]);
            let byte = mem.read(bus_address(self.charset, code * 8 + glyph_line)?);
            let fg = argb(self.latch.colours[col]);
            paint_bits(fb, offset + col * 8, byte, fg);
        }
        Ok(())
    }

    fn debug_colour(&self) -> u8 {
        5
    }
}

/// Multi-colour text: colour RAM bit 3 selects per cell between standard
/// rendering and double-wide bit pairs.
#[derive(Debug, Default)]
pub(crate) struct TextMulti {
    charset: u16,
    matrix: u16,
    latch: RowLatch,
}

impl ScanlineRasterer for TextMulti {
    fn start_frame(&mut self, charset: u16, matrix: u16, _bitmap: u16) {
        self.charset = charset;
        self.matrix = matrix;
        self.latch = RowLatch::default();
    }

    fn on_bad_line(&mut self, line: usize, mem: &dyn VideoMemory) -> Result<(), RasterError> {
        self.latch.fetch(mem, self.matrix, line)
    }

    fn backfill(&self, regs: &RegisterFile, fb: &mut FrameBuffer, offset: usize) {
        fb.fill(offset..offset + CONTENT_WIDTH, argb(regs.background(0)));
    }

    fn raster_content(
        &self,
        regs: &RegisterFile,
        mem: &dyn VideoMemory,
        fb: &mut FrameBuffer,
        offset: usize,
        content_row: usize,
    ) -> Result<(), RasterError> {
        let glyph_line = (content_row & 7) as u32;
        for col in 0..TEXT_COLUMNS {
            let code = u32::from(self.latch.codes[col]);
            let byte = mem.read(bus_address(self.charset, code * 8 + glyph_line)?);
            let colour = self.latch.colours[col];
            let cell = offset + col * 8;
            if colour & 0x08 == 0 {
                // Bit 3 clear: this cell renders as standard text.
                paint_bits(fb, cell, byte, argb(colour));
            } else {
                let colours = [
                    0,
                    argb(regs.background(1)),
                    argb(regs.background(2)),
                    argb(colour & 0x07),
                ];
                paint_pairs(fb, cell, byte, colours);
            }
        }
        Ok(())
    }

    fn debug_colour(&self) -> u8 {
        3
    }
}

/// Extended-colour text: code bits 6-7 select one of four background
/// registers per cell; only 64 glyphs remain addressable.
#[derive(Debug, Default)]
pub(crate) struct TextExtended {
    charset: u16,
    matrix: u16,
    latch: RowLatch,
}

impl ScanlineRasterer for TextExtended {
    fn start_frame(&mut self, charset: u16, matrix: u16, _bitmap: u16) {
        self.charset = charset;
        self.matrix = matrix;
        self.latch = RowLatch::default();
    }

    fn on_bad_line(&mut self, line: usize, mem: &dyn VideoMemory) -> Result<(), RasterError> {
        self.latch.fetch(mem, self.matrix, line)
    }

    fn backfill(&self, regs: &RegisterFile, fb: &mut FrameBuffer, offset: usize) {
        // Per-cell background: the code's top bits pick the register.
        for col in 0..TEXT_COLUMNS {
            let bg_select = usize::from(self.latch.codes[col] >> 6);
            let cell = offset + col * 8;
            fb.fill(cell..cell + 8, argb(regs.background(bg_select)));
        }
    }

    fn raster_content(
        &self,
        _regs: &RegisterFile,
        mem: &dyn VideoMemory,
        fb: &mut FrameBuffer,
        offset: usize,
        content_row: usize,
    ) -> Result<(), RasterError> {
        let glyph_line = (content_row & 7) as u32;
        for col in 0..TEXT_COLUMNS {
            let code = u32::from(self.latch.codes[col] & 0x3F);
            let byte = mem.read(bus_address(self.charset, code * 8 + glyph_line)?);
            let fg = argb(self.latch.colours[col]);
            paint_bits(fb, offset + col * 8, byte, fg);
        }
        Ok(())
    }

    fn debug_colour(&self) -> u8 {
        7
    }
}

// ---------------------------------------------------------------------------
// Bitmap modes
// ---------------------------------------------------------------------------

/// Standard bitmap: per-cell foreground/background from the matrix nybbles.
#[derive(Debug, Default)]
pub(crate) struct BitmapNormal {
    matrix: u16,
    bitmap: u16,
    latch: RowLatch,
}

impl ScanlineRasterer for BitmapNormal {
    fn start_frame(&mut self, _charset: u16, matrix: u16, bitmap: u16) {
        self.matrix = matrix;
        self.bitmap = bitmap;
        self.latch = RowLatch::default();
    }

    fn on_bad_line(&mut self, line: usize, mem: &dyn VideoMemory) -> Result<(), RasterError> {
        self.latch.fetch(mem, self.matrix, line)
    }

    fn backfill(&self, _regs: &RegisterFile, fb: &mut FrameBuffer, offset: usize) {
        // Per-cell background: the matrix byte's low nybble.
        for col in 0..TEXT_COLUMNS {
            let cell = offset + col * 8;
            fb.fill(cell..cell + 8, argb(self.latch.codes[col]));
        }
    }

    fn raster_content(
        &self,
        _regs: &RegisterFile,
        mem: &dyn VideoMemory,
        fb: &mut FrameBuffer,
        offset: usize,
        content_row: usize,
    ) -> Result<(), RasterError> {
        let row = (content_row / 8) as u32;
        let cell_line = (content_row & 7) as u32;
        for col in 0..TEXT_COLUMNS {
            let cell_offset = row * (TEXT_COLUMNS as u32) * 8 + (col as u32) * 8 + cell_line;
            let byte = mem.read(bus_address(self.bitmap, cell_offset)?);
            let fg = argb(self.latch.codes[col] >> 4);
            paint_bits(fb, offset + col * 8, byte, fg);
        }
        Ok(())
    }

    fn debug_colour(&self) -> u8 {
        4
    }
}

/// Multi-colour bitmap: double-wide pairs from matrix nybbles + colour RAM.
#[derive(Debug, Default)]
pub(crate) struct BitmapMulti {
    matrix: u16,
    bitmap: u16,
    latch: RowLatch,
}

impl ScanlineRasterer for BitmapMulti {
    fn start_frame(&mut self, _charset: u16, matrix: u16, bitmap: u16) {
        self.matrix = matrix;
        self.bitmap = bitmap;
        self.latch = RowLatch::default();
    }

    fn on_bad_line(&mut self, line: usize, mem: &dyn VideoMemory) -> Result<(), RasterError> {
        self.latch.fetch(mem, self.matrix, line)
    }

    fn backfill(&self, regs: &RegisterFile, fb: &mut FrameBuffer, offset: usize) {
        fb.fill(offset..offset + CONTENT_WIDTH, argb(regs.background(0)));
    }

    fn raster_content(
        &self,
        _regs: &RegisterFile,
        mem: &dyn VideoMemory,
        fb: &mut FrameBuffer,
        offset: usize,
        content_row: usize,
    ) -> Result<(), RasterError> {
        let row = (content_row / 8) as u32;
        let cell_line = (content_row & 7) as u32;
        for col in 0..TEXT_COLUMNS {
            let cell_offset = row * (TEXT_COLUMNS as u32) * 8 + (col as u32) * 8 + cell_line;
            let byte = mem.read(bus_address(self.bitmap, cell_offset)?);
            let colours = [
                0,
                argb(self.latch.codes[col] >> 4),
                argb(self.latch.codes[col]),
                argb(self.latch.colours[col]),
            ];
            paint_pairs(fb, offset + col * 8, byte, colours);
        }
        Ok(())
    }

    fn debug_colour(&self) -> u8 {
        8
    }
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

/// Tagged union over the five rasterers.
pub(crate) enum ModeRasterer {
    TextNormal(TextNormal),
    TextMulti(TextMulti),
    TextExtended(TextExtended),
    BitmapNormal(BitmapNormal),
    BitmapMulti(BitmapMulti),
}

impl ModeRasterer {
    pub(crate) fn new(variant: ModeVariant) -> Self {
        match variant {
            ModeVariant::TextNormal => Self::TextNormal(TextNormal::default()),
            ModeVariant::TextMulti => Self::TextMulti(TextMulti::default()),
            ModeVariant::TextExtended => Self::TextExtended(TextExtended::default()),
            ModeVariant::BitmapNormal => Self::BitmapNormal(BitmapNormal::default()),
            ModeVariant::BitmapMulti => Self::BitmapMulti(BitmapMulti::default()),
        }
    }

    fn inner(&self) -> &dyn ScanlineRasterer {
        match self {
            Self::TextNormal(m) => m,
            Self::TextMulti(m) => m,
            Self::TextExtended(m) => m,
            Self::BitmapNormal(m) => m,
            Self::BitmapMulti(m) => m,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn ScanlineRasterer {
        match self {
            Self::TextNormal(m) => m,
            Self::TextMulti(m) => m,
            Self::TextExtended(m) => m,
            Self::BitmapNormal(m) => m,
            Self::BitmapMulti(m) => m,
        }
    }
}

impl ScanlineRasterer for ModeRasterer {
    fn start_frame(&mut self, charset: u16, matrix: u16, bitmap: u16) {
        self.inner_mut().start_frame(charset, matrix, bitmap);
    }

    fn on_bad_line(&mut self, line: usize, mem: &dyn VideoMemory) -> Result<(), RasterError> {
        self.inner_mut().on_bad_line(line, mem)
    }

    fn backfill(&self, regs: &RegisterFile, fb: &mut FrameBuffer, offset: usize) {
        self.inner().backfill(regs, fb, offset);
    }

    fn raster_content(
        &self,
        regs: &RegisterFile,
        mem: &dyn VideoMemory,
        fb: &mut FrameBuffer,
        offset: usize,
        content_row: usize,
    ) -> Result<(), RasterError> {
        self.inner()
            .raster_content(regs, mem, fb, offset, content_row)
    }

    fn debug_colour(&self) -> u8 {
        self.inner().debug_colour()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::SimpleRam;
    use crate::palette::PALETTE;
    use crate::registers;

    const CHARSET: u16 = 0x1000;
    const MATRIX: u16 = 0x0400;
    const BITMAP: u16 = 0x2000;

    fn setup() -> (SimpleRam, RegisterFile, FrameBuffer) {
        let mut regs = RegisterFile::new();
        regs.write(registers::BACKGROUND_0, 6); // blue
        regs.write(registers::BACKGROUND_1, 2); // red
        regs.write(registers::BACKGROUND_2, 5); // green
        regs.write(registers::BACKGROUND_3, 7); // yellow
        (SimpleRam::new(), regs, FrameBuffer::new())
    }

    #[test]
    fn resolve_follows_fixed_precedence() {
        use ModeVariant::*;
        let table = [
            ((false, false, false), TextNormal),
            ((false, false, true), TextMulti),
            ((false, true, false), TextExtended),
            ((false, true, true), TextMulti), // multi silently beats extended
            ((true, false, false), BitmapNormal),
            ((true, false, true), BitmapMulti),
            ((true, true, false), BitmapNormal), // extended ignored under bitmap
            ((true, true, true), BitmapMulti),
        ];
        for ((bitmap, extended, multi), expected) in table {
            assert_eq!(
                ModeVariant::resolve(bitmap, extended, multi),
                expected,
                "flags ({bitmap}, {extended}, {multi})"
            );
        }
    }

    #[test]
    fn text_normal_paints_foreground_bits_only() {
        let (mut ram, regs, mut fb) = setup();
        ram.write(MATRIX, 1); // col 0: glyph 1
        ram.write(CHARSET + 8, 0b1010_0000); // glyph 1, line 0
        ram.colour_write(0, 2); // red foreground

        let mut mode = TextNormal::default();
        mode.start_frame(CHARSET, MATRIX, 0);
        mode.on_bad_line(WINDOW_FIRST_LINE, &ram).expect("latch");
        mode.backfill(&regs, &mut fb, 0);
        mode.raster_content(&regs, &ram, &mut fb, 0, 0).expect("raster");

        assert_eq!(fb.pixels()[0], PALETTE[2]); // set bit: foreground
        assert_eq!(fb.pixels()[1], PALETTE[6]); // clear bit: backfill colour
        assert_eq!(fb.pixels()[2], PALETTE[2]);
        assert_eq!(fb.pixels()[3], PALETTE[6]);
    }

    #[test]
    fn text_multi_pairs_and_standard_cells() {
        let (mut ram, regs, mut fb) = setup();
        ram.write(MATRIX, 0); // col 0: glyph 0
        ram.write(MATRIX + 1, 0); // col 1: glyph 0
        ram.write(CHARSET, 0b0110_1100); // pairs: 01 10 11 00
        ram.colour_write(0, 0x08 | 0x07); // bit 3 set: pair mode, fg 7
        ram.colour_write(1, 0x01); // bit 3 clear: standard, white fg

        let mut mode = TextMulti::default();
        mode.start_frame(CHARSET, MATRIX, 0);
        mode.on_bad_line(WINDOW_FIRST_LINE, &ram).expect("latch");
        mode.backfill(&regs, &mut fb, 0);
        mode.raster_content(&regs, &ram, &mut fb, 0, 0).expect("raster");

        assert_eq!(fb.pixels()[0], PALETTE[2]); // pair 01 → background 1
        assert_eq!(fb.pixels()[1], PALETTE[2]); // double-wide
        assert_eq!(fb.pixels()[2], PALETTE[5]); // pair 10 → background 2
        assert_eq!(fb.pixels()[4], PALETTE[7]); // pair 11 → colour RAM low 3 bits
        assert_eq!(fb.pixels()[6], PALETTE[6]); // pair 00 → backfill shows through

        // Cell 1 fell back to standard rendering: glyph 0 line 0 is
        // 0b0110_1100 as single bits.
        assert_eq!(fb.pixels()[8], PALETTE[6]); // clear bit
        assert_eq!(fb.pixels()[9], PALETTE[1]); // set bit, white
    }

    #[test]
    fn text_extended_selects_background_per_cell() {
        let (mut ram, regs, mut fb) = setup();
        // Four cells, same glyph (0, all clear), codes selecting bg 0-3.
        for col in 0..4 {
            ram.write(MATRIX + col, (col as u8) << 6);
        }

        let mut mode = TextExtended::default();
        mode.start_frame(CHARSET, MATRIX, 0);
        mode.on_bad_line(WINDOW_FIRST_LINE, &ram).expect("latch");
        mode.backfill(&regs, &mut fb, 0);
        mode.raster_content(&regs, &ram, &mut fb, 0, 0).expect("raster");

        assert_eq!(fb.pixels()[0], PALETTE[6]); // bg 0: blue
        assert_eq!(fb.pixels()[8], PALETTE[2]); // bg 1: red
        assert_eq!(fb.pixels()[16], PALETTE[5]); // bg 2: green
        assert_eq!(fb.pixels()[24], PALETTE[7]); // bg 3: yellow
    }

    #[test]
    fn bitmap_normal_takes_colours_from_matrix_nybbles() {
        let (mut ram, regs, mut fb) = setup();
        ram.write(MATRIX, 0x21); // fg red, bg white
        ram.write(BITMAP, 0b1111_0000);

        let mut mode = BitmapNormal::default();
        mode.start_frame(0, MATRIX, BITMAP);
        mode.on_bad_line(WINDOW_FIRST_LINE, &ram).expect("latch");
        mode.backfill(&regs, &mut fb, 0);
        mode.raster_content(&regs, &ram, &mut fb, 0, 0).expect("raster");

        assert_eq!(fb.pixels()[0], PALETTE[2]); // set bit: high nybble
        assert_eq!(fb.pixels()[7], PALETTE[1]); // clear bit: low nybble backfill
    }

    #[test]
    fn bitmap_multi_maps_pairs_to_matrix_and_colour_ram() {
        let (mut ram, regs, mut fb) = setup();
        ram.write(MATRIX, 0x21); // 01 → red, 10 → white
        ram.colour_write(0, 0x05); // 11 → green
        ram.write(BITMAP, 0b0110_1100); // pairs: 01 10 11 00

        let mut mode = BitmapMulti::default();
        mode.start_frame(0, MATRIX, BITMAP);
        mode.on_bad_line(WINDOW_FIRST_LINE, &ram).expect("latch");
        mode.backfill(&regs, &mut fb, 0);
        mode.raster_content(&regs, &ram, &mut fb, 0, 0).expect("raster");

        assert_eq!(fb.pixels()[0], PALETTE[2]); // 01 → matrix high nybble
        assert_eq!(fb.pixels()[2], PALETTE[1]); // 10 → matrix low nybble
        assert_eq!(fb.pixels()[4], PALETTE[5]); // 11 → colour RAM
        assert_eq!(fb.pixels()[6], PALETTE[6]); // 00 → background backfill
    }

    #[test]
    fn matrix_writes_invisible_until_next_bad_line() {
        let (mut ram, regs, mut fb) = setup();
        ram.write(MATRIX, 1);
        ram.write(CHARSET + 8, 0xFF); // glyph 1: solid line
        ram.colour_write(0, 1);

        let mut mode = TextNormal::default();
        mode.start_frame(CHARSET, MATRIX, 0);
        mode.on_bad_line(WINDOW_FIRST_LINE, &ram).expect("latch");

        // The matrix changes mid-row...
        ram.write(MATRIX, 0);
        mode.raster_content(&regs, &ram, &mut fb, 0, 0).expect("raster");
        // ...but the latched code still renders.
        assert_eq!(fb.pixels()[0], PALETTE[1]);

        // The next bad line picks the change up (glyph 0 is blank).
        mode.on_bad_line(WINDOW_FIRST_LINE + 8, &ram).expect("latch");
        mode.backfill(&regs, &mut fb, 0);
        mode.raster_content(&regs, &ram, &mut fb, 0, 8).expect("raster");
        assert_eq!(fb.pixels()[0], PALETTE[6]);
    }

    #[test]
    fn glyph_fetch_off_the_bus_is_an_error() {
        let (mut ram, regs, mut fb) = setup();
        ram.write(MATRIX, 0xFF);

        let mut mode = TextNormal::default();
        // A charset base this high pushes glyph fetches past $FFFF.
        mode.start_frame(0xFFF8, MATRIX, 0);
        mode.on_bad_line(WINDOW_FIRST_LINE, &ram).expect("latch");

        let result = mode.raster_content(&regs, &ram, &mut fb, 0, 0);
        assert!(matches!(result, Err(RasterError::AddressOutOfRange(_))));
    }
}
