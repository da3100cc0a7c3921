//! Engine-owned raster state shared with the external register path.
//!
//! One mutex guards the whole block; both sides hold it only for short field
//! updates and reads; no rendering, no memory access, no blocking while
//! held. The bad-line-gated mode commit lives here: a requested mode switch
//! is staged in `scheduled_mode` and becomes `current_mode` only when the
//! engine asks at a bad-line boundary.

use crate::geometry::TOTAL_LINES;
use crate::modes::ModeVariant;

/// Mask keeping the bitmap base on an 8 KiB boundary.
pub const BITMAP_ADDRESS_MASK: u16 = 0xE000;

/// The shared raster state block.
#[derive(Debug)]
pub struct RasterState {
    /// Line currently being rendered, always in `0..TOTAL_LINES`.
    current_line: u16,
    /// Character set base address.
    charset_addr: u16,
    /// Video matrix base address.
    matrix_addr: u16,
    /// Bitmap base address; low 13 bits always zero.
    bitmap_addr: u16,
    /// The mode rendering right now.
    current_mode: ModeVariant,
    /// Mode staged for the next bad line, if any.
    scheduled_mode: Option<ModeVariant>,
    /// Set by `set_addresses`, cleared when the engine re-primes.
    addresses_changed: bool,
}

impl RasterState {
    #[must_use]
    pub fn new() -> Self {
        Self {
            current_line: 0,
            charset_addr: 0,
            matrix_addr: 0,
            bitmap_addr: 0,
            current_mode: ModeVariant::default(),
            scheduled_mode: None,
            addresses_changed: false,
        }
    }

    /// Update the three address fields in a single step.
    ///
    /// The bitmap address is masked to its 8 KiB-aligned form. Either the
    /// full update is applied or none of it; callers observe no partial
    /// state (the caller holds the lock for the whole call).
    pub fn set_addresses(&mut self, charset: u16, matrix: u16, bitmap: u16) {
        self.charset_addr = charset;
        self.matrix_addr = matrix;
        self.bitmap_addr = bitmap & BITMAP_ADDRESS_MASK;
        self.addresses_changed = true;
    }

    /// Stage a mode for the next bad-line boundary. Never swaps immediately.
    pub fn schedule_mode(&mut self, mode: ModeVariant) {
        self.scheduled_mode = Some(mode);
    }

    /// Commit the staged mode, if any. Engine-side, bad lines only.
    pub(crate) fn commit_scheduled_mode(&mut self) -> Option<ModeVariant> {
        let mode = self.scheduled_mode.take()?;
        self.current_mode = mode;
        Some(mode)
    }

    /// Take the addresses-changed flag, returning the current addresses when
    /// a re-prime is due.
    pub(crate) fn take_address_change(&mut self) -> Option<(u16, u16, u16)> {
        if self.addresses_changed {
            self.addresses_changed = false;
            Some(self.addresses())
        } else {
            None
        }
    }

    /// `(charset, matrix, bitmap)` bases.
    #[must_use]
    pub fn addresses(&self) -> (u16, u16, u16) {
        (self.charset_addr, self.matrix_addr, self.bitmap_addr)
    }

    #[must_use]
    pub fn current_line(&self) -> u16 {
        self.current_line
    }

    pub(crate) fn set_current_line(&mut self, line: u16) {
        debug_assert!((line as usize) < TOTAL_LINES);
        self.current_line = line;
    }

    #[must_use]
    pub fn current_mode(&self) -> ModeVariant {
        self.current_mode
    }

    #[must_use]
    pub fn scheduled_mode(&self) -> Option<ModeVariant> {
        self.scheduled_mode
    }
}

impl Default for RasterState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bitmap_address_is_always_8k_aligned() {
        let mut state = RasterState::new();
        for raw in 0..=0xFFFFu32 {
            state.set_addresses(0, 0, raw as u16);
            let (_, _, bitmap) = state.addresses();
            assert_eq!(bitmap, (raw as u16) & 0xE000);
            assert_eq!(bitmap & 0x1FFF, 0);
        }
    }

    #[test]
    fn mode_switch_stays_staged_until_committed() {
        let mut state = RasterState::new();
        state.schedule_mode(ModeVariant::BitmapMulti);
        assert_eq!(state.current_mode(), ModeVariant::TextNormal);
        assert_eq!(state.scheduled_mode(), Some(ModeVariant::BitmapMulti));

        assert_eq!(state.commit_scheduled_mode(), Some(ModeVariant::BitmapMulti));
        assert_eq!(state.current_mode(), ModeVariant::BitmapMulti);
        assert_eq!(state.scheduled_mode(), None);

        // Nothing staged: commit is a no-op.
        assert_eq!(state.commit_scheduled_mode(), None);
    }

    #[test]
    fn address_change_flag_is_taken_once() {
        let mut state = RasterState::new();
        assert_eq!(state.take_address_change(), None);
        state.set_addresses(0x1000, 0x0400, 0x5FFF);
        assert_eq!(state.take_address_change(), Some((0x1000, 0x0400, 0x4000)));
        assert_eq!(state.take_address_change(), None);
    }
}
