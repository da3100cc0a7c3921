//! Frame geometry and timing constants.
//!
//! The geometry is fixed: 302 scanlines per frame, 64 CPU cycles per line.
//! The first content line is scanline 51; the top 27 scanlines are overscan
//! and never reach the framebuffer, which leaves a 24-pixel visible border
//! above (and below) the 320x200 content window.
//!
//! ```text
//!   line 0   ┌──────────────────────────┐ ▲ overscan (27 lines, not painted)
//!   line 27  ├──────────────────────────┤ ▲ top border (24 lines)
//!   line 51  │  ┌────────────────────┐  │ ▲
//!            │  │  content 320x200   │  │ │ 200 lines
//!   line 251 │  └────────────────────┘  │ ▼
//!   line 275 ├──────────────────────────┤ ▼ bottom border (24 lines)
//!   line 302 └──────────────────────────┘ ▼ overscan
//! ```

/// Width of the left and right border strips in pixels.
pub const BORDER_WIDTH: usize = 4 * 8;

/// Width of the content window in pixels.
pub const CONTENT_WIDTH: usize = 320;

/// Height of the content window in scanlines.
pub const CONTENT_HEIGHT: usize = 200;

/// Overall framebuffer width, borders included.
pub const DISPLAY_WIDTH: usize = BORDER_WIDTH + CONTENT_WIDTH + BORDER_WIDTH;

/// Visible border height above and below the content window.
pub const VISIBLE_BORDER_HEIGHT: usize = 3 * 8;

/// Overall framebuffer height, borders included.
pub const DISPLAY_HEIGHT: usize = VISIBLE_BORDER_HEIGHT + CONTENT_HEIGHT + VISIBLE_BORDER_HEIGHT;

/// Scanline number of the first content-window line. Also the height of the
/// full (overscan + visible) top border.
pub const WINDOW_FIRST_LINE: usize = 51;

/// Scanline number one past the last content-window line.
pub const WINDOW_END_LINE: usize = WINDOW_FIRST_LINE + CONTENT_HEIGHT;

/// Scanlines that never reach the framebuffer at the top of the frame.
pub const OVERSCAN_LINES: usize = WINDOW_FIRST_LINE - VISIBLE_BORDER_HEIGHT;

/// Total scanlines per frame, including the invisible ones.
pub const TOTAL_LINES: usize = WINDOW_FIRST_LINE + CONTENT_HEIGHT + WINDOW_FIRST_LINE;

/// Scanline number one past the last line that reaches the framebuffer.
pub const LAST_VISIBLE_LINE: usize = WINDOW_END_LINE + VISIBLE_BORDER_HEIGHT;

/// CPU cycles per scanline.
pub const CYCLES_PER_LINE: u64 = 64;

/// Cycles stolen from the CPU on a bad line (one fetch per text column).
pub const BAD_LINE_PENALTY: u64 = 40;

/// Offset of the sprite vertical coordinate system relative to the content
/// window.
pub const SPRITE_Y_OFFSET: usize = 30;

/// Rows the content window shrinks at the top and bottom in wide-border mode.
pub const WIDE_BORDER_ROWS: usize = 7;

/// Extra border pixels on the left in wide-border mode.
pub const WIDE_BORDER_LEFT: usize = 7;

/// Extra border pixels on the right in wide-border mode.
pub const WIDE_BORDER_RIGHT: usize = 9;

/// Text columns per content row.
pub const TEXT_COLUMNS: usize = 40;

/// Text rows per content window.
pub const TEXT_ROWS: usize = 25;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_geometry_is_consistent() {
        assert_eq!(DISPLAY_WIDTH, 384);
        assert_eq!(DISPLAY_HEIGHT, 248);
        assert_eq!(TOTAL_LINES, 302);
        assert_eq!(OVERSCAN_LINES, 27);
        assert_eq!(WINDOW_END_LINE, 251);
        assert_eq!(LAST_VISIBLE_LINE, 275);
        assert_eq!(TEXT_COLUMNS * 8, CONTENT_WIDTH);
        assert_eq!(TEXT_ROWS * 8, CONTENT_HEIGHT);
    }
}
