//! Fixed 16-colour palette.
//!
//! Colour registers store a 4-bit index into this table. The values are the
//! VICE PAL measurements in ARGB32.

/// Palette: 16 colours indexed 0-15 in ARGB32 format.
pub const PALETTE: [u32; 16] = [
    0xFF00_0000, // 0: Black
    0xFFFF_FFFF, // 1: White
    0xFF88_3932, // 2: Red
    0xFF67_B6BD, // 3: Cyan
    0xFF8B_3F96, // 4: Purple
    0xFF55_A049, // 5: Green
    0xFF40_318D, // 6: Blue
    0xFFBF_CE72, // 7: Yellow
    0xFF8B_5429, // 8: Orange
    0xFF57_4200, // 9: Brown
    0xFFB8_6962, // 10: Light Red
    0xFF50_5050, // 11: Dark Grey
    0xFF78_7878, // 12: Medium Grey
    0xFF94_E089, // 13: Light Green
    0xFF78_68C0, // 14: Light Blue
    0xFF9F_9F9F, // 15: Light Grey
];

/// Reserved index used by the diagnostic overlay for "off" markers.
pub const BLACK: usize = 0;

/// Reserved index used by the diagnostic overlay for "on" markers.
pub const WHITE: usize = 1;

/// Look up a colour register value (only the low 4 bits are wired).
#[must_use]
pub const fn argb(index: u8) -> u32 {
    PALETTE[(index & 0x0F) as usize]
}
