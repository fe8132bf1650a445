//! Raw byte sequences understood by the printer firmware.

// Control characters
pub const CTL_LF: &[u8] = &[0x0a];
pub const CTL_CRLF: &[u8] = &[0x0d, 0x0a];

/// ESC @ - Initialize printer
pub const HW_INIT: &[u8] = &[0x1b, 0x40];
/// DC2 T - Print the self-test page
pub const HW_SELFTEST: &[u8] = &[0x12, 0x54];

/// DLE EOT 1 - Transmit paper status, answered with 3 bytes
pub const PAPER_STATUS: &[u8] = &[0x10, 0x04, 0x01];
pub const PAPER_PRESENT: [u8; 3] = [0xfe, 0x23, 0x12];
pub const PAPER_ABSENT: [u8; 3] = [0xef, 0x23, 0x1a];

// Serial session bracket. The firmware ignores most commands outside of it.
pub const SESSION_OPEN: &[u8] = &[0x1f, 0x77, 0x00];
pub const SESSION_CLOSE: &[u8] = &[0x1f, 0x77, 0x01];

/// Followed by the baud index byte
pub const SET_BAUD_PREFIX: &[u8] = &[0x1f, 0x2d, 0x55, 0x01];

/// Feed template, byte 5 holds the line count
pub const FEED_LINES: [u8; 8] = [0x1f, 0x2d, 0x35, 0x04, 0x00, 0x00, 0xc8, 0x00];
pub const FEED_LINES_COUNT_OFFSET: usize = 5;

// Text alignment
pub const TXT_ALIGN_LT: &[u8] = &[0x1b, 0x61, 0x00];
pub const TXT_ALIGN_CT: &[u8] = &[0x1b, 0x61, 0x01];
pub const TXT_ALIGN_RT: &[u8] = &[0x1b, 0x61, 0x02];

// Line spacing
pub const LINE_SPACING: &[u8] = &[0x1b, 0x33];
pub const LINE_SPACING_DEFAULT: &[u8] = &[0x1b, 0x32];

// Images
/// GS v 0 m - raster bit image, normal scale
pub const RASTER_NORMAL: &[u8] = &[0x1d, 0x76, 0x30, 0x00];
/// ESC * - select bit image mode, followed by the mode byte
pub const BITMAP: &[u8] = &[0x1b, 0x2a];
/// 24-dot double density
pub const BITMAP_D24: u8 = 33;
