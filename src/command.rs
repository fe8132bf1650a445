//! Byte sequences for every command the driver sends.
//!
//! Nothing here validates its arguments; range checks belong to the caller.
//! Multi-byte fields are little-endian.

use byteorder::{LittleEndian, WriteBytesExt};

use crate::consts;

/// Horizontal alignment for text and images, `ESC a n`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
}

/// ESC @ - Initialize printer, clear the print buffer and restore the
/// power-on print mode.
pub fn init() -> &'static [u8] {
    consts::HW_INIT
}

pub fn self_test() -> &'static [u8] {
    consts::HW_SELFTEST
}

/// DLE EOT 1 - the printer answers with one of [`consts::PAPER_PRESENT`] or
/// [`consts::PAPER_ABSENT`].
pub fn check_paper() -> &'static [u8] {
    consts::PAPER_STATUS
}

pub fn session_open() -> &'static [u8] {
    consts::SESSION_OPEN
}

pub fn session_close() -> &'static [u8] {
    consts::SESSION_CLOSE
}

/// Baud change request. `index` comes from [`crate::baud::BAUD_TABLE`].
pub fn set_baud(index: u8) -> [u8; 5] {
    let mut cmd = [0_u8; 5];
    cmd[..4].copy_from_slice(consts::SET_BAUD_PREFIX);
    cmd[4] = index;
    cmd
}

pub fn feed_lines(lines: u8) -> [u8; 8] {
    let mut cmd = consts::FEED_LINES;
    cmd[consts::FEED_LINES_COUNT_OFFSET] = lines;
    cmd
}

pub fn align(alignment: Align) -> &'static [u8] {
    match alignment {
        Align::Left => consts::TXT_ALIGN_LT,
        Align::Center => consts::TXT_ALIGN_CT,
        Align::Right => consts::TXT_ALIGN_RT,
    }
}

/// ESC 3 n - Set line spacing to `n` motion units
pub fn line_spacing(n: u8) -> [u8; 3] {
    [consts::LINE_SPACING[0], consts::LINE_SPACING[1], n]
}

/// ESC 2 - Back to the default line spacing
pub fn default_line_spacing() -> &'static [u8] {
    consts::LINE_SPACING_DEFAULT
}

/// GS v 0 0 xL xH yL yH
///
/// `bytes_per_row` is the width in bytes (8 dots each), `height` in dots.
pub fn raster_header(bytes_per_row: u16, height: u16) -> Vec<u8> {
    let mut cmd = Vec::with_capacity(8);
    cmd.extend_from_slice(consts::RASTER_NORMAL);
    // Writing into a Vec never fails
    let _ = cmd.write_u16::<LittleEndian>(bytes_per_row);
    let _ = cmd.write_u16::<LittleEndian>(height);
    cmd
}

/// ESC * m nL nH
///
/// `width` is the number of columns that follow the header.
pub fn vertical_header(mode: u8, width: u16) -> Vec<u8> {
    let mut cmd = Vec::with_capacity(5);
    cmd.extend_from_slice(consts::BITMAP);
    cmd.push(mode);
    let _ = cmd.write_u16::<LittleEndian>(width);
    cmd
}
