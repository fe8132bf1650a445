/// Rate the printer listens at after power on, before any negotiation.
pub const POWER_ON_BAUD: u32 = 9600;

/// Supported link rates and the index the printer firmware uses for each in
/// the `1F 2D 55 01 m` command.
pub const BAUD_TABLE: &[(u32, u8)] = &[
    (1200, 0),
    (2400, 1),
    (4800, 2),
    (9600, 3),
    (19200, 4),
    (38400, 5),
    (57600, 6),
    (115200, 7),
    (230400, 8),
    (460800, 9),
    (921600, 10),
    (1843200, 11),
];

/// Printer side index for `rate`, or `None` if the printer can't run at it.
pub fn index_for(rate: u32) -> Option<u8> {
    BAUD_TABLE
        .iter()
        .find(|(r, _)| *r == rate)
        .map(|(_, index)| *index)
}

pub fn rate_for(index: u8) -> Option<u32> {
    BAUD_TABLE
        .iter()
        .find(|(_, i)| *i == index)
        .map(|(rate, _)| *rate)
}

pub fn is_supported(rate: u32) -> bool {
    index_for(rate).is_some()
}
