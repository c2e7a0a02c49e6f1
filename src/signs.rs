//! Digit fonts and weather icons, stored as MSB-first packed bit patterns.
//!
//! The screen treats glyphs as opaque bit sequences; swap in another table by
//! implementing [`GlyphTable`].

use crate::Error;

/// Width of a small-font digit in pixels.
pub const SMALL_DIGIT_WIDTH: usize = 4;
/// Height of a small-font digit in pixels.
pub const SMALL_DIGIT_HEIGHT: usize = 6;
/// Horizontal cursor advance per small digit (glyph plus one blank column).
pub const SMALL_DIGIT_ADVANCE: i32 = 5;
/// Width of a big-font digit in pixels.
pub const BIG_DIGIT_WIDTH: usize = 8;
/// Height of a big-font digit in pixels.
pub const BIG_DIGIT_HEIGHT: usize = 8;
/// Horizontal cursor advance per big digit.
pub const BIG_DIGIT_ADVANCE: i32 = 8;
/// Width and height of a weather icon in pixels.
pub const WEATHER_ICON_SIZE: usize = 16;

/// Source of glyph bit patterns.
///
/// Each pattern is packed MSB-first, row-major, with rows as wide as the glyph. A
/// `None` leaves the glyph's cell blank.
pub trait GlyphTable {
    /// Small-font pattern for `digit` (0-9), [`SMALL_DIGIT_WIDTH`] bits per row.
    fn small_digit(&self, digit: u8) -> Option<&[u8]>;

    /// Big-font pattern for `digit` (0-9), [`BIG_DIGIT_WIDTH`] bits per row.
    fn big_digit(&self, digit: u8) -> Option<&[u8]>;

    /// Icon pattern, [`WEATHER_ICON_SIZE`] bits per row.
    fn weather_icon(&self, weather: Weather) -> Option<&[u8]>;
}

/// Weather conditions with a built-in icon.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Weather {
    /// Sun.
    Clear = 0,
    /// Sun behind a cloud.
    PartlyCloudy = 1,
    /// Cloud.
    Cloudy = 2,
    /// Cloud with drops.
    Rain = 3,
    /// Cloud with a bolt.
    Thunderstorm = 4,
    /// Cloud with flakes.
    Snow = 5,
    /// Horizontal bands.
    Fog = 6,
}

impl Weather {
    /// Every condition, ordered by code.
    pub const ALL: [Self; 7] = [
        Self::Clear,
        Self::PartlyCloudy,
        Self::Cloudy,
        Self::Rain,
        Self::Thunderstorm,
        Self::Snow,
        Self::Fog,
    ];
}

impl TryFrom<u8> for Weather {
    type Error = Error;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Self::ALL
            .get(usize::from(code))
            .copied()
            .ok_or(Error::IndexOutOfBounds)
    }
}

impl From<Weather> for u8 {
    fn from(weather: Weather) -> Self {
        weather as Self
    }
}

/// The built-in glyph table.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Signs;

impl GlyphTable for Signs {
    fn small_digit(&self, digit: u8) -> Option<&[u8]> {
        SMALL_DIGITS.get(usize::from(digit)).map(<[u8; 3]>::as_slice)
    }

    fn big_digit(&self, digit: u8) -> Option<&[u8]> {
        BIG_DIGITS.get(usize::from(digit)).map(<[u8; 8]>::as_slice)
    }

    fn weather_icon(&self, weather: Weather) -> Option<&[u8]> {
        WEATHER_ICONS
            .get(usize::from(u8::from(weather)))
            .map(<[u8; 32]>::as_slice)
    }
}

/// Pack six 4-bit rows (low nibble of each entry) into three bytes.
const fn nibble_rows(rows: [u8; SMALL_DIGIT_HEIGHT]) -> [u8; 3] {
    [
        (rows[0] << 4) | (rows[1] & 0x0F),
        (rows[2] << 4) | (rows[3] & 0x0F),
        (rows[4] << 4) | (rows[5] & 0x0F),
    ]
}

/// Split sixteen 16-bit rows into big-endian byte pairs.
const fn icon_rows(rows: [u16; WEATHER_ICON_SIZE]) -> [u8; 32] {
    let mut bytes = [0_u8; 32];
    let mut row_index = 0;
    while row_index < WEATHER_ICON_SIZE {
        let [high, low] = rows[row_index].to_be_bytes();
        bytes[row_index * 2] = high;
        bytes[row_index * 2 + 1] = low;
        row_index += 1;
    }
    bytes
}

static SMALL_DIGITS: [[u8; 3]; 10] = [
    nibble_rows([0b0110, 0b1001, 0b1001, 0b1001, 0b1001, 0b0110]),
    nibble_rows([0b0010, 0b0110, 0b0010, 0b0010, 0b0010, 0b0111]),
    nibble_rows([0b0110, 0b1001, 0b0001, 0b0010, 0b0100, 0b1111]),
    nibble_rows([0b1110, 0b0001, 0b0110, 0b0001, 0b0001, 0b1110]),
    nibble_rows([0b1001, 0b1001, 0b1111, 0b0001, 0b0001, 0b0001]),
    nibble_rows([0b1111, 0b1000, 0b1110, 0b0001, 0b0001, 0b1110]),
    nibble_rows([0b0110, 0b1000, 0b1110, 0b1001, 0b1001, 0b0110]),
    nibble_rows([0b1111, 0b0001, 0b0010, 0b0100, 0b0100, 0b0100]),
    nibble_rows([0b0110, 0b1001, 0b0110, 0b1001, 0b1001, 0b0110]),
    nibble_rows([0b0110, 0b1001, 0b1001, 0b0111, 0b0001, 0b0110]),
];

static BIG_DIGITS: [[u8; 8]; 10] = [
    [0x3C, 0x66, 0x6E, 0x7E, 0x76, 0x66, 0x3C, 0x00],
    [0x18, 0x38, 0x18, 0x18, 0x18, 0x18, 0x7E, 0x00],
    [0x3C, 0x66, 0x06, 0x0C, 0x30, 0x60, 0x7E, 0x00],
    [0x3C, 0x66, 0x06, 0x1C, 0x06, 0x66, 0x3C, 0x00],
    [0x0C, 0x1C, 0x3C, 0x6C, 0x7E, 0x0C, 0x0C, 0x00],
    [0x7E, 0x60, 0x7C, 0x06, 0x06, 0x66, 0x3C, 0x00],
    [0x1C, 0x30, 0x60, 0x7C, 0x66, 0x66, 0x3C, 0x00],
    [0x7E, 0x06, 0x0C, 0x18, 0x30, 0x30, 0x30, 0x00],
    [0x3C, 0x66, 0x66, 0x3C, 0x66, 0x66, 0x3C, 0x00],
    [0x3C, 0x66, 0x66, 0x3E, 0x06, 0x0C, 0x38, 0x00],
];

// Indexed by `Weather` code.
static WEATHER_ICONS: [[u8; 32]; 7] = [
    // Clear
    icon_rows([
        0b0000_0001_0000_0000,
        0b0010_0001_0000_0100,
        0b0001_0000_0000_1000,
        0b0000_0011_1100_0000,
        0b0000_0111_1110_0000,
        0b0000_1111_1111_0000,
        0b0000_1111_1111_0000,
        0b1110_1111_1111_0111,
        0b0000_1111_1111_0000,
        0b0000_1111_1111_0000,
        0b0000_0111_1110_0000,
        0b0000_0011_1100_0000,
        0b0001_0000_0000_1000,
        0b0010_0001_0000_0100,
        0b0000_0001_0000_0000,
        0b0000_0000_0000_0000,
    ]),
    // PartlyCloudy
    icon_rows([
        0b0000_0000_0100_0000,
        0b0000_0100_0100_0100,
        0b0000_0010_0000_1000,
        0b0000_0000_1110_0000,
        0b0000_0001_1111_0000,
        0b0000_0001_1111_0111,
        0b0000_0111_1011_0000,
        0b0000_1111_1100_0000,
        0b0011_1111_1111_0000,
        0b0111_1111_1111_1000,
        0b1111_1111_1111_1100,
        0b1111_1111_1111_1110,
        0b1111_1111_1111_1110,
        0b0111_1111_1111_1100,
        0b0000_0000_0000_0000,
        0b0000_0000_0000_0000,
    ]),
    // Cloudy
    icon_rows([
        0b0000_0000_0000_0000,
        0b0000_0000_0000_0000,
        0b0000_0000_0000_0000,
        0b0000_0011_1100_0000,
        0b0000_0111_1110_0000,
        0b0011_1111_1111_0000,
        0b0111_1111_1111_1100,
        0b1111_1111_1111_1110,
        0b1111_1111_1111_1111,
        0b1111_1111_1111_1111,
        0b0111_1111_1111_1110,
        0b0011_1111_1111_1100,
        0b0000_0000_0000_0000,
        0b0000_0000_0000_0000,
        0b0000_0000_0000_0000,
        0b0000_0000_0000_0000,
    ]),
    // Rain
    icon_rows([
        0b0000_0011_1100_0000,
        0b0000_0111_1110_0000,
        0b0011_1111_1111_0000,
        0b0111_1111_1111_1100,
        0b1111_1111_1111_1110,
        0b1111_1111_1111_1111,
        0b0111_1111_1111_1110,
        0b0000_0000_0000_0000,
        0b0100_0100_0100_0100,
        0b0100_0100_0100_0100,
        0b0000_0000_0000_0000,
        0b0001_0001_0001_0000,
        0b0001_0001_0001_0000,
        0b0000_0000_0000_0000,
        0b0100_0100_0100_0100,
        0b0100_0100_0100_0100,
    ]),
    // Thunderstorm
    icon_rows([
        0b0000_0011_1100_0000,
        0b0000_0111_1110_0000,
        0b0011_1111_1111_0000,
        0b0111_1111_1111_1100,
        0b1111_1111_1111_1110,
        0b1111_1111_1111_1111,
        0b0111_1111_1111_1110,
        0b0000_0001_1000_0000,
        0b0000_0011_0000_0000,
        0b0000_0110_0000_0000,
        0b0000_1111_1000_0000,
        0b0000_0001_1000_0000,
        0b0000_0011_0000_0000,
        0b0000_0110_0000_0000,
        0b0000_0100_0000_0000,
        0b0000_0000_0000_0000,
    ]),
    // Snow
    icon_rows([
        0b0000_0011_1100_0000,
        0b0000_0111_1110_0000,
        0b0011_1111_1111_0000,
        0b0111_1111_1111_1100,
        0b1111_1111_1111_1110,
        0b1111_1111_1111_1111,
        0b0111_1111_1111_1110,
        0b0000_0000_0000_0000,
        0b0010_0000_1000_0010,
        0b0111_0001_1100_0111,
        0b0010_0000_1000_0010,
        0b0000_0000_0000_0000,
        0b0000_1000_0010_0000,
        0b0001_1100_0111_0000,
        0b0000_1000_0010_0000,
        0b0000_0000_0000_0000,
    ]),
    // Fog
    icon_rows([
        0b0000_0000_0000_0000,
        0b0000_0000_0000_0000,
        0b0111_1111_1111_1110,
        0b0000_0000_0000_0000,
        0b0000_0000_0000_0000,
        0b1111_1111_1100_0000,
        0b0000_0000_0000_0000,
        0b0000_0000_0000_0000,
        0b0011_1111_1111_1100,
        0b0000_0000_0000_0000,
        0b0000_0000_0000_0000,
        0b0000_0011_1111_1111,
        0b0000_0000_0000_0000,
        0b0000_0000_0000_0000,
        0b0111_1111_1111_1110,
        0b0000_0000_0000_0000,
    ]),
];
