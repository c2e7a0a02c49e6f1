//! Compile-time description of how logical pixel slots are wired to physical addresses.
//!
//! See [`PositionTable`] for the built-in wirings and for how custom tables are checked.

use crate::{Error, Result};

/// Maps every logical slot of a `W`×`H` screen to the physical address the panel scan uses.
///
/// Logical slot `y * W + x` holds the pixel at `(x, y)`. The physical address is wherever
/// the wiring puts that LED in the shift-register chain, which is rarely row-major.
///
/// ## Validation
///
/// A table must be a bijection: every physical address in `0..W*H` appears exactly once.
/// [`PositionTable::new`] checks this with `assert!`, so a bad table declared in a `const`
/// is a **compile-time** error. [`PositionTable::try_new`] checks the same rule at run time
/// and returns [`Error::InvalidPositionTable`].
///
/// # Example
///
/// ```rust
/// use led_screen::screen::PositionTable;
///
/// // 3×2 panel wired in a snake across the rows.
/// const SNAKE: PositionTable<3, 2> = PositionTable::serpentine_row_major();
/// const EXPECTED: PositionTable<3, 2> = PositionTable::new([[0, 1, 2], [5, 4, 3]]);
/// const _: () = assert!(SNAKE.equals(&EXPECTED));
///
/// assert_eq!(SNAKE.physical_address_at(0, 1), Some(5));
/// ```
///
/// ```text
/// Physical address per logical cell:
///   0  1  2
///   5  4  3
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PositionTable<const W: usize, const H: usize> {
    addresses: [[u16; W]; H],
}

impl<const W: usize, const H: usize> PositionTable<W, H> {
    /// Number of logical slots (and physical addresses).
    pub const LEN: usize = W * H;

    /// Constructor: panics (at compile time in a `const`) unless the table is a bijection.
    ///
    /// ```rust
    /// use led_screen::screen::PositionTable;
    ///
    /// const SWAPPED: PositionTable<2, 2> = PositionTable::new([[1, 0], [2, 3]]);
    /// assert_eq!(SWAPPED.physical_address(0), Some(1));
    /// ```
    #[must_use]
    pub const fn new(addresses: [[u16; W]; H]) -> Self {
        assert!(W > 0 && H > 0, "W and H must be positive");
        assert!(
            W * H <= u16::MAX as usize + 1,
            "W*H physical addresses must fit in u16"
        );
        assert!(
            Self::is_bijection(&addresses),
            "position table must map every physical address exactly once"
        );
        Self { addresses }
    }

    /// Run-time checked constructor for tables loaded from outside the program.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPositionTable`] if an address is out of range, repeated,
    /// or missing.
    pub const fn try_new(addresses: [[u16; W]; H]) -> Result<Self> {
        if W == 0 || H == 0 || !Self::is_bijection(&addresses) {
            return Err(Error::InvalidPositionTable);
        }
        Ok(Self { addresses })
    }

    /// Whether `addresses` lists each of `0..W*H` exactly once.
    #[must_use]
    pub const fn is_bijection(addresses: &[[u16; W]; H]) -> bool {
        let mut seen = [[false; W]; H];
        let mut y_index = 0;
        while y_index < H {
            let mut x_index = 0;
            while x_index < W {
                let address = addresses[y_index][x_index] as usize;
                if address >= W * H {
                    return false;
                }
                if seen[address / W][address % W] {
                    return false;
                }
                seen[address / W][address % W] = true;
                x_index += 1;
            }
            y_index += 1;
        }
        // W*H distinct in-range values cover the whole range.
        true
    }

    /// Row-major wiring: the physical address equals the logical slot.
    ///
    /// ```text
    /// 3×2:
    ///   0  1  2
    ///   3  4  5
    /// ```
    #[must_use]
    pub const fn identity() -> Self {
        let mut addresses = [[0_u16; W]; H];
        let mut y_index = 0;
        while y_index < H {
            let mut x_index = 0;
            while x_index < W {
                addresses[y_index][x_index] = (y_index * W + x_index) as u16;
                x_index += 1;
            }
            y_index += 1;
        }
        Self::new(addresses)
    }

    /// Serpentine row-major wiring (alternating left-to-right and right-to-left across rows).
    ///
    /// ```text
    /// 3×2:
    ///   0  1  2
    ///   5  4  3
    /// ```
    #[must_use]
    pub const fn serpentine_row_major() -> Self {
        let mut addresses = [[0_u16; W]; H];
        let mut y_index = 0;
        while y_index < H {
            let mut x_index = 0;
            while x_index < W {
                let address = if y_index % 2 == 0 {
                    y_index * W + x_index
                } else {
                    y_index * W + (W - 1 - x_index)
                };
                addresses[y_index][x_index] = address as u16;
                x_index += 1;
            }
            y_index += 1;
        }
        Self::new(addresses)
    }

    /// Serpentine column-major wiring (alternating top-to-bottom and bottom-to-top down columns).
    ///
    /// ```text
    /// 3×2:
    ///   0  3  4
    ///   1  2  5
    /// ```
    #[must_use]
    pub const fn serpentine_column_major() -> Self {
        let mut addresses = [[0_u16; W]; H];
        let mut y_index = 0;
        while y_index < H {
            let mut x_index = 0;
            while x_index < W {
                let address = if x_index % 2 == 0 {
                    x_index * H + y_index
                } else {
                    x_index * H + (H - 1 - y_index)
                };
                addresses[y_index][x_index] = address as u16;
                x_index += 1;
            }
            y_index += 1;
        }
        Self::new(addresses)
    }

    /// Physical address for a logical slot, or `None` past the end of the screen.
    #[must_use]
    pub const fn physical_address(&self, logical_index: usize) -> Option<usize> {
        if logical_index >= W * H {
            return None;
        }
        Some(self.addresses[logical_index / W][logical_index % W] as usize)
    }

    /// Physical address for logical `(x, y)`, or `None` off the screen.
    #[must_use]
    pub const fn physical_address_at(&self, x_index: usize, y_index: usize) -> Option<usize> {
        if x_index >= W || y_index >= H {
            return None;
        }
        Some(self.addresses[y_index][x_index] as usize)
    }

    /// The raw table, one row of physical addresses per logical row.
    #[must_use]
    pub const fn as_rows(&self) -> &[[u16; W]; H] {
        &self.addresses
    }

    /// Const equality helper for compile-time assertions.
    #[must_use]
    pub const fn equals(&self, other: &Self) -> bool {
        let mut y_index = 0;
        while y_index < H {
            let mut x_index = 0;
            while x_index < W {
                if self.addresses[y_index][x_index] != other.addresses[y_index][x_index] {
                    return false;
                }
                x_index += 1;
            }
            y_index += 1;
        }
        true
    }
}

impl<const W: usize, const H: usize> Default for PositionTable<W, H> {
    fn default() -> Self {
        Self::identity()
    }
}

/// Wiring of the IKEA OBEGRÄNSAD 16×16 panel.
///
/// Its shift registers are chained in runs of 8 LEDs: each logical row splits into a left
/// half wired right-to-left and a right half wired left-to-right, and row pairs interleave
/// so the chain snakes through 2×16 bands.
pub const OBEGRAENSAD_16X16: PositionTable<16, 16> = PositionTable::new([
    [0x0f, 0x0e, 0x0d, 0x0c, 0x0b, 0x0a, 0x09, 0x08, 0x18, 0x19, 0x1a, 0x1b, 0x1c, 0x1d, 0x1e, 0x1f],
    [0x07, 0x06, 0x05, 0x04, 0x03, 0x02, 0x01, 0x00, 0x10, 0x11, 0x12, 0x13, 0x14, 0x15, 0x16, 0x17],
    [0x27, 0x26, 0x25, 0x24, 0x23, 0x22, 0x21, 0x20, 0x30, 0x31, 0x32, 0x33, 0x34, 0x35, 0x36, 0x37],
    [0x2f, 0x2e, 0x2d, 0x2c, 0x2b, 0x2a, 0x29, 0x28, 0x38, 0x39, 0x3a, 0x3b, 0x3c, 0x3d, 0x3e, 0x3f],
    [0x4f, 0x4e, 0x4d, 0x4c, 0x4b, 0x4a, 0x49, 0x48, 0x58, 0x59, 0x5a, 0x5b, 0x5c, 0x5d, 0x5e, 0x5f],
    [0x47, 0x46, 0x45, 0x44, 0x43, 0x42, 0x41, 0x40, 0x50, 0x51, 0x52, 0x53, 0x54, 0x55, 0x56, 0x57],
    [0x67, 0x66, 0x65, 0x64, 0x63, 0x62, 0x61, 0x60, 0x70, 0x71, 0x72, 0x73, 0x74, 0x75, 0x76, 0x77],
    [0x6f, 0x6e, 0x6d, 0x6c, 0x6b, 0x6a, 0x69, 0x68, 0x78, 0x79, 0x7a, 0x7b, 0x7c, 0x7d, 0x7e, 0x7f],
    [0x8f, 0x8e, 0x8d, 0x8c, 0x8b, 0x8a, 0x89, 0x88, 0x98, 0x99, 0x9a, 0x9b, 0x9c, 0x9d, 0x9e, 0x9f],
    [0x87, 0x86, 0x85, 0x84, 0x83, 0x82, 0x81, 0x80, 0x90, 0x91, 0x92, 0x93, 0x94, 0x95, 0x96, 0x97],
    [0xa7, 0xa6, 0xa5, 0xa4, 0xa3, 0xa2, 0xa1, 0xa0, 0xb0, 0xb1, 0xb2, 0xb3, 0xb4, 0xb5, 0xb6, 0xb7],
    [0xaf, 0xae, 0xad, 0xac, 0xab, 0xaa, 0xa9, 0xa8, 0xb8, 0xb9, 0xba, 0xbb, 0xbc, 0xbd, 0xbe, 0xbf],
    [0xcf, 0xce, 0xcd, 0xcc, 0xcb, 0xca, 0xc9, 0xc8, 0xd8, 0xd9, 0xda, 0xdb, 0xdc, 0xdd, 0xde, 0xdf],
    [0xc7, 0xc6, 0xc5, 0xc4, 0xc3, 0xc2, 0xc1, 0xc0, 0xd0, 0xd1, 0xd2, 0xd3, 0xd4, 0xd5, 0xd6, 0xd7],
    [0xe7, 0xe6, 0xe5, 0xe4, 0xe3, 0xe2, 0xe1, 0xe0, 0xf0, 0xf1, 0xf2, 0xf3, 0xf4, 0xf5, 0xf6, 0xf7],
    [0xef, 0xee, 0xed, 0xec, 0xeb, 0xea, 0xe9, 0xe8, 0xf8, 0xf9, 0xfa, 0xfb, 0xfc, 0xfd, 0xfe, 0xff],
]);
