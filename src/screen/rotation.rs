//! Quarter-turn orientations and the coordinate math behind them.

use crate::{Error, Result};

/// Orientation applied to the logical buffer before physical addressing.
///
/// Turns are clockwise as seen from the front of the panel. On an `S`×`S` panel
/// logical `(x, y)` lands on:
///
/// ```text
/// Deg0    (x,         y        )
/// Deg90   (S - 1 - y, x        )
/// Deg180  (S - 1 - x, S - 1 - y)
/// Deg270  (y,         S - 1 - x)
/// ```
///
/// `Deg180` also works on rectangular panels; the quarter turns need a square one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Rotation {
    /// Unrotated.
    #[default]
    Deg0,
    /// A quarter turn clockwise.
    Deg90,
    /// A half turn.
    Deg180,
    /// Three quarter turns clockwise (a quarter turn counter-clockwise).
    Deg270,
}

impl Rotation {
    /// All four orientations in clockwise order starting at `Deg0`.
    pub const ALL: [Self; 4] = [Self::Deg0, Self::Deg90, Self::Deg180, Self::Deg270];

    /// Orientation after `turns` clockwise quarter turns from `Deg0`; wraps modulo 4.
    #[must_use]
    pub const fn from_quarter_turns(turns: u8) -> Self {
        match turns % 4 {
            0 => Self::Deg0,
            1 => Self::Deg90,
            2 => Self::Deg180,
            _ => Self::Deg270,
        }
    }

    /// Number of clockwise quarter turns, `0..4`.
    #[must_use]
    pub const fn quarter_turns(self) -> u8 {
        match self {
            Self::Deg0 => 0,
            Self::Deg90 => 1,
            Self::Deg180 => 2,
            Self::Deg270 => 3,
        }
    }

    /// Rotation in degrees.
    #[must_use]
    pub const fn degrees(self) -> u16 {
        self.quarter_turns() as u16 * 90
    }

    /// The next orientation one quarter turn clockwise.
    #[must_use]
    pub const fn next_cw(self) -> Self {
        Self::from_quarter_turns(self.quarter_turns() + 1)
    }

    /// Whether a `W`×`H` panel supports this orientation without changing its shape.
    #[must_use]
    pub const fn fits<const W: usize, const H: usize>(self) -> bool {
        match self {
            Self::Deg0 | Self::Deg180 => true,
            Self::Deg90 | Self::Deg270 => W == H,
        }
    }

    /// Map a logical coordinate on a `W`×`H` panel to its rotated coordinate.
    ///
    /// Callers check [`fits`](Self::fits) first; for quarter turns `W == H`.
    #[must_use]
    pub const fn apply<const W: usize, const H: usize>(
        self,
        x_index: usize,
        y_index: usize,
    ) -> (usize, usize) {
        match self {
            Self::Deg0 => (x_index, y_index),
            Self::Deg90 => (H - 1 - y_index, x_index),
            Self::Deg180 => (W - 1 - x_index, H - 1 - y_index),
            Self::Deg270 => (y_index, W - 1 - x_index),
        }
    }
}

impl TryFrom<u16> for Rotation {
    type Error = Error;

    /// Accepts 0, 90, 180, and 270.
    fn try_from(degrees: u16) -> Result<Self> {
        match degrees {
            0 => Ok(Self::Deg0),
            90 => Ok(Self::Deg90),
            180 => Ok(Self::Deg180),
            270 => Ok(Self::Deg270),
            _ => Err(Error::RotationUnsupported),
        }
    }
}

impl From<Rotation> for u16 {
    fn from(rotation: Rotation) -> Self {
        rotation.degrees()
    }
}
