use core::convert::Infallible;
use core::ops::{Deref, DerefMut, Index, IndexMut};

use embedded_graphics::Pixel;
use embedded_graphics::pixelcolor::{Gray8, GrayColor};
use embedded_graphics::prelude::{DrawTarget, OriginDimensions, Point, Size};

use crate::{Error, Result};

/// How [`Frame::copy_from_bytes`] interprets incoming bytes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BufferMode {
    /// Each byte is an on/off flag: zero stays off, anything else becomes full brightness.
    #[default]
    Binary,
    /// Each byte is stored as the pixel's brightness unchanged.
    Grayscale,
}

/// Logical pixel buffer: `H` rows of `W` brightness values in application orientation.
///
/// `frame[(x, y)]` is the pixel at column `x`, row `y`. The linear index of that pixel
/// is `y * W + x`, which is also the byte order used for persistence.
///
/// `Frame` implements [`DrawTarget`] with [`Gray8`] colour, so shapes and fonts from
/// [`embedded-graphics`](https://docs.rs/embedded-graphics) draw straight into it. The
/// luma of each drawn pixel becomes its brightness; pixels off the panel are dropped.
///
/// ```rust
/// use embedded_graphics::pixelcolor::Gray8;
/// use embedded_graphics::prelude::*;
/// use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};
/// use led_screen::screen::Frame;
///
/// let mut frame = Frame::<4, 4>::new();
/// Rectangle::new(Point::new(1, 1), Size::new(2, 2))
///     .into_styled(PrimitiveStyle::with_fill(Gray8::WHITE))
///     .draw(&mut frame)
///     .expect("drawing into a frame is infallible");
/// assert_eq!(frame[(1, 2)], 255);
/// assert_eq!(frame.lit_count(), 4);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Frame<const W: usize, const H: usize>(pub [[u8; W]; H]);

impl<const W: usize, const H: usize> Frame<W, H> {
    /// Frame width in pixels (columns).
    pub const WIDTH: usize = W;
    /// Frame height in pixels (rows).
    pub const HEIGHT: usize = H;
    /// Total number of pixels (WIDTH × HEIGHT).
    pub const LEN: usize = W * H;
    /// Frame dimensions as a [`Size`].
    pub const SIZE: Size = Size::new(W as u32, H as u32);
    /// Top-left corner coordinate as a [`Point`].
    pub const TOP_LEFT: Point = Point::new(0, 0);

    /// Create a new blank (all off) frame.
    #[must_use]
    pub const fn new() -> Self {
        Self([[0; W]; H])
    }

    /// Create a frame with every pixel at the same brightness.
    #[must_use]
    pub const fn filled(value: u8) -> Self {
        Self([[value; W]; H])
    }

    /// Pixels in linear (row-major) order.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_flattened()
    }

    /// Mutable pixels in linear (row-major) order.
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        self.0.as_flattened_mut()
    }

    /// Brightness at `(x, y)`, or `None` off the panel.
    #[must_use]
    pub fn get(&self, x_index: i32, y_index: i32) -> Option<u8> {
        let (x_index, y_index) = Self::checked_xy(x_index, y_index)?;
        Some(self.0[y_index][x_index])
    }

    /// Number of pixels that are not off.
    #[must_use]
    pub fn lit_count(&self) -> usize {
        self.as_bytes().iter().filter(|&&value| value != 0).count()
    }

    /// Turn every pixel off.
    pub fn clear(&mut self) {
        *self = Self::new();
    }

    /// Replace every pixel from `bytes` in linear order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BufferLength`] unless `bytes` holds exactly `W * H` values; the
    /// frame is left untouched in that case.
    pub fn copy_from_bytes(&mut self, bytes: &[u8], mode: BufferMode) -> Result<()> {
        if bytes.len() != Self::LEN {
            return Err(Error::BufferLength {
                expected: Self::LEN,
                actual: bytes.len(),
            });
        }
        for (pixel, &byte) in self.as_bytes_mut().iter_mut().zip(bytes) {
            *pixel = match mode {
                BufferMode::Binary if byte != 0 => u8::MAX,
                BufferMode::Binary => 0,
                BufferMode::Grayscale => byte,
            };
        }
        Ok(())
    }

    /// Convert signed coordinates to in-bounds indices.
    pub(crate) fn checked_xy(x_index: i32, y_index: i32) -> Option<(usize, usize)> {
        let x_index = usize::try_from(x_index).ok()?;
        let y_index = usize::try_from(y_index).ok()?;
        (x_index < W && y_index < H).then_some((x_index, y_index))
    }
}

impl<const W: usize, const H: usize> Deref for Frame<W, H> {
    type Target = [[u8; W]; H];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<const W: usize, const H: usize> DerefMut for Frame<W, H> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl<const W: usize, const H: usize> Index<(usize, usize)> for Frame<W, H> {
    type Output = u8;

    fn index(&self, (x_index, y_index): (usize, usize)) -> &Self::Output {
        assert!(x_index < W, "x_index must be within width");
        assert!(y_index < H, "y_index must be within height");
        &self.0[y_index][x_index]
    }
}

impl<const W: usize, const H: usize> IndexMut<(usize, usize)> for Frame<W, H> {
    fn index_mut(&mut self, (x_index, y_index): (usize, usize)) -> &mut Self::Output {
        assert!(x_index < W, "x_index must be within width");
        assert!(y_index < H, "y_index must be within height");
        &mut self.0[y_index][x_index]
    }
}

impl<const W: usize, const H: usize> From<[[u8; W]; H]> for Frame<W, H> {
    fn from(array: [[u8; W]; H]) -> Self {
        Self(array)
    }
}

impl<const W: usize, const H: usize> From<Frame<W, H>> for [[u8; W]; H] {
    fn from(frame: Frame<W, H>) -> Self {
        frame.0
    }
}

impl<const W: usize, const H: usize> Default for Frame<W, H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const W: usize, const H: usize> OriginDimensions for Frame<W, H> {
    fn size(&self) -> Size {
        Self::SIZE
    }
}

impl<const W: usize, const H: usize> DrawTarget for Frame<W, H> {
    type Color = Gray8;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> core::result::Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(coord, color) in pixels {
            if let Some((x_index, y_index)) = Self::checked_xy(coord.x, coord.y) {
                self.0[y_index][x_index] = color.luma();
            }
        }
        Ok(())
    }
}

/// Physically ordered buffer: slot `a` holds the brightness of the LED at wiring address `a`.
///
/// Produced by [`Screen::rotate`](super::Screen::rotate) and consumed by the refresh cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PhysicalFrame<const W: usize, const H: usize>([[u8; W]; H]);

impl<const W: usize, const H: usize> PhysicalFrame<W, H> {
    /// Number of physical addresses.
    pub const LEN: usize = W * H;

    /// All LEDs off.
    #[must_use]
    pub const fn new() -> Self {
        Self([[0; W]; H])
    }

    /// Brightness at a physical address, or `None` past the end.
    #[must_use]
    pub fn get(&self, address: usize) -> Option<u8> {
        self.as_bytes().get(address).copied()
    }

    /// Set the brightness at a physical address; out-of-range addresses are ignored.
    pub fn set(&mut self, address: usize, value: u8) {
        if let Some(slot) = self.0.as_flattened_mut().get_mut(address) {
            *slot = value;
        }
    }

    /// Slots in physical address order.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_flattened()
    }

    /// Mutable slots in physical address order.
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        self.0.as_flattened_mut()
    }

    /// Number of LEDs that are not off.
    #[must_use]
    pub fn lit_count(&self) -> usize {
        self.as_bytes().iter().filter(|&&value| value != 0).count()
    }

    /// Addresses that are not off, in ascending order.
    pub fn lit_addresses(&self) -> impl Iterator<Item = usize> + '_ {
        self.as_bytes()
            .iter()
            .enumerate()
            .filter_map(|(address, &value)| (value != 0).then_some(address))
    }
}

impl<const W: usize, const H: usize> Default for PhysicalFrame<W, H> {
    fn default() -> Self {
        Self::new()
    }
}
