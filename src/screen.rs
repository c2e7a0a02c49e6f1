//! The screen controller: logical drawing, rotation, brightness, cache, and persistence.
//!
//! A [`Screen`] comes from [`ScreenShared::split`] together with the
//! [`Refresher`](crate::refresh::Refresher) that scans the panel. Drawing only touches the
//! logical buffer; [`Screen::rotate`] turns it into a physically ordered frame and hands
//! that frame to the refresh side in one step.
//!
//! Operations that replace the whole buffer ([`Screen::set_render_buffer`],
//! [`Screen::restore_cache`], [`Screen::load_from_storage`]) and setting changes
//! ([`Screen::set_rotation`], [`Screen::set_brightness`]) publish immediately.
//! Incremental drawing is published by the next [`Screen::rotate`], so a sequence of
//! primitives shows up as one frame.
//!
//! # Example
//!
//! ```rust
//! use led_screen::refresh::{ScreenConfig, ScreenShared};
//! use led_screen::screen::{LedStatus, OBEGRAENSAD_16X16, FULL_BRIGHTNESS};
//! use led_screen::storage::{FlashStorage, MemoryFlash};
//!
//! static SHARED: ScreenShared<16, 16> = ScreenShared::new();
//!
//! # fn main() -> led_screen::Result<()> {
//! let mut storage = FlashStorage::at_end(MemoryFlash::<4096>::new(), 2)?;
//! let (mut screen, _refresher, _restored) =
//!     SHARED.setup(ScreenConfig::new(OBEGRAENSAD_16X16), &mut storage, ())?;
//!
//! screen.draw_big_numbers(0, 4, &[4, 2], FULL_BRIGHTNESS);
//! screen.draw_line(0, 15, 15, 15, LedStatus::On, FULL_BRIGHTNESS);
//! screen.rotate();
//!
//! // Keep the drawing across power cycles.
//! screen.persist(&mut storage)?;
//! # Ok(())
//! # }
//! ```

mod draw;
mod frame;
mod position;
mod rotation;

use core::convert::Infallible;

use embedded_graphics::Pixel;
use embedded_graphics::pixelcolor::Gray8;
use embedded_graphics::prelude::{DrawTarget, OriginDimensions, Size};

pub use draw::{FULL_BRIGHTNESS, LedStatus, Orientation};
pub use frame::{BufferMode, Frame, PhysicalFrame};
pub use position::{OBEGRAENSAD_16X16, PositionTable};
pub use rotation::Rotation;

use crate::bits;
use crate::refresh::{ScreenConfig, ScreenShared};
use crate::signs::{GlyphTable, Signs};
use crate::storage::Storage;
use crate::{Error, Result};

/// Storage key of the one-byte brightness record.
pub const BRIGHTNESS_KEY: &str = "brightness";
/// Storage key of the logical buffer record (`W * H` bytes, row-major).
pub const DATA_KEY: &str = "data";

/// Where [`Screen::load_from_storage`] took its state from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Restored {
    /// Brightness and buffer were read back from storage.
    FromStorage,
    /// Storage was empty or unreadable; the screen is cleared at default brightness.
    Defaults,
}

/// Controller for one `W`×`H` LED matrix.
///
/// Owns the logical render buffer and the cache buffer; shares only the published
/// physical frame and brightness with the refresh side. There is exactly one `Screen`
/// per [`ScreenShared`].
///
/// Glyphs for [`draw_numbers`](Self::draw_numbers) and friends come from `G`, the
/// built-in [`Signs`] unless replaced with [`with_glyphs`](Self::with_glyphs).
pub struct Screen<'a, const W: usize, const H: usize, G = Signs> {
    shared: &'a ScreenShared<W, H>,
    positions: PositionTable<W, H>,
    render: Frame<W, H>,
    cache: Frame<W, H>,
    rotation: Rotation,
    brightness: u8,
    default_brightness: u8,
    glyphs: G,
}

impl<'a, const W: usize, const H: usize> Screen<'a, W, H> {
    pub(crate) const fn new(shared: &'a ScreenShared<W, H>, config: &ScreenConfig<W, H>) -> Self {
        Self {
            shared,
            positions: config.position_table,
            render: Frame::new(),
            cache: Frame::new(),
            rotation: config.rotation,
            brightness: config.default_brightness,
            default_brightness: config.default_brightness,
            glyphs: Signs,
        }
    }
}

impl<'a, const W: usize, const H: usize, G: GlyphTable> Screen<'a, W, H, G> {
    /// Replace the glyph table used by the digit and weather primitives.
    #[must_use]
    pub fn with_glyphs<G2: GlyphTable>(self, glyphs: G2) -> Screen<'a, W, H, G2> {
        Screen {
            shared: self.shared,
            positions: self.positions,
            render: self.render,
            cache: self.cache,
            rotation: self.rotation,
            brightness: self.brightness,
            default_brightness: self.default_brightness,
            glyphs,
        }
    }

    /// The logical render buffer.
    #[must_use]
    pub const fn render_buffer(&self) -> &Frame<W, H> {
        &self.render
    }

    /// The logical render buffer, for collaborators that edit pixels directly.
    pub const fn render_buffer_mut(&mut self) -> &mut Frame<W, H> {
        &mut self.render
    }

    /// Copy of the physical frame the refresh side is currently showing.
    #[must_use]
    pub fn rotated_render_buffer(&self) -> PhysicalFrame<W, H> {
        self.shared.snapshot().frame
    }

    /// Turn every logical pixel off.
    pub fn clear(&mut self) {
        self.render.clear();
    }

    /// Replace the logical buffer from `W * H` bytes in row-major order and publish it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BufferLength`] for any other length; nothing changes then.
    pub fn set_render_buffer(&mut self, bytes: &[u8], mode: BufferMode) -> Result<()> {
        self.render.copy_from_bytes(bytes, mode)?;
        self.rotate();
        Ok(())
    }

    /// Replace the logical buffer from an MSB-first packed bitstream and publish it.
    ///
    /// Set bits light at full brightness.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BufferLength`] unless `packed` holds exactly `W * H` bits
    /// (rounded up to whole bytes); nothing changes then.
    pub fn set_render_buffer_packed(&mut self, packed: &[u8]) -> Result<()> {
        let expected = Frame::<W, H>::LEN.div_ceil(8);
        if packed.len() != expected {
            return Err(Error::BufferLength {
                expected,
                actual: packed.len(),
            });
        }
        for (pixel, bit) in self.render.as_bytes_mut().iter_mut().zip(bits::unpacked(packed)) {
            *pixel = if bit == 0 { 0 } else { FULL_BRIGHTNESS };
        }
        self.rotate();
        Ok(())
    }

    /// Physical address of a logical slot, or `None` past the end of the screen.
    #[must_use]
    pub const fn get_buffer_index(&self, logical_index: usize) -> Option<usize> {
        self.positions.physical_address(logical_index)
    }

    /// The wiring table in use.
    #[must_use]
    pub const fn position_table(&self) -> &PositionTable<W, H> {
        &self.positions
    }

    /// Current panel brightness.
    #[must_use]
    pub const fn current_brightness(&self) -> u8 {
        self.brightness
    }

    /// Set the panel brightness; the refresh side picks it up on its next tick.
    pub fn set_brightness(&mut self, brightness: u8) {
        self.brightness = brightness;
        self.shared.publish_brightness(brightness);
        debug!("Screen: brightness {}", brightness);
    }

    /// Current orientation.
    #[must_use]
    pub const fn current_rotation(&self) -> Rotation {
        self.rotation
    }

    /// Change the orientation and republish the frame.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RotationUnsupported`] for a quarter turn on a non-square panel.
    pub fn set_rotation(&mut self, rotation: Rotation) -> Result<()> {
        if !rotation.fits::<W, H>() {
            return Err(Error::RotationUnsupported);
        }
        self.rotation = rotation;
        info!("Screen: rotation {} degrees", rotation.degrees());
        self.rotate();
        Ok(())
    }

    /// Rebuild the physical frame from the logical buffer and publish it.
    ///
    /// Each logical pixel moves to its rotated coordinate, whose slot the position
    /// table turns into a physical address. The new frame is built off to the side and
    /// handed over in a single critical section, so the refresh side never sees half
    /// of it.
    pub fn rotate(&mut self) {
        let mut physical = PhysicalFrame::new();
        for (y_index, row) in self.render.iter().enumerate() {
            for (x_index, &value) in row.iter().enumerate() {
                let (rotated_x, rotated_y) = self.rotation.apply::<W, H>(x_index, y_index);
                if let Some(address) = self.positions.physical_address_at(rotated_x, rotated_y)
                {
                    physical.set(address, value);
                }
            }
        }
        self.shared.publish_frame(&physical);
    }

    /// Remember the logical buffer, e.g. before drawing a transient overlay.
    pub fn cache_current(&mut self) {
        self.cache = self.render;
    }

    /// Bring back the buffer saved by [`cache_current`](Self::cache_current) and publish it.
    ///
    /// Without an earlier cache this restores a blank buffer.
    pub fn restore_cache(&mut self) {
        self.render = self.cache;
        self.rotate();
    }

    /// Save the logical buffer, then brightness.
    ///
    /// The two records are not written atomically. The buffer is written first, so an
    /// interrupted persist never pairs a new brightness with an old buffer. Failure
    /// leaves the screen untouched and is safe to ignore.
    ///
    /// # Errors
    ///
    /// Returns whatever error the storage reported.
    pub fn persist(&self, storage: &mut impl Storage) -> Result<()> {
        let saved = storage
            .save(DATA_KEY, self.render.as_bytes())
            .and_then(|()| storage.save(BRIGHTNESS_KEY, &[self.brightness]));
        if let Err(err) = saved {
            warn!("Screen: persist failed, keeping in-memory state");
            return Err(err);
        }
        info!("Screen: persisted {} pixels", Frame::<W, H>::LEN);
        Ok(())
    }

    /// Load brightness and the logical buffer, then publish them.
    ///
    /// Anything missing or unreadable falls back to a cleared buffer at the default
    /// brightness; the screen stays usable either way.
    pub fn load_from_storage(&mut self, storage: &mut impl Storage) -> Restored {
        let restored = match Self::read_state(storage) {
            Ok(Some((brightness, frame))) => {
                self.brightness = brightness;
                self.render = frame;
                info!("Screen: restored state, brightness {}", brightness);
                Restored::FromStorage
            }
            Ok(None) => {
                info!("Screen: nothing stored, starting cleared");
                self.reset_to_defaults();
                Restored::Defaults
            }
            Err(_) => {
                warn!("Screen: stored state unreadable, starting cleared");
                self.reset_to_defaults();
                Restored::Defaults
            }
        };
        self.shared.publish_brightness(self.brightness);
        self.rotate();
        restored
    }

    fn reset_to_defaults(&mut self) {
        self.render.clear();
        self.brightness = self.default_brightness;
    }

    fn read_state(storage: &mut impl Storage) -> Result<Option<(u8, Frame<W, H>)>> {
        let mut brightness = [0_u8; 1];
        let Some(brightness_len) = storage.load(BRIGHTNESS_KEY, &mut brightness)? else {
            return Ok(None);
        };
        let mut frame = Frame::new();
        let Some(data_len) = storage.load(DATA_KEY, frame.as_bytes_mut())? else {
            return Ok(None);
        };
        if brightness_len != brightness.len() || data_len != Frame::<W, H>::LEN {
            return Err(Error::StorageCorrupted);
        }
        Ok(Some((brightness[0], frame)))
    }

    /// See [`Frame::set_pixel`].
    pub fn set_pixel(&mut self, x_index: i32, y_index: i32, value: u8, brightness: u8) {
        self.render.set_pixel(x_index, y_index, value, brightness);
    }

    /// See [`Frame::set_pixel_at_index`].
    pub fn set_pixel_at_index(&mut self, index: usize, value: u8, brightness: u8) {
        self.render.set_pixel_at_index(index, value, brightness);
    }

    /// See [`Frame::draw_full_line`].
    pub fn draw_full_line(&mut self, line: usize, orientation: Orientation, brightness: u8) {
        self.render.draw_full_line(line, orientation, brightness);
    }

    /// See [`Frame::draw_line`].
    pub fn draw_line(
        &mut self,
        x1: i32,
        y1: i32,
        x2: i32,
        y2: i32,
        status: LedStatus,
        brightness: u8,
    ) {
        self.render.draw_line(x1, y1, x2, y2, status, brightness);
    }

    /// See [`Frame::draw_rectangle`].
    #[expect(clippy::too_many_arguments, reason = "mirrors the drawing API of the panel")]
    pub fn draw_rectangle(
        &mut self,
        x_index: i32,
        y_index: i32,
        width: u32,
        height: u32,
        outline: bool,
        status: LedStatus,
        brightness: u8,
    ) {
        self.render
            .draw_rectangle(x_index, y_index, width, height, outline, status, brightness);
    }

    /// See [`Frame::draw_character`].
    pub fn draw_character(
        &mut self,
        x_index: i32,
        y_index: i32,
        bits: &[u8],
        bit_count: usize,
        brightness: u8,
    ) {
        self.render
            .draw_character(x_index, y_index, bits, bit_count, brightness);
    }

    /// Draw small-font digits starting at `(x, y)`.
    pub fn draw_numbers(&mut self, x_index: i32, y_index: i32, digits: &[u8], brightness: u8) {
        self.render
            .draw_numbers(&self.glyphs, x_index, y_index, digits, brightness);
    }

    /// Draw big-font digits starting at `(x, y)`.
    pub fn draw_big_numbers(&mut self, x_index: i32, y_index: i32, digits: &[u8], brightness: u8) {
        self.render
            .draw_big_numbers(&self.glyphs, x_index, y_index, digits, brightness);
    }

    /// Draw the icon for a weather code at `(x, y)`.
    pub fn draw_weather(&mut self, x_index: i32, y_index: i32, code: u8, brightness: u8) {
        self.render
            .draw_weather(&self.glyphs, x_index, y_index, code, brightness);
    }
}

impl<const W: usize, const H: usize, G> OriginDimensions for Screen<'_, W, H, G> {
    fn size(&self) -> Size {
        Frame::<W, H>::SIZE
    }
}

/// Draws into the logical buffer; call [`Screen::rotate`] to show the result.
impl<const W: usize, const H: usize, G> DrawTarget for Screen<'_, W, H, G> {
    type Color = Gray8;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> core::result::Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        self.render.draw_iter(pixels)
    }
}
