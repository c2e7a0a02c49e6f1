//! Drawing primitives on the logical [`Frame`].
//!
//! Every primitive clips to the panel and writes only the logical buffer; the physical
//! frame changes when the screen is rotated/published.

use embedded_graphics::prelude::Point;
use embedded_graphics::primitives::{Line, PointsIter};

use crate::bits;
use crate::signs::{
    BIG_DIGIT_ADVANCE, BIG_DIGIT_WIDTH, GlyphTable, SMALL_DIGIT_ADVANCE, SMALL_DIGIT_WIDTH,
    WEATHER_ICON_SIZE, Weather,
};

use super::Frame;

/// Brightness used when a caller has no reason to dim a primitive.
pub const FULL_BRIGHTNESS: u8 = u8::MAX;

/// What a line or rectangle does to each pixel it touches.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LedStatus {
    /// Turn the pixel off.
    Off,
    /// Set the pixel to the primitive's brightness.
    #[default]
    On,
    /// Turn a lit pixel off and an unlit pixel on at the primitive's brightness.
    Toggle,
}

impl LedStatus {
    /// New value of a pixel currently at `current`.
    #[must_use]
    pub const fn apply(self, current: u8, brightness: u8) -> u8 {
        match self {
            Self::Off => 0,
            Self::On => brightness,
            Self::Toggle if current == 0 => brightness,
            Self::Toggle => 0,
        }
    }
}

impl From<bool> for LedStatus {
    fn from(on: bool) -> Self {
        if on { Self::On } else { Self::Off }
    }
}

/// Axis of a full-length line drawn by [`Frame::draw_full_line`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Orientation {
    /// A whole row.
    Horizontal,
    /// A whole column.
    Vertical,
}

impl<const W: usize, const H: usize> Frame<W, H> {
    /// Write `brightness` at `(x, y)` if `value` is non-zero, else turn the pixel off.
    ///
    /// Coordinates off the panel are ignored.
    pub fn set_pixel(&mut self, x_index: i32, y_index: i32, value: u8, brightness: u8) {
        if let Some((x_index, y_index)) = Self::checked_xy(x_index, y_index) {
            self.0[y_index][x_index] = if value == 0 { 0 } else { brightness };
        }
    }

    /// [`set_pixel`](Self::set_pixel) addressed by linear index `y * W + x`.
    pub fn set_pixel_at_index(&mut self, index: usize, value: u8, brightness: u8) {
        if let Some(pixel) = self.as_bytes_mut().get_mut(index) {
            *pixel = if value == 0 { 0 } else { brightness };
        }
    }

    fn apply_status(&mut self, point: Point, status: LedStatus, brightness: u8) {
        if let Some((x_index, y_index)) = Self::checked_xy(point.x, point.y) {
            let pixel = &mut self.0[y_index][x_index];
            *pixel = status.apply(*pixel, brightness);
        }
    }

    /// Light every pixel of one row or column.
    pub fn draw_full_line(&mut self, line: usize, orientation: Orientation, brightness: u8) {
        match orientation {
            Orientation::Horizontal => {
                if let Some(row) = self.0.get_mut(line) {
                    row.fill(brightness);
                }
            }
            Orientation::Vertical => {
                if line < W {
                    for row in &mut self.0 {
                        row[line] = brightness;
                    }
                }
            }
        }
    }

    /// Bresenham line from `(x1, y1)` to `(x2, y2)`, both ends included.
    ///
    /// The segment is first clipped to the panel, so endpoints anywhere in `i32` cost
    /// no more than a line across the panel.
    pub fn draw_line(
        &mut self,
        x1: i32,
        y1: i32,
        x2: i32,
        y2: i32,
        status: LedStatus,
        brightness: u8,
    ) {
        let Some((start, end)) = Self::clip_line((x1, y1), (x2, y2)) else {
            return;
        };
        for point in Line::new(start, end).points() {
            self.apply_status(point, status, brightness);
        }
    }

    /// Liang-Barsky clip of a segment to `[0, W) x [0, H)`, in wide integers.
    fn clip_line(start: (i32, i32), end: (i32, i32)) -> Option<(Point, Point)> {
        let x_max = i64::try_from(W).ok()?.checked_sub(1)?;
        let y_max = i64::try_from(H).ok()?.checked_sub(1)?;
        let (x0, y0) = (i64::from(start.0), i64::from(start.1));
        let (dx, dy) = (i64::from(end.0) - x0, i64::from(end.1) - y0);

        // Parameters along the segment as (numerator, positive denominator).
        let mut enter = (0_i64, 1_i64);
        let mut exit = (1_i64, 1_i64);
        for (step, room) in [(-dx, x0), (dx, x_max - x0), (-dy, y0), (dy, y_max - y0)] {
            if step == 0 {
                if room < 0 {
                    return None;
                }
            } else if step < 0 {
                let bound = (-room, -step);
                if fraction_lt(enter, bound) {
                    enter = bound;
                }
            } else {
                let bound = (room, step);
                if fraction_lt(bound, exit) {
                    exit = bound;
                }
            }
        }
        if fraction_lt(exit, enter) {
            return None;
        }

        let at = |(numerator, denominator): (i64, i64)| {
            let x_index = x0 + round_div(dx, numerator, denominator);
            let y_index = y0 + round_div(dy, numerator, denominator);
            Some(Point::new(
                i32::try_from(x_index.clamp(0, x_max)).ok()?,
                i32::try_from(y_index.clamp(0, y_max)).ok()?,
            ))
        };
        Some((at(enter)?, at(exit)?))
    }

    /// Rectangle with its top-left corner at `(x, y)`.
    ///
    /// With `outline` only the perimeter is touched; otherwise the whole area. Every
    /// touched pixel is touched exactly once, so [`LedStatus::Toggle`] inverts it. Only
    /// the part on the panel is walked.
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
        if width == 0 || height == 0 {
            return;
        }
        let left = i64::from(x_index);
        let top = i64::from(y_index);
        let right = left + i64::from(width) - 1;
        let bottom = top + i64::from(height) - 1;
        let (Some((first_x, last_x)), Some((first_y, last_y))) =
            (clip_span::<W>(left, right), clip_span::<H>(top, bottom))
        else {
            return;
        };

        for row in first_y..=last_y {
            if !outline || row == top || row == bottom {
                for column in first_x..=last_x {
                    self.apply_status_at(column, row, status, brightness);
                }
            } else {
                self.apply_status_at(left, row, status, brightness);
                if right != left {
                    self.apply_status_at(right, row, status, brightness);
                }
            }
        }
    }

    fn apply_status_at(&mut self, x_index: i64, y_index: i64, status: LedStatus, brightness: u8) {
        if let (Ok(x_index), Ok(y_index)) = (i32::try_from(x_index), i32::try_from(y_index)) {
            self.apply_status(Point::new(x_index, y_index), status, brightness);
        }
    }

    /// Draw a glyph given as 0/1 flags in row-major order, `bit_count` flags per row.
    ///
    /// A 0 flag turns its pixel off and a 1 flag lights it. A trailing partial row draws
    /// only the flags present, and a `bit_count` of zero draws nothing.
    pub fn draw_character(
        &mut self,
        x_index: i32,
        y_index: i32,
        bits: &[u8],
        bit_count: usize,
        brightness: u8,
    ) {
        self.draw_bit_rows(x_index, y_index, bits.iter().copied(), bit_count, brightness);
    }

    /// Draw a glyph packed MSB-first, eight flags per byte.
    pub fn draw_packed_character(
        &mut self,
        x_index: i32,
        y_index: i32,
        packed: &[u8],
        bit_count: usize,
        brightness: u8,
    ) {
        self.draw_bit_rows(
            x_index,
            y_index,
            bits::unpacked(packed),
            bit_count,
            brightness,
        );
    }

    fn draw_bit_rows(
        &mut self,
        x_index: i32,
        y_index: i32,
        bits: impl Iterator<Item = u8>,
        bit_count: usize,
        brightness: u8,
    ) {
        if bit_count == 0 {
            return;
        }
        for (bit_index, bit) in bits.enumerate() {
            let (Ok(row), Ok(column)) = (
                i32::try_from(bit_index / bit_count),
                i32::try_from(bit_index % bit_count),
            ) else {
                return;
            };
            self.set_pixel(
                x_index.saturating_add(column),
                y_index.saturating_add(row),
                bit,
                brightness,
            );
        }
    }

    /// Draw digits from the small font, advancing the cursor one cell per digit.
    ///
    /// Values above 9 leave a blank cell.
    pub fn draw_numbers(
        &mut self,
        glyphs: &impl GlyphTable,
        x_index: i32,
        y_index: i32,
        digits: &[u8],
        brightness: u8,
    ) {
        let mut cursor = x_index;
        for &digit in digits {
            if let Some(packed) = glyphs.small_digit(digit) {
                self.draw_packed_character(cursor, y_index, packed, SMALL_DIGIT_WIDTH, brightness);
            }
            cursor = cursor.saturating_add(SMALL_DIGIT_ADVANCE);
        }
    }

    /// Draw digits from the big font, advancing the cursor one cell per digit.
    ///
    /// Values above 9 leave a blank cell.
    pub fn draw_big_numbers(
        &mut self,
        glyphs: &impl GlyphTable,
        x_index: i32,
        y_index: i32,
        digits: &[u8],
        brightness: u8,
    ) {
        let mut cursor = x_index;
        for &digit in digits {
            if let Some(packed) = glyphs.big_digit(digit) {
                self.draw_packed_character(cursor, y_index, packed, BIG_DIGIT_WIDTH, brightness);
            }
            cursor = cursor.saturating_add(BIG_DIGIT_ADVANCE);
        }
    }

    /// Draw the icon for a weather code; unknown codes draw nothing.
    pub fn draw_weather(
        &mut self,
        glyphs: &impl GlyphTable,
        x_index: i32,
        y_index: i32,
        code: u8,
        brightness: u8,
    ) {
        let Ok(weather) = Weather::try_from(code) else {
            warn!("Screen: unknown weather code {}", code);
            return;
        };
        if let Some(packed) = glyphs.weather_icon(weather) {
            self.draw_packed_character(x_index, y_index, packed, WEATHER_ICON_SIZE, brightness);
        }
    }
}

/// Part of `first..=last` inside `0..LIMIT`.
fn clip_span<const LIMIT: usize>(first: i64, last: i64) -> Option<(i64, i64)> {
    let max = i64::try_from(LIMIT).ok()?.checked_sub(1)?;
    let (first, last) = (first.max(0), last.min(max));
    (first <= last).then_some((first, last))
}

/// `a < b` for fractions with positive denominators.
fn fraction_lt(a: (i64, i64), b: (i64, i64)) -> bool {
    i128::from(a.0) * i128::from(b.1) < i128::from(b.0) * i128::from(a.1)
}

/// `delta * numerator / denominator`, rounded half up; the quotient lies within `delta`.
fn round_div(delta: i64, numerator: i64, denominator: i64) -> i64 {
    let scaled = 2 * i128::from(delta) * i128::from(numerator) + i128::from(denominator);
    let quotient = scaled.div_euclid(2 * i128::from(denominator));
    i64::try_from(quotient).unwrap_or(delta)
}
