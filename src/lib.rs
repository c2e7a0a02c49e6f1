//! Frame buffers, rotation, drawing, and persistence for LED matrix screens whose
//! elements are wired in a scrambled, non-row-major order.
//!
//! The crate is built around a [`Screen`](screen::Screen) controller that owns the
//! logical render buffer the application draws into, and a
//! [`Refresher`](refresh::Refresher) that periodically scans the physically ordered
//! frame out to the panel. The two halves come from one
//! [`ScreenShared`](refresh::ScreenShared), normally a `static`, which hands the
//! rotated frame across contexts without tearing.
//!
//! # Glossary
//!
//! - **Logical coordinate:** `(x, y)` in the unrotated, application-facing space.
//!   `(0, 0)` is the top-left corner, `x` grows to the right and `y` grows downward.
//! - **Physical address:** the wiring-defined slot consumed by the panel scan,
//!   obtained through a [`PositionTable`](screen::PositionTable).
//! - **Rotation:** one of four quarter-turn orientations applied before physical
//!   addressing.
//! - **Refresh cycle:** the periodic read of the published physical frame that
//!   produces visible output.
//!
//! # Example
//!
//! ```rust
//! use led_screen::refresh::{ScreenConfig, ScreenShared};
//! use led_screen::screen::{LedStatus, PositionTable, Rotation, FULL_BRIGHTNESS};
//!
//! static SHARED: ScreenShared<4, 4> = ScreenShared::new();
//!
//! # fn main() -> led_screen::Result<()> {
//! let config = ScreenConfig::new(PositionTable::identity()).with_rotation(Rotation::Deg90);
//! let (mut screen, _refresher) = SHARED.split(config, ())?;
//!
//! screen.draw_rectangle(0, 0, 4, 4, true, LedStatus::On, FULL_BRIGHTNESS);
//! screen.rotate();
//! assert_eq!(screen.rotated_render_buffer().lit_count(), 12);
//! # Ok(())
//! # }
//! ```
#![cfg_attr(not(feature = "host"), no_std)]

#[cfg(all(feature = "pico1", feature = "pico2"))]
compile_error!("Cannot enable both 'pico1' and 'pico2' features simultaneously");

// Must come first so the logging macros are visible to every module below.
#[macro_use]
mod fmt;

pub mod bits;
mod error;
pub mod refresh;
#[cfg(any(feature = "pico1", feature = "pico2"))]
pub mod rp_flash;
pub mod screen;
pub mod signs;
pub mod storage;
#[cfg(feature = "host")]
pub mod to_png;

// Re-export error types and result (used throughout)
pub use crate::error::{Error, Result};
