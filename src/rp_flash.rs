//! Screen persistence in the internal flash of a Raspberry Pi Pico 1 or 2.
//!
//! ⚠️ **Warning**: the Pico stores firmware and data in the same flash device. The
//! reserved blocks are taken from the very end of flash; reserving too many can
//! overwrite your firmware.
//!
//! ```rust,ignore
//! let p = embassy_rp::init(Default::default());
//! let mut storage = led_screen::rp_flash::new_flash_storage(p.FLASH, 2)?;
//! let (screen, refresher, restored) = SHARED.setup(config, &mut storage, panel_driver)?;
//! ```

use embassy_rp::Peri;
use embassy_rp::flash::{Blocking, Flash};
use embassy_rp::peripherals::FLASH;

use crate::Result;
use crate::storage::FlashStorage;

/// Internal flash size for Raspberry Pi Pico 2 (4 MB).
#[cfg(feature = "pico2")]
pub const INTERNAL_FLASH_SIZE: usize = 4 * 1024 * 1024;

/// Internal flash size for Raspberry Pi Pico 1 (2 MB).
#[cfg(not(feature = "pico2"))]
pub const INTERNAL_FLASH_SIZE: usize = 2 * 1024 * 1024;

/// Blocking driver for the Pico's internal flash.
pub type InternalFlash = Flash<'static, FLASH, Blocking, INTERNAL_FLASH_SIZE>;

/// Key/value storage in the last `blocks` erase blocks (4 KB each) of internal flash.
///
/// The screen needs two blocks: one for brightness and one for the buffer.
///
/// # Errors
///
/// Returns [`Error::IndexOutOfBounds`](crate::Error::IndexOutOfBounds) if `blocks`
/// exceeds the flash.
pub fn new_flash_storage(
    peripheral: Peri<'static, FLASH>,
    blocks: u32,
) -> Result<FlashStorage<InternalFlash>> {
    let storage = FlashStorage::at_end(Flash::new_blocking(peripheral), blocks)?;
    info!("Flash: Reserved {} blocks at end of flash", blocks);
    Ok(storage)
}
