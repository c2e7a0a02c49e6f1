//! The periodic refresh cycle and the state it shares with the [`Screen`].
//!
//! [`ScreenShared`] is the only state touched from both sides. The screen publishes a
//! complete [`PhysicalFrame`] plus brightness inside one critical section, and every
//! [`Refresher::tick`] copies them out inside another, so a tick never sees a frame
//! that is only partly rewritten.
//!
//! Each tick shows one of [`GRAY_LEVELS`] binary sub-frames, so brightness values
//! between 0 and 255 come out as duty cycles on panels that can only switch LEDs on
//! and off.
//!
//! # Example
//!
//! ```rust
//! use core::convert::Infallible;
//! use led_screen::refresh::{BitPlane, PanelDriver, ScreenConfig, ScreenShared};
//! use led_screen::screen::{PositionTable, FULL_BRIGHTNESS};
//!
//! /// Counts lit LEDs instead of shifting them out.
//! #[derive(Default)]
//! struct CountingDriver {
//!     lit: usize,
//! }
//!
//! impl PanelDriver<4, 4> for CountingDriver {
//!     type Error = Infallible;
//!
//!     fn scan(&mut self, plane: BitPlane<'_, 4, 4>, _brightness: u8) -> Result<(), Infallible> {
//!         self.lit = plane.iter().filter(|&lit| lit).count();
//!         Ok(())
//!     }
//! }
//!
//! static SHARED: ScreenShared<4, 4> = ScreenShared::new();
//!
//! # fn main() -> led_screen::Result<()> {
//! let config = ScreenConfig::new(PositionTable::identity());
//! let (mut screen, mut refresher) = SHARED.split(config, CountingDriver::default())?;
//!
//! screen.set_pixel(1, 1, 1, FULL_BRIGHTNESS);
//! screen.rotate();
//! refresher.tick().expect("counting never fails");
//! assert_eq!(refresher.driver().lit, 1);
//! # Ok(())
//! # }
//! ```

use core::cell::Cell;
use core::convert::Infallible;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_time::{Duration, Ticker};
use portable_atomic::{AtomicBool, Ordering};

use crate::bits;
use crate::screen::{PhysicalFrame, PositionTable, Restored, Rotation, Screen};
use crate::storage::Storage;
use crate::{Error, Result};

/// Number of binary sub-frames one full gray-scale refresh is split into.
pub const GRAY_LEVELS: u8 = 8;
/// Brightness step between consecutive sub-frame thresholds.
pub const GRAY_STEP: u8 = u8::MAX / GRAY_LEVELS + 1;
/// Refresh period used when [`ScreenConfig`] is not told otherwise.
pub const DEFAULT_REFRESH_PERIOD: Duration = Duration::from_micros(1_250);
/// Panel brightness used when nothing has been restored from storage.
pub const DEFAULT_BRIGHTNESS: u8 = u8::MAX;

/// Start-up settings for a screen.
#[derive(Clone, Copy, Debug)]
pub struct ScreenConfig<const W: usize, const H: usize> {
    /// Wiring of the panel.
    pub position_table: PositionTable<W, H>,
    /// Initial orientation.
    pub rotation: Rotation,
    /// Brightness used at start-up and whenever storage holds nothing usable.
    pub default_brightness: u8,
    /// Time between refresh ticks.
    pub refresh_period: Duration,
}

impl<const W: usize, const H: usize> ScreenConfig<W, H> {
    /// Defaults: no rotation, full brightness, [`DEFAULT_REFRESH_PERIOD`].
    #[must_use]
    pub const fn new(position_table: PositionTable<W, H>) -> Self {
        Self {
            position_table,
            rotation: Rotation::Deg0,
            default_brightness: DEFAULT_BRIGHTNESS,
            refresh_period: DEFAULT_REFRESH_PERIOD,
        }
    }

    /// Set the initial orientation.
    #[must_use]
    pub const fn with_rotation(mut self, rotation: Rotation) -> Self {
        self.rotation = rotation;
        self
    }

    /// Set the default brightness.
    #[must_use]
    pub const fn with_default_brightness(mut self, brightness: u8) -> Self {
        self.default_brightness = brightness;
        self
    }

    /// Set the time between refresh ticks.
    #[must_use]
    pub const fn with_refresh_period(mut self, refresh_period: Duration) -> Self {
        self.refresh_period = refresh_period;
        self
    }
}

/// What the screen last handed to the refresh side.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Published<const W: usize, const H: usize> {
    /// Physically ordered frame.
    pub frame: PhysicalFrame<W, H>,
    /// Panel brightness.
    pub brightness: u8,
    /// Number of frames published so far; wraps.
    pub generation: u32,
}

/// State shared between one [`Screen`] and one [`Refresher`]; normally a `static`.
///
/// ```rust
/// use led_screen::refresh::ScreenShared;
///
/// static SHARED: ScreenShared<16, 16> = ScreenShared::new();
/// ```
pub struct ScreenShared<const W: usize, const H: usize> {
    published: Mutex<CriticalSectionRawMutex, Cell<Published<W, H>>>,
    split: AtomicBool,
}

impl<const W: usize, const H: usize> ScreenShared<W, H> {
    /// Blank frame at [`DEFAULT_BRIGHTNESS`], not yet split.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            published: Mutex::new(Cell::new(Published {
                frame: PhysicalFrame::new(),
                brightness: DEFAULT_BRIGHTNESS,
                generation: 0,
            })),
            split: AtomicBool::new(false),
        }
    }

    /// Create the one controller and the one refresher for this panel.
    ///
    /// The screen starts cleared at the configured default brightness; the blank frame
    /// is published before this returns.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RotationUnsupported`] if the configured rotation does not fit the
    /// panel, and [`Error::AlreadySplit`] on every call after the first successful one.
    pub fn split<D: PanelDriver<W, H>>(
        &self,
        config: ScreenConfig<W, H>,
        driver: D,
    ) -> Result<(Screen<'_, W, H>, Refresher<'_, W, H, D>)> {
        if !config.rotation.fits::<W, H>() {
            return Err(Error::RotationUnsupported);
        }
        if self.split.swap(true, Ordering::AcqRel) {
            return Err(Error::AlreadySplit);
        }
        let mut screen = Screen::new(self, &config);
        self.publish_brightness(config.default_brightness);
        screen.rotate();
        info!("Screen: split {}x{} screen", W, H);
        Ok((screen, Refresher::new(self, driver, config.refresh_period)))
    }

    /// One-time start-up: [`split`](Self::split), then restore the last persisted state.
    ///
    /// # Errors
    ///
    /// Fails only as [`split`](Self::split) does; unreadable storage yields
    /// [`Restored::Defaults`] instead.
    pub fn setup<D: PanelDriver<W, H>>(
        &self,
        config: ScreenConfig<W, H>,
        storage: &mut impl Storage,
        driver: D,
    ) -> Result<(Screen<'_, W, H>, Refresher<'_, W, H, D>, Restored)> {
        let (mut screen, refresher) = self.split(config, driver)?;
        let restored = screen.load_from_storage(storage);
        Ok((screen, refresher, restored))
    }

    /// Copy of the most recently published state.
    #[must_use]
    pub fn snapshot(&self) -> Published<W, H> {
        self.published.lock(Cell::get)
    }

    pub(crate) fn publish_frame(&self, frame: &PhysicalFrame<W, H>) {
        self.published.lock(|cell| {
            let mut published = cell.get();
            published.frame = *frame;
            published.generation = published.generation.wrapping_add(1);
            cell.set(published);
        });
    }

    pub(crate) fn publish_brightness(&self, brightness: u8) {
        self.published.lock(|cell| {
            let mut published = cell.get();
            published.brightness = brightness;
            cell.set(published);
        });
    }
}

impl<const W: usize, const H: usize> Default for ScreenShared<W, H> {
    fn default() -> Self {
        Self::new()
    }
}

/// One binary sub-frame: which physical LEDs are on during this tick.
#[derive(Clone, Copy, Debug)]
pub struct BitPlane<'a, const W: usize, const H: usize> {
    frame: &'a PhysicalFrame<W, H>,
    threshold: u8,
}

impl<'a, const W: usize, const H: usize> BitPlane<'a, W, H> {
    /// LEDs brighter than `threshold` are on.
    #[must_use]
    pub const fn new(frame: &'a PhysicalFrame<W, H>, threshold: u8) -> Self {
        Self { frame, threshold }
    }

    /// Brightness a slot must exceed to be on in this plane.
    #[must_use]
    pub const fn threshold(&self) -> u8 {
        self.threshold
    }

    /// Whether the LED at a physical address is on; `false` past the end.
    #[must_use]
    pub fn is_lit(&self, address: usize) -> bool {
        self.frame
            .get(address)
            .is_some_and(|value| value > self.threshold)
    }

    /// On/off state of every LED in physical address order.
    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        self.frame
            .as_bytes()
            .iter()
            .map(|&value| value > self.threshold)
    }

    /// Pack the plane MSB-first into `out`, ready to shift into the panel's registers.
    ///
    /// Returns the number of bytes written; a short `out` gets the first bytes only.
    pub fn pack_into(&self, out: &mut [u8]) -> usize {
        bits::pack_into(self.iter(), out)
    }
}

/// The electrical side of the panel: shifts one bit plane out to the LED drivers.
pub trait PanelDriver<const W: usize, const H: usize> {
    /// Error reported by the hardware.
    type Error;

    /// Show `plane`, with `brightness` applied by whatever dimming the panel supports.
    ///
    /// # Errors
    ///
    /// Returns the hardware's error; the refresh loop logs it and keeps going.
    fn scan(&mut self, plane: BitPlane<'_, W, H>, brightness: u8) -> Result<(), Self::Error>;
}

/// A driver that discards every plane, for screens that are only persisted or previewed.
impl<const W: usize, const H: usize> PanelDriver<W, H> for () {
    type Error = Infallible;

    fn scan(&mut self, _plane: BitPlane<'_, W, H>, _brightness: u8) -> Result<(), Infallible> {
        Ok(())
    }
}

/// Extension point consulted at the start of every refresh tick.
///
/// The hook sees a private copy of the published state, so changes apply to the current
/// tick only and never reach the [`Screen`].
pub trait RenderHook<const W: usize, const H: usize> {
    /// Observe or override what this tick is about to show.
    fn before_render(&mut self, frame: &mut PhysicalFrame<W, H>, brightness: &mut u8) {
        let _ = (frame, brightness);
    }
}

impl<const W: usize, const H: usize> RenderHook<W, H> for () {}

/// The refresh side of a screen: periodically shows the published frame.
pub struct Refresher<'a, const W: usize, const H: usize, D, K = ()> {
    shared: &'a ScreenShared<W, H>,
    driver: D,
    hook: K,
    sub_frame: u8,
    period: Duration,
}

impl<'a, const W: usize, const H: usize, D: PanelDriver<W, H>> Refresher<'a, W, H, D> {
    const fn new(shared: &'a ScreenShared<W, H>, driver: D, period: Duration) -> Self {
        Self {
            shared,
            driver,
            hook: (),
            sub_frame: 0,
            period,
        }
    }
}

impl<'a, const W: usize, const H: usize, D, K> Refresher<'a, W, H, D, K>
where
    D: PanelDriver<W, H>,
    K: RenderHook<W, H>,
{
    /// Install a [`RenderHook`], replacing the current one.
    #[must_use]
    pub fn with_hook<K2: RenderHook<W, H>>(self, hook: K2) -> Refresher<'a, W, H, D, K2> {
        Refresher {
            shared: self.shared,
            driver: self.driver,
            hook,
            sub_frame: self.sub_frame,
            period: self.period,
        }
    }

    /// The panel driver.
    #[must_use]
    pub const fn driver(&self) -> &D {
        &self.driver
    }

    /// The panel driver, mutably.
    pub const fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    /// The installed hook.
    #[must_use]
    pub const fn hook(&self) -> &K {
        &self.hook
    }

    /// Time between ticks in [`run`](Self::run).
    #[must_use]
    pub const fn period(&self) -> Duration {
        self.period
    }

    /// Sub-frame the next tick will show, `0..GRAY_LEVELS`.
    #[must_use]
    pub const fn sub_frame(&self) -> u8 {
        self.sub_frame
    }

    /// Show one sub-frame of the published state.
    ///
    /// # Errors
    ///
    /// Returns the driver's error; the sub-frame still advances.
    pub fn tick(&mut self) -> Result<(), D::Error> {
        let Published {
            mut frame,
            mut brightness,
            ..
        } = self.shared.snapshot();
        self.hook.before_render(&mut frame, &mut brightness);

        let threshold = self.sub_frame * GRAY_STEP;
        self.sub_frame = (self.sub_frame + 1) % GRAY_LEVELS;
        trace!("Refresh: sub-frame threshold {}", threshold);
        self.driver.scan(BitPlane::new(&frame, threshold), brightness)
    }

    /// Tick every [`period`](Self::period) forever.
    ///
    /// Driver errors are logged and the loop keeps going.
    pub async fn run(mut self) -> ! {
        info!("Refresh: running every {} us", self.period.as_micros());
        let mut ticker = Ticker::every(self.period);
        loop {
            if self.tick().is_err() {
                warn!("Refresh: panel scan failed");
            }
            ticker.next().await;
        }
    }
}

/// Declare an embassy task that runs a [`Refresher`] forever.
///
/// Embassy tasks cannot be generic, so the macro names the concrete panel size, driver,
/// and (optionally) hook types.
///
/// ```rust,ignore
/// led_screen::screen_refresh_task!(refresh_task, 16, 16, MyPanelDriver);
///
/// spawner.spawn(refresh_task(refresher))?;
/// ```
#[macro_export]
macro_rules! screen_refresh_task {
    (
        $vis:vis $task_name:ident,
        $width:expr,
        $height:expr,
        $driver_ty:ty
        $(, $hook_ty:ty)? $(,)?
    ) => {
        #[embassy_executor::task]
        $vis async fn $task_name(
            refresher: $crate::refresh::Refresher<'static, $width, $height, $driver_ty $(, $hook_ty)?>,
        ) {
            refresher.run().await
        }
    };
}
