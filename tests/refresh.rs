#![allow(missing_docs)]
//! Host-level tests for the refresh cycle and the screen/refresher handoff.

use led_screen::Error;
use led_screen::bits::{pack_bits, read_bytes};
use led_screen::refresh::{
    BitPlane, DEFAULT_BRIGHTNESS, GRAY_LEVELS, PanelDriver, RenderHook, ScreenConfig,
    ScreenShared,
};
use led_screen::screen::{FULL_BRIGHTNESS, PhysicalFrame, PositionTable};

/// Remembers every plane it was asked to show.
#[derive(Default)]
struct RecordingDriver {
    planes: Vec<Vec<bool>>,
    brightness: Vec<u8>,
}

impl PanelDriver<4, 4> for RecordingDriver {
    type Error = core::convert::Infallible;

    fn scan(
        &mut self,
        plane: BitPlane<'_, 4, 4>,
        brightness: u8,
    ) -> Result<(), Self::Error> {
        self.planes.push(plane.iter().collect());
        self.brightness.push(brightness);
        Ok(())
    }
}

impl RecordingDriver {
    fn lit_in_last(&self) -> Vec<usize> {
        self.planes.last().map_or_else(Vec::new, |plane| {
            plane
                .iter()
                .enumerate()
                .filter_map(|(address, &lit)| lit.then_some(address))
                .collect()
        })
    }
}

fn identity_config() -> ScreenConfig<4, 4> {
    ScreenConfig::new(PositionTable::identity())
}

#[test]
fn tick_shows_only_published_frames() {
    let shared = ScreenShared::new();
    let (mut screen, mut refresher) = shared
        .split(identity_config(), RecordingDriver::default())
        .expect("first split");

    screen.set_pixel(2, 0, 1, FULL_BRIGHTNESS);
    refresher.tick().expect("recording never fails");
    assert!(refresher.driver().lit_in_last().is_empty());

    screen.rotate();
    refresher.tick().expect("recording never fails");
    assert_eq!(refresher.driver().lit_in_last(), vec![2]);
}

#[test]
fn second_split_is_rejected() {
    let shared = ScreenShared::<4, 4>::new();
    let first = shared.split(identity_config(), ());
    assert!(first.is_ok());
    assert!(matches!(
        shared.split(identity_config(), ()),
        Err(Error::AlreadySplit)
    ));
}

#[test]
fn split_publishes_blank_frame_at_default_brightness() {
    let shared = ScreenShared::<4, 4>::new();
    let before = shared.snapshot();
    assert_eq!(before.brightness, DEFAULT_BRIGHTNESS);

    let (screen, _refresher) = shared
        .split(identity_config().with_default_brightness(30), ())
        .expect("first split");
    let published = shared.snapshot();
    assert_eq!(published.brightness, 30);
    assert_eq!(published.frame.lit_count(), 0);
    assert_ne!(published.generation, before.generation);
    assert_eq!(screen.current_brightness(), 30);
}

#[test]
fn gray_levels_become_duty_cycles() {
    let shared = ScreenShared::new();
    let (mut screen, mut refresher) = shared
        .split(identity_config(), RecordingDriver::default())
        .expect("first split");
    screen.set_pixel(0, 0, 1, 100);
    screen.set_pixel(1, 0, 1, FULL_BRIGHTNESS);
    screen.set_pixel(2, 0, 1, 1);
    screen.rotate();

    for _ in 0..GRAY_LEVELS {
        refresher.tick().expect("recording never fails");
    }
    assert_eq!(refresher.sub_frame(), 0);

    let on_count =
        |address: usize| refresher.driver().planes.iter().filter(|plane| plane[address]).count();
    assert_eq!(on_count(0), 4);
    assert_eq!(on_count(1), usize::from(GRAY_LEVELS));
    assert_eq!(on_count(2), 1);
    assert_eq!(on_count(3), 0);
}

#[test]
fn brightness_reaches_the_driver() {
    let shared = ScreenShared::new();
    let (mut screen, mut refresher) = shared
        .split(identity_config(), RecordingDriver::default())
        .expect("first split");

    screen.set_brightness(42);
    refresher.tick().expect("recording never fails");
    assert_eq!(refresher.driver().brightness.last(), Some(&42));
    assert_eq!(screen.current_brightness(), 42);
}

#[test]
fn every_publish_bumps_the_generation() {
    let shared = ScreenShared::<4, 4>::new();
    let (mut screen, _refresher) = shared.split(identity_config(), ()).expect("first split");
    let start = shared.snapshot().generation;

    screen.rotate();
    screen.rotate();
    assert_eq!(shared.snapshot().generation, start.wrapping_add(2));

    // Brightness alone does not count as a new frame.
    screen.set_brightness(1);
    assert_eq!(shared.snapshot().generation, start.wrapping_add(2));
}

/// Lights every LED and halves the brightness for the tick it runs in.
struct AllOn;

impl RenderHook<4, 4> for AllOn {
    fn before_render(&mut self, frame: &mut PhysicalFrame<4, 4>, brightness: &mut u8) {
        frame.as_bytes_mut().fill(FULL_BRIGHTNESS);
        *brightness /= 2;
    }
}

#[test]
fn hook_overrides_one_tick_without_touching_the_screen() {
    let shared = ScreenShared::new();
    let (screen, refresher) = shared
        .split(identity_config(), RecordingDriver::default())
        .expect("first split");
    let mut refresher = refresher.with_hook(AllOn);

    refresher.tick().expect("recording never fails");
    assert_eq!(refresher.driver().lit_in_last().len(), 16);
    assert_eq!(refresher.driver().brightness.last(), Some(&(DEFAULT_BRIGHTNESS / 2)));

    assert_eq!(shared.snapshot().frame.lit_count(), 0);
    assert_eq!(screen.rotated_render_buffer().lit_count(), 0);
}

/// Fails every scan.
struct BrokenDriver;

impl PanelDriver<4, 4> for BrokenDriver {
    type Error = &'static str;

    fn scan(&mut self, _plane: BitPlane<'_, 4, 4>, _brightness: u8) -> Result<(), Self::Error> {
        Err("bus fault")
    }
}

#[test]
fn failed_scan_still_advances_the_sub_frame() {
    let shared = ScreenShared::new();
    let (_screen, mut refresher) = shared
        .split(identity_config(), BrokenDriver)
        .expect("first split");

    assert_eq!(refresher.tick(), Err("bus fault"));
    assert_eq!(refresher.sub_frame(), 1);
}

#[test]
fn bit_plane_packs_msb_first() {
    let mut frame = PhysicalFrame::<4, 4>::new();
    frame.set(0, 200);
    frame.set(9, 50);
    frame.set(15, 10);
    frame.set(16, 255);

    let plane = BitPlane::new(&frame, 32);
    assert!(plane.is_lit(0));
    assert!(plane.is_lit(9));
    assert!(!plane.is_lit(15));
    assert!(!plane.is_lit(16));

    let mut out = [0xAA_u8; 2];
    assert_eq!(plane.pack_into(&mut out), 2);
    assert_eq!(out, [0x80, 0x40]);

    let mut short = [0_u8; 1];
    assert_eq!(plane.pack_into(&mut short), 1);
    assert_eq!(short, [0x80]);
}

#[test]
fn packing_and_unpacking_bits_are_inverse() {
    let flags = [1_u8, 0, 1, 1, 0, 0, 0, 1, 1, 1];
    let packed = pack_bits::<2>(&flags);
    assert_eq!(packed.as_slice(), &[0b1011_0001, 0b1100_0000]);

    let unpacked = read_bytes::<16>(&packed);
    assert_eq!(unpacked.len(), 16);
    assert_eq!(&unpacked[..flags.len()], &flags);
    assert!(unpacked[flags.len()..].iter().all(|&bit| bit == 0));

    // Anything nonzero counts as set.
    assert_eq!(pack_bits::<1>(&[7, 0, 0, 0, 0, 0, 0, 2]).as_slice(), &[0x81]);
}
