#![allow(missing_docs)]
//! Host-level tests for the rotation engine.

use led_screen::Error;
use led_screen::refresh::{ScreenConfig, ScreenShared};
use led_screen::screen::{
    BufferMode, FULL_BRIGHTNESS, OBEGRAENSAD_16X16, PositionTable, Rotation,
};

fn identity_4x4() -> ScreenConfig<4, 4> {
    ScreenConfig::new(PositionTable::identity())
}

#[test]
fn quarter_turn_moves_pixel_to_rotated_slot() {
    let shared = ScreenShared::new();
    let (mut screen, _refresher) = shared.split(identity_4x4(), ()).expect("first split");

    screen.clear();
    screen.set_pixel(1, 1, 255, FULL_BRIGHTNESS);
    screen.set_rotation(Rotation::Deg90).expect("square panel");

    // (1, 1) turns to (2, 1), slot 1 * 4 + 2.
    let rotated = screen.rotated_render_buffer();
    assert_eq!(rotated.lit_addresses().collect::<Vec<_>>(), vec![6]);
    assert_eq!(rotated.get(6), Some(FULL_BRIGHTNESS));
}

#[test]
fn four_quarter_turns_round_trip() {
    let shared = ScreenShared::new();
    let (mut screen, _refresher) = shared.split(identity_4x4(), ()).expect("first split");
    screen.set_pixel(0, 0, 1, 10);
    screen.set_pixel(3, 0, 1, 20);
    screen.set_pixel(1, 2, 1, 30);
    screen.rotate();
    let original = screen.rotated_render_buffer();

    for rotation in [Rotation::Deg90, Rotation::Deg180, Rotation::Deg270] {
        screen.set_rotation(rotation).expect("square panel");
        assert_ne!(screen.rotated_render_buffer(), original, "{rotation:?}");
    }
    screen.set_rotation(Rotation::Deg0).expect("square panel");
    assert_eq!(screen.rotated_render_buffer(), original);
}

#[test]
fn every_rotation_is_a_permutation() {
    let shared = ScreenShared::<16, 16>::new();
    let (mut screen, _refresher) = shared
        .split(ScreenConfig::new(OBEGRAENSAD_16X16), ())
        .expect("first split");
    let distinct: Vec<u8> = (0..=255).collect();
    screen
        .set_render_buffer(&distinct, BufferMode::Grayscale)
        .expect("256 bytes");

    for rotation in Rotation::ALL {
        screen.set_rotation(rotation).expect("square panel");
        let mut values = screen.rotated_render_buffer().as_bytes().to_vec();
        values.sort_unstable();
        assert_eq!(values, distinct, "{rotation:?}");
    }
}

#[test]
fn rotation_then_wiring_on_obegraensad() {
    let shared = ScreenShared::<16, 16>::new();
    let (mut screen, _refresher) = shared
        .split(ScreenConfig::new(OBEGRAENSAD_16X16), ())
        .expect("first split");
    screen.set_pixel(0, 0, 1, FULL_BRIGHTNESS);

    screen.rotate();
    assert_eq!(
        screen.rotated_render_buffer().lit_addresses().collect::<Vec<_>>(),
        vec![0x0f]
    );

    // Top-left turns to top-right.
    screen.set_rotation(Rotation::Deg90).expect("square panel");
    assert_eq!(
        screen.rotated_render_buffer().lit_addresses().collect::<Vec<_>>(),
        vec![0x1f]
    );

    // Then to bottom-right.
    screen.set_rotation(Rotation::Deg180).expect("square panel");
    assert_eq!(
        screen.rotated_render_buffer().lit_addresses().collect::<Vec<_>>(),
        vec![0xff]
    );
}

#[test]
fn rectangular_panels_allow_only_half_turns() {
    let shared = ScreenShared::<3, 2>::new();
    let (mut screen, _refresher) = shared
        .split(ScreenConfig::new(PositionTable::identity()), ())
        .expect("first split");
    screen.set_pixel(0, 0, 1, FULL_BRIGHTNESS);

    assert_eq!(
        screen.set_rotation(Rotation::Deg90),
        Err(Error::RotationUnsupported)
    );
    assert_eq!(screen.current_rotation(), Rotation::Deg0);

    screen.set_rotation(Rotation::Deg180).expect("half turn fits");
    assert_eq!(
        screen.rotated_render_buffer().lit_addresses().collect::<Vec<_>>(),
        vec![5]
    );
}

#[test]
fn split_rejects_quarter_turn_on_rectangle_without_using_up_the_split() {
    let shared = ScreenShared::<3, 2>::new();
    let config = ScreenConfig::new(PositionTable::identity());
    assert!(matches!(
        shared.split(config.with_rotation(Rotation::Deg270), ()),
        Err(Error::RotationUnsupported)
    ));
    assert!(shared.split(config, ()).is_ok());
}

#[test]
fn configured_rotation_applies_from_the_start() {
    let shared = ScreenShared::new();
    let (mut screen, _refresher) = shared
        .split(identity_4x4().with_rotation(Rotation::Deg270), ())
        .expect("first split");
    assert_eq!(screen.current_rotation(), Rotation::Deg270);

    // (0, 0) turns counter-clockwise to (0, 3).
    screen.set_pixel(0, 0, 1, FULL_BRIGHTNESS);
    screen.rotate();
    assert_eq!(
        screen.rotated_render_buffer().lit_addresses().collect::<Vec<_>>(),
        vec![12]
    );
}

#[test]
fn rotation_conversions() {
    assert_eq!(Rotation::from_quarter_turns(5), Rotation::Deg90);
    assert_eq!(Rotation::Deg270.next_cw(), Rotation::Deg0);
    assert_eq!(Rotation::try_from(180), Ok(Rotation::Deg180));
    assert_eq!(Rotation::try_from(45), Err(Error::RotationUnsupported));
    assert_eq!(u16::from(Rotation::Deg270), 270);
    assert_eq!(Rotation::Deg90.apply::<4, 4>(1, 1), (2, 1));
    assert_eq!(Rotation::Deg180.apply::<3, 2>(0, 0), (2, 1));
}
