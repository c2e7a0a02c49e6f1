#![cfg(feature = "host")]
#![allow(missing_docs)]
//! PNG preview rendering on the host.

use std::fs::File;

use led_screen::screen::{FULL_BRIGHTNESS, Frame, LedStatus};
use led_screen::to_png::write_frame_png;

#[test]
fn preview_fits_the_requested_size() {
    let temp_dir = tempfile::tempdir().expect("temp dir");
    let path = temp_dir.path().join("nested").join("preview.png");
    let mut frame = Frame::<16, 16>::new();
    frame.draw_rectangle(0, 0, 16, 16, true, LedStatus::On, FULL_BRIGHTNESS);

    write_frame_png(&frame, FULL_BRIGHTNESS, &path, 200).expect("write png");

    let decoder = png::Decoder::new(File::open(&path).expect("png exists"));
    let reader = decoder.read_info().expect("valid png");
    let info = reader.info();
    assert_eq!(info.width, info.height);
    assert!(info.width <= 200);
    assert!(info.width >= 16);
    assert_eq!(info.color_type, png::ColorType::Rgb);
    assert_eq!(info.bit_depth, png::BitDepth::Sixteen);
}

#[test]
fn lit_leds_are_brighter_than_unlit_ones() {
    let temp_dir = tempfile::tempdir().expect("temp dir");
    let path = temp_dir.path().join("half.png");
    let mut frame = Frame::<2, 1>::new();
    frame.set_pixel(0, 0, 1, FULL_BRIGHTNESS);

    write_frame_png(&frame, FULL_BRIGHTNESS, &path, 64).expect("write png");

    let decoder = png::Decoder::new(File::open(&path).expect("png exists"));
    let mut reader = decoder.read_info().expect("valid png");
    let mut pixels = vec![0_u8; reader.output_buffer_size()];
    let info = reader.next_frame(&mut pixels).expect("one frame");
    let width = info.width as usize;
    let height = info.height as usize;
    let row = &pixels[(height / 2) * info.line_size..][..info.line_size];

    // Red channel, 16-bit big-endian, at the centers of the left and right halves.
    let red_at = |x: usize| u16::from_be_bytes([row[x * 6], row[x * 6 + 1]]);
    let lit = red_at(width / 4);
    let unlit = red_at(width * 3 / 4);
    assert!(lit > unlit, "lit {lit} vs unlit {unlit}");
}
