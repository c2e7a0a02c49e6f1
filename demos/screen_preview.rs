//! Draw a clock-and-weather face on a 16×16 OBEGRÄNSAD screen, persist it, restore it
//! into a fresh screen as if after a power cycle, and write PNG previews of both.
//!
//! Run with `cargo run --features host --bin demo_screen_preview [output-dir]`.

use std::error::Error;
use std::path::PathBuf;

use led_screen::refresh::{ScreenConfig, ScreenShared};
use led_screen::screen::{FULL_BRIGHTNESS, LedStatus, OBEGRAENSAD_16X16, Restored, Rotation};
use led_screen::signs::Weather;
use led_screen::storage::{FlashStorage, MemoryFlash};
use led_screen::to_png::write_frame_png;

static BEFORE: ScreenShared<16, 16> = ScreenShared::new();
static AFTER: ScreenShared<16, 16> = ScreenShared::new();

fn main() -> Result<(), Box<dyn Error>> {
    let output_dir = std::env::args_os()
        .nth(1)
        .map_or_else(std::env::temp_dir, PathBuf::from);
    let config = ScreenConfig::new(OBEGRAENSAD_16X16).with_default_brightness(200);
    let mut storage = FlashStorage::at_end(MemoryFlash::<4096>::new(), 2)?;

    let (mut screen, _refresher, restored) = BEFORE.setup(config, &mut storage, ())?;
    assert_eq!(restored, Restored::Defaults);

    // 12:34 as hours over minutes, split by a dim rule; then a rain icon on top.
    screen.draw_numbers(3, 0, &[1, 2], FULL_BRIGHTNESS);
    screen.draw_line(0, 7, 15, 7, LedStatus::On, 64);
    screen.draw_numbers(3, 9, &[3, 4], FULL_BRIGHTNESS);
    screen.cache_current();
    screen.draw_weather(0, 0, u8::from(Weather::Rain), FULL_BRIGHTNESS);
    write_frame_png(
        screen.render_buffer(),
        screen.current_brightness(),
        output_dir.join("screen_weather_overlay.png"),
        320,
    )?;
    screen.restore_cache();
    screen.set_rotation(Rotation::Deg180)?;
    screen.persist(&mut storage)?;
    println!(
        "persisted {} lit pixels at brightness {}",
        screen.render_buffer().lit_count(),
        screen.current_brightness()
    );

    let (restored_screen, _refresher, restored) = AFTER.setup(config, &mut storage, ())?;
    assert_eq!(restored, Restored::FromStorage);
    assert_eq!(restored_screen.render_buffer(), screen.render_buffer());
    write_frame_png(
        restored_screen.render_buffer(),
        restored_screen.current_brightness(),
        output_dir.join("screen_restored.png"),
        320,
    )?;
    Ok(())
}
