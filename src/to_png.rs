//! Host-side previews: render a logical frame as a PNG of round, glowing LEDs.

use png::{BitDepth, ColorType, Encoder, ScaledFloat};
use std::error::Error;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use crate::screen::Frame;

const PREVIEW_INVERSE_GAMMA: f32 = 2.2;
/// Colour of a fully lit LED (warm white).
const LED_TINT: [f32; 3] = [1.0, 0.93, 0.82];
/// Faint glow of an unlit LED so the grid stays visible.
const UNLIT_LEVEL: f32 = 0.015;

/// Render `frame` at panel `brightness` into a PNG file no larger than
/// `target_max_dimension` pixels on its longest side.
///
/// # Errors
///
/// Returns any I/O or PNG encoding error.
pub fn write_frame_png<const W: usize, const H: usize>(
    frame: &Frame<W, H>,
    brightness: u8,
    output_path: impl AsRef<Path>,
    target_max_dimension: u32,
) -> Result<(), Box<dyn Error>> {
    let output_path = output_path.as_ref();
    let cell_size = select_cell_size(W as u32, H as u32, target_max_dimension);
    let led_margin = (cell_size / 8).max(1);
    let (width, height, pixels) = panel_pixels(frame, brightness, cell_size, led_margin);

    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let file = File::create(output_path)?;
    let mut encoder = Encoder::new(BufWriter::new(file), width, height);
    encoder.set_color(ColorType::Rgb);
    encoder.set_depth(BitDepth::Sixteen);
    encoder.set_source_gamma(ScaledFloat::new(1.0));
    let mut writer = encoder.write_header()?;
    writer.write_image_data(&pixels)?;
    println!("wrote PNG to {}", output_path.display());
    Ok(())
}

fn select_cell_size(panel_width: u32, panel_height: u32, target_max_dimension: u32) -> u32 {
    assert!(target_max_dimension > 0, "target_max_dimension must be positive");
    let mut cell_size = target_max_dimension;
    while cell_size > 1 {
        let led_margin = (cell_size / 8).max(1);
        let led_radius = cell_size.saturating_sub(led_margin * 2) / 2;
        let max_dimension = panel_width.max(panel_height) * cell_size + led_radius * 2;
        if max_dimension <= target_max_dimension {
            break;
        }
        cell_size -= 1;
    }
    cell_size
}

/// Returns `(width, height, 16-bit big-endian RGB bytes)`.
fn panel_pixels<const W: usize, const H: usize>(
    frame: &Frame<W, H>,
    brightness: u8,
    cell_size: u32,
    led_margin: u32,
) -> (u32, u32, Vec<u8>) {
    assert!(
        led_margin < cell_size / 2,
        "led_margin must fit inside cell (target_max_dimension too small)"
    );
    let led_radius = (cell_size - led_margin * 2) / 2;
    let fade_width = (led_radius / 3).max(1);
    let border = led_radius;
    let width = (W as u32) * cell_size + border * 2;
    let height = (H as u32) * cell_size + border * 2;
    let mut bytes = vec![0_u8; (width * height * 3 * 2) as usize];
    let center = (cell_size - 1) as i32 / 2;
    let led_radius_f = led_radius as f32;
    let inner_radius_f = led_radius.saturating_sub(fade_width) as f32;
    let radius_sq = (led_radius as i32) * (led_radius as i32);
    let panel_level = f32::from(brightness) / 255.0;

    for (row_index, row) in frame.iter().enumerate() {
        for (column_index, &value) in row.iter().enumerate() {
            let level = (inverse_gamma_to_linear(value) * panel_level).max(UNLIT_LEVEL);
            let cell_origin_x = (column_index as u32) * cell_size;
            let cell_origin_y = (row_index as u32) * cell_size;

            for local_y in 0..cell_size {
                let delta_y = local_y as i32 - center;
                for local_x in 0..cell_size {
                    let delta_x = local_x as i32 - center;
                    let distance_sq = delta_x * delta_x + delta_y * delta_y;
                    if distance_sq > radius_sq {
                        continue;
                    }
                    let distance = (distance_sq as f32).sqrt();
                    let intensity = if distance <= inner_radius_f {
                        1.0
                    } else {
                        let fade_span = led_radius_f - inner_radius_f;
                        (1.0 - (distance - inner_radius_f) / fade_span).max(0.0)
                    };
                    let x = border + cell_origin_x + local_x;
                    let y = border + cell_origin_y + local_y;
                    let pixel_index = ((y * width + x) * 3 * 2) as usize;
                    for (channel, tint) in LED_TINT.iter().enumerate() {
                        let sample = linear_to_u16(level * intensity * tint);
                        let [high, low] = sample.to_be_bytes();
                        bytes[pixel_index + channel * 2] = high;
                        bytes[pixel_index + channel * 2 + 1] = low;
                    }
                }
            }
        }
    }

    (width, height, bytes)
}

fn inverse_gamma_to_linear(value: u8) -> f32 {
    let normalized = f32::from(value) / 255.0;
    normalized.powf(PREVIEW_INVERSE_GAMMA)
}

fn linear_to_u16(value: f32) -> u16 {
    let clamped = value.clamp(0.0, 1.0);
    (clamped * 65535.0).round() as u16
}
