//! Generated raster assets: the placeholder logo and the verification QR code.

use std::io::Cursor;

use image::{ImageFormat, Rgb, RgbImage};
use qrcode::QrCode;
use thiserror::Error;

/// Side of the square logo canvas, in pixels.
pub const LOGO_CANVAS: u32 = 200;
const LOGO_CENTER: f32 = 100.0;
const LOGO_RADIUS: f32 = 50.0;
const LOGO_OUTLINE_WIDTH: f32 = 3.0;
const LOGO_FILL: Rgb<u8> = Rgb([0x1f, 0x4e, 0x79]);
const LOGO_OUTLINE: Rgb<u8> = Rgb([0x2d, 0x5a, 0xa0]);

/// Pixels per QR module.
pub const QR_BOX_SIZE: usize = 10;
/// Quiet zone around the symbol, in modules.
pub const QR_BORDER: usize = 5;

const WHITE: Rgb<u8> = Rgb([0xff, 0xff, 0xff]);
const BLACK: Rgb<u8> = Rgb([0, 0, 0]);

/// 5x7 bitmaps of the logo initials, one row per byte, most significant of
/// the low five bits first.
const GLYPH_C: [u8; 7] = [0b01110, 0b10001, 0b10000, 0b10000, 0b10000, 0b10001, 0b01110];
const GLYPH_A: [u8; 7] = [0b01110, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001];
const GLYPH_SCALE: u32 = 4;
const GLYPH_GAP: u32 = 4;

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to encode PNG: {0}")]
    Encode(#[from] image::ImageError),
    #[error("failed to encode QR symbol: {0}")]
    Qr(String),
}

fn encode_png(image: &RgbImage) -> Result<Vec<u8>, AssetError> {
    let mut buffer = Cursor::new(Vec::new());
    image.write_to(&mut buffer, ImageFormat::Png)?;
    Ok(buffer.into_inner())
}

fn draw_glyph(canvas: &mut RgbImage, glyph: &[u8; 7], left: u32, top: u32, color: Rgb<u8>) {
    for (row, bits) in glyph.iter().enumerate() {
        for column in 0..5u32 {
            if bits & (0b10000 >> column) == 0 {
                continue;
            }
            let x0 = left + column * GLYPH_SCALE;
            let y0 = top + row as u32 * GLYPH_SCALE;
            for y in y0..y0 + GLYPH_SCALE {
                for x in x0..x0 + GLYPH_SCALE {
                    if x < canvas.width() && y < canvas.height() {
                        canvas.put_pixel(x, y, color);
                    }
                }
            }
        }
    }
}

/// The placeholder company logo: a filled circle with "CA" in the middle.
pub fn create_logo_placeholder() -> Result<Vec<u8>, AssetError> {
    let mut canvas = RgbImage::from_fn(LOGO_CANVAS, LOGO_CANVAS, |x, y| {
        let dx = x as f32 + 0.5 - LOGO_CENTER;
        let dy = y as f32 + 0.5 - LOGO_CENTER;
        let distance = (dx * dx + dy * dy).sqrt();
        if distance > LOGO_RADIUS {
            WHITE
        } else if distance > LOGO_RADIUS - LOGO_OUTLINE_WIDTH {
            LOGO_OUTLINE
        } else {
            LOGO_FILL
        }
    });

    let glyph_width = 5 * GLYPH_SCALE;
    let glyph_height = 7 * GLYPH_SCALE;
    let text_width = 2 * glyph_width + GLYPH_GAP;
    let left = LOGO_CANVAS / 2 - text_width / 2;
    let top = LOGO_CANVAS / 2 - glyph_height / 2;
    draw_glyph(&mut canvas, &GLYPH_C, left, top, WHITE);
    draw_glyph(&mut canvas, &GLYPH_A, left + glyph_width + GLYPH_GAP, top, WHITE);

    encode_png(&canvas)
}

/// Encode `text` as a black-on-white QR code PNG.
pub fn generate_qr_code(text: &str) -> Result<Vec<u8>, AssetError> {
    let code = QrCode::new(text.as_bytes()).map_err(|error| AssetError::Qr(error.to_string()))?;
    let modules = code.width();
    let colors = code.to_colors();
    let side = (modules + 2 * QR_BORDER) * QR_BOX_SIZE;

    let image = RgbImage::from_fn(side as u32, side as u32, |x, y| {
        let column = x as usize / QR_BOX_SIZE;
        let row = y as usize / QR_BOX_SIZE;
        let inside = (QR_BORDER..QR_BORDER + modules).contains(&column)
            && (QR_BORDER..QR_BORDER + modules).contains(&row);
        if !inside {
            return WHITE;
        }
        match colors[(row - QR_BORDER) * modules + (column - QR_BORDER)] {
            qrcode::Color::Dark => BLACK,
            qrcode::Color::Light => WHITE,
        }
    });

    encode_png(&image)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(bytes: &[u8]) -> RgbImage {
        image::load_from_memory_with_format(bytes, ImageFormat::Png)
            .unwrap()
            .to_rgb8()
    }

    #[test]
    fn test_logo_geometry() {
        let logo = decode(&create_logo_placeholder().unwrap());
        assert_eq!(logo.dimensions(), (LOGO_CANVAS, LOGO_CANVAS));
        assert_eq!(*logo.get_pixel(0, 0), WHITE);
        assert_eq!(*logo.get_pixel(100, 53), LOGO_FILL);
        assert_eq!(*logo.get_pixel(100, 51), LOGO_OUTLINE);
        assert_eq!(*logo.get_pixel(100, 40), WHITE);
    }

    #[test]
    fn test_logo_has_white_initials() {
        let logo = decode(&create_logo_placeholder().unwrap());
        let white_inside_circle = (80..120)
            .flat_map(|y| (70..130).map(move |x| (x, y)))
            .filter(|&(x, y)| *logo.get_pixel(x, y) == WHITE)
            .count();
        assert!(white_inside_circle > 100);
    }

    #[test]
    fn test_qr_code_has_quiet_zone() {
        let qr = decode(&generate_qr_code("Agreement ID: AGR-0000ABCD").unwrap());
        let (width, height) = qr.dimensions();
        assert_eq!(width, height);
        assert_eq!(width as usize % QR_BOX_SIZE, 0);

        let border = (QR_BORDER * QR_BOX_SIZE) as u32;
        for offset in 0..border {
            assert_eq!(*qr.get_pixel(offset, offset), WHITE);
        }
        // Top-left finder pattern starts dark right after the quiet zone.
        assert_eq!(*qr.get_pixel(border, border), BLACK);
    }

    #[test]
    fn test_qr_code_grows_with_payload() {
        let small = decode(&generate_qr_code("A").unwrap());
        let large = decode(&generate_qr_code(&"verification ".repeat(20)).unwrap());
        assert!(large.width() > small.width());
    }
}
