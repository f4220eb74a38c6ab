//! Text rasterization
//!
//! The frame pass asks a `Rasterizer` for a bitmap exactly once per label, when
//! the label's visual is created. `BitmapFont` is the built-in rasterizer: a
//! procedural 5x7 glyph font scaled to the requested size, with outline, italic
//! shear and opacity.

use crate::color::Rgba;
use std::fmt;

/// Bitmaps are clamped to this many pixels per edge
pub const MAX_BITMAP_EDGE: u32 = 2048;

const GLYPH_WIDTH: i64 = 5;
const GLYPH_HEIGHT: i64 = 7;
const MAX_OUTLINE: i64 = 8;

/// Everything needed to draw one label's text
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextRaster<'a> {
    pub text: &'a str,
    pub width: u32,
    pub height: u32,
    pub font_face: &'a str,
    pub font_size: f64,
    pub italic: bool,
    pub color: &'a str,
    pub outline_color: &'a str,
    pub outline_width: f64,
    pub alpha: f64,
}

/// Bitmap size for `text`: one em per character plus the outline on each side
pub fn bitmap_size(text: &str, font_size: f64, outline_width: f64) -> (u32, u32) {
    let padding = outline_width * 2.0;
    let chars = text.chars().count() as f64;
    (
        clamp_edge(font_size * chars + padding),
        clamp_edge(font_size + padding),
    )
}

fn clamp_edge(value: f64) -> u32 {
    if value.is_nan() {
        return 0;
    }
    value.ceil().clamp(0.0, MAX_BITMAP_EDGE as f64) as u32
}

/// Produces drawable text surfaces
pub trait Rasterizer {
    /// Draws one label's text into a new bitmap
    ///
    /// # Parameters
    ///
    /// - `request`: the text, the bitmap size from `bitmap_size`, and the style
    ///   values (font, size, italic, colors, outline, alpha) in effect when the
    ///   label's visual is created
    ///
    /// # Returns
    ///
    /// A bitmap of exactly `request.width` by `request.height` pixels. Style
    /// values the rasterizer cannot use (unknown colors, negative sizes) are
    /// replaced by fallbacks rather than reported.
    ///
    /// # Example
    ///
    /// ```rust
    /// use callouts::raster::{BitmapFont, Rasterizer, TextRaster, bitmap_size};
    ///
    /// let (width, height) = bitmap_size("HP", 21.0, 2.0);
    /// let bitmap = BitmapFont::new().draw_text(&TextRaster {
    ///     text: "HP",
    ///     width,
    ///     height,
    ///     font_face: "GameFont",
    ///     font_size: 21.0,
    ///     italic: false,
    ///     color: "#ffffff",
    ///     outline_color: "rgba(0,0,0,0.5)",
    ///     outline_width: 2.0,
    ///     alpha: 1.0,
    /// });
    /// assert_eq!((bitmap.width(), bitmap.height()), (width, height));
    /// ```
    fn draw_text(&mut self, request: &TextRaster<'_>) -> TextBitmap;
}

/// RGBA8 pixel buffer, row-major, no padding
#[derive(Clone, PartialEq, Eq)]
pub struct TextBitmap {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl fmt::Debug for TextBitmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextBitmap")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

impl TextBitmap {
    /// Fully transparent bitmap
    pub fn new(width: u32, height: u32) -> Self {
        TextBitmap {
            width,
            height,
            pixels: vec![0; width as usize * height as usize * 4],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        Some(Rgba::new(
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ))
    }

    /// Number of pixels with any coverage
    pub fn covered_pixels(&self) -> usize {
        self.pixels.chunks_exact(4).filter(|p| p[3] > 0).count()
    }

    /// Source-over blend of a solid rectangle, clipped to the bitmap
    pub fn blend_rect(&mut self, x: i64, y: i64, w: i64, h: i64, color: Rgba) {
        if color.a == 0 {
            return;
        }
        let x0 = x.max(0);
        let y0 = y.max(0);
        let x1 = (x + w).min(self.width as i64);
        let y1 = (y + h).min(self.height as i64);
        for py in y0..y1 {
            for px in x0..x1 {
                self.blend_pixel(px as usize, py as usize, color);
            }
        }
    }

    fn blend_pixel(&mut self, x: usize, y: usize, src: Rgba) {
        let i = (y * self.width as usize + x) * 4;
        let sa = src.a as f32 / 255.0;
        let da = self.pixels[i + 3] as f32 / 255.0;
        let out_a = sa + da * (1.0 - sa);
        if out_a <= 0.0 {
            return;
        }
        let mix = |s: u8, d: u8| {
            ((s as f32 * sa + d as f32 * da * (1.0 - sa)) / out_a).round() as u8
        };
        self.pixels[i] = mix(src.r, self.pixels[i]);
        self.pixels[i + 1] = mix(src.g, self.pixels[i + 1]);
        self.pixels[i + 2] = mix(src.b, self.pixels[i + 2]);
        self.pixels[i + 3] = (out_a * 255.0).round() as u8;
    }
}

/// Built-in procedural font. Only one face exists, so `font_face` is ignored.
#[derive(Debug, Default, Clone, Copy)]
pub struct BitmapFont;

impl BitmapFont {
    pub fn new() -> Self {
        BitmapFont
    }

    /// Integer pixel scale for a glyph cell of `font_size` pixels
    fn scale(font_size: f64) -> i64 {
        if font_size.is_nan() {
            return 1;
        }
        ((font_size / 8.0).floor() as i64).clamp(1, 64)
    }

    fn draw_glyph(bitmap: &mut TextBitmap, c: char, x: i64, y: i64, scale: i64, italic: bool, color: Rgba) {
        for (row, &bits) in glyph(c).iter().enumerate() {
            let row = row as i64;
            let shear = if italic { (GLYPH_HEIGHT - 1 - row) * scale / 3 } else { 0 };
            for col in 0..GLYPH_WIDTH {
                if (bits >> (GLYPH_WIDTH - 1 - col)) & 1 == 1 {
                    bitmap.blend_rect(x + col * scale + shear, y + row * scale, scale, scale, color);
                }
            }
        }
    }
}

impl Rasterizer for BitmapFont {
    fn draw_text(&mut self, request: &TextRaster<'_>) -> TextBitmap {
        let mut bitmap = TextBitmap::new(request.width, request.height);
        let chars: Vec<char> = request.text.chars().collect();
        if chars.is_empty() || request.width == 0 || request.height == 0 {
            return bitmap;
        }

        let fill = Rgba::parse_or(request.color, Rgba::WHITE).with_opacity(request.alpha);
        let outline = Rgba::parse_or(request.outline_color, Rgba::new(0, 0, 0, 128))
            .with_opacity(request.alpha);

        let scale = Self::scale(request.font_size);
        let advance = (GLYPH_WIDTH + 1) * scale;
        let text_width = advance * chars.len() as i64 - scale;
        let text_height = GLYPH_HEIGHT * scale;
        // Centered in the bitmap
        let origin_x = (request.width as i64 - text_width) / 2;
        let origin_y = (request.height as i64 - text_height) / 2;

        let outline_px = if request.outline_width.is_nan() {
            0
        } else {
            (request.outline_width.round() as i64).clamp(0, MAX_OUTLINE)
        };
        if outline_px > 0 && outline.a > 0 {
            for dy in -outline_px..=outline_px {
                for dx in -outline_px..=outline_px {
                    if (dx, dy) == (0, 0) || dx * dx + dy * dy > outline_px * outline_px {
                        continue;
                    }
                    for (i, &c) in chars.iter().enumerate() {
                        let x = origin_x + i as i64 * advance + dx;
                        Self::draw_glyph(&mut bitmap, c, x, origin_y + dy, scale, request.italic, outline);
                    }
                }
            }
        }

        for (i, &c) in chars.iter().enumerate() {
            let x = origin_x + i as i64 * advance;
            Self::draw_glyph(&mut bitmap, c, x, origin_y, scale, request.italic, fill);
        }

        bitmap
    }
}

/// 5x7 glyph rows, most significant of the low five bits is the leftmost column.
/// Letters are case-insensitive; unknown characters draw as a hollow box.
fn glyph(c: char) -> [u8; 7] {
    match c.to_ascii_uppercase() {
        'A' => [0b01110, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001],
        'B' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10001, 0b10001, 0b11110],
        'C' => [0b01110, 0b10001, 0b10000, 0b10000, 0b10000, 0b10001, 0b01110],
        'D' => [0b11110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b11110],
        'E' => [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b11111],
        'F' => [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b10000],
        'G' => [0b01110, 0b10001, 0b10000, 0b10111, 0b10001, 0b10001, 0b01110],
        'H' => [0b10001, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001],
        'I' => [0b11111, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b11111],
        'J' => [0b00111, 0b00010, 0b00010, 0b00010, 0b00010, 0b10010, 0b01100],
        'K' => [0b10001, 0b10010, 0b10100, 0b11000, 0b10100, 0b10010, 0b10001],
        'L' => [0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b11111],
        'M' => [0b10001, 0b11011, 0b10101, 0b10001, 0b10001, 0b10001, 0b10001],
        'N' => [0b10001, 0b11001, 0b10101, 0b10011, 0b10001, 0b10001, 0b10001],
        'O' => [0b01110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110],
        'P' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10000, 0b10000, 0b10000],
        'Q' => [0b01110, 0b10001, 0b10001, 0b10001, 0b10101, 0b10010, 0b01101],
        'R' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10100, 0b10010, 0b10001],
        'S' => [0b01110, 0b10001, 0b10000, 0b01110, 0b00001, 0b10001, 0b01110],
        'T' => [0b11111, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100],
        'U' => [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110],
        'V' => [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01010, 0b00100],
        'W' => [0b10001, 0b10001, 0b10001, 0b10001, 0b10101, 0b11011, 0b10001],
        'X' => [0b10001, 0b10001, 0b01010, 0b00100, 0b01010, 0b10001, 0b10001],
        'Y' => [0b10001, 0b10001, 0b01010, 0b00100, 0b00100, 0b00100, 0b00100],
        'Z' => [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b10000, 0b11111],
        '0' => [0b01110, 0b10001, 0b10011, 0b10101, 0b11001, 0b10001, 0b01110],
        '1' => [0b00100, 0b01100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
        '2' => [0b01110, 0b10001, 0b00001, 0b00110, 0b01000, 0b10000, 0b11111],
        '3' => [0b11111, 0b00010, 0b00100, 0b00010, 0b00001, 0b10001, 0b01110],
        '4' => [0b00010, 0b00110, 0b01010, 0b10010, 0b11111, 0b00010, 0b00010],
        '5' => [0b11111, 0b10000, 0b11110, 0b00001, 0b00001, 0b10001, 0b01110],
        '6' => [0b00110, 0b01000, 0b10000, 0b11110, 0b10001, 0b10001, 0b01110],
        '7' => [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b01000, 0b01000],
        '8' => [0b01110, 0b10001, 0b10001, 0b01110, 0b10001, 0b10001, 0b01110],
        '9' => [0b01110, 0b10001, 0b10001, 0b01111, 0b00001, 0b00010, 0b01100],
        ' ' => [0; 7],
        '.' => [0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b01100, 0b01100],
        ',' => [0b00000, 0b00000, 0b00000, 0b00000, 0b01100, 0b00100, 0b01000],
        ':' => [0b00000, 0b01100, 0b01100, 0b00000, 0b01100, 0b01100, 0b00000],
        '!' => [0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00000, 0b00100],
        '?' => [0b01110, 0b10001, 0b00001, 0b00010, 0b00100, 0b00000, 0b00100],
        '\'' => [0b00100, 0b00100, 0b01000, 0b00000, 0b00000, 0b00000, 0b00000],
        '-' => [0b00000, 0b00000, 0b00000, 0b11111, 0b00000, 0b00000, 0b00000],
        '+' => [0b00000, 0b00100, 0b00100, 0b11111, 0b00100, 0b00100, 0b00000],
        '=' => [0b00000, 0b00000, 0b11111, 0b00000, 0b11111, 0b00000, 0b00000],
        '/' => [0b00001, 0b00010, 0b00010, 0b00100, 0b01000, 0b01000, 0b10000],
        '%' => [0b11001, 0b11010, 0b00010, 0b00100, 0b01000, 0b01011, 0b10011],
        '(' => [0b00010, 0b00100, 0b01000, 0b01000, 0b01000, 0b00100, 0b00010],
        ')' => [0b01000, 0b00100, 0b00010, 0b00010, 0b00010, 0b00100, 0b01000],
        '<' => [0b00010, 0b00100, 0b01000, 0b10000, 0b01000, 0b00100, 0b00010],
        '>' => [0b01000, 0b00100, 0b00010, 0b00001, 0b00010, 0b00100, 0b01000],
        _ => [0b11111, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b11111],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(text: &str) -> TextRaster<'_> {
        let (width, height) = bitmap_size(text, 21.0, 2.0);
        TextRaster {
            text,
            width,
            height,
            font_face: "GameFont",
            font_size: 21.0,
            italic: false,
            color: "#ffffff",
            outline_color: "rgba(0,0,0,0.5)",
            outline_width: 2.0,
            alpha: 1.0,
        }
    }

    #[test]
    fn test_bitmap_size_matches_em_per_char() {
        assert_eq!(bitmap_size("hello", 21.0, 2.0), (109, 25));
        assert_eq!(bitmap_size("", 21.0, 2.0), (4, 25));
    }

    #[test]
    fn test_bitmap_size_clamps_garbage() {
        assert_eq!(bitmap_size("x", -10.0, 0.0), (0, 0));
        assert_eq!(bitmap_size("x", f64::NAN, 2.0), (0, 0));
        assert_eq!(bitmap_size("x", 1e12, 0.0), (MAX_BITMAP_EDGE, MAX_BITMAP_EDGE));
    }

    #[test]
    fn test_draw_text_fills_pixels() {
        let mut font = BitmapFont::new();
        let bitmap = font.draw_text(&request("HP"));
        assert_eq!((bitmap.width(), bitmap.height()), (46, 25));
        assert!(bitmap.covered_pixels() > 0);
    }

    #[test]
    fn test_space_only_draws_nothing_visible() {
        let mut font = BitmapFont::new();
        let bitmap = font.draw_text(&request("   "));
        assert_eq!(bitmap.covered_pixels(), 0);
    }

    #[test]
    fn test_zero_alpha_is_invisible() {
        let mut font = BitmapFont::new();
        let req = TextRaster {
            alpha: 0.0,
            ..request("hi")
        };
        assert_eq!(font.draw_text(&req).covered_pixels(), 0);
    }

    #[test]
    fn test_outline_widens_coverage() {
        let mut font = BitmapFont::new();
        let plain = font.draw_text(&TextRaster {
            outline_width: 0.0,
            ..request("I")
        });
        let outlined = font.draw_text(&request("I"));
        assert!(outlined.covered_pixels() > plain.covered_pixels());
    }

    #[test]
    fn test_fill_color_applied() {
        let mut font = BitmapFont::new();
        let req = TextRaster {
            color: "#ff0000",
            outline_width: 0.0,
            ..request("I")
        };
        let bitmap = font.draw_text(&req);
        let red = (0..bitmap.height())
            .flat_map(|y| (0..bitmap.width()).map(move |x| (x, y)))
            .filter_map(|(x, y)| bitmap.pixel(x, y))
            .any(|p| p == Rgba::new(255, 0, 0, 255));
        assert!(red);
    }

    #[test]
    fn test_blend_rect_clips() {
        let mut bitmap = TextBitmap::new(4, 4);
        bitmap.blend_rect(-2, -2, 4, 4, Rgba::WHITE);
        assert_eq!(bitmap.covered_pixels(), 4);
        assert_eq!(bitmap.pixel(1, 1), Some(Rgba::WHITE));
        assert_eq!(bitmap.pixel(2, 2), Some(Rgba::TRANSPARENT));
        assert_eq!(bitmap.pixel(4, 0), None);
    }
}
