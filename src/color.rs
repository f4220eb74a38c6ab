//! CSS-style color strings
//!
//! Styles keep colors as the raw strings they were configured with. They are
//! only interpreted here, when a label is rasterized.

/// 8-bit RGBA color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const WHITE: Rgba = Rgba::new(255, 255, 255, 255);
    pub const TRANSPARENT: Rgba = Rgba::new(0, 0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Rgba { r, g, b, a }
    }

    /// Parses `#rgb`, `#rrggbb`, `#rrggbbaa`, `rgb(r,g,b)` and `rgba(r,g,b,a)`
    /// (alpha as a 0..1 fraction). Returns None for anything else.
    pub fn parse(input: &str) -> Option<Self> {
        let s = input.trim();
        if let Some(hex) = s.strip_prefix('#') {
            return parse_hex(hex);
        }

        let lower = s.to_ascii_lowercase();
        let (body, has_alpha) = if let Some(rest) = lower.strip_prefix("rgba(") {
            (rest, true)
        } else if let Some(rest) = lower.strip_prefix("rgb(") {
            (rest, false)
        } else {
            return None;
        };
        let body = body.strip_suffix(')')?;
        let parts: Vec<&str> = body.split(',').map(str::trim).collect();
        let expected = if has_alpha { 4 } else { 3 };
        if parts.len() != expected {
            return None;
        }

        let channel = |p: &str| p.parse::<f64>().ok().map(|v| v.round().clamp(0.0, 255.0) as u8);
        let r = channel(parts[0])?;
        let g = channel(parts[1])?;
        let b = channel(parts[2])?;
        let a = if has_alpha {
            let a: f64 = parts[3].parse().ok()?;
            (a.clamp(0.0, 1.0) * 255.0).round() as u8
        } else {
            255
        };
        Some(Rgba::new(r, g, b, a))
    }

    /// Parses `input`, falling back to `fallback` when it is not a color we understand
    pub fn parse_or(input: &str, fallback: Rgba) -> Self {
        Rgba::parse(input).unwrap_or_else(|| {
            log::debug!("unrecognized color {:?}, using {:?}", input, fallback);
            fallback
        })
    }

    /// Multiplies the alpha channel by `factor` (clamped to 0..1)
    pub fn with_opacity(self, factor: f64) -> Self {
        let factor = if factor.is_nan() { 0.0 } else { factor.clamp(0.0, 1.0) };
        Rgba {
            a: (self.a as f64 * factor).round() as u8,
            ..self
        }
    }
}

fn parse_hex(hex: &str) -> Option<Rgba> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    let nibble = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok().map(|v| v * 17);
    match hex.len() {
        3 => Some(Rgba::new(nibble(0)?, nibble(1)?, nibble(2)?, 255)),
        6 => Some(Rgba::new(byte(0)?, byte(2)?, byte(4)?, 255)),
        8 => Some(Rgba::new(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_forms() {
        assert_eq!(Rgba::parse("#ffffff"), Some(Rgba::WHITE));
        assert_eq!(Rgba::parse("#f00"), Some(Rgba::new(255, 0, 0, 255)));
        assert_eq!(Rgba::parse("#00ff0080"), Some(Rgba::new(0, 255, 0, 128)));
    }

    #[test]
    fn test_parse_rgba_function() {
        // The default outline color
        assert_eq!(Rgba::parse("rgba(0,0,0,0.5)"), Some(Rgba::new(0, 0, 0, 128)));
        assert_eq!(Rgba::parse("RGB(10, 20, 30)"), Some(Rgba::new(10, 20, 30, 255)));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(Rgba::parse("red"), None);
        assert_eq!(Rgba::parse("#12345"), None);
        assert_eq!(Rgba::parse("rgba(1,2,3)"), None);
        assert_eq!(Rgba::parse("#gggggg"), None);
    }

    #[test]
    fn test_parse_or_fallback() {
        assert_eq!(Rgba::parse_or("not a color", Rgba::WHITE), Rgba::WHITE);
    }

    #[test]
    fn test_with_opacity_clamps() {
        assert_eq!(Rgba::WHITE.with_opacity(0.5).a, 128);
        assert_eq!(Rgba::WHITE.with_opacity(3.0).a, 255);
        assert_eq!(Rgba::WHITE.with_opacity(-1.0).a, 0);
    }
}
