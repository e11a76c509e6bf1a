use std::str::FromStr;

use palette::{Hsl, IntoColor, Srgb};
use plotters::style::RGBColor;

use crate::error::{ReportError, Result};

// ---------------------------------------------------------------------------
// Chart colours
// ---------------------------------------------------------------------------

/// Parse a `#rrggbb` (or `#rgb`) colour into a plotters colour.
pub fn parse_hex(hex: &str) -> Result<RGBColor> {
    let rgb = Srgb::<u8>::from_str(hex)
        .map_err(|e| ReportError::Config(format!("invalid colour '{hex}': {e}")))?;
    Ok(RGBColor(rgb.red, rgb.green, rgb.blue))
}

/// A lighter tint of `color` for grid lines, keeping its hue.
pub fn lighten(color: RGBColor, lightness: f32) -> RGBColor {
    let rgb = Srgb::new(
        color.0 as f32 / 255.0,
        color.1 as f32 / 255.0,
        color.2 as f32 / 255.0,
    );
    let mut hsl: Hsl = rgb.into_color();
    hsl.lightness = lightness.clamp(0.0, 1.0);
    let out: Srgb = hsl.into_color();
    RGBColor(
        (out.red * 255.0).round() as u8,
        (out.green * 255.0).round() as u8,
        (out.blue * 255.0).round() as u8,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_colours() {
        let c = parse_hex("#2c3e50").unwrap();
        assert_eq!((c.0, c.1, c.2), (0x2c, 0x3e, 0x50));
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_hex("not-a-colour").is_err());
    }

    #[test]
    fn lighten_moves_towards_white() {
        let base = parse_hex("#27ae60").unwrap();
        let light = lighten(base, 0.9);
        assert!(light.0 > base.0 && light.1 > base.1 && light.2 > base.2);
    }
}
