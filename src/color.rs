use eframe::egui::Color32;
use palette::{Hsl, IntoColor, LinSrgb, Mix, Srgb};

use crate::data::model::Status;

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.65, 0.65);
            to_color32(hsl.into_color())
        })
        .collect()
}

fn to_color32(rgb: Srgb) -> Color32 {
    let rgb: Srgb<u8> = rgb.into_format();
    Color32::from_rgb(rgb.red, rgb.green, rgb.blue)
}

// ---------------------------------------------------------------------------
// Fixed colours
// ---------------------------------------------------------------------------

pub const PROFIT: Color32 = Color32::from_rgb(0x00, 0xCC, 0x96);
pub const LOSS: Color32 = Color32::from_rgb(0xEF, 0x55, 0x3B);
/// Bars standing for the whole market in comparisons.
pub const MARKET: Color32 = Color32::from_rgb(0x63, 0x6E, 0xFA);

pub fn status_color(status: Status) -> Color32 {
    match status {
        Status::Profit => PROFIT,
        Status::Loss => LOSS,
    }
}

// ---------------------------------------------------------------------------
// Continuous colour scales
// ---------------------------------------------------------------------------

/// Piecewise-linear gradient, interpolated in linear RGB.
#[derive(Debug, Clone)]
pub struct ColorScale {
    stops: Vec<LinSrgb>,
}

impl ColorScale {
    fn from_hex(stops: &[u32]) -> Self {
        let stops = stops
            .iter()
            .map(|&hex| Srgb::<u8>::from(hex).into_format::<f32>().into_linear())
            .collect();
        ColorScale { stops }
    }

    /// Dark purple → orange → yellow, for numeric point colouring.
    pub fn sequential() -> Self {
        Self::from_hex(&[0x0D0887, 0x9C179E, 0xED7953, 0xF0F921])
    }

    /// Blue → white → red, for correlations in [-1, 1].
    pub fn diverging() -> Self {
        Self::from_hex(&[0x2166AC, 0xF7F7F7, 0xB2182B])
    }

    /// Colour at position `t` in [0, 1]; out-of-range values are clamped.
    pub fn sample(&self, t: f64) -> Color32 {
        let segments = self.stops.len().saturating_sub(1);
        if segments == 0 {
            return self
                .stops
                .first()
                .map(|c| to_color32((*c).into_color()))
                .unwrap_or(Color32::GRAY);
        }
        let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 } as f32;
        let pos = t * segments as f32;
        let idx = (pos.floor() as usize).min(segments - 1);
        let local = pos - idx as f32;
        let mixed = self.stops[idx].mix(self.stops[idx + 1], local);
        to_color32(mixed.into_color())
    }

    /// Colour of `value` mapped linearly from `[min, max]`.
    pub fn sample_range(&self, value: f64, min: f64, max: f64) -> Color32 {
        let span = max - min;
        if span.abs() < f64::EPSILON {
            return self.sample(0.5);
        }
        self.sample((value - min) / span)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_has_requested_size() {
        assert!(generate_palette(0).is_empty());
        let p = generate_palette(3);
        assert_eq!(p.len(), 3);
        assert_ne!(p[0], p[1]);
    }

    fn close(a: Color32, b: Color32) -> bool {
        let d = |x: u8, y: u8| (x as i16 - y as i16).abs() <= 1;
        d(a.r(), b.r()) && d(a.g(), b.g()) && d(a.b(), b.b())
    }

    #[test]
    fn scale_endpoints_match_stops() {
        let scale = ColorScale::diverging();
        assert!(close(scale.sample(0.0), Color32::from_rgb(0x21, 0x66, 0xAC)));
        assert!(close(scale.sample(1.0), Color32::from_rgb(0xB2, 0x18, 0x2B)));
        assert_eq!(scale.sample(7.0), scale.sample(1.0));
        assert_eq!(scale.sample_range(5.0, 5.0, 5.0), scale.sample(0.5));
    }
}
