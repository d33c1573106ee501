use std::collections::BTreeMap;

use disaster_dash::data::category::SeverityCategory;
use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

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
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            Color32::from_rgb(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Color mapping: category label → Color32
// ---------------------------------------------------------------------------

/// Maps the distinct values of a text column (e.g. disaster type) to colours.
#[derive(Debug, Clone)]
pub struct ColorMap {
    mapping: BTreeMap<String, Color32>,
    default_color: Color32,
}

impl ColorMap {
    /// Build a colour map from the column's distinct values.
    pub fn new<'a>(values: impl IntoIterator<Item = &'a String>) -> Self {
        let values: Vec<&String> = values.into_iter().collect();
        let palette = generate_palette(values.len());
        let mapping: BTreeMap<String, Color32> = values
            .into_iter()
            .zip(palette)
            .map(|(v, c)| (v.clone(), c))
            .collect();

        ColorMap {
            mapping,
            default_color: Color32::GRAY,
        }
    }

    /// Look up the colour for a given value.
    pub fn color_for(&self, value: &str) -> Color32 {
        self.mapping
            .get(value)
            .copied()
            .unwrap_or(self.default_color)
    }
}

/// Fixed traffic-light colours for the severity bands.
pub fn severity_color(category: SeverityCategory) -> Color32 {
    match category {
        SeverityCategory::Low => Color32::from_rgb(76, 175, 80),
        SeverityCategory::Medium => Color32::from_rgb(255, 193, 7),
        SeverityCategory::High => Color32::from_rgb(255, 111, 0),
        SeverityCategory::Critical => Color32::from_rgb(211, 47, 47),
    }
}

/// Four-step ramp for the other ordered bands (index 0 = mildest).
pub fn band_color(index: usize) -> Color32 {
    const RAMP: [Color32; 4] = [
        Color32::from_rgb(102, 126, 234),
        Color32::from_rgb(118, 75, 162),
        Color32::from_rgb(240, 147, 251),
        Color32::from_rgb(245, 87, 108),
    ];
    RAMP[index.min(RAMP.len() - 1)]
}

/// Diverging blue–white–red colour for a correlation coefficient.
pub fn correlation_color(r: f64) -> Color32 {
    if r.is_nan() {
        return Color32::from_gray(90);
    }
    let t = r.clamp(-1.0, 1.0) as f32;
    let fade = |c: u8| (255.0 - (255.0 - c as f32) * t.abs()) as u8;
    if t >= 0.0 {
        Color32::from_rgb(255, fade(60), fade(60))
    } else {
        Color32::from_rgb(fade(60), fade(110), 255)
    }
}
