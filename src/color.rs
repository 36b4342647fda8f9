use std::collections::{BTreeMap, BTreeSet};

use palette::{Hsl, IntoColor, Srgb};
use plotly::common::{ColorScale, ColorScaleElement};

use crate::data::model::Dataset;

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues,
/// formatted as `#rrggbb` for the browser.
pub fn generate_palette(n: usize) -> Vec<String> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            let rgb: Srgb<u8> = rgb.into_format();
            format!("#{:02x}{:02x}{:02x}", rgb.red, rgb.green, rgb.blue)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Category codes: species → stable integer
// ---------------------------------------------------------------------------

/// Integer code per category, assigned once from the full dataset in sorted
/// order. Codes never change with the selection, so colours stay put.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryCodes {
    codes: BTreeMap<String, u32>,
}

impl CategoryCodes {
    pub fn from_dataset(dataset: &Dataset) -> Self {
        let sorted: BTreeSet<&String> = dataset.categories().iter().collect();
        let codes = sorted
            .into_iter()
            .zip(0u32..)
            .map(|(c, code)| (c.clone(), code))
            .collect();
        CategoryCodes { codes }
    }

    /// Code for a category, `None` for labels outside the dataset.
    pub fn code_for(&self, category: &str) -> Option<u32> {
        self.codes.get(category).copied()
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }
}

// ---------------------------------------------------------------------------
// Color mapping: category code → colour
// ---------------------------------------------------------------------------

/// Discrete Plotly colour scale over the category codes.
///
/// Each code `k` of `n` owns the band `[k/n, (k+1)/n]` of the scale, so with
/// `cmin = 0` and `cmax = n - 1` every marker lands inside its own band.
#[derive(Debug, Clone)]
pub struct ColorMap {
    n_codes: usize,
    stops: Vec<(f64, String)>,
}

impl ColorMap {
    /// Build a colour map for the given category codes.
    pub fn new(codes: &CategoryCodes) -> Self {
        let n = codes.len();
        let palette = generate_palette(n);
        let mut stops = Vec::with_capacity(n * 2);
        for (k, color) in palette.iter().enumerate() {
            stops.push((k as f64 / n as f64, color.clone()));
            stops.push(((k + 1) as f64 / n as f64, color.clone()));
        }
        ColorMap { n_codes: n, stops }
    }

    pub fn color_scale(&self) -> ColorScale {
        ColorScale::Vector(
            self.stops
                .iter()
                .map(|(pos, color)| ColorScaleElement(*pos, color.clone()))
                .collect(),
        )
    }

    /// Upper bound for the marker colour axis.
    pub fn cmax(&self) -> f64 {
        self.n_codes.saturating_sub(1) as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::load_bundled;

    #[test]
    fn codes_follow_sorted_category_order() {
        let ds = load_bundled().unwrap();
        let codes = CategoryCodes::from_dataset(&ds);
        assert_eq!(codes.code_for("setosa"), Some(0));
        assert_eq!(codes.code_for("versicolor"), Some(1));
        assert_eq!(codes.code_for("virginica"), Some(2));
        assert_eq!(codes.code_for("unknown"), None);
    }

    #[test]
    fn palette_colours_are_distinct_hex() {
        let p = generate_palette(3);
        assert_eq!(p.len(), 3);
        assert!(p.iter().all(|c| c.len() == 7 && c.starts_with('#')));
        assert_ne!(p[0], p[1]);
        assert_ne!(p[1], p[2]);
        assert!(generate_palette(0).is_empty());
    }

    #[test]
    fn scale_gives_each_code_its_own_band() {
        let ds = load_bundled().unwrap();
        let map = ColorMap::new(&CategoryCodes::from_dataset(&ds));
        let palette = generate_palette(3);
        assert_eq!(map.stops.len(), 6);
        assert_eq!(map.stops.first().map(|s| s.0), Some(0.0));
        assert_eq!(map.stops.last().map(|s| s.0), Some(1.0));
        assert_eq!(map.stops[2], (1.0 / 3.0, palette[1].clone()));
        assert_eq!(map.stops[3], (2.0 / 3.0, palette[1].clone()));
        assert_eq!(map.cmax(), 2.0);
    }
}
