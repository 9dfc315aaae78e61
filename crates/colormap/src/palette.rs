//! Class palette and the vegetation index colour ramp

use vegtrace_algorithms::imagery::LandCover;

/// RGB color as (r, g, b) with values in 0..=255.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Opaque RGBA bytes
    pub const fn opaque(self) -> [u8; 4] {
        [self.r, self.g, self.b, 255]
    }
}

/// Fixed land-cover class → display colour mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassPalette {
    pub vegetation: Rgb,
    pub water: Rgb,
    pub barren: Rgb,
    /// RGBA for no-data cells and unknown codes. Default: fully transparent.
    pub nodata: [u8; 4],
}

impl Default for ClassPalette {
    fn default() -> Self {
        Self {
            vegetation: Rgb::new(56, 168, 0),
            water: Rgb::new(0, 92, 230),
            barren: Rgb::new(210, 180, 140),
            nodata: [0, 0, 0, 0],
        }
    }
}

impl ClassPalette {
    /// RGBA of one class
    pub fn color(&self, class: LandCover) -> [u8; 4] {
        match class {
            LandCover::NoData => self.nodata,
            LandCover::Vegetation => self.vegetation.opaque(),
            LandCover::Water => self.water.opaque(),
            LandCover::Barren => self.barren.opaque(),
        }
    }

    /// RGBA of a stored code; codes outside 0..=3 render as no-data
    pub fn color_of_code(&self, code: u8) -> [u8; 4] {
        LandCover::from_code(code)
            .map(|class| self.color(class))
            .unwrap_or(self.nodata)
    }
}

/// A color stop: position in [0, 1] mapped to an RGB color.
#[derive(Debug, Clone, Copy)]
pub struct ColorStop {
    pub t: f64,
    pub color: Rgb,
}

impl ColorStop {
    pub const fn new(t: f64, r: u8, g: u8, b: u8) -> Self {
        Self {
            t,
            color: Rgb::new(r, g, b),
        }
    }
}

/// Brown (bare / water) → yellow → green (dense vegetation)
const INDEX_STOPS: &[ColorStop] = &[
    ColorStop::new(0.0, 120, 70, 20),
    ColorStop::new(0.3, 200, 170, 60),
    ColorStop::new(0.5, 240, 230, 100),
    ColorStop::new(0.7, 100, 180, 50),
    ColorStop::new(1.0, 10, 100, 20),
];

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

fn lerp_color(c1: Rgb, c2: Rgb, t: f64) -> Rgb {
    Rgb::new(
        lerp(c1.r as f64, c2.r as f64, t).round() as u8,
        lerp(c1.g as f64, c2.g as f64, t).round() as u8,
        lerp(c1.b as f64, c2.b as f64, t).round() as u8,
    )
}

fn multi_stop(stops: &[ColorStop], t: f64) -> Rgb {
    let (first, last) = (stops[0], stops[stops.len() - 1]);
    if t <= first.t {
        return first.color;
    }
    stops
        .windows(2)
        .find(|w| t <= w[1].t)
        .map(|w| lerp_color(w[0].color, w[1].color, (t - w[0].t) / (w[1].t - w[0].t)))
        .unwrap_or(last.color)
}

/// Colour of an index value; [-1, 1] is stretched over the whole ramp and
/// values outside are clamped.
pub fn evaluate_index(value: f64) -> Rgb {
    multi_stop(INDEX_STOPS, (value + 1.0) / 2.0)
}
