//! Land-cover classification of a vegetation index grid
//!
//! Three fixed classes, decided by two thresholds with strict inequalities:
//!
//! | Rule (first match wins) | Class |
//! |---|---|
//! | masked | `NoData` (0) |
//! | `index > veg_min` | `Vegetation` (1) |
//! | `index < water_max` | `Water` (2) |
//! | otherwise | `Barren` (3) |

use crate::maybe_rayon::*;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;
use vegtrace_core::raster::{MaskedRaster, Raster};
use vegtrace_core::{Algorithm, Error, Result};

/// Land-cover class codes stored in a label grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum LandCover {
    NoData = 0,
    Vegetation = 1,
    Water = 2,
    Barren = 3,
}

impl LandCover {
    /// All codes, indexed by their value
    pub const ALL: [LandCover; 4] = [
        LandCover::NoData,
        LandCover::Vegetation,
        LandCover::Water,
        LandCover::Barren,
    ];

    /// The real classes (everything except `NoData`)
    pub const CLASSES: [LandCover; 3] = [LandCover::Vegetation, LandCover::Water, LandCover::Barren];

    pub fn code(self) -> u8 {
        self as u8
    }

    /// Parse a stored label code
    pub fn from_code(code: u8) -> Result<Self> {
        Self::ALL.get(code as usize).copied().ok_or(Error::InvalidLabel {
            label: i64::from(code),
            reason: "not a land-cover code (expected 0..=3)",
        })
    }

    /// Human-readable name
    pub fn name(self) -> &'static str {
        match self {
            LandCover::NoData => "nodata",
            LandCover::Vegetation => "vegetation",
            LandCover::Water => "water",
            LandCover::Barren => "barren",
        }
    }
}

impl fmt::Display for LandCover {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LandCover {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "vegetation" | "veg" | "1" => Ok(LandCover::Vegetation),
            "water" | "2" => Ok(LandCover::Water),
            "barren" | "bare" | "3" => Ok(LandCover::Barren),
            "nodata" | "0" => Ok(LandCover::NoData),
            _ => Err(Error::invalid_parameter("class", s, "expected vegetation, water or barren")),
        }
    }
}

/// Classification thresholds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassThresholds {
    /// Index strictly above this is vegetation
    pub veg_min: f64,
    /// Index strictly below this (and not vegetation) is water
    pub water_max: f64,
}

impl Default for ClassThresholds {
    fn default() -> Self {
        Self {
            veg_min: 0.3,
            water_max: 0.1,
        }
    }
}

impl ClassThresholds {
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [("veg_min", self.veg_min), ("water_max", self.water_max)] {
            if !value.is_finite() {
                return Err(Error::invalid_parameter(name, value, "must be finite"));
            }
        }
        if self.water_max > self.veg_min {
            return Err(Error::invalid_parameter(
                "water_max",
                self.water_max,
                format!("must not exceed veg_min ({})", self.veg_min),
            ));
        }
        Ok(())
    }

    /// Class of one unmasked index value
    pub fn class_of(&self, index: f64) -> LandCover {
        if index > self.veg_min {
            LandCover::Vegetation
        } else if index < self.water_max {
            LandCover::Water
        } else {
            LandCover::Barren
        }
    }
}

/// Classify an index grid into land-cover codes.
///
/// Masked cells become `NoData` (0). Every unmasked value lands in exactly
/// one real class; values below zero that are not below `water_max` (only
/// possible with a negative `water_max`) fall through to `Barren`.
///
/// The label grid has the index grid's shape, transform and CRS, with 0 as
/// its no-data sentinel.
pub fn classify(index: &MaskedRaster<f64>, thresholds: ClassThresholds) -> Result<Raster<u8>> {
    thresholds.validate()?;

    let (rows, cols) = index.shape();
    let values = index.raster().view();
    let mask = index.mask();

    let data: Vec<u8> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![LandCover::NoData.code(); cols];
            for col in 0..cols {
                if !mask[(row, col)] {
                    row_data[col] = thresholds.class_of(values[(row, col)]).code();
                }
            }
            row_data
        })
        .collect();

    let labels =
        Array2::from_shape_vec((rows, cols), data).map_err(|e| Error::Other(e.to_string()))?;
    let mut output = index.raster().derive(labels)?;
    output.set_nodata(Some(LandCover::NoData.code()));

    debug!(counts = ?class_counts(&output), "classified index grid");
    Ok(output)
}

/// Number of cells per code, indexed by code (codes above 3 are ignored)
pub fn class_counts(labels: &Raster<u8>) -> [usize; 4] {
    let mut counts = [0usize; 4];
    for &code in labels.data().iter() {
        if let Some(slot) = counts.get_mut(code as usize) {
            *slot += 1;
        }
    }
    counts
}

/// Classifier pipeline stage
#[derive(Debug, Clone, Default)]
pub struct Classifier;

impl Algorithm for Classifier {
    type Input = MaskedRaster<f64>;
    type Output = Raster<u8>;
    type Params = ClassThresholds;
    type Error = Error;

    fn name(&self) -> &'static str {
        "Land-cover Classification"
    }

    fn description(&self) -> &'static str {
        "Split a vegetation index into vegetation, water and barren classes"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        classify(&input, params)
    }
}
