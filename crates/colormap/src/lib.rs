//! # vegtrace colormap
//!
//! Display colours for vegtrace outputs. Rendering never feeds back into the
//! pipeline; it only turns finished grids into RGBA pixel buffers.
//!
//! - [`ClassPalette`]: fixed land-cover class → colour mapping
//! - [`labels_to_rgba`]: label grid → RGBA
//! - [`index_to_rgba`]: vegetation index grid → RGBA on a brown-to-green ramp
//!
//! ## Usage
//!
//! ```ignore
//! use vegtrace_colormap::{labels_to_rgba, ClassPalette};
//!
//! let rgba = labels_to_rgba(&labels, &ClassPalette::default());
//! ```

mod palette;
mod render;

pub use palette::{evaluate_index, ClassPalette, ColorStop, Rgb};
pub use render::{index_to_rgba, labels_to_rgba};
