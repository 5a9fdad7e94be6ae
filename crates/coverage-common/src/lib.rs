//! Common geometry and raster types shared across the coverage-view workspace.

pub mod crs;
pub mod envelope;
pub mod grid;
pub mod raster;

pub use crs::CrsCode;
pub use envelope::Envelope;
pub use grid::{GridRange, GridToWorld, PixelAnchor, Resolution};
pub use raster::{BandRole, PixelType, Raster, RasterBand, RasterLayout};
