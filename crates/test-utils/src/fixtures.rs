//! Common test fixtures for coverage-view tests.
//!
//! Pre-defined envelopes and raster builders representing common scenarios
//! in coverage composition.

use coverage_common::{Envelope, PixelType, Raster, RasterBand};

/// Common envelope definitions for testing.
pub mod envelopes {
    /// Global geographic extent (-180 to 180, -90 to 90)
    pub const GLOBAL: (f64, f64, f64, f64) = (-180.0, -90.0, 180.0, 90.0);

    /// Continental United States extent
    pub const CONUS: (f64, f64, f64, f64) = (-130.0, 20.0, -60.0, 55.0);

    /// Europe extent
    pub const EUROPE: (f64, f64, f64, f64) = (-15.0, 35.0, 45.0, 72.0);

    /// A small test tile (typical web map tile extent at ~zoom 8)
    pub const SMALL_TILE: (f64, f64, f64, f64) = (-100.0, 40.0, -99.0, 41.0);
}

/// Build a single-band float32 raster from row-major samples.
///
/// Panics when the sample count does not match the dimensions, which is a
/// bug in the test itself.
pub fn single_band_raster(
    width: usize,
    height: usize,
    envelope: Envelope,
    samples: Vec<f32>,
) -> Raster {
    let mut raster = Raster::new(width, height, envelope, PixelType::Float32);
    raster
        .push_band(RasterBand::data(samples))
        .expect("sample count must match raster dimensions");
    raster
}

/// Build a multi-band float32 raster from row-major per-band samples.
pub fn raster_with_bands(
    width: usize,
    height: usize,
    envelope: Envelope,
    bands: Vec<Vec<f32>>,
) -> Raster {
    let mut raster = Raster::new(width, height, envelope, PixelType::Float32);
    for samples in bands {
        raster
            .push_band(RasterBand::data(samples))
            .expect("sample count must match raster dimensions");
    }
    raster
}
