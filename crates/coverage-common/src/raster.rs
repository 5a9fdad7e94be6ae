//! In-memory raster model.
//!
//! Sample buffers are row-major `Vec<f32>` regardless of the declared pixel
//! type; `PixelType` is carried as metadata so heterogeneous sources can be
//! rejected before any merge is attempted. Bands are ordered and carry a
//! role so that an incidental alpha/transparency mask can travel alongside
//! the data bands without being counted as one of them.

use crate::Envelope;
use serde::{Deserialize, Serialize};

/// Sample data type of a coverage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PixelType {
    UInt8,
    Int16,
    UInt16,
    Int32,
    Float32,
    Float64,
}

impl PixelType {
    /// Size of one sample in bytes.
    pub fn size_bytes(&self) -> usize {
        match self {
            Self::UInt8 => 1,
            Self::Int16 | Self::UInt16 => 2,
            Self::Int32 | Self::Float32 => 4,
            Self::Float64 => 8,
        }
    }

    /// Get the type name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UInt8 => "uint8",
            Self::Int16 => "int16",
            Self::UInt16 => "uint16",
            Self::Int32 => "int32",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
        }
    }
}

impl std::fmt::Display for PixelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Role of a band within a raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BandRole {
    /// A measurement channel.
    Data,
    /// A transparency/footprint mask injected by a reader.
    Alpha,
}

/// One channel of a raster.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterBand {
    /// Sample values in row-major order (row 0 first).
    pub samples: Vec<f32>,
    pub role: BandRole,
    /// Sample-dimension name, if known.
    pub name: Option<String>,
}

impl RasterBand {
    /// Create a data band.
    pub fn data(samples: Vec<f32>) -> Self {
        Self {
            samples,
            role: BandRole::Data,
            name: None,
        }
    }

    /// Create an alpha band.
    pub fn alpha(samples: Vec<f32>) -> Self {
        Self {
            samples,
            role: BandRole::Alpha,
            name: None,
        }
    }

    /// Set the sample-dimension name.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Shape of a raster without its pixel data.
///
/// Cloned from a representative read when synthesizing constant-filled
/// stand-ins for missing sources.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RasterLayout {
    /// Number of data bands (alpha excluded).
    pub band_count: usize,
    pub pixel_type: PixelType,
    pub has_alpha: bool,
    pub nodata: Option<f64>,
}

/// A raster tile: pixel data plus its geo-referencing.
#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    width: usize,
    height: usize,
    envelope: Envelope,
    pixel_type: PixelType,
    nodata: Option<f64>,
    bands: Vec<RasterBand>,
}

impl Raster {
    /// Create an empty raster shell; add channels with [`Raster::push_band`].
    pub fn new(width: usize, height: usize, envelope: Envelope, pixel_type: PixelType) -> Self {
        Self {
            width,
            height,
            envelope,
            pixel_type,
            nodata: None,
            bands: Vec::new(),
        }
    }

    /// Set the nodata sentinel.
    pub fn with_nodata(mut self, nodata: f64) -> Self {
        self.nodata = Some(nodata);
        self
    }

    /// Append a band. The sample count must match the raster dimensions.
    pub fn push_band(&mut self, band: RasterBand) -> Result<(), RasterError> {
        let expected = self.width * self.height;
        if band.samples.len() != expected {
            return Err(RasterError::BandLengthMismatch {
                expected,
                actual: band.samples.len(),
            });
        }
        self.bands.push(band);
        Ok(())
    }

    /// Synthesize a constant-valued raster matching `layout`.
    ///
    /// Data bands are filled with `value`; an alpha band, when the layout
    /// declares one, is filled with zero (fully transparent).
    pub fn constant(
        width: usize,
        height: usize,
        envelope: Envelope,
        layout: &RasterLayout,
        value: f64,
    ) -> Self {
        let len = width * height;
        let mut raster = Self {
            width,
            height,
            envelope,
            pixel_type: layout.pixel_type,
            nodata: layout.nodata,
            bands: Vec::with_capacity(layout.band_count + usize::from(layout.has_alpha)),
        };

        for _ in 0..layout.band_count {
            raster.bands.push(RasterBand::data(vec![value as f32; len]));
        }
        if layout.has_alpha {
            raster.bands.push(RasterBand::alpha(vec![0.0; len]));
        }

        raster
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    pub fn pixel_type(&self) -> PixelType {
        self.pixel_type
    }

    pub fn nodata(&self) -> Option<f64> {
        self.nodata
    }

    /// All bands in order, alpha included.
    pub fn bands(&self) -> &[RasterBand] {
        &self.bands
    }

    /// Consume the raster, yielding its bands in order.
    pub fn into_bands(self) -> Vec<RasterBand> {
        self.bands
    }

    /// Number of data bands (alpha excluded).
    pub fn data_band_count(&self) -> usize {
        self.bands
            .iter()
            .filter(|b| b.role == BandRole::Data)
            .count()
    }

    /// Total band count, alpha included.
    pub fn band_count(&self) -> usize {
        self.bands.len()
    }

    /// Get the i-th data band (alpha bands are not counted).
    pub fn data_band(&self, index: usize) -> Option<&RasterBand> {
        self.bands
            .iter()
            .filter(|b| b.role == BandRole::Data)
            .nth(index)
    }

    /// Iterate over alpha bands.
    pub fn alpha_bands(&self) -> impl Iterator<Item = &RasterBand> {
        self.bands.iter().filter(|b| b.role == BandRole::Alpha)
    }

    /// True if any band is an alpha mask.
    pub fn has_alpha(&self) -> bool {
        self.bands.iter().any(|b| b.role == BandRole::Alpha)
    }

    /// Get a sample value by raw band index and pixel position.
    pub fn get(&self, band: usize, col: usize, row: usize) -> Option<f32> {
        if col >= self.width || row >= self.height {
            return None;
        }
        self.bands
            .get(band)?
            .samples
            .get(row * self.width + col)
            .copied()
    }

    /// Extract a single data band, carrying along any alpha bands.
    ///
    /// Returns `None` when the data band index is out of range.
    pub fn select_data_band(&self, index: usize) -> Option<Raster> {
        let band = self.data_band(index)?;

        let mut out = Raster::new(self.width, self.height, self.envelope, self.pixel_type);
        out.nodata = self.nodata;
        out.bands.push(band.clone());
        for alpha in self.alpha_bands() {
            out.bands.push(alpha.clone());
        }
        Some(out)
    }

    /// Describe this raster's shape.
    pub fn layout(&self) -> RasterLayout {
        RasterLayout {
            band_count: self.data_band_count(),
            pixel_type: self.pixel_type,
            has_alpha: self.has_alpha(),
            nodata: self.nodata,
        }
    }

    /// Check pixel dimensions and envelope agreement with another raster.
    pub fn same_geometry(&self, other: &Raster, tolerance: f64) -> bool {
        self.width == other.width
            && self.height == other.height
            && self.envelope.approx_eq(&other.envelope, tolerance)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RasterError {
    #[error("band has {actual} samples, raster dimensions require {expected}")]
    BandLengthMismatch { expected: usize, actual: usize },
}
