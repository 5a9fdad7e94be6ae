//! Error types for coverage composition.
//!
//! Configuration problems are surfaced as errors when a session is opened
//! and abort construction; a region that simply has no data is `Ok(None)`
//! from the read path, never an error.

use coverage_common::{CrsCode, GridRange, PixelType};
use thiserror::Error;

use crate::definition::SourceId;

/// Errors that can occur while composing coverages.
#[derive(Error, Debug)]
pub enum CompositionError {
    // === Configuration errors (fatal at session open) ===
    /// The view defines no output bands.
    #[error("view '{0}' defines no output bands")]
    EmptyDefinition(String),

    /// An output band carries a number of input refs its composition kind
    /// cannot consume.
    #[error("output band '{band}' has {refs} input refs, band selection supports exactly one")]
    UnsupportedBandComposition { band: String, refs: usize },

    /// An input ref names a source the registry cannot open.
    #[error("source '{0}' is not queryable")]
    UnknownSource(SourceId),

    /// An input ref selects a band the source does not have.
    #[error("source '{source_id}' has {available} bands, band {requested} was requested")]
    BandIndexOutOfRange {
        source_id: SourceId,
        requested: usize,
        available: usize,
    },

    /// Source pixel types disagree; no numeric promotion is performed.
    #[error("pixel type mismatch: source '{source_id}' is {found}, reference is {reference}")]
    PixelTypeMismatch {
        source_id: SourceId,
        found: PixelType,
        reference: PixelType,
    },

    /// Source metadata-name sets disagree; dimension metadata cannot be merged.
    #[error("metadata name mismatch between source '{source_id}' and the reference source")]
    MetadataNameMismatch { source_id: SourceId },

    /// Source CRS is not related to the reference CRS by an identity transform.
    #[error("CRS mismatch: source '{source_id}' is {found}, reference is {reference}")]
    CrsMismatch {
        source_id: SourceId,
        found: CrsCode,
        reference: CrsCode,
    },

    /// Source envelopes do not intersect; composing disjoint rasters is
    /// meaningless under any tolerance mode.
    #[error("envelope of source '{0}' does not intersect the reference envelope")]
    DisjointEnvelopes(SourceId),

    /// Envelopes differ and the tolerance mode forbids heterogeneity.
    #[error("envelope of source '{0}' differs from the reference under strict tolerance")]
    EnvelopeMismatch(SourceId),

    /// Grid ranges differ and the tolerance mode forbids heterogeneity.
    #[error("grid range of source '{source_id}' is {found:?}, reference is {reference:?}")]
    GridRangeMismatch {
        source_id: SourceId,
        found: GridRange,
        reference: GridRange,
    },

    /// A composer received zero usable sources.
    #[error("no usable source: {0}")]
    NoUsableSource(String),

    /// A fixed resolution policy names a source index outside the source list.
    #[error("fixed resolution index {index} is out of range for {sources} sources")]
    FixedResolutionOutOfRange { index: usize, sources: usize },

    /// Invalid configuration values.
    #[error("configuration error: {0}")]
    ConfigError(String),

    // === Invariant violations (defensive, loud) ===
    /// Per-band rasters disagreed on geometry at merge time.
    #[error("geometry mismatch at band merge: {0}")]
    GeometryMismatch(String),

    // === Derived-storage restrictions ===
    /// Granule insertion into a composed view is not supported.
    #[error("granule insertion is not supported on a composed view")]
    InsertUnsupported,

    // === Collaborator failures ===
    /// A source reader failed (distinct from "no data here").
    #[error("source read failed: {0}")]
    Source(String),

    /// The catalog store failed.
    #[error("catalog error: {0}")]
    Catalog(String),

    /// The CRS service failed.
    #[error("CRS service error: {0}")]
    Crs(String),
}

impl CompositionError {
    /// Create a Source error.
    pub fn source(msg: impl Into<String>) -> Self {
        Self::Source(msg.into())
    }

    /// Create a Catalog error.
    pub fn catalog(msg: impl Into<String>) -> Self {
        Self::Catalog(msg.into())
    }

    /// Create a NoUsableSource error.
    pub fn no_usable_source(msg: impl Into<String>) -> Self {
        Self::NoUsableSource(msg.into())
    }

    /// Create a GeometryMismatch error.
    pub fn geometry_mismatch(msg: impl Into<String>) -> Self {
        Self::GeometryMismatch(msg.into())
    }

    /// True for errors that indicate a bad view configuration rather than a
    /// runtime failure.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::EmptyDefinition(_)
                | Self::UnsupportedBandComposition { .. }
                | Self::UnknownSource(_)
                | Self::BandIndexOutOfRange { .. }
                | Self::PixelTypeMismatch { .. }
                | Self::MetadataNameMismatch { .. }
                | Self::CrsMismatch { .. }
                | Self::DisjointEnvelopes(_)
                | Self::EnvelopeMismatch(_)
                | Self::GridRangeMismatch { .. }
                | Self::NoUsableSource(_)
                | Self::FixedResolutionOutOfRange { .. }
                | Self::ConfigError(_)
        )
    }
}

impl From<coverage_common::raster::RasterError> for CompositionError {
    fn from(err: coverage_common::raster::RasterError) -> Self {
        Self::GeometryMismatch(err.to_string())
    }
}

/// Result type for composition operations.
pub type Result<T> = std::result::Result<T, CompositionError>;
