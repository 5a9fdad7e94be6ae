//! Session-open consistency check across source coverages.
//!
//! The first source is the reference; every other source is compared
//! against it in a fixed order. Geometric disagreement (envelope, grid
//! range) is reconcilable and only marks the session heterogeneous under
//! the lenient tolerance mode; type, dimension-name, and CRS disagreement
//! is not reconcilable and always aborts.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ToleranceMode;
use crate::crs::CrsService;
use crate::descriptor::SourceDescriptor;
use crate::error::{CompositionError, Result};

/// Outcome of the consistency check, computed once per session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsistencyVerdict {
    /// True when every source shares the reference geometry exactly.
    pub homogeneous: bool,
    /// True when at least one envelope differed beyond tolerance.
    pub envelope_heterogeneous: bool,
    /// True when at least one grid range differed.
    pub grid_heterogeneous: bool,
    /// Index of the reference source (always the first).
    pub reference: usize,
}

/// Compares source descriptors against a reference.
pub struct ConsistencyChecker<'a> {
    crs: &'a dyn CrsService,
    envelope_tolerance: f64,
}

impl<'a> ConsistencyChecker<'a> {
    /// Create a checker using the given CRS capability and envelope
    /// tolerance (CRS units).
    pub fn new(crs: &'a dyn CrsService, envelope_tolerance: f64) -> Self {
        Self {
            crs,
            envelope_tolerance,
        }
    }

    /// Check that the sources can be legally merged.
    ///
    /// Comparison order per source: envelope, grid range, metadata names,
    /// CRS, pixel type. The first two are tolerance-dependent; the last
    /// three are always fatal on mismatch.
    pub fn open(
        &self,
        sources: &[SourceDescriptor],
        mode: ToleranceMode,
    ) -> Result<ConsistencyVerdict> {
        let reference = sources
            .first()
            .ok_or_else(|| CompositionError::no_usable_source("no sources to check"))?;

        let mut envelope_heterogeneous = false;
        let mut grid_heterogeneous = false;

        for source in &sources[1..] {
            // (1) Envelope, compared in the reference CRS
            let envelope = if self.crs.is_identity(source.crs, reference.crs) {
                source.envelope
            } else {
                self.crs
                    .transform_envelope(&source.envelope, source.crs, reference.crs)?
            };

            if !envelope.approx_eq(&reference.envelope, self.envelope_tolerance) {
                if mode == ToleranceMode::Strict {
                    return Err(CompositionError::EnvelopeMismatch(source.id.clone()));
                }
                if !self
                    .crs
                    .envelopes_intersect(&envelope, &reference.envelope, reference.crs)
                {
                    return Err(CompositionError::DisjointEnvelopes(source.id.clone()));
                }
                envelope_heterogeneous = true;
                debug!(
                    source = %source.id,
                    "envelope differs from reference, composing heterogeneous"
                );
            }

            // (2) Grid range
            if source.grid_range != reference.grid_range {
                if mode == ToleranceMode::Strict {
                    return Err(CompositionError::GridRangeMismatch {
                        source_id: source.id.clone(),
                        found: source.grid_range,
                        reference: reference.grid_range,
                    });
                }
                grid_heterogeneous = true;
                debug!(
                    source = %source.id,
                    "grid range differs from reference, composing heterogeneous"
                );
            }

            // (3) Metadata names: dimension metadata cannot be merged
            if source.metadata_names != reference.metadata_names {
                return Err(CompositionError::MetadataNameMismatch {
                    source_id: source.id.clone(),
                });
            }

            // (4) CRS: no on-the-fly reprojection inside composition
            if !self.crs.is_identity(source.crs, reference.crs) {
                return Err(CompositionError::CrsMismatch {
                    source_id: source.id.clone(),
                    found: source.crs,
                    reference: reference.crs,
                });
            }

            // (5) Pixel type: no numeric promotion
            if source.pixel_type != reference.pixel_type {
                return Err(CompositionError::PixelTypeMismatch {
                    source_id: source.id.clone(),
                    found: source.pixel_type,
                    reference: reference.pixel_type,
                });
            }
        }

        Ok(ConsistencyVerdict {
            homogeneous: !envelope_heterogeneous && !grid_heterogeneous,
            envelope_heterogeneous,
            grid_heterogeneous,
            reference: 0,
        })
    }
}
