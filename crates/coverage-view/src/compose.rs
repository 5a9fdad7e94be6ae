//! Geometry reconciliation across heterogeneous sources.
//!
//! Two independent composition axes, each a closed-enum strategy: the
//! envelope policy grows or shrinks the composed extent, the resolution
//! policy picks which source's pixel size wins. A candidate replaces the
//! running resolution choice only when it is strictly better on BOTH axes,
//! so an axis-inconsistent source can never oscillate the selection.

use coverage_common::{Envelope, GridRange, Resolution};
use tracing::debug;

use crate::definition::{EnvelopePolicy, ResolutionPolicy};
use crate::descriptor::SourceDescriptor;
use crate::error::{CompositionError, Result};

/// The resolution selected by [`compose_resolution`], with the source that
/// achieved it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComposedResolution {
    pub resolution: Resolution,
    /// Index into the source list of the winning source; subsequent reads
    /// treat it as the reference.
    pub reference: usize,
}

/// Reconcile one envelope from every source's extent.
pub fn compose_envelope(
    sources: &[SourceDescriptor],
    policy: EnvelopePolicy,
) -> Result<Envelope> {
    let first = sources
        .first()
        .ok_or_else(|| CompositionError::no_usable_source("no sources to compose an envelope"))?;

    let mut composed = first.envelope;
    for source in &sources[1..] {
        composed = match policy {
            EnvelopePolicy::Union => composed.union(&source.envelope),
            EnvelopePolicy::Intersection => {
                composed.intersection(&source.envelope).ok_or_else(|| {
                    CompositionError::DisjointEnvelopes(source.id.clone())
                })?
            }
        };
    }

    Ok(composed)
}

/// Select the effective resolution across all sources.
pub fn compose_resolution(
    sources: &[SourceDescriptor],
    policy: ResolutionPolicy,
) -> Result<ComposedResolution> {
    if sources.is_empty() {
        return Err(CompositionError::no_usable_source(
            "no sources to compose a resolution",
        ));
    }

    let chosen = match policy {
        ResolutionPolicy::Fixed(index) => {
            if index >= sources.len() {
                return Err(CompositionError::FixedResolutionOutOfRange {
                    index,
                    sources: sources.len(),
                });
            }
            ComposedResolution {
                resolution: sources[index].resolution,
                reference: index,
            }
        }
        ResolutionPolicy::Best | ResolutionPolicy::Worst => {
            let mut best = ComposedResolution {
                resolution: sources[0].resolution,
                reference: 0,
            };
            for (index, source) in sources.iter().enumerate().skip(1) {
                let replaces = match policy {
                    ResolutionPolicy::Best => source.resolution.finer_than(&best.resolution),
                    ResolutionPolicy::Worst => source.resolution.coarser_than(&best.resolution),
                    ResolutionPolicy::Fixed(_) => unreachable!(),
                };
                if replaces {
                    best = ComposedResolution {
                        resolution: source.resolution,
                        reference: index,
                    };
                }
            }
            best
        }
    };

    debug!(
        reference = %sources[chosen.reference].id,
        res_x = chosen.resolution.x,
        res_y = chosen.resolution.y,
        "composed resolution"
    );
    Ok(chosen)
}

/// Derive the composed pixel rectangle from the reconciled envelope and
/// resolution: `ceil(span / pixel size)` per axis.
///
/// Used on the heterogeneous path only; the homogeneous path passes the
/// reference source's native range through to avoid rounding drift.
pub fn derive_grid_range(envelope: &Envelope, resolution: &Resolution) -> GridRange {
    GridRange::new(
        (envelope.width() / resolution.x).ceil() as usize,
        (envelope.height() / resolution.y).ceil() as usize,
    )
}
