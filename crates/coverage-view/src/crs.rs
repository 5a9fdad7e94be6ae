//! CRS capability, consumed from the projection layer.

use coverage_common::{CrsCode, Envelope};

use crate::error::{CompositionError, Result};

/// Opaque coordinate-reference-system operations.
///
/// The engine only asks three questions; full transform machinery lives
/// elsewhere.
pub trait CrsService: Send + Sync {
    /// True when the transform between the two CRSs is the identity.
    fn is_identity(&self, a: CrsCode, b: CrsCode) -> bool;

    /// Reproject an envelope into the target CRS.
    fn transform_envelope(&self, envelope: &Envelope, from: CrsCode, to: CrsCode)
        -> Result<Envelope>;

    /// True when the two envelopes, both in `crs`, intersect.
    fn envelopes_intersect(&self, a: &Envelope, b: &Envelope, crs: CrsCode) -> bool {
        let _ = crs;
        a.intersects(b)
    }
}

/// Pass-through service: two CRSs are identity-related only when their codes
/// are equal, and no reprojection is performed.
///
/// Sufficient for the composition engine, which rejects non-identity CRS
/// pairs at session open anyway.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalCrsService;

impl CrsService for LocalCrsService {
    fn is_identity(&self, a: CrsCode, b: CrsCode) -> bool {
        a == b
    }

    fn transform_envelope(
        &self,
        envelope: &Envelope,
        from: CrsCode,
        to: CrsCode,
    ) -> Result<Envelope> {
        if from == to {
            Ok(*envelope)
        } else {
            Err(CompositionError::Crs(format!(
                "no transform available from {} to {}",
                from, to
            )))
        }
    }
}
