//! Constant-fill stand-ins for sources with no data in a requested region.
//!
//! A fill plan may only be built from a source that demonstrates a nodata
//! value on a sample read; a source with no discoverable nodata cannot be
//! filled and the composition for that request fails instead.

use coverage_common::{Envelope, Raster, RasterLayout};
use tracing::{debug, warn};

use crate::definition::SourceId;
use crate::descriptor::SourceDescriptor;
use crate::reader::{ReadRegion, SourceReader};

/// Pixel dimensions of the discovery probe.
const PROBE_PIXELS: usize = 2;

/// Recipe for synthesizing a constant-filled raster in place of a missing
/// source.
#[derive(Debug, Clone, PartialEq)]
pub struct FillPlan {
    pub source: SourceId,
    /// The demonstrated nodata value; every synthesized sample holds it.
    pub nodata: f64,
    /// Layout cloned from the sample read.
    pub layout: RasterLayout,
}

impl FillPlan {
    /// Probe the source with a small sample read and derive a fill plan
    /// from the returned raster.
    ///
    /// Returns `None` when no nodata value is discoverable: the probe
    /// returned nothing, the probe raster carries no nodata, or the probe
    /// itself failed.
    pub fn discover(reader: &dyn SourceReader, descriptor: &SourceDescriptor) -> Option<FillPlan> {
        let probe = probe_region(descriptor);

        match reader.read(&probe) {
            Ok(Some(sample)) => match sample.nodata() {
                Some(nodata) => {
                    debug!(source = %descriptor.id, nodata, "discovered fill plan");
                    Some(FillPlan {
                        source: descriptor.id.clone(),
                        nodata,
                        layout: sample.layout(),
                    })
                }
                None => {
                    warn!(source = %descriptor.id, "sample read carries no nodata value, source is unfillable");
                    None
                }
            },
            Ok(None) => {
                warn!(source = %descriptor.id, "sample read returned no data, source is unfillable");
                None
            }
            Err(e) => {
                warn!(source = %descriptor.id, error = %e, "sample read failed, source is unfillable");
                None
            }
        }
    }

    /// Synthesize the stand-in raster at the given geometry.
    pub fn synthesize(&self, width: usize, height: usize, envelope: Envelope) -> Raster {
        Raster::constant(width, height, envelope, &self.layout, self.nodata)
    }
}

/// A probe window in the source's lower-left corner, a few native pixels
/// wide.
fn probe_region(descriptor: &SourceDescriptor) -> ReadRegion {
    let envelope = &descriptor.envelope;
    let span_x = (descriptor.resolution.x * PROBE_PIXELS as f64).min(envelope.width());
    let span_y = (descriptor.resolution.y * PROBE_PIXELS as f64).min(envelope.height());

    ReadRegion::new(
        Envelope::new(
            envelope.min_x,
            envelope.min_y,
            envelope.min_x + span_x,
            envelope.min_y + span_y,
        ),
        PROBE_PIXELS,
        PROBE_PIXELS,
    )
}
