//! Per-request read path: read, fill, band-select, merge.
//!
//! The pipeline is an ordered sequence of stages over `Option<Raster>`
//! values rather than a chain of nested reader wrappers, so each stage's
//! contract is independently testable:
//!
//! ```text
//! read(region)
//!      │
//!      ├─► 1. read every referenced source once
//!      │
//!      ├─► 2. fill-plan discovery for tolerated gaps
//!      │        (unfillable gap -> no data for this request)
//!      │
//!      ├─► 3. synthesize constant stand-ins at the present geometry
//!      │
//!      ├─► 4. select the requested band from each source raster
//!      │
//!      └─► 5. merge single-band rasters in output order,
//!             carrying incidental alpha through
//! ```
//!
//! A read never invalidates its session; transient absence of data is
//! `Ok(None)`, exactly like a physical reader.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use coverage_common::{BandRole, Raster, RasterBand};
use tracing::{debug, warn};

use crate::config::{ReadOptions, ToleranceMode};
use crate::definition::{EnvelopePolicy, OutputBand, SourceId};
use crate::error::{CompositionError, Result};
use crate::fill::FillPlan;
use crate::handler::CompositionHandler;
use crate::reader::{ReadRegion, SourceReader};

/// Read path over an opened composition session.
///
/// Stateless across requests; safe to share behind the session's `Arc`.
pub struct ReadPipeline {
    session: Arc<CompositionHandler>,
}

impl ReadPipeline {
    /// Create a pipeline over an opened session.
    pub fn new(session: Arc<CompositionHandler>) -> Self {
        Self { session }
    }

    /// The session this pipeline reads through.
    pub fn session(&self) -> &Arc<CompositionHandler> {
        &self.session
    }

    /// Read every output band for the region.
    pub fn read(&self, region: &ReadRegion) -> Result<Option<Raster>> {
        self.read_with(region, &ReadOptions::all())
    }

    /// Read a subset of output bands for the region.
    pub fn read_with(&self, region: &ReadRegion, options: &ReadOptions) -> Result<Option<Raster>> {
        let selected = self.select_bands(options)?;
        let source_ids = distinct_sources(&selected);

        // Stage 1: read every referenced source once
        let mut present: HashMap<SourceId, Raster> = HashMap::with_capacity(source_ids.len());
        let mut missing: Vec<SourceId> = Vec::new();

        for id in &source_ids {
            let reader = self
                .session
                .reader(id)
                .ok_or_else(|| CompositionError::UnknownSource((*id).clone()))?;

            match reader.read(region) {
                Ok(Some(raster)) => {
                    let descriptor = self.session.descriptor(id);
                    if raster.has_alpha() && descriptor.map_or(true, |d| !d.has_alpha) {
                        debug!(source = %id, "source injected an alpha channel, preserving it");
                    }
                    present.insert((*id).clone(), raster);
                }
                Ok(None) => missing.push((*id).clone()),
                Err(e) => {
                    warn!(source = %id, error = %e, "source read failed, returning no data");
                    return Ok(None);
                }
            }
        }

        if present.is_empty() {
            debug!(view = self.session.definition().name(), "no source returned data");
            return Ok(None);
        }

        // Stage 2: fill-plan discovery for the gaps
        let mut fills: Vec<FillPlan> = Vec::with_capacity(missing.len());
        if !missing.is_empty() {
            if !self.tolerates_missing() {
                debug!(
                    view = self.session.definition().name(),
                    missing = missing.len(),
                    "missing sources are not tolerated, returning no data"
                );
                return Ok(None);
            }

            for id in &missing {
                let reader = self
                    .session
                    .reader(id)
                    .ok_or_else(|| CompositionError::UnknownSource(id.clone()))?;
                let descriptor = self
                    .session
                    .descriptor(id)
                    .ok_or_else(|| CompositionError::UnknownSource(id.clone()))?;

                match FillPlan::discover(reader.as_ref(), descriptor) {
                    Some(plan) => fills.push(plan),
                    None => {
                        warn!(source = %id, "missing source is unfillable, returning no data");
                        return Ok(None);
                    }
                }
            }
        }

        // Stage 3: synthesize stand-ins at the geometry of the first
        // present source, so cross-filled bands agree by construction
        let template = source_ids
            .iter()
            .find_map(|id| present.get(*id))
            .map(|r| (r.width(), r.height(), *r.envelope()));
        let (width, height, envelope) = template.ok_or_else(|| {
            CompositionError::geometry_mismatch("no present raster to anchor fill geometry")
        })?;

        for plan in fills {
            let source = plan.source.clone();
            present.insert(source, plan.synthesize(width, height, envelope));
        }

        // Stage 4: per-band extraction
        let mut parts: Vec<(&OutputBand, Raster)> = Vec::with_capacity(selected.len());
        for band in &selected {
            let band_ref = band.input();
            let raster = present.get(&band_ref.source).ok_or_else(|| {
                CompositionError::UnknownSource(band_ref.source.clone())
            })?;

            let single = raster.select_data_band(band_ref.band).ok_or_else(|| {
                CompositionError::geometry_mismatch(format!(
                    "source '{}' returned {} data bands, band {} was expected",
                    band_ref.source,
                    raster.data_band_count(),
                    band_ref.band
                ))
            })?;
            parts.push((band, single));
        }

        // Stage 5: merge, in output order
        self.merge(parts).map(Some)
    }

    /// Concatenate single-band rasters into the composed output.
    ///
    /// Pure data layout; geometry must already agree, and disagreement is
    /// a loud error rather than a silent truncation.
    fn merge(&self, parts: Vec<(&OutputBand, Raster)>) -> Result<Raster> {
        let tolerance = self.session.config().envelope_tolerance;
        let first = &parts[0].1;

        for (band, part) in &parts[1..] {
            if !part.same_geometry(first, tolerance) {
                return Err(CompositionError::geometry_mismatch(format!(
                    "band '{}' is {}x{} over {:?}, first band is {}x{} over {:?}",
                    band.label,
                    part.width(),
                    part.height(),
                    part.envelope(),
                    first.width(),
                    first.height(),
                    first.envelope()
                )));
            }
        }

        let mut out = Raster::new(
            first.width(),
            first.height(),
            *first.envelope(),
            first.pixel_type(),
        );
        if let Some(nodata) = first.nodata() {
            out = out.with_nodata(nodata);
        }

        // Data bands first, then each contributing source's alpha once
        let mut alphas: Vec<(SourceId, Vec<RasterBand>)> = Vec::new();
        let mut alpha_seen: HashSet<SourceId> = HashSet::new();

        let mut data_bands: Vec<RasterBand> = Vec::with_capacity(parts.len());
        for (band, part) in parts {
            let source = band.input().source.clone();
            let mut data = None;
            let mut part_alphas = Vec::new();

            for raster_band in part.into_bands() {
                match raster_band.role {
                    BandRole::Data => data = Some(raster_band),
                    BandRole::Alpha => part_alphas.push(raster_band),
                }
            }

            let data = data.ok_or_else(|| {
                CompositionError::geometry_mismatch(format!(
                    "band '{}' lost its data channel during selection",
                    band.label
                ))
            })?;
            data_bands.push(data.named(&band.label));

            if !part_alphas.is_empty() && alpha_seen.insert(source.clone()) {
                alphas.push((source, part_alphas));
            }
        }

        for band in data_bands {
            out.push_band(band)?;
        }
        for (_, bands) in alphas {
            for band in bands {
                out.push_band(band)?;
            }
        }

        debug!(
            view = self.session.definition().name(),
            bands = out.band_count(),
            "composed raster"
        );
        Ok(out)
    }

    /// Resolve the output bands a read addresses.
    fn select_bands(&self, options: &ReadOptions) -> Result<Vec<&OutputBand>> {
        let bands = self.session.definition().bands();
        match &options.bands {
            None => Ok(bands.iter().collect()),
            Some(indices) => {
                let mut selected = Vec::with_capacity(indices.len());
                for &index in indices {
                    let band = bands.get(index).ok_or_else(|| {
                        CompositionError::ConfigError(format!(
                            "read selects output band {}, view '{}' has {}",
                            index,
                            self.session.definition().name(),
                            bands.len()
                        ))
                    })?;
                    selected.push(band);
                }
                Ok(selected)
            }
        }
    }

    /// Whether a source with no data may be replaced by a fill.
    ///
    /// Strict tolerance and intersection composition both demand every
    /// source; only a lenient union composition with fill enabled tolerates
    /// gaps.
    fn tolerates_missing(&self) -> bool {
        let config = self.session.config();
        config.fill_missing
            && config.tolerance_mode == ToleranceMode::Lenient
            && self.session.definition().envelope_policy() == EnvelopePolicy::Union
    }
}

/// A composed coverage answers the same contract as any single physical
/// coverage, so callers written against one reader work unmodified against
/// a view.
impl SourceReader for ReadPipeline {
    fn describe(&self) -> Result<crate::descriptor::SourceDescriptor> {
        let session = &self.session;
        let reference = session.reference();
        let levels = session.effective_resolution_levels();

        Ok(crate::descriptor::SourceDescriptor {
            id: SourceId::new(session.definition().name()),
            crs: reference.crs,
            envelope: session.effective_envelope(),
            grid_range: session.effective_grid_range(),
            resolution: levels[0],
            overview_resolutions: levels[1..].to_vec(),
            band_count: session.definition().bands().len(),
            pixel_type: reference.pixel_type,
            nodata: reference.nodata,
            metadata_names: reference.metadata_names.clone(),
            has_alpha: session.sources().iter().any(|s| s.has_alpha),
            version: session
                .sources()
                .iter()
                .fold(0u64, |acc, s| acc.wrapping_add(s.version)),
        })
    }

    fn read(&self, region: &ReadRegion) -> Result<Option<Raster>> {
        ReadPipeline::read(self, region)
    }
}

/// Distinct sources referenced by the bands, in first-use order.
fn distinct_sources<'a>(bands: &[&'a OutputBand]) -> Vec<&'a SourceId> {
    let mut seen = Vec::new();
    for band in bands {
        for band_ref in &band.refs {
            if !seen.contains(&&band_ref.source) {
                seen.push(&band_ref.source);
            }
        }
    }
    seen
}
