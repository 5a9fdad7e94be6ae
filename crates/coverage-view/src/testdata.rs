//! In-memory sources with predictable values for unit and integration
//! tests.
//!
//! [`MemorySource`] holds a full-resolution grid per band and serves window
//! reads by nearest-neighbor lookup, so a full-envelope read at native size
//! returns the stored values exactly. Value patterns follow the
//! col * 1000 + row convention used across the test suite.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};

use coverage_common::{
    Envelope, GridRange, GridToWorld, PixelAnchor, PixelType, Raster, RasterBand, Resolution,
};

use crate::catalog::{DimensionInfo, ViewCatalog};
use crate::definition::{SourceId, ViewDefinition};
use crate::descriptor::SourceDescriptor;
use crate::error::{CompositionError, Result};
use crate::granule::{Granule, GranuleQuery, GranuleSource};
use crate::reader::{ReadRegion, SourceReader, SourceReaderRegistry};

/// Create grid data where value at (col, row) = col * 1000 + row.
/// This pattern makes it easy to verify data integrity after reads.
pub fn indexed_grid(width: usize, height: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            data.push((col * 1000 + row) as f32);
        }
    }
    data
}

/// Create grid data holding a single value everywhere.
pub fn constant_grid(width: usize, height: usize, value: f32) -> Vec<f32> {
    vec![value; width * height]
}

/// Build a descriptor whose resolution is derived from the envelope and
/// grid range, with single-band float32 defaults.
pub fn descriptor_with(
    id: &str,
    envelope: Envelope,
    grid_range: GridRange,
    pixel_type: PixelType,
) -> SourceDescriptor {
    SourceDescriptor {
        id: SourceId::new(id),
        crs: coverage_common::CrsCode::Epsg4326,
        envelope,
        grid_range,
        resolution: Resolution::new(
            envelope.width() / grid_range.width as f64,
            envelope.height() / grid_range.height as f64,
        ),
        overview_resolutions: Vec::new(),
        band_count: 1,
        pixel_type,
        nodata: None,
        metadata_names: BTreeSet::new(),
        has_alpha: false,
        version: 1,
    }
}

/// When a [`MemorySource`] answers reads with data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadMode {
    /// Serve every intersecting request.
    #[default]
    Always,
    /// Never serve data (source with nothing anywhere).
    Never,
    /// Serve only tiny requests (4 pixels or fewer). Simulates a source
    /// whose data misses the requested windows but that still demonstrates
    /// its nodata on a sample read.
    SampleOnly,
}

/// An in-memory source coverage.
pub struct MemorySource {
    descriptor: SourceDescriptor,
    bands: Vec<Vec<f32>>,
    mode: ReadMode,
    inject_alpha: bool,
}

impl MemorySource {
    /// Create a source from full-resolution band grids (row-major,
    /// `grid_range` sized). The descriptor's band count is synced to the
    /// number of grids.
    pub fn new(mut descriptor: SourceDescriptor, bands: Vec<Vec<f32>>) -> Self {
        descriptor.band_count = bands.len();
        Self {
            descriptor,
            bands,
            mode: ReadMode::Always,
            inject_alpha: false,
        }
    }

    /// Set the read mode.
    pub fn with_mode(mut self, mode: ReadMode) -> Self {
        self.mode = mode;
        self
    }

    /// Append an opaque alpha band to every returned raster while the
    /// descriptor keeps reporting no alpha, like a reader injecting a
    /// footprint mask.
    pub fn with_injected_alpha(mut self) -> Self {
        self.inject_alpha = true;
        self
    }

    pub fn descriptor(&self) -> &SourceDescriptor {
        &self.descriptor
    }
}

impl SourceReader for MemorySource {
    fn describe(&self) -> Result<SourceDescriptor> {
        Ok(self.descriptor.clone())
    }

    fn read(&self, region: &ReadRegion) -> Result<Option<Raster>> {
        match self.mode {
            ReadMode::Never => return Ok(None),
            ReadMode::SampleOnly if region.width * region.height > 4 => return Ok(None),
            _ => {}
        }

        if !region.envelope.intersects(&self.descriptor.envelope) {
            return Ok(None);
        }

        let native = GridToWorld::from_envelope(
            &self.descriptor.envelope,
            &self.descriptor.grid_range,
            PixelAnchor::CellCorner,
        );
        let width = self.descriptor.grid_range.width;
        let height = self.descriptor.grid_range.height;
        let fill = self.descriptor.nodata.unwrap_or(f64::NAN) as f32;

        let mut raster = Raster::new(
            region.width,
            region.height,
            region.envelope,
            self.descriptor.pixel_type,
        );
        if let Some(nodata) = self.descriptor.nodata {
            raster = raster.with_nodata(nodata);
        }

        for band in &self.bands {
            let mut samples = Vec::with_capacity(region.width * region.height);
            for row in 0..region.height {
                for col in 0..region.width {
                    // Nearest-neighbor lookup at the output cell center
                    let x = region.envelope.min_x
                        + (col as f64 + 0.5) * region.envelope.width() / region.width as f64;
                    let y = region.envelope.max_y
                        - (row as f64 + 0.5) * region.envelope.height() / region.height as f64;
                    let (ncol, nrow) = native.world_to_pixel(x, y);
                    let (ncol, nrow) = (ncol.floor() as isize, nrow.floor() as isize);

                    let value = if ncol >= 0
                        && nrow >= 0
                        && (ncol as usize) < width
                        && (nrow as usize) < height
                    {
                        band[nrow as usize * width + ncol as usize]
                    } else {
                        fill
                    };
                    samples.push(value);
                }
            }
            raster.push_band(RasterBand::data(samples))?;
        }

        if self.inject_alpha {
            raster.push_band(RasterBand::alpha(vec![
                255.0;
                region.width * region.height
            ]))?;
        }

        Ok(Some(raster))
    }
}

/// Registry over in-memory sources.
#[derive(Default)]
pub struct MemoryRegistry {
    sources: HashMap<SourceId, Arc<MemorySource>>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a source under its descriptor's id.
    pub fn insert(&mut self, source: MemorySource) {
        self.sources
            .insert(source.descriptor.id.clone(), Arc::new(source));
    }
}

impl SourceReaderRegistry for MemoryRegistry {
    fn open(&self, id: &SourceId) -> Result<Arc<dyn SourceReader>> {
        self.sources
            .get(id)
            .cloned()
            .map(|s| s as Arc<dyn SourceReader>)
            .ok_or_else(|| CompositionError::UnknownSource(id.clone()))
    }
}

/// In-memory catalog of stored view definitions and dimension metadata.
#[derive(Default)]
pub struct MemoryCatalog {
    definitions: HashMap<SourceId, ViewDefinition>,
    dimensions: HashMap<SourceId, Vec<DimensionInfo>>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a view definition under a coverage id.
    pub fn insert_definition(&mut self, coverage: impl Into<SourceId>, view: ViewDefinition) {
        self.definitions.insert(coverage.into(), view);
    }

    /// Store dimension metadata under a coverage id.
    pub fn insert_dimensions(
        &mut self,
        coverage: impl Into<SourceId>,
        dimensions: Vec<DimensionInfo>,
    ) {
        self.dimensions.insert(coverage.into(), dimensions);
    }
}

impl ViewCatalog for MemoryCatalog {
    fn load_view_definition(&self, coverage: &SourceId) -> Result<ViewDefinition> {
        self.definitions
            .get(coverage)
            .cloned()
            .ok_or_else(|| CompositionError::catalog(format!("no view stored for '{coverage}'")))
    }

    fn load_dimension_metadata(&self, coverage: &SourceId) -> Result<Vec<DimensionInfo>> {
        self.dimensions
            .get(coverage)
            .cloned()
            .ok_or_else(|| {
                CompositionError::catalog(format!("no dimension metadata stored for '{coverage}'"))
            })
    }
}

/// In-memory granule catalog.
pub struct MemoryGranuleStore {
    granules: Mutex<Vec<Granule>>,
}

impl MemoryGranuleStore {
    pub fn new(granules: Vec<Granule>) -> Self {
        Self {
            granules: Mutex::new(granules),
        }
    }

    /// Number of granules currently stored.
    pub fn len(&self) -> usize {
        self.granules.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl GranuleSource for MemoryGranuleStore {
    fn query(&self, query: &GranuleQuery) -> Result<Vec<Granule>> {
        Ok(self
            .granules
            .lock()
            .unwrap()
            .iter()
            .filter(|g| query.matches(g))
            .cloned()
            .collect())
    }

    fn remove(&self, query: &GranuleQuery) -> Result<usize> {
        let mut granules = self.granules.lock().unwrap();
        let before = granules.len();
        granules.retain(|g| !query.matches(g));
        Ok(before - granules.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indexed_grid_pattern() {
        let grid = indexed_grid(10, 5);
        assert_eq!(grid.len(), 50);
        assert_eq!(grid[0], 0.0); // col=0, row=0
        assert_eq!(grid[1], 1000.0); // col=1, row=0
        assert_eq!(grid[10], 1.0); // col=0, row=1
    }

    #[test]
    fn test_full_envelope_read_is_exact() {
        let range = GridRange::new(8, 8);
        let envelope = Envelope::new(0.0, 0.0, 8.0, 8.0);
        let source = MemorySource::new(
            descriptor_with("src", envelope, range, PixelType::Float32),
            vec![indexed_grid(8, 8)],
        );

        let raster = source
            .read(&ReadRegion::new(envelope, 8, 8))
            .unwrap()
            .unwrap();

        for row in 0..8 {
            for col in 0..8 {
                assert_eq!(
                    raster.get(0, col, row),
                    Some((col * 1000 + row) as f32),
                    "mismatch at ({col}, {row})"
                );
            }
        }
    }

    #[test]
    fn test_read_outside_envelope_is_none() {
        let range = GridRange::new(8, 8);
        let envelope = Envelope::new(0.0, 0.0, 8.0, 8.0);
        let source = MemorySource::new(
            descriptor_with("src", envelope, range, PixelType::Float32),
            vec![indexed_grid(8, 8)],
        );

        let far = ReadRegion::new(Envelope::new(100.0, 100.0, 108.0, 108.0), 8, 8);
        assert!(source.read(&far).unwrap().is_none());
    }

    #[test]
    fn test_sample_only_mode() {
        let range = GridRange::new(8, 8);
        let envelope = Envelope::new(0.0, 0.0, 8.0, 8.0);
        let source = MemorySource::new(
            descriptor_with("src", envelope, range, PixelType::Float32),
            vec![indexed_grid(8, 8)],
        )
        .with_mode(ReadMode::SampleOnly);

        assert!(source
            .read(&ReadRegion::new(envelope, 8, 8))
            .unwrap()
            .is_none());
        assert!(source
            .read(&ReadRegion::new(
                Envelope::new(0.0, 0.0, 2.0, 2.0),
                2,
                2
            ))
            .unwrap()
            .is_some());
    }

    #[test]
    fn test_injected_alpha() {
        let range = GridRange::new(4, 4);
        let envelope = Envelope::new(0.0, 0.0, 4.0, 4.0);
        let source = MemorySource::new(
            descriptor_with("src", envelope, range, PixelType::Float32),
            vec![indexed_grid(4, 4)],
        )
        .with_injected_alpha();

        assert!(!source.descriptor().has_alpha);
        let raster = source
            .read(&ReadRegion::new(envelope, 4, 4))
            .unwrap()
            .unwrap();
        assert!(raster.has_alpha());
        assert_eq!(raster.data_band_count(), 1);
    }
}
