//! Derived description of a source coverage.

use std::collections::BTreeSet;

use coverage_common::{CrsCode, Envelope, GridRange, PixelType, Resolution};
use serde::{Deserialize, Serialize};

use crate::definition::SourceId;

/// Everything the composition engine needs to know about one source
/// coverage, built once per session by querying the source's reader.
///
/// Not persisted; the `version` stamp changes whenever the underlying source
/// configuration changes, and session caches compare it on lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceDescriptor {
    pub id: SourceId,
    pub crs: CrsCode,
    /// Full extent in the source CRS.
    pub envelope: Envelope,
    /// Native pixel rectangle.
    pub grid_range: GridRange,
    /// Native per-axis pixel size.
    pub resolution: Resolution,
    /// Coarser overview levels, finest first. Empty when the source exposes
    /// only its native resolution.
    pub overview_resolutions: Vec<Resolution>,
    /// Number of data bands.
    pub band_count: usize,
    pub pixel_type: PixelType,
    /// Nodata sentinel declared by the source, if any.
    pub nodata: Option<f64>,
    /// Names of the dimension/metadata entries the source exposes.
    pub metadata_names: BTreeSet<String>,
    /// Whether the native layout declares an alpha channel.
    pub has_alpha: bool,
    /// Version stamp of the underlying source configuration.
    pub version: u64,
}

impl SourceDescriptor {
    /// All resolution levels, native first.
    pub fn resolution_levels(&self) -> Vec<Resolution> {
        let mut levels = Vec::with_capacity(1 + self.overview_resolutions.len());
        levels.push(self.resolution);
        levels.extend(self.overview_resolutions.iter().copied());
        levels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_levels_native_first() {
        let descriptor = SourceDescriptor {
            id: SourceId::new("src"),
            crs: CrsCode::Epsg4326,
            envelope: Envelope::new(0.0, 0.0, 10.0, 10.0),
            grid_range: GridRange::new(100, 100),
            resolution: Resolution::new(0.1, 0.1),
            overview_resolutions: vec![Resolution::new(0.2, 0.2), Resolution::new(0.4, 0.4)],
            band_count: 1,
            pixel_type: PixelType::Float32,
            nodata: None,
            metadata_names: BTreeSet::new(),
            has_alpha: false,
            version: 1,
        };

        let levels = descriptor.resolution_levels();
        assert_eq!(levels.len(), 3);
        assert_eq!(levels[0], Resolution::new(0.1, 0.1));
        assert_eq!(levels[2], Resolution::new(0.4, 0.4));
    }
}
