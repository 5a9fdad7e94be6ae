//! Source reader capability, consumed from the format layer.
//!
//! The engine never decodes raster formats itself; it is handed an opaque
//! reader per source and treats `Ok(None)` from [`SourceReader::read`]
//! exactly like a physical reader's "no data for this region".

use std::sync::Arc;

use coverage_common::{Envelope, Raster};

use crate::definition::SourceId;
use crate::descriptor::SourceDescriptor;
use crate::error::Result;

/// A read request: the world-space window and the output pixel dimensions.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadRegion {
    pub envelope: Envelope,
    pub width: usize,
    pub height: usize,
}

impl ReadRegion {
    /// Create a new read region.
    pub fn new(envelope: Envelope, width: usize, height: usize) -> Self {
        Self {
            envelope,
            width,
            height,
        }
    }
}

/// Read capability over one source coverage.
///
/// Implementations wrap a concrete format reader (file, tile store, ...).
/// `read` returning `Ok(None)` means the region holds no data and is not an
/// error.
pub trait SourceReader: Send + Sync {
    /// Describe the source: geometry, bands, pixel type, metadata names.
    fn describe(&self) -> Result<SourceDescriptor>;

    /// Read a raster for the region, or `None` when the source has no data
    /// there.
    fn read(&self, region: &ReadRegion) -> Result<Option<Raster>>;
}

/// Registry resolving source ids to reader handles.
pub trait SourceReaderRegistry: Send + Sync {
    /// Open a reader for the source, or fail when the id is unknown.
    fn open(&self, id: &SourceId) -> Result<Arc<dyn SourceReader>>;
}
