//! Coverage View Composition Engine
//!
//! This crate composes several independently-stored raster coverages into
//! one logical virtual coverage, exposed through the same read contract as
//! a physical one. It enables:
//!
//! - **Band stacking**: output bands drawn from different source coverages
//! - **Geometry reconciliation**: union/intersection envelopes, best/worst
//!   resolution selection across heterogeneous sources
//! - **Gap filling**: constant nodata stand-ins for sources with no data in
//!   a requested region
//!
//! # Architecture
//!
//! ```text
//! Tile/WCS request
//!      │
//!      ▼
//! ReadPipeline::read(region)
//!      │
//!      ├─► CompositionHandler (session, opened once)
//!      │         │
//!      │         ├─► SourceReaderRegistry: describe each source
//!      │         │
//!      │         ├─► ConsistencyChecker: mergeable? homogeneous?
//!      │         │
//!      │         └─► compose_envelope / compose_resolution
//!      │
//!      ├─► read each source, fill tolerated gaps
//!      │
//!      └─► band-select + merge into one raster
//!               │
//!               ▼
//!          Return to renderer
//! ```
//!
//! # Example
//!
//! ```ignore
//! use coverage_view::{
//!     CompositionConfig, CompositionHandler, LocalCrsService, ReadPipeline,
//!     ReadRegion, ViewDefinition,
//! };
//!
//! let view = ViewDefinition::builder("false_color")
//!     .band("nir", "landsat_b5", 0)
//!     .band("red", "landsat_b4", 0)
//!     .band("green", "landsat_b3", 0)
//!     .build()?;
//!
//! let session = CompositionHandler::open(
//!     view,
//!     &registry,
//!     &LocalCrsService,
//!     CompositionConfig::default(),
//! )?;
//!
//! let pipeline = ReadPipeline::new(std::sync::Arc::new(session));
//! let raster = pipeline.read(&ReadRegion::new(bbox, 256, 256))?;
//! ```

pub mod cache;
pub mod catalog;
pub mod compose;
pub mod config;
pub mod consistency;
pub mod crs;
pub mod definition;
pub mod descriptor;
pub mod error;
pub mod fill;
pub mod granule;
pub mod handler;
pub mod pipeline;
pub mod reader;
pub mod testdata;

// Re-export commonly used types at crate root
pub use cache::{CacheStats, SessionCache};
pub use catalog::{DimensionExtent, DimensionInfo, ViewCatalog};
pub use compose::{compose_envelope, compose_resolution, derive_grid_range, ComposedResolution};
pub use config::{CompositionConfig, ReadOptions, ToleranceMode};
pub use consistency::{ConsistencyChecker, ConsistencyVerdict};
pub use crs::{CrsService, LocalCrsService};
pub use definition::{
    CompositionKind, EnvelopePolicy, InputBandRef, OutputBand, ResolutionPolicy, SourceId,
    ViewDefinition, ViewDefinitionBuilder,
};
pub use descriptor::SourceDescriptor;
pub use error::{CompositionError, Result};
pub use fill::FillPlan;
pub use granule::{
    AttributeValue, Granule, GranuleQuery, GranuleSource, StructuredGranuleView,
};
pub use handler::{CompositionHandler, EffectiveGeometry, SourceSetToken};
pub use pipeline::ReadPipeline;
pub use reader::{ReadRegion, SourceReader, SourceReaderRegistry};
