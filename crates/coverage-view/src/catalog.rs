//! Catalog metadata store, consumed as an interface.
//!
//! The engine reads view definitions and dimension metadata from whatever
//! store the host application provides; it never writes back.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::definition::{SourceId, ViewDefinition};
use crate::error::Result;

/// Metadata for one dimension of a coverage (time, elevation, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionInfo {
    /// Dimension name (e.g. "time", "elevation").
    pub name: String,

    /// Units (e.g. "ISO8601", "hPa", "m").
    pub units: Option<String>,

    /// Available values.
    pub extent: DimensionExtent,
}

/// The value space of a dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DimensionExtent {
    /// Explicit list of values.
    Values(Vec<String>),

    /// Continuous time interval.
    TimeInterval {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

/// Read access to the catalog's stored configuration for composed coverages.
pub trait ViewCatalog: Send + Sync {
    /// Fetch the stored definition of a composed coverage.
    fn load_view_definition(&self, coverage: &SourceId) -> Result<ViewDefinition>;

    /// Fetch the dimension metadata of a coverage.
    fn load_dimension_metadata(&self, coverage: &SourceId) -> Result<Vec<DimensionInfo>>;
}
