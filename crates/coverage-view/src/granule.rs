//! Granule-level composition for structured sources.
//!
//! Some sources expose a queryable catalog of granules (sub-tiles carrying
//! time/elevation/... attributes) rather than a flat raster. A query against
//! the composed view becomes one query per contributing source; results are
//! joined back on every shared attribute, because a virtual granule only
//! exists where its contributing sources' granules coincide on those shared
//! dimensions.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use coverage_common::Envelope;

use crate::definition::SourceId;
use crate::error::{CompositionError, Result};

/// Value of one granule attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttributeValue {
    Text(String),
    Number(f64),
    Time(DateTime<Utc>),
}

/// One sub-tile of a structured coverage.
///
/// Geometry and identity live outside the attribute map; joins operate on
/// the attributes alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Granule {
    pub id: Uuid,
    pub envelope: Envelope,
    pub attributes: BTreeMap<String, AttributeValue>,
}

impl Granule {
    /// Create a granule with a fresh identity.
    pub fn new(envelope: Envelope, attributes: BTreeMap<String, AttributeValue>) -> Self {
        Self {
            id: Uuid::new_v4(),
            envelope,
            attributes,
        }
    }
}

/// Filter for granule queries.
///
/// # Example
///
/// ```rust
/// use coverage_view::granule::{AttributeValue, GranuleQuery};
///
/// let query = GranuleQuery::all()
///     .with_attribute("elevation", AttributeValue::Number(500.0));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GranuleQuery {
    /// Spatial filter; `None` matches everywhere.
    pub envelope: Option<Envelope>,
    /// Attribute equality filters, all of which must match.
    pub attributes: BTreeMap<String, AttributeValue>,
}

impl GranuleQuery {
    /// Match every granule.
    pub fn all() -> Self {
        Self::default()
    }

    /// Restrict to granules intersecting the envelope.
    pub fn with_envelope(mut self, envelope: Envelope) -> Self {
        self.envelope = Some(envelope);
        self
    }

    /// Require an attribute to equal a value.
    pub fn with_attribute(mut self, name: impl Into<String>, value: AttributeValue) -> Self {
        self.attributes.insert(name.into(), value);
        self
    }

    /// Check a granule against this filter.
    pub fn matches(&self, granule: &Granule) -> bool {
        if let Some(envelope) = &self.envelope {
            if !envelope.intersects(&granule.envelope) {
                return false;
            }
        }
        self.attributes
            .iter()
            .all(|(name, value)| granule.attributes.get(name) == Some(value))
    }
}

/// Granule catalog of one structured source.
pub trait GranuleSource: Send + Sync {
    /// Granules matching the query.
    fn query(&self, query: &GranuleQuery) -> Result<Vec<Granule>>;

    /// Remove matching granules from the source's store; returns the count
    /// removed.
    fn remove(&self, query: &GranuleQuery) -> Result<usize>;
}

/// Composed, read-mostly granule catalog over several structured sources.
pub struct StructuredGranuleView {
    sources: Vec<(SourceId, Arc<dyn GranuleSource>)>,
}

impl StructuredGranuleView {
    /// Build a view over the given sources. Order matters only for which
    /// source seeds the join.
    pub fn new(sources: Vec<(SourceId, Arc<dyn GranuleSource>)>) -> Self {
        Self { sources }
    }

    /// Query the composed catalog.
    ///
    /// Each source is queried independently; a virtual granule is emitted
    /// for every combination of per-source granules that agree on all
    /// shared attributes. The emitted envelope is the intersection of the
    /// contributing envelopes and the attributes are the union of theirs.
    /// The join is a nested-loop equality match; granule catalogs are
    /// orders of magnitude smaller than pixel data.
    pub fn query(&self, query: &GranuleQuery) -> Result<Vec<Granule>> {
        let (first, rest) = match self.sources.split_first() {
            Some(split) => split,
            None => return Ok(Vec::new()),
        };

        let mut composed = first.1.query(query)?;
        for (id, source) in rest {
            let candidates = source.query(query)?;
            composed = join(&composed, &candidates);
            debug!(source = %id, joined = composed.len(), "joined granule results");
            if composed.is_empty() {
                break;
            }
        }

        Ok(composed)
    }

    /// Forward a removal to every contributing source's store.
    ///
    /// Returns the total number of granules removed across all sources.
    pub fn remove(&self, query: &GranuleQuery) -> Result<usize> {
        let mut removed = 0;
        for (id, source) in &self.sources {
            let count = source.remove(query)?;
            debug!(source = %id, count, "forwarded granule removal");
            removed += count;
        }
        Ok(removed)
    }

    /// Granule insertion is rejected: the view is derived, not primary,
    /// storage.
    pub fn insert(&self, _granule: Granule) -> Result<()> {
        Err(CompositionError::InsertUnsupported)
    }
}

/// Nested-loop join on shared attributes.
fn join(left: &[Granule], right: &[Granule]) -> Vec<Granule> {
    let mut out = Vec::new();

    for a in left {
        for b in right {
            if !shared_attributes_agree(a, b) {
                continue;
            }
            let envelope = match a.envelope.intersection(&b.envelope) {
                Some(envelope) => envelope,
                None => continue,
            };

            let mut attributes = a.attributes.clone();
            for (name, value) in &b.attributes {
                attributes.entry(name.clone()).or_insert_with(|| value.clone());
            }
            out.push(Granule::new(envelope, attributes));
        }
    }

    out
}

/// True when every attribute key present in both granules holds the same
/// value.
fn shared_attributes_agree(a: &Granule, b: &Granule) -> bool {
    a.attributes.iter().all(|(name, value)| {
        b.attributes
            .get(name)
            .map(|other| other == value)
            .unwrap_or(true)
    })
}
