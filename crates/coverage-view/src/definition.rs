//! Declarative model of a composed coverage.
//!
//! A [`ViewDefinition`] is the recipe a catalog stores for a virtual
//! coverage: which output bands it exposes and which source band each one is
//! drawn from. Definitions are built through a validating builder and are
//! read-only at request time.
//!
//! # Example
//!
//! ```rust
//! use coverage_view::{EnvelopePolicy, ResolutionPolicy, ViewDefinition};
//!
//! let view = ViewDefinition::builder("ndvi_inputs")
//!     .envelope_policy(EnvelopePolicy::Union)
//!     .resolution_policy(ResolutionPolicy::Best)
//!     .band("red", "landsat_red", 0)
//!     .band("nir", "landsat_nir", 0)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(view.bands().len(), 2);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{CompositionError, Result};

/// Unique identifier for a source coverage.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourceId(pub String);

impl SourceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for SourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SourceId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for SourceId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&SourceId> for SourceId {
    fn from(s: &SourceId) -> Self {
        s.clone()
    }
}

/// How the effective envelope is reconciled across sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EnvelopePolicy {
    /// Grow a running envelope to include every source's envelope.
    #[default]
    Union,
    /// Shrink to the extent every source covers.
    Intersection,
}

/// How the effective resolution is selected across sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResolutionPolicy {
    /// Keep the finest pixel size seen on both axes.
    Best,
    /// Keep the coarsest pixel size seen on both axes.
    Worst,
    /// Use the native resolution of the source at this index.
    Fixed(usize),
}

impl Default for ResolutionPolicy {
    fn default() -> Self {
        Self::Best
    }
}

/// Reference to one band of one source coverage.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InputBandRef {
    /// The source coverage to read from.
    pub source: SourceId,
    /// Band index within that source (data bands only).
    pub band: usize,
}

impl InputBandRef {
    pub fn new(source: impl Into<SourceId>, band: usize) -> Self {
        Self {
            source: source.into(),
            band,
        }
    }
}

/// How an output band is derived from its input refs.
///
/// Closed enum; formula evaluation over multiple refs is reserved and
/// currently rejected at build time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CompositionKind {
    /// Copy a single source band through unchanged.
    #[default]
    BandSelect,
}

/// One band of the composed output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputBand {
    /// Position in the composed output; also the position in
    /// [`ViewDefinition::bands`].
    pub index: usize,
    /// Textual definition label, used as the output sample-dimension name.
    pub label: String,
    /// Source bands feeding this output band.
    pub refs: Vec<InputBandRef>,
    /// How the refs are combined.
    pub kind: CompositionKind,
}

impl OutputBand {
    /// The single input ref of a band-selection output band.
    ///
    /// Build-time validation guarantees exactly one ref under
    /// [`CompositionKind::BandSelect`].
    pub fn input(&self) -> &InputBandRef {
        &self.refs[0]
    }
}

/// The declarative recipe for a composed coverage.
///
/// Invariants after [`ViewDefinitionBuilder::build`]:
/// - at least one output band
/// - band order is the output band order and never changes
/// - every band's ref count matches its composition kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewDefinition {
    name: String,
    bands: Vec<OutputBand>,
    envelope_policy: EnvelopePolicy,
    resolution_policy: ResolutionPolicy,
}

impl ViewDefinition {
    /// Start building a definition.
    pub fn builder(name: impl Into<String>) -> ViewDefinitionBuilder {
        ViewDefinitionBuilder {
            name: name.into(),
            bands: Vec::new(),
            envelope_policy: EnvelopePolicy::default(),
            resolution_policy: ResolutionPolicy::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Output bands in output order.
    pub fn bands(&self) -> &[OutputBand] {
        &self.bands
    }

    pub fn envelope_policy(&self) -> EnvelopePolicy {
        self.envelope_policy
    }

    pub fn resolution_policy(&self) -> ResolutionPolicy {
        self.resolution_policy
    }

    /// Distinct sources referenced by this view, in first-use order.
    pub fn distinct_sources(&self) -> Vec<&SourceId> {
        let mut seen = Vec::new();
        for band in &self.bands {
            for band_ref in &band.refs {
                if !seen.contains(&&band_ref.source) {
                    seen.push(&band_ref.source);
                }
            }
        }
        seen
    }
}

/// Validating builder for [`ViewDefinition`].
#[derive(Debug, Clone)]
pub struct ViewDefinitionBuilder {
    name: String,
    bands: Vec<OutputBand>,
    envelope_policy: EnvelopePolicy,
    resolution_policy: ResolutionPolicy,
}

impl ViewDefinitionBuilder {
    /// Set the envelope composition policy.
    pub fn envelope_policy(mut self, policy: EnvelopePolicy) -> Self {
        self.envelope_policy = policy;
        self
    }

    /// Set the resolution selection policy.
    pub fn resolution_policy(mut self, policy: ResolutionPolicy) -> Self {
        self.resolution_policy = policy;
        self
    }

    /// Append a band-selection output band.
    pub fn band(mut self, label: impl Into<String>, source: impl Into<SourceId>, band: usize) -> Self {
        let index = self.bands.len();
        self.bands.push(OutputBand {
            index,
            label: label.into(),
            refs: vec![InputBandRef::new(source, band)],
            kind: CompositionKind::BandSelect,
        });
        self
    }

    /// Append an output band with explicit refs and kind.
    pub fn band_with_refs(
        mut self,
        label: impl Into<String>,
        refs: Vec<InputBandRef>,
        kind: CompositionKind,
    ) -> Self {
        let index = self.bands.len();
        self.bands.push(OutputBand {
            index,
            label: label.into(),
            refs,
            kind,
        });
        self
    }

    /// Validate and freeze the definition.
    pub fn build(self) -> Result<ViewDefinition> {
        if self.bands.is_empty() {
            return Err(CompositionError::EmptyDefinition(self.name));
        }

        for band in &self.bands {
            match band.kind {
                CompositionKind::BandSelect => {
                    if band.refs.len() != 1 {
                        return Err(CompositionError::UnsupportedBandComposition {
                            band: band.label.clone(),
                            refs: band.refs.len(),
                        });
                    }
                }
            }
        }

        Ok(ViewDefinition {
            name: self.name,
            bands: self.bands,
            envelope_policy: self.envelope_policy,
            resolution_policy: self.resolution_policy,
        })
    }
}
