//! Composition session: owns the consistency verdict and reconciled
//! geometry for the lifetime of a view/source-set pairing.
//!
//! A [`CompositionHandler`] is opened once, is read-only afterwards, and
//! answers every effective-geometry question by dispatching to either the
//! single reference source (homogeneous case) or the reconciled values
//! (heterogeneous case). Callers cannot tell which path was taken.

use std::collections::HashMap;
use std::sync::Arc;

use coverage_common::{Envelope, GridRange, GridToWorld, PixelAnchor, Resolution};
use tracing::debug;

use crate::compose::{compose_envelope, compose_resolution, derive_grid_range};
use crate::config::CompositionConfig;
use crate::consistency::{ConsistencyChecker, ConsistencyVerdict};
use crate::crs::CrsService;
use crate::definition::{SourceId, ViewDefinition};
use crate::descriptor::SourceDescriptor;
use crate::error::{CompositionError, Result};
use crate::reader::{SourceReader, SourceReaderRegistry};

/// Reconciled geometry used for every read in a session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectiveGeometry {
    pub envelope: Envelope,
    pub resolution: Resolution,
    pub grid_range: GridRange,
    /// Index of the source whose geometry anchors subsequent reads.
    pub reference: usize,
}

/// Version token of the source set backing a session; sorted so that two
/// tokens over the same sources compare equal.
pub type SourceSetToken = Vec<(SourceId, u64)>;

/// An opened composition session.
pub struct CompositionHandler {
    definition: ViewDefinition,
    config: CompositionConfig,
    sources: Vec<SourceDescriptor>,
    index: HashMap<SourceId, usize>,
    readers: HashMap<SourceId, Arc<dyn SourceReader>>,
    verdict: ConsistencyVerdict,
    effective: EffectiveGeometry,
}

impl CompositionHandler {
    /// Open a session: resolve every referenced source, describe it once,
    /// run the consistency check, and reconcile geometry if needed.
    ///
    /// Configuration problems surface here and only here; a successfully
    /// opened session cannot fail on configuration grounds at read time.
    pub fn open(
        definition: ViewDefinition,
        registry: &dyn SourceReaderRegistry,
        crs: &dyn CrsService,
        config: CompositionConfig,
    ) -> Result<Self> {
        config.validate().map_err(CompositionError::ConfigError)?;

        let source_ids: Vec<SourceId> = definition
            .distinct_sources()
            .into_iter()
            .cloned()
            .collect();

        let mut sources = Vec::with_capacity(source_ids.len());
        let mut index = HashMap::with_capacity(source_ids.len());
        let mut readers = HashMap::with_capacity(source_ids.len());

        for id in &source_ids {
            let reader = registry.open(id)?;
            let descriptor = reader.describe()?;
            index.insert(id.clone(), sources.len());
            sources.push(descriptor);
            readers.insert(id.clone(), reader);
        }

        // Every input ref must select a band its source actually has
        for band in definition.bands() {
            for band_ref in &band.refs {
                let descriptor = index
                    .get(&band_ref.source)
                    .map(|&i| &sources[i])
                    .ok_or_else(|| CompositionError::UnknownSource(band_ref.source.clone()))?;
                if band_ref.band >= descriptor.band_count {
                    return Err(CompositionError::BandIndexOutOfRange {
                        source_id: band_ref.source.clone(),
                        requested: band_ref.band,
                        available: descriptor.band_count,
                    });
                }
            }
        }

        let checker = ConsistencyChecker::new(crs, config.envelope_tolerance);
        let verdict = checker.open(&sources, config.tolerance_mode)?;

        let effective = if verdict.homogeneous {
            let reference = &sources[verdict.reference];
            EffectiveGeometry {
                envelope: reference.envelope,
                resolution: reference.resolution,
                grid_range: reference.grid_range,
                reference: verdict.reference,
            }
        } else {
            let envelope = compose_envelope(&sources, definition.envelope_policy())?;
            let composed = compose_resolution(&sources, definition.resolution_policy())?;
            EffectiveGeometry {
                envelope,
                resolution: composed.resolution,
                grid_range: derive_grid_range(&envelope, &composed.resolution),
                reference: composed.reference,
            }
        };

        debug!(
            view = definition.name(),
            homogeneous = verdict.homogeneous,
            width = effective.grid_range.width,
            height = effective.grid_range.height,
            "opened composition session"
        );

        Ok(Self {
            definition,
            config,
            sources,
            index,
            readers,
            verdict,
            effective,
        })
    }

    pub fn definition(&self) -> &ViewDefinition {
        &self.definition
    }

    pub fn config(&self) -> &CompositionConfig {
        &self.config
    }

    pub fn verdict(&self) -> &ConsistencyVerdict {
        &self.verdict
    }

    /// Source descriptors, in first-use order.
    pub fn sources(&self) -> &[SourceDescriptor] {
        &self.sources
    }

    /// Descriptor of one source.
    pub fn descriptor(&self, id: &SourceId) -> Option<&SourceDescriptor> {
        self.index.get(id).map(|&i| &self.sources[i])
    }

    /// Reader handle of one source.
    pub fn reader(&self, id: &SourceId) -> Option<&Arc<dyn SourceReader>> {
        self.readers.get(id)
    }

    /// The source whose geometry anchors this session's reads.
    pub fn reference(&self) -> &SourceDescriptor {
        &self.sources[self.effective.reference]
    }

    /// Composed extent of the view.
    pub fn effective_envelope(&self) -> Envelope {
        self.effective.envelope
    }

    /// Available resolution levels, finest first.
    ///
    /// Homogeneous sessions expose the reference source's native and
    /// overview levels; heterogeneous sessions expose the single
    /// reconciled level.
    pub fn effective_resolution_levels(&self) -> Vec<Resolution> {
        if self.verdict.homogeneous {
            self.reference().resolution_levels()
        } else {
            vec![self.effective.resolution]
        }
    }

    /// Composed pixel rectangle of the view.
    pub fn effective_grid_range(&self) -> GridRange {
        self.effective.grid_range
    }

    /// Grid-to-world transform of the composed coverage at the requested
    /// pixel anchor.
    pub fn effective_grid_to_world(&self, anchor: PixelAnchor) -> GridToWorld {
        GridToWorld::from_envelope(
            &self.effective.envelope,
            &self.effective.grid_range,
            PixelAnchor::CellCorner,
        )
        .with_anchor(anchor)
    }

    /// Version token of the backing source set, for cache lookups.
    pub fn source_set_token(&self) -> SourceSetToken {
        let mut token: SourceSetToken = self
            .sources
            .iter()
            .map(|s| (s.id.clone(), s.version))
            .collect();
        token.sort();
        token
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ToleranceMode;
    use crate::crs::LocalCrsService;
    use crate::definition::{EnvelopePolicy, ResolutionPolicy};
    use crate::testdata::{descriptor_with, indexed_grid, MemoryRegistry, MemorySource};
    use coverage_common::PixelType;

    fn two_source_registry(
        env_a: Envelope,
        env_b: Envelope,
        range_a: GridRange,
        range_b: GridRange,
    ) -> MemoryRegistry {
        let mut registry = MemoryRegistry::new();
        let desc_a = descriptor_with("a", env_a, range_a, PixelType::Float32);
        let desc_b = descriptor_with("b", env_b, range_b, PixelType::Float32);
        registry.insert(MemorySource::new(
            desc_a,
            vec![indexed_grid(range_a.width, range_a.height)],
        ));
        registry.insert(MemorySource::new(
            desc_b,
            vec![indexed_grid(range_b.width, range_b.height)],
        ));
        registry
    }

    fn two_band_view() -> ViewDefinition {
        ViewDefinition::builder("pair")
            .band("band_a", "a", 0)
            .band("band_b", "b", 0)
            .build()
            .unwrap()
    }

    #[test]
    fn test_homogeneous_passthrough() {
        let env = Envelope::new(0.0, 0.0, 10.0, 10.0);
        let range = GridRange::new(10, 10);
        let registry = two_source_registry(env, env, range, range);

        let session = CompositionHandler::open(
            two_band_view(),
            &registry,
            &LocalCrsService,
            CompositionConfig::default(),
        )
        .unwrap();

        assert!(session.verdict().homogeneous);
        assert_eq!(session.effective_envelope(), env);
        assert_eq!(session.effective_grid_range(), range);
        assert_eq!(session.reference().id, SourceId::new("a"));
    }

    #[test]
    fn test_heterogeneous_union_reconciliation() {
        let env_a = Envelope::new(0.0, 0.0, 10.0, 10.0);
        let env_b = Envelope::new(5.0, 5.0, 15.0, 15.0);
        // Same pixel counts over different extents: b is the same
        // resolution, so the union is still 1 unit/pixel
        let registry =
            two_source_registry(env_a, env_b, GridRange::new(10, 10), GridRange::new(10, 10));

        let view = ViewDefinition::builder("pair")
            .envelope_policy(EnvelopePolicy::Union)
            .resolution_policy(ResolutionPolicy::Best)
            .band("band_a", "a", 0)
            .band("band_b", "b", 0)
            .build()
            .unwrap();

        let session = CompositionHandler::open(
            view,
            &registry,
            &LocalCrsService,
            CompositionConfig::default(),
        )
        .unwrap();

        assert!(!session.verdict().homogeneous);
        assert_eq!(
            session.effective_envelope(),
            Envelope::new(0.0, 0.0, 15.0, 15.0)
        );
        // ceil(15 / 1) = 15 per axis
        assert_eq!(session.effective_grid_range(), GridRange::new(15, 15));
        assert_eq!(session.effective_resolution_levels().len(), 1);
    }

    #[test]
    fn test_strict_mode_rejects_heterogeneous() {
        let env_a = Envelope::new(0.0, 0.0, 10.0, 10.0);
        let env_b = Envelope::new(5.0, 5.0, 15.0, 15.0);
        let registry =
            two_source_registry(env_a, env_b, GridRange::new(10, 10), GridRange::new(10, 10));

        let config = CompositionConfig {
            tolerance_mode: ToleranceMode::Strict,
            ..CompositionConfig::default()
        };

        let result =
            CompositionHandler::open(two_band_view(), &registry, &LocalCrsService, config);
        assert!(matches!(result, Err(CompositionError::EnvelopeMismatch(_))));
    }

    #[test]
    fn test_unknown_source_rejected() {
        let registry = MemoryRegistry::new();
        let result = CompositionHandler::open(
            two_band_view(),
            &registry,
            &LocalCrsService,
            CompositionConfig::default(),
        );
        assert!(matches!(result, Err(CompositionError::UnknownSource(_))));
    }

    #[test]
    fn test_band_index_validated_against_descriptor() {
        let env = Envelope::new(0.0, 0.0, 10.0, 10.0);
        let range = GridRange::new(10, 10);
        let registry = two_source_registry(env, env, range, range);

        let view = ViewDefinition::builder("bad")
            .band("band_a", "a", 3)
            .build()
            .unwrap();

        let result = CompositionHandler::open(
            view,
            &registry,
            &LocalCrsService,
            CompositionConfig::default(),
        );
        assert!(matches!(
            result,
            Err(CompositionError::BandIndexOutOfRange {
                requested: 3,
                available: 1,
                ..
            })
        ));
    }

    #[test]
    fn test_grid_to_world_anchor_shift() {
        let env = Envelope::new(0.0, 0.0, 10.0, 10.0);
        let range = GridRange::new(10, 10);
        let registry = two_source_registry(env, env, range, range);

        let session = CompositionHandler::open(
            two_band_view(),
            &registry,
            &LocalCrsService,
            CompositionConfig::default(),
        )
        .unwrap();

        let corner = session.effective_grid_to_world(PixelAnchor::CellCorner);
        let center = session.effective_grid_to_world(PixelAnchor::CellCenter);

        assert_eq!(corner.pixel_to_world(0.0, 0.0), (0.0, 10.0));
        assert_eq!(center.pixel_to_world(0.0, 0.0), (0.5, 9.5));
    }

    #[test]
    fn test_source_set_token_is_sorted() {
        let env = Envelope::new(0.0, 0.0, 10.0, 10.0);
        let range = GridRange::new(10, 10);
        let registry = two_source_registry(env, env, range, range);

        // View lists b before a; the token sorts by id regardless
        let view = ViewDefinition::builder("pair")
            .band("band_b", "b", 0)
            .band("band_a", "a", 0)
            .build()
            .unwrap();

        let session = CompositionHandler::open(
            view,
            &registry,
            &LocalCrsService,
            CompositionConfig::default(),
        )
        .unwrap();

        let token = session.source_set_token();
        assert_eq!(token[0].0, SourceId::new("a"));
        assert_eq!(token[1].0, SourceId::new("b"));
    }
}
