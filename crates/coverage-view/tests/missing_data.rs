//! Integration tests for partial data availability: nodata fill,
//! unfillable gaps, and incidental alpha preservation.

use std::sync::Arc;

use coverage_view::testdata::{descriptor_with, MemoryRegistry, MemorySource, ReadMode};
use coverage_view::{
    CompositionConfig, CompositionError, CompositionHandler, EnvelopePolicy, LocalCrsService,
    ReadPipeline, ReadRegion, ToleranceMode, ViewDefinition,
};
use coverage_common::{Envelope, GridRange, PixelType};
use test_utils::create_test_grid;

const SIZE: usize = 8;

fn envelope() -> Envelope {
    Envelope::new(0.0, 0.0, 8.0, 8.0)
}

fn range() -> GridRange {
    GridRange::new(SIZE, SIZE)
}

/// Source A always has data; source B is configured per scenario.
fn registry_with_b(b: MemorySource) -> MemoryRegistry {
    let mut registry = MemoryRegistry::new();
    registry.insert(MemorySource::new(
        descriptor_with("a", envelope(), range(), PixelType::Float32),
        vec![create_test_grid(SIZE, SIZE)],
    ));
    registry.insert(b);
    registry
}

fn two_band_view() -> ViewDefinition {
    ViewDefinition::builder("partial")
        .band("a_band", "a", 0)
        .band("b_band", "b", 0)
        .build()
        .unwrap()
}

fn open_pipeline(registry: &MemoryRegistry, config: CompositionConfig) -> ReadPipeline {
    let session =
        CompositionHandler::open(two_band_view(), registry, &LocalCrsService, config).unwrap();
    ReadPipeline::new(Arc::new(session))
}

/// A source that misses every real request but demonstrates its nodata on
/// a sample read.
fn fillable_b() -> MemorySource {
    let mut descriptor = descriptor_with("b", envelope(), range(), PixelType::Float32);
    descriptor.nodata = Some(-9999.0);
    MemorySource::new(descriptor, vec![create_test_grid(SIZE, SIZE)])
        .with_mode(ReadMode::SampleOnly)
}

#[test]
fn test_missing_source_is_filled_with_nodata() {
    let registry = registry_with_b(fillable_b());
    let pipeline = open_pipeline(&registry, CompositionConfig::default());

    let raster = pipeline
        .read(&ReadRegion::new(envelope(), SIZE, SIZE))
        .unwrap()
        .expect("fillable gap must still compose");

    assert_eq!(raster.band_count(), 2);
    for row in 0..SIZE {
        for col in 0..SIZE {
            // A's band matches its direct read
            assert_eq!(raster.get(0, col, row), Some((col * 1000 + row) as f32));
            // B's band is the fill constant everywhere
            assert_eq!(raster.get(1, col, row), Some(-9999.0));
        }
    }
}

#[test]
fn test_unfillable_gap_returns_no_data() {
    // B returns nothing and exposes no discoverable nodata
    let b = MemorySource::new(
        descriptor_with("b", envelope(), range(), PixelType::Float32),
        vec![create_test_grid(SIZE, SIZE)],
    )
    .with_mode(ReadMode::Never);

    let registry = registry_with_b(b);
    let pipeline = open_pipeline(&registry, CompositionConfig::default());

    // Not a partial raster, not an error: no data for this request
    let result = pipeline.read(&ReadRegion::new(envelope(), SIZE, SIZE)).unwrap();
    assert!(result.is_none());
}

#[test]
fn test_fill_disabled_returns_no_data() {
    let registry = registry_with_b(fillable_b());
    let config = CompositionConfig {
        fill_missing: false,
        ..CompositionConfig::default()
    };
    let pipeline = open_pipeline(&registry, config);

    let result = pipeline.read(&ReadRegion::new(envelope(), SIZE, SIZE)).unwrap();
    assert!(result.is_none());
}

#[test]
fn test_failed_read_does_not_poison_the_session() {
    let registry = registry_with_b(fillable_b());
    let config = CompositionConfig {
        fill_missing: false,
        ..CompositionConfig::default()
    };
    let pipeline = open_pipeline(&registry, config);

    // First read finds a gap and yields no data
    assert!(pipeline
        .read(&ReadRegion::new(envelope(), SIZE, SIZE))
        .unwrap()
        .is_none());

    // A sample-sized read hits data in both sources and succeeds on the
    // same session
    let small = ReadRegion::new(Envelope::new(0.0, 0.0, 2.0, 2.0), 2, 2);
    assert!(pipeline.read(&small).unwrap().is_some());
}

#[test]
fn test_every_source_missing_returns_no_data() {
    let mut registry = MemoryRegistry::new();
    registry.insert(
        MemorySource::new(
            descriptor_with("a", envelope(), range(), PixelType::Float32),
            vec![create_test_grid(SIZE, SIZE)],
        )
        .with_mode(ReadMode::Never),
    );
    registry.insert(fillable_b());

    let pipeline = open_pipeline(&registry, CompositionConfig::default());
    let result = pipeline.read(&ReadRegion::new(envelope(), SIZE, SIZE)).unwrap();
    assert!(result.is_none());
}

#[test]
fn test_incidental_alpha_is_preserved() {
    // The descriptor reports no alpha, but reads come back with a mask
    let b = MemorySource::new(
        descriptor_with("b", envelope(), range(), PixelType::Float32),
        vec![create_test_grid(SIZE, SIZE)],
    )
    .with_injected_alpha();

    let registry = registry_with_b(b);
    let pipeline = open_pipeline(&registry, CompositionConfig::default());

    let raster = pipeline
        .read(&ReadRegion::new(envelope(), SIZE, SIZE))
        .unwrap()
        .unwrap();

    // Two data bands plus the carried-through alpha channel
    assert_eq!(raster.data_band_count(), 2);
    assert!(raster.has_alpha());
    assert_eq!(raster.band_count(), 3);
}

#[test]
fn test_disjoint_sources_rejected_at_open() {
    let mut registry = MemoryRegistry::new();
    registry.insert(MemorySource::new(
        descriptor_with("a", envelope(), range(), PixelType::Float32),
        vec![create_test_grid(SIZE, SIZE)],
    ));
    registry.insert(MemorySource::new(
        descriptor_with(
            "b",
            Envelope::new(100.0, 100.0, 108.0, 108.0),
            range(),
            PixelType::Float32,
        ),
        vec![create_test_grid(SIZE, SIZE)],
    ));

    // Lenient mode tolerates heterogeneity but never disjoint envelopes
    let result = CompositionHandler::open(
        two_band_view(),
        &registry,
        &LocalCrsService,
        CompositionConfig::default(),
    );
    assert!(matches!(result, Err(CompositionError::DisjointEnvelopes(_))));

    // Strict mode refuses them as well (as an envelope mismatch)
    let result = CompositionHandler::open(
        two_band_view(),
        &registry,
        &LocalCrsService,
        CompositionConfig {
            tolerance_mode: ToleranceMode::Strict,
            ..CompositionConfig::default()
        },
    );
    assert!(result.is_err());
}

#[test]
fn test_intersection_composition_does_not_fill() {
    let env_a = Envelope::new(0.0, 0.0, 8.0, 8.0);
    let env_b = Envelope::new(4.0, 4.0, 12.0, 12.0);

    let mut registry = MemoryRegistry::new();
    registry.insert(MemorySource::new(
        descriptor_with("a", env_a, range(), PixelType::Float32),
        vec![create_test_grid(SIZE, SIZE)],
    ));
    let mut desc_b = descriptor_with("b", env_b, range(), PixelType::Float32);
    desc_b.nodata = Some(-9999.0);
    registry.insert(
        MemorySource::new(desc_b, vec![create_test_grid(SIZE, SIZE)])
            .with_mode(ReadMode::SampleOnly),
    );

    let view = ViewDefinition::builder("strict_overlap")
        .envelope_policy(EnvelopePolicy::Intersection)
        .band("a_band", "a", 0)
        .band("b_band", "b", 0)
        .build()
        .unwrap();

    let session = CompositionHandler::open(
        view,
        &registry,
        &LocalCrsService,
        CompositionConfig::default(),
    )
    .unwrap();
    let pipeline = ReadPipeline::new(Arc::new(session));

    // B is missing and fillable, but intersection composition demands
    // every source
    let overlap = ReadRegion::new(Envelope::new(4.0, 4.0, 8.0, 8.0), 4, 4);
    assert!(pipeline.read(&overlap).unwrap().is_none());
}
