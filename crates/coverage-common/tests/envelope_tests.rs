//! Comprehensive tests for Envelope operations.

use coverage_common::Envelope;

// ============================================================================
// Constructor tests
// ============================================================================

#[test]
fn test_envelope_new() {
    let env = Envelope::new(-180.0, -90.0, 180.0, 90.0);
    assert_eq!(env.min_x, -180.0);
    assert_eq!(env.min_y, -90.0);
    assert_eq!(env.max_x, 180.0);
    assert_eq!(env.max_y, 90.0);
}

#[test]
fn test_envelope_dimensions() {
    let env = Envelope::new(-100.0, 30.0, -90.0, 40.0);
    assert!((env.width() - 10.0).abs() < f64::EPSILON);
    assert!((env.height() - 10.0).abs() < f64::EPSILON);
}

// ============================================================================
// Intersection / union tests
// ============================================================================

#[test]
fn test_intersection_of_overlapping() {
    let a = Envelope::new(0.0, 0.0, 10.0, 10.0);
    let b = Envelope::new(5.0, 5.0, 15.0, 15.0);

    let i = a.intersection(&b).unwrap();
    assert_eq!(i, Envelope::new(5.0, 5.0, 10.0, 10.0));

    // Intersection is symmetric
    assert_eq!(b.intersection(&a).unwrap(), i);
}

#[test]
fn test_intersection_of_disjoint_is_none() {
    let a = Envelope::new(0.0, 0.0, 10.0, 10.0);
    let b = Envelope::new(20.0, 20.0, 30.0, 30.0);
    assert!(a.intersection(&b).is_none());
}

#[test]
fn test_union_grows() {
    let a = Envelope::new(0.0, 0.0, 10.0, 10.0);
    let b = Envelope::new(5.0, 5.0, 15.0, 15.0);

    let u = a.union(&b);
    assert_eq!(u, Envelope::new(0.0, 0.0, 15.0, 15.0));

    // Union of disjoint envelopes spans both
    let c = Envelope::new(20.0, 20.0, 30.0, 30.0);
    let u2 = a.union(&c);
    assert_eq!(u2, Envelope::new(0.0, 0.0, 30.0, 30.0));
}

#[test]
fn test_touching_edges_do_not_intersect() {
    let a = Envelope::new(0.0, 0.0, 10.0, 10.0);
    let b = Envelope::new(10.0, 0.0, 20.0, 10.0);
    assert!(!a.intersects(&b));
}

// ============================================================================
// Tolerance comparison tests
// ============================================================================

#[test]
fn test_approx_eq_within_tolerance() {
    let a = Envelope::new(0.0, 0.0, 360.0, 180.0);
    let b = Envelope::new(5e-11, 0.0, 360.0, 180.0 - 5e-11);
    assert!(a.approx_eq(&b, 1e-10));
}

#[test]
fn test_approx_eq_exceeding_tolerance() {
    let a = Envelope::new(0.0, 0.0, 360.0, 180.0);
    let b = Envelope::new(1e-9, 0.0, 360.0, 180.0);
    assert!(!a.approx_eq(&b, 1e-10));
}

#[test]
fn test_cache_key_is_stable() {
    let a = Envelope::new(0.1, 0.2, 0.3, 0.4);
    let b = Envelope::new(0.1, 0.2, 0.3, 0.4);
    assert_eq!(a.cache_key(), b.cache_key());
}
