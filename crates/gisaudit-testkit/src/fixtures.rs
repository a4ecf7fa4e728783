//! Common test fixtures for gisaudit.
//!
//! This module provides geometry helpers, sample layers and a sample
//! registry for use in tests across the workspace.

use geo::{LineString, Point, Polygon};

use gisaudit_domain::{Feature, MemoryLayer, MemoryRegistry};
use gisaudit_types::{
    AttributeValue, CheckConfiguration, DuplicateConfig, ExclusionConfig, SpatialConfig,
};

// =============================================================================
// Geometry
// =============================================================================

/// Axis-aligned square with its lower-left corner at `(x, y)`.
pub fn square(x: f64, y: f64, size: f64) -> Polygon<f64> {
    Polygon::new(
        LineString::from(vec![
            (x, y),
            (x + size, y),
            (x + size, y + size),
            (x, y + size),
            (x, y),
        ]),
        vec![],
    )
}

/// L-shaped polygon covering `[0,10]²` minus the notch `(5,10]²`.
pub fn ell() -> Polygon<f64> {
    Polygon::new(
        LineString::from(vec![
            (0.0, 0.0),
            (10.0, 0.0),
            (10.0, 5.0),
            (5.0, 5.0),
            (5.0, 10.0),
            (0.0, 10.0),
            (0.0, 0.0),
        ]),
        vec![],
    )
}

// =============================================================================
// Layers
// =============================================================================

/// A layer with a single field `field` holding `values`, one feature per value.
pub fn value_layer(name: &str, field: &str, values: &[AttributeValue]) -> MemoryLayer {
    MemoryLayer::new(name, vec![field.to_string()]).with_features(
        values
            .iter()
            .enumerate()
            .map(|(i, v)| Feature::new(i as u64).with_attribute(field, v.clone())),
    )
}

/// A layer with one square polygon per `(x, y, size)` triple, ids from 0.
pub fn polygon_layer(name: &str, squares: &[(f64, f64, f64)]) -> MemoryLayer {
    MemoryLayer::new(name, vec!["code".to_string()]).with_features(squares.iter().enumerate().map(
        |(i, &(x, y, size))| {
            Feature::new(i as u64)
                .with_geometry(square(x, y, size))
                .with_attribute("code", format!("F{i}"))
        },
    ))
}

/// A small project:
/// - `districts`: two 10x10 districts side by side
/// - `parcels`: three parcels, `P-3` outside both districts; `pin` repeats `P-1`
/// - `wells`: two wells, `W-1` inside the wetland
/// - `wetlands`: one 4x4 wetland inside the first district
pub fn sample_registry() -> MemoryRegistry {
    let districts = MemoryLayer::new("Districts", vec!["name".to_string()]).with_features([
        Feature::new(1)
            .with_geometry(square(0.0, 0.0, 10.0))
            .with_attribute("name", "North"),
        Feature::new(2)
            .with_geometry(square(10.0, 0.0, 10.0))
            .with_attribute("name", "South"),
    ]);

    let parcels = MemoryLayer::new("Parcels", vec!["pin".to_string()]).with_features([
        Feature::new(1)
            .with_geometry(square(1.0, 1.0, 2.0))
            .with_attribute("pin", "P-1"),
        Feature::new(2)
            .with_geometry(square(12.0, 1.0, 2.0))
            .with_attribute("pin", "P-1"),
        Feature::new(3)
            .with_geometry(square(30.0, 30.0, 2.0))
            .with_attribute("pin", "P-3"),
    ]);

    let wells = MemoryLayer::new("Wells", vec!["well_no".to_string()]).with_features([
        Feature::new(1)
            .with_geometry(Point::new(6.0, 6.0))
            .with_attribute("well_no", "W-1"),
        Feature::new(2)
            .with_geometry(Point::new(15.0, 5.0))
            .with_attribute("well_no", "W-2"),
    ]);

    let wetlands = MemoryLayer::new("Wetlands", vec![])
        .with_features([Feature::new(1).with_geometry(square(5.0, 5.0, 4.0))]);

    MemoryRegistry::new()
        .with_layer("districts", districts)
        .with_layer("parcels", parcels)
        .with_layer("wells", wells)
        .with_layer("wetlands", wetlands)
}

// =============================================================================
// Configurations
// =============================================================================

/// One configuration of each kind against [`sample_registry`].
pub fn sample_configs() -> Vec<CheckConfiguration> {
    vec![
        CheckConfiguration::Duplicate(DuplicateConfig {
            layer_id: "parcels".to_string(),
            field_name: "pin".to_string(),
        }),
        CheckConfiguration::Spatial(SpatialConfig {
            parent_id: "districts".to_string(),
            child_id: "parcels".to_string(),
            child_unique_field: Some("pin".to_string()),
        }),
        CheckConfiguration::Exclusion(ExclusionConfig {
            target_id: "wells".to_string(),
            exclusion_id: "wetlands".to_string(),
            target_unique_field: Some("well_no".to_string()),
        }),
    ]
}
