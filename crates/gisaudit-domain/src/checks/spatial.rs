use geo::{Geometry, Within};
use tracing::{debug, info, warn};

use gisaudit_types::{SpatialConfig, SpatialError, SpatialResult};

use crate::index::SpatialIndex;
use crate::layer::{identity_field, Feature, Layer, LayerRegistry};

/// Flags child features that are not inside any parent feature.
pub struct SpatialCheck<'r> {
    parent_id: String,
    child_id: String,
    child_unique_field: Option<String>,
    parent: Option<&'r dyn Layer>,
    child: Option<&'r dyn Layer>,
}

impl<'r> SpatialCheck<'r> {
    pub fn new(config: &SpatialConfig, registry: &'r dyn LayerRegistry) -> Self {
        let parent = registry.resolve(&config.parent_id);
        let child = registry.resolve(&config.child_id);
        debug!(
            "SpatialCheck: parent '{}' (found: {}), child '{}' (found: {}), unique field {:?}",
            config.parent_id,
            parent.is_some(),
            config.child_id,
            child.is_some(),
            config.child_unique_field
        );

        Self {
            parent_id: config.parent_id.clone(),
            child_id: config.child_id.clone(),
            child_unique_field: config.child_unique_field.clone(),
            parent,
            child,
        }
    }

    pub fn run(self) -> SpatialResult {
        let mut result = SpatialResult {
            parent_layer_name: super::layer_name(self.parent),
            child_layer_name: super::layer_name(self.child),
            errors: Vec::new(),
            config_error: None,
        };

        let (Some(parent), Some(child)) = (self.parent, self.child) else {
            result.config_error = super::missing_layers_message(&[
                ("parent", self.parent_id.as_str(), self.parent.is_some()),
                ("child", self.child_id.as_str(), self.child.is_some()),
            ]);
            warn!(
                "spatial check skipped: {}",
                result.config_error.as_deref().unwrap_or_default()
            );
            return result;
        };

        let index = SpatialIndex::build(parent.features());
        let field = identity_field(child, self.child_unique_field.as_deref());
        let mut checked = 0usize;

        for feature in child.features() {
            checked += 1;
            if !inside_any_parent(feature, &index) {
                result.errors.push(SpatialError {
                    child_id: feature.identity(field),
                    parent_layer_name: result.parent_layer_name.clone(),
                    child_layer_name: result.child_layer_name.clone(),
                });
            }
        }

        info!(
            "spatial check '{}' in '{}': checked {} child feature(s), {} outside all parents",
            child.name(),
            parent.name(),
            checked,
            result.errors.len()
        );
        result
    }
}

/// A child with no geometry, or with no bounding-box candidates, is never inside.
fn inside_any_parent(child: &Feature, index: &SpatialIndex<'_>) -> bool {
    let (Some(geometry), Some(bbox)) = (child.geometry(), child.bounding_box()) else {
        return false;
    };

    index
        .candidates_intersecting(&bbox)
        .into_iter()
        .filter_map(Feature::geometry)
        .any(|parent| contained_by(geometry, parent))
}

fn contained_by(child: &Geometry<f64>, parent: &Geometry<f64>) -> bool {
    child.is_within(parent)
}
