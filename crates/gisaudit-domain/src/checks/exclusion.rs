use geo::Intersects;
use tracing::{debug, info, warn};

use gisaudit_types::{ExclusionConfig, ExclusionError, ExclusionResult};

use crate::index::SpatialIndex;
use crate::layer::{identity_field, Feature, Layer, LayerRegistry};

/// Flags target features that intersect (or touch) any exclusion-zone feature.
pub struct ExclusionCheck<'r> {
    target_id: String,
    exclusion_id: String,
    target_unique_field: Option<String>,
    target: Option<&'r dyn Layer>,
    exclusion: Option<&'r dyn Layer>,
}

impl<'r> ExclusionCheck<'r> {
    pub fn new(config: &ExclusionConfig, registry: &'r dyn LayerRegistry) -> Self {
        let target = registry.resolve(&config.target_id);
        let exclusion = registry.resolve(&config.exclusion_id);
        debug!(
            "ExclusionCheck: target '{}' (found: {}), exclusion '{}' (found: {}), unique field {:?}",
            config.target_id,
            target.is_some(),
            config.exclusion_id,
            exclusion.is_some(),
            config.target_unique_field
        );

        Self {
            target_id: config.target_id.clone(),
            exclusion_id: config.exclusion_id.clone(),
            target_unique_field: config.target_unique_field.clone(),
            target,
            exclusion,
        }
    }

    pub fn run(self) -> ExclusionResult {
        let mut result = ExclusionResult {
            target_layer_name: super::layer_name(self.target),
            exclusion_layer_name: super::layer_name(self.exclusion),
            errors: Vec::new(),
            config_error: None,
        };

        let (Some(target), Some(exclusion)) = (self.target, self.exclusion) else {
            result.config_error = super::missing_layers_message(&[
                ("target", self.target_id.as_str(), self.target.is_some()),
                ("exclusion", self.exclusion_id.as_str(), self.exclusion.is_some()),
            ]);
            warn!(
                "exclusion check skipped: {}",
                result.config_error.as_deref().unwrap_or_default()
            );
            return result;
        };

        let index = SpatialIndex::build(exclusion.features());
        let field = identity_field(target, self.target_unique_field.as_deref());

        result.errors = target
            .features()
            .filter(|f| violates_exclusion(f, &index))
            .map(|f| ExclusionError {
                target_id: f.identity(field),
            })
            .collect();

        info!(
            "exclusion check '{}' against '{}': {} violation(s)",
            target.name(),
            exclusion.name(),
            result.errors.len()
        );
        result
    }
}

/// Targets without geometry or without bounding-box candidates are clean.
fn violates_exclusion(target: &Feature, index: &SpatialIndex<'_>) -> bool {
    let (Some(geometry), Some(bbox)) = (target.geometry(), target.bounding_box()) else {
        return false;
    };

    index
        .candidates_intersecting(&bbox)
        .into_iter()
        .filter_map(Feature::geometry)
        .any(|zone| geometry.intersects(zone))
}
