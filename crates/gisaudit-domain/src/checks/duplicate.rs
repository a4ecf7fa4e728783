use std::collections::HashMap;

use tracing::{debug, info, warn};

use gisaudit_types::{DuplicateConfig, DuplicateError, DuplicateResult};

use crate::layer::{Layer, LayerRegistry};

/// Finds attribute values that occur more than once in one field of a layer.
pub struct DuplicateCheck<'r> {
    layer_id: String,
    field_name: String,
    layer: Option<&'r dyn Layer>,
}

impl<'r> DuplicateCheck<'r> {
    pub fn new(config: &DuplicateConfig, registry: &'r dyn LayerRegistry) -> Self {
        let layer = registry.resolve(&config.layer_id);
        debug!(
            "DuplicateCheck: layer '{}' (found: {}), field '{}'",
            config.layer_id,
            layer.is_some(),
            config.field_name
        );

        Self {
            layer_id: config.layer_id.clone(),
            field_name: config.field_name.clone(),
            layer,
        }
    }

    pub fn run(self) -> DuplicateResult {
        let mut result = DuplicateResult {
            layer_name: super::layer_name(self.layer),
            field_name: self.field_name.clone(),
            errors: Vec::new(),
            config_error: None,
        };

        let Some(layer) = self.layer else {
            warn!("duplicate check skipped: layer '{}' not found", self.layer_id);
            result.config_error = Some(format!("layer '{}' not found", self.layer_id));
            return result;
        };

        if !layer.has_field(&self.field_name) {
            warn!(
                "duplicate check skipped: field '{}' not in layer '{}' (fields: {:?})",
                self.field_name,
                layer.name(),
                layer.field_names()
            );
            result.config_error = Some(format!(
                "field '{}' not found in layer '{}'",
                self.field_name,
                layer.name()
            ));
            return result;
        }

        let values = layer
            .features()
            .map(|f| f.attribute(&self.field_name).to_count_key());
        result.errors = count_duplicates(values);

        info!(
            "duplicate check on '{}'.'{}': {} duplicated value(s)",
            layer.name(),
            self.field_name,
            result.errors.len()
        );
        result
    }
}

/// Values seen more than once, in first-seen order.
fn count_duplicates(values: impl IntoIterator<Item = String>) -> Vec<DuplicateError> {
    let mut order: Vec<String> = Vec::new();
    let mut counts: HashMap<String, u64> = HashMap::new();

    for value in values {
        match counts.get_mut(&value) {
            Some(n) => *n = n.saturating_add(1),
            None => {
                counts.insert(value.clone(), 1);
                order.push(value);
            }
        }
    }

    order
        .into_iter()
        .filter_map(|value| {
            let count = counts[&value];
            (count > 1).then_some(DuplicateError { value, count })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::{Feature, MemoryLayer, MemoryRegistry};
    use gisaudit_types::AttributeValue;

    fn registry(values: &[AttributeValue]) -> MemoryRegistry {
        let layer = MemoryLayer::new("parcels", vec!["pin".to_string(), "owner".to_string()])
            .with_features(
                values
                    .iter()
                    .enumerate()
                    .map(|(i, v)| Feature::new(i as u64).with_attribute("pin", v.clone())),
            );
        MemoryRegistry::new().with_layer("parcels", layer)
    }

    fn config(layer_id: &str, field: &str) -> DuplicateConfig {
        DuplicateConfig {
            layer_id: layer_id.to_string(),
            field_name: field.to_string(),
        }
    }

    fn texts(values: &[&str]) -> Vec<AttributeValue> {
        values.iter().map(|v| AttributeValue::from(*v)).collect()
    }

    #[test]
    fn reports_duplicates_in_first_seen_order() {
        let reg = registry(&texts(&["A", "B", "A", "C", "A", "B"]));
        let result = DuplicateCheck::new(&config("parcels", "pin"), &reg).run();

        assert_eq!(
            result.errors,
            vec![
                DuplicateError {
                    value: "A".to_string(),
                    count: 3
                },
                DuplicateError {
                    value: "B".to_string(),
                    count: 2
                },
            ]
        );
        assert_eq!(result.layer_name, "parcels");
        assert_eq!(result.field_name, "pin");
        assert_eq!(result.config_error, None);
    }

    #[test]
    fn unique_values_yield_no_errors() {
        let reg = registry(&texts(&["A", "B", "C"]));
        let result = DuplicateCheck::new(&config("parcels", "pin"), &reg).run();
        assert!(result.errors.is_empty());
        assert_eq!(result.config_error, None);
    }

    #[test]
    fn null_and_empty_collapse_into_null_token() {
        let reg = registry(&[
            AttributeValue::Null,
            AttributeValue::from(""),
            AttributeValue::from("X"),
        ]);
        let result = DuplicateCheck::new(&config("parcels", "pin"), &reg).run();
        assert_eq!(
            result.errors,
            vec![DuplicateError {
                value: "NULL".to_string(),
                count: 2
            }]
        );
    }

    #[test]
    fn features_missing_the_attribute_count_as_null() {
        let layer = MemoryLayer::new("parcels", vec!["pin".to_string()])
            .with_features([Feature::new(1), Feature::new(2)]);
        let reg = MemoryRegistry::new().with_layer("parcels", layer);
        let result = DuplicateCheck::new(&config("parcels", "pin"), &reg).run();
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].value, "NULL");
    }

    #[test]
    fn absent_field_degrades_to_empty_result() {
        let reg = registry(&texts(&["A", "A"]));
        let result = DuplicateCheck::new(&config("parcels", "area"), &reg).run();
        assert!(result.errors.is_empty());
        assert_eq!(
            result.config_error.as_deref(),
            Some("field 'area' not found in layer 'parcels'")
        );
    }

    #[test]
    fn missing_layer_degrades_to_empty_result() {
        let reg = registry(&[]);
        let result = DuplicateCheck::new(&config("roads", "pin"), &reg).run();
        assert!(result.errors.is_empty());
        assert_eq!(result.layer_name, "Invalid Layer");
        assert_eq!(result.config_error.as_deref(), Some("layer 'roads' not found"));
    }

    #[test]
    fn mixed_types_are_keyed_by_display() {
        let reg = registry(&[
            AttributeValue::Int(5),
            AttributeValue::from("5"),
            AttributeValue::Float(1.5),
            AttributeValue::Float(5.0),
        ]);
        let result = DuplicateCheck::new(&config("parcels", "pin"), &reg).run();
        assert_eq!(
            result.errors,
            vec![DuplicateError {
                value: "5".to_string(),
                count: 2
            }]
        );
    }
}
