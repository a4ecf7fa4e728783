use std::collections::{BTreeMap, HashMap};

use geo::{BoundingRect, Geometry, Rect};

use gisaudit_types::{AttributeValue, FeatureIdentity};

/// One geometry + attribute record within a layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    id: u64,
    geometry: Option<Geometry<f64>>,
    attributes: BTreeMap<String, AttributeValue>,
}

static NULL: AttributeValue = AttributeValue::Null;

impl Feature {
    pub fn new(id: u64) -> Self {
        Self {
            id,
            geometry: None,
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_geometry(mut self, geometry: impl Into<Geometry<f64>>) -> Self {
        self.geometry = Some(geometry.into());
        self
    }

    pub fn with_attribute(
        mut self,
        field: impl Into<String>,
        value: impl Into<AttributeValue>,
    ) -> Self {
        self.attributes.insert(field.into(), value.into());
        self
    }

    /// The intrinsic sequence identifier.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn geometry(&self) -> Option<&Geometry<f64>> {
        self.geometry.as_ref()
    }

    /// The value stored for `field`, or `Null` when the feature has none.
    pub fn attribute(&self, field: &str) -> &AttributeValue {
        self.attributes.get(field).unwrap_or(&NULL)
    }

    /// `None` for features without geometry and for empty geometries.
    pub fn bounding_box(&self) -> Option<Rect<f64>> {
        self.geometry.as_ref().and_then(|g| g.bounding_rect())
    }

    /// Identity used in error records: the value of `field` when it is set,
    /// otherwise the intrinsic id.
    ///
    /// Callers resolve `field` against the layer's field names first, see [`identity_field`].
    pub fn identity(&self, field: Option<&str>) -> FeatureIdentity {
        match field.map(|f| self.attribute(f)) {
            Some(value) if !value.is_unset() => FeatureIdentity::Attribute(value.clone()),
            _ => FeatureIdentity::Id(self.id),
        }
    }
}

/// A named collection of features, borrowed from the host.
pub trait Layer {
    fn name(&self) -> &str;

    fn field_names(&self) -> &[String];

    /// Restartable: every call yields all features from the start.
    fn features(&self) -> Box<dyn Iterator<Item = &Feature> + '_>;

    fn feature(&self, id: u64) -> Option<&Feature>;

    fn feature_count(&self) -> usize {
        self.features().count()
    }

    fn has_field(&self, field: &str) -> bool {
        self.field_names().iter().any(|f| f == field)
    }
}

/// Resolves layer identifiers to layers. A miss is `None`, never an error.
pub trait LayerRegistry {
    fn resolve(&self, layer_id: &str) -> Option<&dyn Layer>;
}

/// Returns `field` only if the layer actually has it.
pub fn identity_field<'a>(layer: &dyn Layer, field: Option<&'a str>) -> Option<&'a str> {
    field.filter(|f| layer.has_field(f))
}

/// A layer held fully in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryLayer {
    name: String,
    fields: Vec<String>,
    features: Vec<Feature>,
    by_id: HashMap<u64, usize>,
}

impl MemoryLayer {
    pub fn new(name: impl Into<String>, fields: Vec<String>) -> Self {
        Self {
            name: name.into(),
            fields,
            features: Vec::new(),
            by_id: HashMap::new(),
        }
    }

    /// Adds a feature. A later feature with the same id replaces the earlier one in id lookups.
    pub fn push(&mut self, feature: Feature) {
        self.by_id.insert(feature.id(), self.features.len());
        self.features.push(feature);
    }

    pub fn with_features(mut self, features: impl IntoIterator<Item = Feature>) -> Self {
        for f in features {
            self.push(f);
        }
        self
    }
}

impl Layer for MemoryLayer {
    fn name(&self) -> &str {
        &self.name
    }

    fn field_names(&self) -> &[String] {
        &self.fields
    }

    fn features(&self) -> Box<dyn Iterator<Item = &Feature> + '_> {
        Box::new(self.features.iter())
    }

    fn feature(&self, id: u64) -> Option<&Feature> {
        self.by_id.get(&id).map(|&i| &self.features[i])
    }

    fn feature_count(&self) -> usize {
        self.features.len()
    }
}

/// A registry of in-memory layers keyed by identifier.
#[derive(Debug, Clone, Default)]
pub struct MemoryRegistry {
    layers: BTreeMap<String, MemoryLayer>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, layer_id: impl Into<String>, layer: MemoryLayer) {
        self.layers.insert(layer_id.into(), layer);
    }

    pub fn with_layer(mut self, layer_id: impl Into<String>, layer: MemoryLayer) -> Self {
        self.insert(layer_id, layer);
        self
    }

    /// `(id, layer)` pairs in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &MemoryLayer)> {
        self.layers.iter().map(|(id, l)| (id.as_str(), l))
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

impl LayerRegistry for MemoryRegistry {
    fn resolve(&self, layer_id: &str) -> Option<&dyn Layer> {
        self.layers.get(layer_id).map(|l| l as &dyn Layer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{coord, Point, Rect};

    fn layer() -> MemoryLayer {
        MemoryLayer::new("parcels", vec!["pin".to_string()]).with_features([
            Feature::new(10)
                .with_geometry(Point::new(1.0, 2.0))
                .with_attribute("pin", "A-1"),
            Feature::new(11).with_attribute("pin", ""),
            Feature::new(12),
        ])
    }

    #[test]
    fn identity_prefers_set_field_value() {
        let l = layer();
        let field = identity_field(&l, Some("pin"));
        assert_eq!(field, Some("pin"));

        let ids: Vec<_> = l.features().map(|f| f.identity(field)).collect();
        assert_eq!(
            ids,
            vec![
                FeatureIdentity::Attribute(AttributeValue::from("A-1")),
                FeatureIdentity::Id(11),
                FeatureIdentity::Id(12),
            ]
        );
    }

    #[test]
    fn identity_field_absent_from_layer_is_dropped() {
        let l = layer();
        assert_eq!(identity_field(&l, Some("name")), None);
        assert_eq!(identity_field(&l, None), None);
    }

    #[test]
    fn feature_lookup_and_bbox() {
        let l = layer();
        assert_eq!(l.feature_count(), 3);
        assert_eq!(l.feature(11).map(Feature::id), Some(11));
        assert!(l.feature(99).is_none());

        let f = l.feature(10).expect("feature 10");
        assert_eq!(
            f.bounding_box(),
            Some(Rect::new(coord! { x: 1.0, y: 2.0 }, coord! { x: 1.0, y: 2.0 }))
        );
        assert_eq!(l.feature(12).and_then(Feature::bounding_box), None);
        assert_eq!(f.attribute("missing"), &AttributeValue::Null);
    }

    #[test]
    fn registry_miss_is_none() {
        let reg = MemoryRegistry::new().with_layer("parcels", layer());
        assert_eq!(reg.resolve("parcels").map(|l| l.name()), Some("parcels"));
        assert!(reg.resolve("roads").is_none());
        assert_eq!(reg.len(), 1);
    }
}
