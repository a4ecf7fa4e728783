//! Bounding-box index over the features of one layer.

use geo::Rect;
use rstar::primitives::{GeomWithData, Rectangle};
use rstar::{RTree, AABB};

use crate::layer::Feature;

type Entry = GeomWithData<Rectangle<[f64; 2]>, usize>;

/// An R-tree of feature bounding boxes keyed by position in the indexed set.
///
/// Candidates resolve straight to the indexed feature, so layers that repeat
/// an intrinsic id still get every geometry tested. Lookups are a pre-filter
/// only: a candidate's box overlaps the query box, its geometry may still
/// miss. Features without geometry are not indexed.
#[derive(Debug)]
pub struct SpatialIndex<'a> {
    tree: RTree<Entry>,
    features: Vec<&'a Feature>,
}

impl<'a> SpatialIndex<'a> {
    pub fn build(features: impl IntoIterator<Item = &'a Feature>) -> Self {
        let mut indexed = Vec::new();
        let mut entries: Vec<Entry> = Vec::new();
        for feature in features {
            if let Some(bbox) = feature.bounding_box() {
                entries.push(GeomWithData::new(rectangle(&bbox), indexed.len()));
                indexed.push(feature);
            }
        }

        Self {
            tree: RTree::bulk_load(entries),
            features: indexed,
        }
    }

    /// Indexed features whose box overlaps `bbox` (touching counts), in input order.
    pub fn candidates_intersecting(&self, bbox: &Rect<f64>) -> Vec<&'a Feature> {
        let envelope =
            AABB::from_corners([bbox.min().x, bbox.min().y], [bbox.max().x, bbox.max().y]);
        let mut positions: Vec<usize> = self
            .tree
            .locate_in_envelope_intersecting(&envelope)
            .map(|e| e.data)
            .collect();
        positions.sort_unstable();
        positions.into_iter().map(|pos| self.features[pos]).collect()
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn rectangle(bbox: &Rect<f64>) -> Rectangle<[f64; 2]> {
    Rectangle::from_corners([bbox.min().x, bbox.min().y], [bbox.max().x, bbox.max().y])
}
