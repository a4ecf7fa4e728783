//! Domain logic: layer model, spatial index and data-quality checks.
//!
//! This crate is designed to be I/O-free and highly testable. Layers are
//! borrowed from a [`LayerRegistry`] supplied by the host.

pub mod checks;
pub mod index;
pub mod layer;

pub use checks::{Check, DuplicateCheck, ExclusionCheck, SpatialCheck};
pub use index::SpatialIndex;
pub use layer::{identity_field, Feature, Layer, LayerRegistry, MemoryLayer, MemoryRegistry};
