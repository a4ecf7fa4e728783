//! The three data-quality checks and the closed [`Check`] variant used for dispatch.
//!
//! Each check resolves its layers when constructed, runs once (`run` takes
//! `self`) and is dropped. A layer that cannot be resolved degrades the
//! result instead of failing.

mod duplicate;
mod exclusion;
mod spatial;

pub use duplicate::DuplicateCheck;
pub use exclusion::ExclusionCheck;
pub use spatial::SpatialCheck;

use gisaudit_types::{CheckConfiguration, CheckKind, CheckResult, INVALID_LAYER_NAME};

use crate::layer::{Layer, LayerRegistry};

/// A check built from one configuration, ready to run.
pub enum Check<'r> {
    Duplicate(DuplicateCheck<'r>),
    Spatial(SpatialCheck<'r>),
    Exclusion(ExclusionCheck<'r>),
}

impl<'r> Check<'r> {
    /// `None` for unrecognized check kinds.
    pub fn from_config(
        config: &CheckConfiguration,
        registry: &'r dyn LayerRegistry,
    ) -> Option<Self> {
        match config {
            CheckConfiguration::Duplicate(c) => {
                Some(Check::Duplicate(DuplicateCheck::new(c, registry)))
            }
            CheckConfiguration::Spatial(c) => Some(Check::Spatial(SpatialCheck::new(c, registry))),
            CheckConfiguration::Exclusion(c) => {
                Some(Check::Exclusion(ExclusionCheck::new(c, registry)))
            }
            CheckConfiguration::Unknown => None,
        }
    }

    pub fn kind(&self) -> CheckKind {
        match self {
            Check::Duplicate(_) => CheckKind::Duplicate,
            Check::Spatial(_) => CheckKind::Spatial,
            Check::Exclusion(_) => CheckKind::Exclusion,
        }
    }

    pub fn run(self) -> CheckResult {
        match self {
            Check::Duplicate(c) => CheckResult::Duplicate(c.run()),
            Check::Spatial(c) => CheckResult::Spatial(c.run()),
            Check::Exclusion(c) => CheckResult::Exclusion(c.run()),
        }
    }
}

fn layer_name(layer: Option<&dyn Layer>) -> String {
    layer.map_or_else(|| INVALID_LAYER_NAME.to_string(), |l| l.name().to_string())
}

/// Describes the unresolved side(s) of a two-layer check, e.g.
/// `"parent layer 'districts' not found"`.
fn missing_layers_message(sides: &[(&str, &str, bool)]) -> Option<String> {
    let missing: Vec<String> = sides
        .iter()
        .filter(|(_, _, found)| !found)
        .map(|(role, id, _)| format!("{role} layer '{id}' not found"))
        .collect();
    if missing.is_empty() {
        None
    } else {
        Some(missing.join("; "))
    }
}
