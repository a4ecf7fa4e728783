//! Loading of project files (the layer set) and audit configurations.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{bail, Context, Result};
use tracing::{debug, info};

use gisaudit_domain::{Layer, MemoryRegistry};
use gisaudit_types::{ConfigFile, ProjectFile};

use crate::env_expand::expand_env_vars;
use crate::geojson::parse_layer;

/// A project with every layer read into memory.
pub struct LoadedProject {
    pub name: Option<String>,
    pub registry: MemoryRegistry,
    /// Layer ids in project-file order.
    pub layer_ids: Vec<String>,
}

fn read_expanded(path: &Path, what: &str) -> Result<String> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read {what} '{}'", path.display()))?;
    let expanded = expand_env_vars(&text)
        .with_context(|| format!("expand variables in {what} '{}'", path.display()))?;
    Ok(expanded.into_owned())
}

pub fn load_audit_config(path: &Path) -> Result<ConfigFile> {
    debug!("Loading audit config from: {}", path.display());
    let text = read_expanded(path, "audit config")?;
    let cfg: ConfigFile =
        toml::from_str(&text).with_context(|| format!("parse audit config '{}'", path.display()))?;
    debug!("Loaded {} check configuration(s)", cfg.check.len());
    Ok(cfg)
}

pub fn load_project_file(path: &Path) -> Result<ProjectFile> {
    debug!("Loading project from: {}", path.display());
    let text = read_expanded(path, "project")?;
    toml::from_str(&text).with_context(|| format!("parse project '{}'", path.display()))
}

/// Reads the project file and every GeoJSON layer it names.
///
/// Layer paths are resolved relative to the project file's directory.
pub fn load_project(path: &Path) -> Result<LoadedProject> {
    let project = load_project_file(path)?;
    let base = path.parent().unwrap_or_else(|| Path::new("."));

    let mut seen = HashSet::new();
    let mut registry = MemoryRegistry::new();
    let mut layer_ids = Vec::with_capacity(project.layer.len());

    for source in &project.layer {
        if !seen.insert(source.id.as_str()) {
            bail!(
                "project '{}': layer id '{}' is defined more than once",
                path.display(),
                source.id
            );
        }

        let layer_path = base.join(&source.path);
        let text = std::fs::read_to_string(&layer_path).with_context(|| {
            format!("read layer '{}' from '{}'", source.id, layer_path.display())
        })?;
        let name = source.name.as_deref().unwrap_or(&source.id);
        let layer = parse_layer(name, &text).with_context(|| {
            format!("load layer '{}' from '{}'", source.id, layer_path.display())
        })?;

        info!(
            "Loaded layer '{}' ({} feature(s)) from {}",
            source.id,
            layer.feature_count(),
            layer_path.display()
        );
        registry.insert(source.id.clone(), layer);
        layer_ids.push(source.id.clone());
    }

    Ok(LoadedProject {
        name: project.name,
        registry,
        layer_ids,
    })
}
