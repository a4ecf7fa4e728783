//! Data types (configuration, results, reports) for gisaudit.
//!
//! This crate is intentionally "dumb": pure DTOs with serde + schemars.

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

// ── Schema Identifiers ─────────────────────────────────────────
pub const REPORT_SCHEMA_V1: &str = "gisaudit.report.v1";

// ── Frozen Vocabulary ──────────────────────────────────────────
/// Token that stands in for null or empty attribute values when counting duplicates.
pub const NULL_VALUE_TOKEN: &str = "NULL";

/// Display name used for a layer reference that could not be resolved.
pub const INVALID_LAYER_NAME: &str = "Invalid Layer";

/// The discriminator selecting validation logic and result bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    Duplicate,
    Spatial,
    Exclusion,
}

impl CheckKind {
    pub const ALL: [CheckKind; 3] = [
        CheckKind::Duplicate,
        CheckKind::Spatial,
        CheckKind::Exclusion,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CheckKind::Duplicate => "duplicate",
            CheckKind::Spatial => "spatial",
            CheckKind::Exclusion => "exclusion",
        }
    }
}

impl fmt::Display for CheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Attribute Values ───────────────────────────────────────────

/// A single attribute value read from a feature.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum AttributeValue {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl AttributeValue {
    /// Null and empty text are both "unset".
    pub fn is_unset(&self) -> bool {
        match self {
            AttributeValue::Null => true,
            AttributeValue::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Stringified form used for duplicate counting; unset values map to [`NULL_VALUE_TOKEN`].
    pub fn to_count_key(&self) -> String {
        if self.is_unset() {
            NULL_VALUE_TOKEN.to_string()
        } else {
            self.to_string()
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Null => f.write_str(NULL_VALUE_TOKEN),
            AttributeValue::Bool(b) => write!(f, "{b}"),
            AttributeValue::Int(i) => write!(f, "{i}"),
            AttributeValue::Float(x) => write!(f, "{x:?}"),
            AttributeValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        AttributeValue::Text(s.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(s: String) -> Self {
        AttributeValue::Text(s)
    }
}

impl From<i64> for AttributeValue {
    fn from(i: i64) -> Self {
        AttributeValue::Int(i)
    }
}

impl From<f64> for AttributeValue {
    fn from(x: f64) -> Self {
        AttributeValue::Float(x)
    }
}

impl From<bool> for AttributeValue {
    fn from(b: bool) -> Self {
        AttributeValue::Bool(b)
    }
}

/// How a feature is named in error records.
///
/// Serialized untagged, so an integer attribute and an intrinsic id look the same on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum FeatureIdentity {
    /// The feature's intrinsic sequence identifier.
    Id(u64),
    /// The value of the configured unique field.
    Attribute(AttributeValue),
}

impl fmt::Display for FeatureIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureIdentity::Id(id) => write!(f, "{id}"),
            FeatureIdentity::Attribute(v) => write!(f, "{v}"),
        }
    }
}

// ── Check Configuration ────────────────────────────────────────

/// One requested check, tagged by `check_type`.
///
/// Unrecognized `check_type` values deserialize to [`CheckConfiguration::Unknown`]
/// so they can be skipped at dispatch instead of failing the whole file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "check_type", rename_all = "snake_case")]
pub enum CheckConfiguration {
    Duplicate(DuplicateConfig),
    Spatial(SpatialConfig),
    Exclusion(ExclusionConfig),
    #[serde(other)]
    Unknown,
}

impl CheckConfiguration {
    pub fn kind(&self) -> Option<CheckKind> {
        match self {
            CheckConfiguration::Duplicate(_) => Some(CheckKind::Duplicate),
            CheckConfiguration::Spatial(_) => Some(CheckKind::Spatial),
            CheckConfiguration::Exclusion(_) => Some(CheckKind::Exclusion),
            CheckConfiguration::Unknown => None,
        }
    }

    /// Every layer identifier this configuration refers to.
    pub fn layer_ids(&self) -> Vec<&str> {
        match self {
            CheckConfiguration::Duplicate(c) => vec![c.layer_id.as_str()],
            CheckConfiguration::Spatial(c) => vec![c.parent_id.as_str(), c.child_id.as_str()],
            CheckConfiguration::Exclusion(c) => {
                vec![c.target_id.as_str(), c.exclusion_id.as_str()]
            }
            CheckConfiguration::Unknown => vec![],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct DuplicateConfig {
    pub layer_id: String,
    pub field_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SpatialConfig {
    pub parent_id: String,
    pub child_id: String,
    /// Field naming child features in error records. Falls back to the intrinsic id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child_unique_field: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ExclusionConfig {
    pub target_id: String,
    pub exclusion_id: String,
    /// Field naming target features in error records. Falls back to the intrinsic id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_unique_field: Option<String>,
}

// ── Check Results ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct DuplicateError {
    pub value: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SpatialError {
    pub child_id: FeatureIdentity,
    pub parent_layer_name: String,
    pub child_layer_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ExclusionError {
    pub target_id: FeatureIdentity,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct DuplicateResult {
    pub layer_name: String,
    pub field_name: String,
    pub errors: Vec<DuplicateError>,
    /// Set when the check could not run (missing layer or field).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SpatialResult {
    pub parent_layer_name: String,
    pub child_layer_name: String,
    pub errors: Vec<SpatialError>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ExclusionResult {
    pub target_layer_name: String,
    pub exclusion_layer_name: String,
    pub errors: Vec<ExclusionError>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_error: Option<String>,
}

/// The result of one executed check, tagged by `check_type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "check_type", rename_all = "snake_case")]
pub enum CheckResult {
    Duplicate(DuplicateResult),
    Spatial(SpatialResult),
    Exclusion(ExclusionResult),
}

impl CheckResult {
    pub fn kind(&self) -> CheckKind {
        match self {
            CheckResult::Duplicate(_) => CheckKind::Duplicate,
            CheckResult::Spatial(_) => CheckKind::Spatial,
            CheckResult::Exclusion(_) => CheckKind::Exclusion,
        }
    }

    pub fn error_count(&self) -> usize {
        match self {
            CheckResult::Duplicate(r) => r.errors.len(),
            CheckResult::Spatial(r) => r.errors.len(),
            CheckResult::Exclusion(r) => r.errors.len(),
        }
    }

    pub fn config_error(&self) -> Option<&str> {
        match self {
            CheckResult::Duplicate(r) => r.config_error.as_deref(),
            CheckResult::Spatial(r) => r.config_error.as_deref(),
            CheckResult::Exclusion(r) => r.config_error.as_deref(),
        }
    }
}

/// Results of a run, one ordered bucket per check kind.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct ResultAggregate {
    #[serde(default)]
    pub duplicate: Vec<DuplicateResult>,
    #[serde(default)]
    pub spatial: Vec<SpatialResult>,
    #[serde(default)]
    pub exclusion: Vec<ExclusionResult>,
}

impl ResultAggregate {
    /// Appends a result to the bucket matching its kind.
    pub fn push(&mut self, result: CheckResult) {
        match result {
            CheckResult::Duplicate(r) => self.duplicate.push(r),
            CheckResult::Spatial(r) => self.spatial.push(r),
            CheckResult::Exclusion(r) => self.exclusion.push(r),
        }
    }

    pub fn len(&self, kind: CheckKind) -> usize {
        match kind {
            CheckKind::Duplicate => self.duplicate.len(),
            CheckKind::Spatial => self.spatial.len(),
            CheckKind::Exclusion => self.exclusion.len(),
        }
    }

    pub fn total_results(&self) -> usize {
        CheckKind::ALL.iter().map(|k| self.len(*k)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total_results() == 0
    }

    pub fn error_count(&self, kind: CheckKind) -> usize {
        match kind {
            CheckKind::Duplicate => self.duplicate.iter().map(|r| r.errors.len()).sum(),
            CheckKind::Spatial => self.spatial.iter().map(|r| r.errors.len()).sum(),
            CheckKind::Exclusion => self.exclusion.iter().map(|r| r.errors.len()).sum(),
        }
    }

    pub fn total_errors(&self) -> usize {
        CheckKind::ALL.iter().map(|k| self.error_count(*k)).sum()
    }

    /// Number of results that could not run because of a configuration problem.
    pub fn degraded_count(&self) -> usize {
        self.duplicate
            .iter()
            .filter(|r| r.config_error.is_some())
            .count()
            + self
                .spatial
                .iter()
                .filter(|r| r.config_error.is_some())
                .count()
            + self
                .exclusion
                .iter()
                .filter(|r| r.config_error.is_some())
                .count()
    }
}

// ── Report ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ReportFormat {
    Json,
    #[default]
    Markdown,
}

impl ReportFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            ReportFormat::Json => "json",
            ReportFormat::Markdown => "markdown",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ReportFormat::Json => "json",
            ReportFormat::Markdown => "md",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ToolMeta {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub struct AuditSummary {
    pub checks_run: u32,
    pub degraded_checks: u32,
    pub duplicate_errors: u32,
    pub spatial_errors: u32,
    pub exclusion_errors: u32,
}

impl AuditSummary {
    pub fn total_errors(&self) -> u32 {
        self.duplicate_errors
            .saturating_add(self.spatial_errors)
            .saturating_add(self.exclusion_errors)
    }
}

/// The document handed to report renderers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AuditReport {
    pub schema: String,
    pub tool: ToolMeta,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    /// RFC 3339 timestamp (UTC).
    pub generated_at: String,
    pub summary: AuditSummary,
    pub results: ResultAggregate,
}

// ── On-disk Files ──────────────────────────────────────────────

/// Report defaults from the `[report]` table of an audit config.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub struct ReportDefaults {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<ReportFormat>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub out: Option<String>,
}

/// The on-disk audit configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub struct ConfigFile {
    #[serde(default)]
    pub report: ReportDefaults,

    /// Checks run in file order.
    #[serde(default)]
    pub check: Vec<CheckConfiguration>,
}

/// One layer entry in a project file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct LayerSource {
    pub id: String,
    /// GeoJSON file, relative to the project file.
    pub path: String,
    /// Display name. Defaults to `id`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// The on-disk project file: the set of layers checks can refer to.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub struct ProjectFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub layer: Vec<LayerSource>,
}
