use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};

use gisaudit_types::{
    AuditReport, AuditSummary, CheckKind, ReportFormat, ResultAggregate, ToolMeta, REPORT_SCHEMA_V1,
};

use crate::render::render_markdown_report;

pub const DEFAULT_REPORT_TITLE: &str = "GIS Audit Report";

/// Presentation options passed through to the renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportOptions {
    pub title: String,
    pub project_name: Option<String>,
    pub format: ReportFormat,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            title: DEFAULT_REPORT_TITLE.to_string(),
            project_name: None,
            format: ReportFormat::default(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("write report '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Turns a finished aggregate into a report document at `destination`.
pub trait ReportRenderer {
    fn generate(
        &self,
        destination: &Path,
        aggregate: &ResultAggregate,
        options: &ReportOptions,
    ) -> Result<(), ReportError>;
}

/// Writes JSON or Markdown reports to the filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileReportRenderer;

impl ReportRenderer for FileReportRenderer {
    fn generate(
        &self,
        destination: &Path,
        aggregate: &ResultAggregate,
        options: &ReportOptions,
    ) -> Result<(), ReportError> {
        let report = build_report(aggregate, options);
        let text = match options.format {
            ReportFormat::Json => render_json_report(&report)?,
            ReportFormat::Markdown => render_markdown_report(&report),
        };

        if let Some(parent) = destination.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|source| ReportError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        std::fs::write(destination, text).map_err(|source| ReportError::Io {
            path: destination.to_path_buf(),
            source,
        })
    }
}

/// Stamps schema, tool and timestamp onto the aggregate and summarizes it.
pub fn build_report(aggregate: &ResultAggregate, options: &ReportOptions) -> AuditReport {
    AuditReport {
        schema: REPORT_SCHEMA_V1.to_string(),
        tool: ToolMeta {
            name: "gisaudit".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        title: options.title.clone(),
        project: options.project_name.clone(),
        generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        summary: summarize(aggregate),
        results: aggregate.clone(),
    }
}

pub fn render_json_report(report: &AuditReport) -> Result<String, serde_json::Error> {
    let mut s = serde_json::to_string_pretty(report)?;
    s.push('\n');
    Ok(s)
}

fn summarize(aggregate: &ResultAggregate) -> AuditSummary {
    let count = |n: usize| u32::try_from(n).unwrap_or(u32::MAX);
    AuditSummary {
        checks_run: count(aggregate.total_results()),
        degraded_checks: count(aggregate.degraded_count()),
        duplicate_errors: count(aggregate.error_count(CheckKind::Duplicate)),
        spatial_errors: count(aggregate.error_count(CheckKind::Spatial)),
        exclusion_errors: count(aggregate.error_count(CheckKind::Exclusion)),
    }
}
