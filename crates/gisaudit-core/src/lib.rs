//! Core engine: orchestrates check dispatch + result aggregation + reporting.

mod render;
mod report;
mod runner;

pub use render::render_markdown_report;
pub use report::{
    build_report, render_json_report, FileReportRenderer, ReportError, ReportOptions,
    ReportRenderer, DEFAULT_REPORT_TITLE,
};
pub use runner::AuditRunner;
