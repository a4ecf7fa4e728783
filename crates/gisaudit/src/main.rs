use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{debug, info};

use gisaudit_core::{AuditRunner, FileReportRenderer, ReportOptions, DEFAULT_REPORT_TITLE};
use gisaudit_domain::LayerRegistry;
use gisaudit_types::{CheckConfiguration, CheckResult, ConfigFile, ReportFormat, ResultAggregate};

mod config_loader;
mod env_expand;
mod geojson;

use config_loader::{load_audit_config, load_project, LoadedProject};

const DEFAULT_REPORT_DIR: &str = "artifacts/gisaudit";

/// Exit code when the audit itself found problems.
const EXIT_FINDINGS: i32 = 2;

#[derive(Parser)]
#[command(name = "gisaudit")]
#[command(about = "Data-quality audits for GIS layers", long_about = None)]
struct Cli {
    /// Enable verbose (info-level) logging to stderr.
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    /// Enable debug-level logging to stderr.
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every configured check and write a report.
    Run(RunArgs),

    /// Check that configurations refer to existing layers and fields.
    Validate(ValidateArgs),

    /// List the layers a project provides.
    Layers(LayersArgs),
}

#[derive(Parser, Debug)]
struct RunArgs {
    /// Project file listing the layers.
    #[arg(long)]
    project: PathBuf,

    /// Audit configuration with `[[check]]` tables.
    #[arg(long)]
    config: PathBuf,

    /// Report destination. Overrides `[report] out`.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Report format. Overrides `[report] format`.
    #[arg(long, value_enum)]
    format: Option<FormatArg>,

    /// Report title. Overrides `[report] title`.
    #[arg(long)]
    title: Option<String>,
}

#[derive(Parser, Debug)]
struct ValidateArgs {
    #[arg(long)]
    project: PathBuf,

    #[arg(long)]
    config: PathBuf,
}

#[derive(Parser, Debug)]
struct LayersArgs {
    #[arg(long)]
    project: PathBuf,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FormatArg {
    Json,
    Markdown,
}

impl From<FormatArg> for ReportFormat {
    fn from(f: FormatArg) -> Self {
        match f {
            FormatArg::Json => ReportFormat::Json,
            FormatArg::Markdown => ReportFormat::Markdown,
        }
    }
}

#[cfg(not(test))]
fn main() -> std::process::ExitCode {
    match run_with_args(std::env::args_os()) {
        Ok(code) => std::process::ExitCode::from(code as u8),
        Err(err) => {
            eprintln!("{err:?}");
            std::process::ExitCode::from(1)
        }
    }
}

fn run_with_args<I, T>(args: I) -> Result<i32>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = Cli::parse_from(args);

    init_logging(cli.verbose, cli.debug);

    match cli.command {
        Commands::Run(args) => cmd_run(args),
        Commands::Validate(args) => cmd_validate(args),
        Commands::Layers(args) => {
            cmd_layers(args)?;
            Ok(0)
        }
    }
}

fn init_logging(verbose: bool, debug: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let level = if debug {
        "debug"
    } else if verbose {
        "info"
    } else {
        "warn"
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();

    debug!("Logging initialized at level: {}", level);
}

/// CLI flags win over the config's `[report]` table, which wins over defaults.
fn resolve_report(
    args: &RunArgs,
    cfg: &ConfigFile,
    project: &LoadedProject,
) -> (PathBuf, ReportOptions) {
    let format = args
        .format
        .map(ReportFormat::from)
        .or(cfg.report.format)
        .unwrap_or_default();
    let out = args
        .out
        .clone()
        .or_else(|| cfg.report.out.as_ref().map(PathBuf::from))
        .unwrap_or_else(|| {
            Path::new(DEFAULT_REPORT_DIR).join(format!("report.{}", format.extension()))
        });
    let title = args
        .title
        .clone()
        .or_else(|| cfg.report.title.clone())
        .unwrap_or_else(|| DEFAULT_REPORT_TITLE.to_string());

    let options = ReportOptions {
        title,
        project_name: project.name.clone(),
        format,
    };
    (out, options)
}

fn cmd_run(args: RunArgs) -> Result<i32> {
    let project = load_project(&args.project)?;
    let cfg = load_audit_config(&args.config)?;
    let (out, options) = resolve_report(&args, &cfg, &project);

    info!(
        "Running {} check(s) against {} layer(s)",
        cfg.check.len(),
        project.layer_ids.len()
    );

    let mut written: Option<PathBuf> = None;
    let aggregate = AuditRunner::new(&project.registry)
        .on_progress(|done, total| eprintln!("[{done}/{total}] checks complete"))
        .on_finished(|dest| written = dest.map(Path::to_path_buf))
        .with_report(Box::new(FileReportRenderer), out, options)
        .run(&cfg.check);

    print!("{}", render_summary(&aggregate));
    if let Some(path) = &written {
        if path.exists() {
            println!("Report: {}", path.display());
        }
    }

    if aggregate.total_errors() > 0 || aggregate.degraded_count() > 0 {
        Ok(EXIT_FINDINGS)
    } else {
        Ok(0)
    }
}

/// One line per check, grouped by kind, then a totals line.
fn render_summary(aggregate: &ResultAggregate) -> String {
    let mut out = String::new();
    let results = aggregate
        .duplicate
        .iter()
        .cloned()
        .map(CheckResult::Duplicate)
        .chain(aggregate.spatial.iter().cloned().map(CheckResult::Spatial))
        .chain(aggregate.exclusion.iter().cloned().map(CheckResult::Exclusion));

    for result in results {
        let subject = match &result {
            CheckResult::Duplicate(r) => format!("{}.{}", r.layer_name, r.field_name),
            CheckResult::Spatial(r) => {
                format!("{} within {}", r.child_layer_name, r.parent_layer_name)
            }
            CheckResult::Exclusion(r) => {
                format!("{} against {}", r.target_layer_name, r.exclusion_layer_name)
            }
        };
        let status = match result.config_error() {
            Some(reason) => format!("not run ({reason})"),
            None => format!("{} error(s)", result.error_count()),
        };
        out.push_str(&format!("{:<10} {subject}: {status}\n", result.kind().as_str()));
    }

    out.push_str(&format!(
        "{} check(s), {} error(s), {} not run\n",
        aggregate.total_results(),
        aggregate.total_errors(),
        aggregate.degraded_count()
    ));
    out
}

/// Problems that would degrade a check, plus softer warnings.
fn validate_checks(
    checks: &[CheckConfiguration],
    registry: &dyn LayerRegistry,
) -> (Vec<String>, Vec<String>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    for (i, check) in checks.iter().enumerate() {
        let label = match check.kind() {
            Some(kind) => format!("Check {} ({kind})", i + 1),
            None => {
                warnings.push(format!(
                    "Check {}: unknown check_type, it will be skipped",
                    i + 1
                ));
                continue;
            }
        };

        for id in check.layer_ids() {
            if registry.resolve(id).is_none() {
                errors.push(format!("{label}: unknown layer '{id}'"));
            }
        }

        let (layer_id, field, required) = match check {
            CheckConfiguration::Duplicate(c) => {
                (c.layer_id.as_str(), Some(c.field_name.as_str()), true)
            }
            CheckConfiguration::Spatial(c) => {
                (c.child_id.as_str(), c.child_unique_field.as_deref(), false)
            }
            CheckConfiguration::Exclusion(c) => {
                (c.target_id.as_str(), c.target_unique_field.as_deref(), false)
            }
            CheckConfiguration::Unknown => continue,
        };
        let (Some(layer), Some(field)) = (registry.resolve(layer_id), field) else {
            continue;
        };
        if !layer.has_field(field) {
            let msg = format!("{label}: field '{field}' not found in layer '{layer_id}'");
            if required {
                errors.push(msg);
            } else {
                warnings.push(format!("{msg}, feature ids will be reported instead"));
            }
        }
    }

    (errors, warnings)
}

fn cmd_validate(args: ValidateArgs) -> Result<i32> {
    info!("Validating audit configuration");
    let project = load_project(&args.project)?;
    let cfg = load_audit_config(&args.config)?;
    let (errors, warnings) = validate_checks(&cfg.check, &project.registry);

    println!("Validating {}...", args.config.display());
    println!();

    if !warnings.is_empty() {
        println!("Warnings ({}):", warnings.len());
        for (i, warn) in warnings.iter().enumerate() {
            println!("  {}. {}", i + 1, warn);
        }
        println!();
    }

    if errors.is_empty() {
        println!("Configuration is valid!");
        println!("  {} check(s) defined", cfg.check.len());
        Ok(0)
    } else {
        println!("Configuration has {} error(s):", errors.len());
        println!();
        for (i, err) in errors.iter().enumerate() {
            println!("  {}. {}", i + 1, err);
        }
        Ok(EXIT_FINDINGS)
    }
}

fn cmd_layers(args: LayersArgs) -> Result<()> {
    let project = load_project(&args.project)?;

    for id in &project.layer_ids {
        let layer = project
            .registry
            .resolve(id)
            .with_context(|| format!("layer '{id}' missing after load"))?;
        let fields = if layer.field_names().is_empty() {
            "-".to_string()
        } else {
            layer.field_names().join(", ")
        };
        println!(
            "{id}\t{}\t{} feature(s)\tfields: {fields}",
            layer.name(),
            layer.feature_count()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gisaudit_types::{DuplicateConfig, DuplicateResult, ExclusionConfig, SpatialConfig};
    use tempfile::TempDir;

    const PARCELS: &str = r#"{"type": "FeatureCollection", "features": [
        {"type": "Feature", "geometry": {"type": "Polygon", "coordinates": [[[1,1],[3,1],[3,3],[1,3],[1,1]]]}, "properties": {"pin": "P-1"}},
        {"type": "Feature", "geometry": {"type": "Polygon", "coordinates": [[[4,4],[6,4],[6,6],[4,6],[4,4]]]}, "properties": {"pin": "P-2"}}
    ]}"#;

    const DISTRICTS: &str = r#"{"type": "FeatureCollection", "features": [
        {"type": "Feature", "geometry": {"type": "Polygon", "coordinates": [[[0,0],[10,0],[10,10],[0,10],[0,0]]]}, "properties": {"name": "North"}}
    ]}"#;

    fn write_project(dir: &Path) -> PathBuf {
        std::fs::write(dir.join("parcels.geojson"), PARCELS).expect("write parcels");
        std::fs::write(dir.join("districts.geojson"), DISTRICTS).expect("write districts");
        let path = dir.join("project.toml");
        std::fs::write(
            &path,
            r#"
name = "Test County"

[[layer]]
id = "parcels"
path = "parcels.geojson"
name = "Parcels"

[[layer]]
id = "districts"
path = "districts.geojson"
"#,
        )
        .expect("write project");
        path
    }

    fn write_config(dir: &Path, contents: &str) -> PathBuf {
        let path = dir.join("audit.toml");
        std::fs::write(&path, contents).expect("write config");
        path
    }

    #[test]
    fn run_with_args_clean_audit_exits_zero() {
        let dir = TempDir::new().expect("temp");
        let project = write_project(dir.path());
        let config = write_config(
            dir.path(),
            r#"
[[check]]
check_type = "duplicate"
layer_id = "parcels"
field_name = "pin"

[[check]]
check_type = "spatial"
parent_id = "districts"
child_id = "parcels"
"#,
        );
        let out = dir.path().join("out/report.json");

        let code = run_with_args([
            "gisaudit",
            "--verbose",
            "run",
            "--project",
            project.to_str().expect("utf8"),
            "--config",
            config.to_str().expect("utf8"),
            "--out",
            out.to_str().expect("utf8"),
            "--format",
            "json",
        ])
        .expect("run");
        assert_eq!(code, 0);

        let report: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&out).expect("report")).expect("json");
        assert_eq!(report["project"], "Test County");
        assert_eq!(report["summary"]["checks_run"], 2);
    }

    #[test]
    fn run_with_args_degraded_audit_exits_two() {
        let dir = TempDir::new().expect("temp");
        let project = write_project(dir.path());
        let config = write_config(
            dir.path(),
            r#"
[[check]]
check_type = "exclusion"
target_id = "wells"
exclusion_id = "districts"
"#,
        );
        let out = dir.path().join("report.md");

        let code = run_with_args([
            "gisaudit",
            "run",
            "--project",
            project.to_str().expect("utf8"),
            "--config",
            config.to_str().expect("utf8"),
            "--out",
            out.to_str().expect("utf8"),
        ])
        .expect("run");
        assert_eq!(code, EXIT_FINDINGS);
        let md = std::fs::read_to_string(&out).expect("report");
        assert!(md.contains("target layer 'wells' not found"));
    }

    #[test]
    fn report_settings_prefer_flags_then_config() {
        let dir = TempDir::new().expect("temp");
        let project = load_project(&write_project(dir.path())).expect("load");
        let mut cfg = ConfigFile::default();
        cfg.report.title = Some("From config".to_string());
        cfg.report.format = Some(ReportFormat::Json);

        let args = RunArgs {
            project: PathBuf::new(),
            config: PathBuf::new(),
            out: None,
            format: None,
            title: Some("From flag".to_string()),
        };
        let (out, options) = resolve_report(&args, &cfg, &project);
        assert_eq!(out, Path::new(DEFAULT_REPORT_DIR).join("report.json"));
        assert_eq!(options.title, "From flag");
        assert_eq!(options.format, ReportFormat::Json);
        assert_eq!(options.project_name.as_deref(), Some("Test County"));
    }

    #[test]
    fn validate_reports_unknown_layers_and_fields() {
        let dir = TempDir::new().expect("temp");
        let project = load_project(&write_project(dir.path())).expect("load");
        let checks = vec![
            CheckConfiguration::Duplicate(DuplicateConfig {
                layer_id: "parcels".to_string(),
                field_name: "owner".to_string(),
            }),
            CheckConfiguration::Spatial(SpatialConfig {
                parent_id: "zones".to_string(),
                child_id: "parcels".to_string(),
                child_unique_field: Some("apn".to_string()),
            }),
            CheckConfiguration::Exclusion(ExclusionConfig {
                target_id: "parcels".to_string(),
                exclusion_id: "districts".to_string(),
                target_unique_field: Some("pin".to_string()),
            }),
            CheckConfiguration::Unknown,
        ];

        let (errors, warnings) = validate_checks(&checks, &project.registry);
        assert_eq!(
            errors,
            vec![
                "Check 1 (duplicate): field 'owner' not found in layer 'parcels'".to_string(),
                "Check 2 (spatial): unknown layer 'zones'".to_string(),
            ]
        );
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].contains("field 'apn' not found"));
        assert!(warnings[1].contains("unknown check_type"));
    }

    #[test]
    fn summary_lists_each_check_and_totals() {
        let mut aggregate = ResultAggregate::default();
        aggregate.push(CheckResult::Duplicate(DuplicateResult {
            layer_name: "Parcels".to_string(),
            field_name: "pin".to_string(),
            errors: vec![],
            config_error: None,
        }));
        aggregate.push(CheckResult::Duplicate(DuplicateResult {
            layer_name: "Invalid Layer".to_string(),
            field_name: "pin".to_string(),
            errors: vec![],
            config_error: Some("layer 'x' not found".to_string()),
        }));

        let summary = render_summary(&aggregate);
        assert!(summary.contains("duplicate  Parcels.pin: 0 error(s)"));
        assert!(summary.contains("Invalid Layer.pin: not run (layer 'x' not found)"));
        assert!(summary.ends_with("2 check(s), 0 error(s), 1 not run\n"));
    }
}
