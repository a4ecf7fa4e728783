use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use schemars::schema::RootSchema;
use schemars::schema_for;

use gisaudit_types::{AuditReport, ConfigFile, ProjectFile};

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Repo automation tasks", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Run the local CI suite: fmt, clippy, test.
    Ci,

    /// Generate JSON Schemas for the audit config, project file and report.
    Schema {
        #[arg(long, default_value = "schemas")]
        out_dir: PathBuf,

        /// Fail instead of writing when the files on disk are stale.
        #[arg(long)]
        check: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.cmd {
        Cmd::Ci => ci(),
        Cmd::Schema { out_dir, check } => {
            if check {
                check_schemas(&out_dir)
            } else {
                write_schemas(&out_dir)
            }
        }
    }
}

fn ci() -> Result<()> {
    run("cargo", &["fmt", "--check"])?;
    run(
        "cargo",
        &[
            "clippy",
            "--workspace",
            "--all-targets",
            "--",
            "-D",
            "warnings",
        ],
    )?;
    run("cargo", &["test", "--workspace"])?;
    Ok(())
}

fn schemas() -> Vec<(&'static str, RootSchema)> {
    vec![
        ("gisaudit.config.schema.json", schema_for!(ConfigFile)),
        ("gisaudit.project.schema.json", schema_for!(ProjectFile)),
        ("gisaudit.report.v1.schema.json", schema_for!(AuditReport)),
    ]
}

fn render(schema: &RootSchema) -> Result<Vec<u8>> {
    let mut bytes = serde_json::to_vec_pretty(schema).context("serialize schema")?;
    bytes.push(b'\n');
    Ok(bytes)
}

fn write_schemas(out_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(out_dir).context("create schema output dir")?;

    for (file, schema) in schemas() {
        let path = out_dir.join(file);
        std::fs::write(&path, render(&schema)?)
            .with_context(|| format!("write {}", path.display()))?;
        eprintln!("wrote {}", path.display());
    }
    Ok(())
}

fn check_schemas(out_dir: &Path) -> Result<()> {
    let mut stale = Vec::new();
    for (file, schema) in schemas() {
        let path = out_dir.join(file);
        let on_disk = std::fs::read(&path).unwrap_or_default();
        if on_disk != render(&schema)? {
            stale.push(path.display().to_string());
        }
    }

    if !stale.is_empty() {
        bail!(
            "schemas out of date (run `cargo xtask schema`): {}",
            stale.join(", ")
        );
    }
    eprintln!("schemas up to date");
    Ok(())
}

fn run(bin: &str, args: &[&str]) -> Result<()> {
    let status = Command::new(bin)
        .args(args)
        .status()
        .with_context(|| format!("run {bin} {args:?}"))?;
    if !status.success() {
        bail!("command failed: {bin} {args:?}");
    }
    Ok(())
}
