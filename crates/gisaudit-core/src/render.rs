use gisaudit_types::{AuditReport, DuplicateResult, ExclusionResult, SpatialResult};

pub fn render_markdown_report(report: &AuditReport) -> String {
    let summary = &report.summary;
    let status = if summary.total_errors() > 0 {
        "ERRORS FOUND"
    } else {
        "CLEAN"
    };

    let mut out = String::new();
    out.push_str(&format!("# {} — {status}\n\n", escape_md(&report.title)));

    if let Some(project) = &report.project {
        out.push_str(&format!("Project: **{}**\n\n", escape_md(project)));
    }

    out.push_str(&format!(
        "Ran **{}** check(s) at {}: **{}** duplicate, **{}** spatial, **{}** exclusion error(s).\n\n",
        summary.checks_run,
        report.generated_at,
        summary.duplicate_errors,
        summary.spatial_errors,
        summary.exclusion_errors
    ));

    if summary.degraded_checks > 0 {
        out.push_str(&format!(
            "**Note:** {} check(s) could not run because of configuration problems.\n\n",
            summary.degraded_checks
        ));
    }

    if report.results.is_empty() {
        out.push_str("No checks were run.\n");
        return out;
    }

    if !report.results.duplicate.is_empty() {
        out.push_str("## Duplicate values\n\n");
        for r in &report.results.duplicate {
            out.push_str(&render_duplicate(r));
        }
    }

    if !report.results.spatial.is_empty() {
        out.push_str("## Spatial containment\n\n");
        for r in &report.results.spatial {
            out.push_str(&render_spatial(r));
        }
    }

    if !report.results.exclusion.is_empty() {
        out.push_str("## Exclusion zones\n\n");
        for r in &report.results.exclusion {
            out.push_str(&render_exclusion(r));
        }
    }

    out
}

fn render_duplicate(r: &DuplicateResult) -> String {
    let mut out = format!(
        "### `{}`.`{}`\n\n",
        escape_md(&r.layer_name),
        escape_md(&r.field_name)
    );
    if push_config_error(&mut out, r.config_error.as_deref()) {
        return out;
    }
    if r.errors.is_empty() {
        out.push_str("No errors.\n\n");
        return out;
    }

    out.push_str("| Value | Count |\n");
    out.push_str("|---|---|\n");
    for e in &r.errors {
        out.push_str(&format!("| `{}` | {} |\n", escape_md(&e.value), e.count));
    }
    out.push('\n');
    out
}

fn render_spatial(r: &SpatialResult) -> String {
    let mut out = format!(
        "### `{}` within `{}`\n\n",
        escape_md(&r.child_layer_name),
        escape_md(&r.parent_layer_name)
    );
    if push_config_error(&mut out, r.config_error.as_deref()) {
        return out;
    }
    if r.errors.is_empty() {
        out.push_str("No errors.\n\n");
        return out;
    }

    out.push_str(&format!(
        "{} feature(s) outside all parents.\n\n",
        r.errors.len()
    ));
    out.push_str("| Child | Child layer | Parent layer |\n");
    out.push_str("|---|---|---|\n");
    for e in &r.errors {
        out.push_str(&format!(
            "| `{}` | {} | {} |\n",
            escape_md(&e.child_id.to_string()),
            escape_md(&e.child_layer_name),
            escape_md(&e.parent_layer_name)
        ));
    }
    out.push('\n');
    out
}

fn render_exclusion(r: &ExclusionResult) -> String {
    let mut out = format!(
        "### `{}` against `{}`\n\n",
        escape_md(&r.target_layer_name),
        escape_md(&r.exclusion_layer_name)
    );
    if push_config_error(&mut out, r.config_error.as_deref()) {
        return out;
    }
    if r.errors.is_empty() {
        out.push_str("No errors.\n\n");
        return out;
    }

    out.push_str(&format!(
        "{} feature(s) inside the exclusion zone.\n\n",
        r.errors.len()
    ));
    out.push_str("| Target |\n");
    out.push_str("|---|\n");
    for e in &r.errors {
        out.push_str(&format!("| `{}` |\n", escape_md(&e.target_id.to_string())));
    }
    out.push('\n');
    out
}

/// Returns true when the check was degraded and nothing else should be rendered.
fn push_config_error(out: &mut String, config_error: Option<&str>) -> bool {
    match config_error {
        Some(msg) => {
            out.push_str(&format!("**Not run:** {}\n\n", escape_md(msg)));
            true
        }
        None => false,
    }
}

fn escape_md(s: &str) -> String {
    s.replace('|', "\\|").replace('`', "\\`")
}
