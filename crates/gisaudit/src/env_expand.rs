//! `${VAR}` and `${VAR:-default}` expansion for project and audit files.
//!
//! Expansion runs on the raw TOML text before parsing, so a data directory
//! can be supplied as `path = "${GIS_DATA}/parcels.geojson"`.

use std::borrow::Cow;

use anyhow::{bail, Result};

/// Expands every `${...}` reference in `text`.
///
/// A reference without a default fails when the variable is unset. A default
/// is used when the variable is unset or empty. A `$` not followed by `{`
/// is kept as is.
pub fn expand_env_vars(text: &str) -> Result<Cow<'_, str>> {
    expand_with(text, |name| std::env::var(name).ok())
}

fn expand_with<F>(text: &str, lookup: F) -> Result<Cow<'_, str>>
where
    F: Fn(&str) -> Option<String>,
{
    if !text.contains("${") {
        return Ok(Cow::Borrowed(text));
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let body_start = start + 2;
        let Some(len) = rest[body_start..].find('}') else {
            let offset = text.len() - rest.len() + start;
            bail!("unclosed variable reference at byte {offset}");
        };
        let body = &rest[body_start..body_start + len];
        out.push_str(&resolve(body, &lookup)?);
        rest = &rest[body_start + len + 1..];
    }
    out.push_str(rest);

    Ok(Cow::Owned(out))
}

fn resolve<F>(body: &str, lookup: &F) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    let (name, default) = match body.split_once(":-") {
        Some((name, default)) => (name, Some(default)),
        None => (body, None),
    };
    validate_var_name(name)?;

    match (lookup(name), default) {
        (Some(value), Some(_)) if !value.is_empty() => Ok(value),
        (Some(value), None) => Ok(value),
        (_, Some(default)) => Ok(default.to_string()),
        (None, None) => bail!("environment variable '{name}' is not set"),
    }
}

fn validate_var_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !valid {
        bail!("invalid environment variable name '{name}'");
    }
    Ok(())
}
