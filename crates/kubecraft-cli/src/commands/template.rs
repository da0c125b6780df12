//! Template command - render a template file locally

use console::style;
use kubecraft_engine::{TemplateContext, render, unresolved_placeholders};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{CliError, Result};
use crate::util::{load_values_file, merge_values, parse_set_values};

/// Identity overrides from the command line
#[derive(Debug, Default)]
pub struct Identity {
    pub release_name: Option<String>,
    pub namespace: Option<String>,
    pub chart_name: Option<String>,
    pub chart_version: Option<String>,
}

pub fn run(
    template_path: &Path,
    context_file: Option<&Path>,
    values_files: &[PathBuf],
    set_values: &[String],
    identity: Identity,
) -> Result<()> {
    let template =
        fs::read_to_string(template_path).map_err(|e| CliError::io_at(template_path, e))?;

    let context = build_context(context_file, values_files, set_values, identity)?;
    let rendered = render(&template, &context);

    for placeholder in unresolved_placeholders(&rendered) {
        eprintln!(
            "{} unresolved placeholder left as-is: {}",
            style("warning:").yellow().bold(),
            placeholder
        );
    }

    print!("{}", rendered);
    Ok(())
}

/// Context file, then values files in order, then `--set`, then identity flags
fn build_context(
    context_file: Option<&Path>,
    values_files: &[PathBuf],
    set_values: &[String],
    identity: Identity,
) -> Result<TemplateContext> {
    let mut context = match context_file {
        Some(path) => {
            let content = fs::read_to_string(path).map_err(|e| CliError::io_at(path, e))?;
            TemplateContext::from_yaml(&content).map_err(|e| {
                CliError::template_with_help(
                    format!("{}: {}", path.display(), e),
                    "context keys are values, releaseName, chartName, namespace and chartVersion",
                )
            })?
        }
        None => TemplateContext::default(),
    };

    for values_file in values_files {
        let file_values = load_values_file(values_file)?;
        merge_values(&mut context.values, &file_values);
        tracing::debug!(file = %values_file.display(), "merged values");
    }

    if !set_values.is_empty() {
        let overrides = parse_set_values(set_values)?;
        merge_values(&mut context.values, &overrides);
        tracing::debug!(count = set_values.len(), "applied --set values");
    }

    if let Some(name) = identity.release_name {
        context = context.with_release_name(name);
    }
    if let Some(namespace) = identity.namespace {
        context = context.with_namespace(namespace);
    }
    if let Some(name) = identity.chart_name {
        context = context.with_chart_name(name);
    }
    if let Some(version) = identity.chart_version {
        context = context.with_chart_version(version);
    }

    Ok(context)
}
