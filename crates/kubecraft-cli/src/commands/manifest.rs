//! Manifest command - build and validate an application bundle

use console::style;
use kubecraft_core::{Value, to_yaml_multi_doc};
use kubecraft_kube::validate::parse_manifests;
use kubecraft_kube::{AppSpec, KubeError, validate_manifest};
use std::fs;
use std::path::Path;

use crate::error::{CliError, Result};

pub fn run(app_path: &Path, namespace: Option<&str>, output: Option<&Path>) -> Result<()> {
    let mut spec = AppSpec::from_file(app_path).map_err(|e| match e {
        KubeError::Io(err) => CliError::io_at(app_path, err),
        other => CliError::validation_with_help(
            format!("{}: {}", app_path.display(), other),
            "an app spec needs at least `name` and `image`",
        ),
    })?;

    if let Some(namespace) = namespace {
        spec.namespace = Some(namespace.to_string());
    }

    let resources = spec
        .resources()
        .map_err(|e| CliError::validation(e.to_string()))?;

    check(&resources, "fix the fields listed above")?;

    // Scalars can change type on the way through YAML; check the re-parsed text
    let yaml = format!("{}\n", to_yaml_multi_doc(&resources));
    let written = parse_manifests(&yaml).map_err(|e| CliError::validation(e.to_string()))?;
    check(
        &written,
        "values such as 0.5, -1, True or 1e3 are written unquoted and read back as numbers or booleans",
    )?;

    match output {
        Some(path) => {
            fs::write(path, &yaml).map_err(|e| CliError::io_at(path, e))?;
            eprintln!(
                "{} Wrote {} resource(s) to {}",
                style("✓").green(),
                resources.len(),
                path.display()
            );
        }
        None => print!("{}", yaml),
    }

    Ok(())
}

fn check(manifests: &[Value], help: &str) -> Result<()> {
    let problems: Vec<String> = manifests
        .iter()
        .map(validate_manifest)
        .filter(|report| !report.is_valid())
        .flat_map(|report| {
            let resource = report.resource();
            report
                .issues
                .into_iter()
                .map(move |issue| format!("{}: {}", resource, issue))
        })
        .collect();

    if problems.is_empty() {
        return Ok(());
    }

    Err(CliError::validation_with_help(
        format!(
            "{} issue(s) in generated manifests:\n{}",
            problems.len(),
            problems.join("\n")
        ),
        help,
    ))
}
