//! Validate command - structural checks on a manifest file

use console::style;
use kubecraft_kube::validate::parse_manifests;
use kubecraft_kube::validate_manifest;
use std::fs;
use std::path::Path;

use crate::error::{CliError, Result};

pub fn run(path: &Path) -> Result<()> {
    let content = fs::read_to_string(path).map_err(|e| CliError::io_at(path, e))?;
    let manifests = parse_manifests(&content)
        .map_err(|e| CliError::validation(format!("{}: {}", path.display(), e)))?;

    println!(
        "{} Validating {} document(s) in {}",
        style("→").blue(),
        manifests.len(),
        path.display()
    );

    let mut failed = 0;
    for (index, manifest) in manifests.iter().enumerate() {
        let report = validate_manifest(manifest);
        if report.is_valid() {
            println!("  {} {}", style("✓").green(), report.resource());
            continue;
        }

        failed += 1;
        println!(
            "  {} {} (document {})",
            style("✗").red(),
            report.resource(),
            index + 1
        );
        for issue in &report.issues {
            println!("      {}", issue);
        }
    }

    println!();
    if failed > 0 {
        return Err(CliError::validation_with_help(
            format!("{} of {} document(s) have issues", failed, manifests.len()),
            "fix the fields listed above",
        ));
    }

    println!("{} All documents are valid", style("✓").green().bold());
    Ok(())
}
