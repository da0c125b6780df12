//! Chart command - scaffold a Helm chart

use console::style;
use kubecraft_engine::standard_chart;
use std::path::Path;

use crate::error::{CliError, Result};

pub fn run(name: &str, image: &str, tag: &str, port: u16, output: &Path) -> Result<()> {
    let chart = standard_chart(name, image, tag, port).map_err(CliError::chart)?;
    let chart_dir = chart.write_to(output).map_err(CliError::chart)?;

    println!(
        "{} Created chart: {}",
        style("✓").green().bold(),
        style(chart_dir.display()).cyan()
    );
    println!();
    println!("Files:");
    for file in chart.files().map_err(CliError::chart)? {
        println!("  {}", file.path);
    }
    println!();
    println!("Preview with:");
    println!(
        "  kubecraft chart {} --image {} --tag {} --port {} --preview",
        name, image, tag, port
    );

    Ok(())
}

pub fn preview(
    name: &str,
    image: &str,
    tag: &str,
    port: u16,
    release: &str,
    namespace: &str,
) -> Result<()> {
    let chart = standard_chart(name, image, tag, port).map_err(CliError::chart)?;
    let rendered = chart.preview(&chart.context(release, namespace));

    for (template, content) in &rendered {
        println!("---");
        println!("# Source: {}/templates/{}", name, template);
        print!("{}", content);
    }

    Ok(())
}
