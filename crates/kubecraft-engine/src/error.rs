//! Engine error types

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Main engine error type
///
/// Rendering itself never fails; these cover chart assembly and I/O.
#[derive(Error, Debug, Diagnostic)]
pub enum EngineError {
    #[error("Invalid chart: {message}")]
    #[diagnostic(code(kubecraft::chart::invalid))]
    InvalidChart {
        message: String,
        #[help]
        help: Option<String>,
    },

    #[error("Invalid chart version: {0}")]
    #[diagnostic(code(kubecraft::chart::version))]
    InvalidVersion(#[from] semver::Error),

    #[error("Output directory already exists: {}", .0.display())]
    #[diagnostic(
        code(kubecraft::chart::output_exists),
        help("remove the directory or choose another output path")
    )]
    OutputExists(PathBuf),

    #[error("Failed to parse context: {0}")]
    #[diagnostic(code(kubecraft::context::parse))]
    ContextParse(#[from] serde_yaml::Error),

    #[error("Failed to serialize {path}: {source}")]
    #[diagnostic(code(kubecraft::chart::serialize))]
    ChartSerialize {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("IO error: {0}")]
    #[diagnostic(code(kubecraft::io))]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;
