//! CLI error types with exit code handling
//!
//! Library errors are flattened into one of these variants at the command
//! boundary so `main` can pick an exit code.

use miette::Diagnostic;
use std::path::Path;
use thiserror::Error;

use crate::exit_codes;

/// CLI-specific error type that includes exit code information
#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    /// App spec, values or manifests failed validation
    #[error("Validation failed: {message}")]
    #[diagnostic(code(kubecraft::cli::validation))]
    Validation {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Template or its inputs could not be used
    #[error("Template error: {message}")]
    #[diagnostic(code(kubecraft::cli::template))]
    Template {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Chart could not be assembled or written
    #[error("Chart error: {message}")]
    #[diagnostic(code(kubecraft::cli::chart))]
    Chart {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// IO error (file not found, permissions, etc.)
    #[error("IO error: {message}")]
    #[diagnostic(code(kubecraft::cli::io))]
    Io { message: String },
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> u8 {
        match self {
            CliError::Validation { .. } => exit_codes::VALIDATION_ERROR,
            CliError::Template { .. } => exit_codes::TEMPLATE_ERROR,
            CliError::Chart { .. } => exit_codes::CHART_ERROR,
            CliError::Io { .. } => exit_codes::IO_ERROR,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            help: None,
        }
    }

    pub fn validation_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            help: Some(help.into()),
        }
    }

    pub fn template(message: impl Into<String>) -> Self {
        Self::Template {
            message: message.into(),
            help: None,
        }
    }

    pub fn template_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Template {
            message: message.into(),
            help: Some(help.into()),
        }
    }

    /// Wrap an engine error, keeping its help text
    pub fn chart(err: kubecraft_engine::EngineError) -> Self {
        let help = err.help().map(|h| h.to_string());
        Self::Chart {
            message: err.to_string(),
            help,
        }
    }

    /// IO error annotated with the path involved
    pub fn io_at(path: &Path, err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{}: {}", path.display(), err),
        }
    }
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
