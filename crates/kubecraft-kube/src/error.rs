//! Kube error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum KubeError {
    #[error("Invalid {kind} spec: {message}")]
    InvalidSpec { kind: &'static str, message: String },

    #[error("Manifest validation failed with {} issue(s)", .0.len())]
    Validation(Vec<crate::validate::ValidationIssue>),

    #[error(transparent)]
    Core(#[from] kubecraft_core::CoreError),

    #[error("Failed to parse spec: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, KubeError>;
