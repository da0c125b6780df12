//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid label {kind} '{input}': {reason}")]
    InvalidLabel {
        kind: &'static str,
        input: String,
        reason: String,
    },

    #[error("Invalid quantity '{input}': {reason}")]
    InvalidQuantity { input: String, reason: String },
}

pub type Result<T> = std::result::Result<T, CoreError>;
