//! CLI commands

pub mod chart;
pub mod manifest;
pub mod template;
pub mod validate;
