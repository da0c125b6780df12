//! kubecraft Engine - Helm-style placeholder rendering
//!
//! This crate provides:
//! - `TemplateContext`: values plus release/chart identity, with Helm defaults
//! - `render`: substitution of `.Values.*`, `.Release.*` and `.Chart.*` placeholders
//! - `HelmChart`: Chart.yaml, values.yaml and templates assembled as files

pub mod chart;
pub mod context;
pub mod error;
pub mod render;

pub use chart::{ChartFile, ChartMetadata, ChartType, HelmChart, Maintainer, standard_chart};
pub use context::TemplateContext;
pub use error::{EngineError, Result};
pub use render::{render, unresolved_placeholders};
