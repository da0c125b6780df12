//! kubecraft Core - Value model and YAML output for Kubernetes manifests
//!
//! This crate provides the foundational pieces used throughout kubecraft:
//! - `Value`: An ordered, typed tree that distinguishes absent keys from explicit nulls
//! - `yaml`: The manifest-subset YAML serializer (single and multi-document)
//! - `labels`: Standard `app.kubernetes.io/*` labels and label validation
//! - `quantity`: CPU and memory resource quantity parsing

pub mod error;
pub mod labels;
pub mod quantity;
pub mod value;
pub mod yaml;

pub use error::{CoreError, Result};
pub use labels::{LabelSet, merge_labels, selector_labels, standard_labels};
pub use value::{Mapping, Number, Value};
pub use yaml::{to_yaml, to_yaml_multi_doc, to_yaml_string};
