//! Template rendering context

use kubecraft_core::{Mapping, Value};
use serde::Deserialize;
use serde_json::Value as JsonValue;

use crate::error::Result;

pub const DEFAULT_RELEASE_NAME: &str = "release";
pub const DEFAULT_CHART_NAME: &str = "chart";
pub const DEFAULT_NAMESPACE: &str = "default";
pub const DEFAULT_CHART_VERSION: &str = "0.1.0";

/// Values and identity available to templates
///
/// Unset identity fields fall back to Helm-like defaults when read through
/// the accessor methods.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplateContext {
    /// Substitution source for `.Values.*`
    pub values: Mapping,

    pub release_name: Option<String>,
    pub chart_name: Option<String>,
    pub namespace: Option<String>,
    pub chart_version: Option<String>,
}

/// On-disk form of a context file
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContextFile {
    #[serde(default)]
    values: Option<JsonValue>,
    release_name: Option<String>,
    chart_name: Option<String>,
    namespace: Option<String>,
    chart_version: Option<String>,
}

impl TemplateContext {
    /// Create a context with values and default identity
    pub fn new(values: Mapping) -> Self {
        Self {
            values,
            ..Default::default()
        }
    }

    /// Create a context from JSON-shaped values; non-objects give empty values
    pub fn from_json_values(values: JsonValue) -> Self {
        match Value::from(values) {
            Value::Mapping(map) => Self::new(map),
            _ => Self::default(),
        }
    }

    /// Parse a context document (`values`, `releaseName`, `chartName`,
    /// `namespace`, `chartVersion`)
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let file: ContextFile = serde_yaml::from_str(yaml)?;

        let mut ctx = file
            .values
            .map(Self::from_json_values)
            .unwrap_or_default();
        ctx.release_name = file.release_name;
        ctx.chart_name = file.chart_name;
        ctx.namespace = file.namespace;
        ctx.chart_version = file.chart_version;
        Ok(ctx)
    }

    pub fn with_release_name(mut self, name: impl Into<String>) -> Self {
        self.release_name = Some(name.into());
        self
    }

    pub fn with_chart_name(mut self, name: impl Into<String>) -> Self {
        self.chart_name = Some(name.into());
        self
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn with_chart_version(mut self, version: impl Into<String>) -> Self {
        self.chart_version = Some(version.into());
        self
    }

    pub fn release_name(&self) -> &str {
        self.release_name.as_deref().unwrap_or(DEFAULT_RELEASE_NAME)
    }

    pub fn chart_name(&self) -> &str {
        self.chart_name.as_deref().unwrap_or(DEFAULT_CHART_NAME)
    }

    pub fn namespace(&self) -> &str {
        self.namespace.as_deref().unwrap_or(DEFAULT_NAMESPACE)
    }

    pub fn chart_version(&self) -> &str {
        self.chart_version.as_deref().unwrap_or(DEFAULT_CHART_VERSION)
    }
}
