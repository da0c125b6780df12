//! Helm chart artifacts
//!
//! A `HelmChart` is the in-memory form of a chart directory: `Chart.yaml`
//! metadata, default `values.yaml`, and template files. Templates use only
//! the placeholders understood by [`crate::render`], so a chart can be
//! previewed locally and still be consumed by Helm itself.

use indexmap::IndexMap;
use kubecraft_core::labels::is_dns1123_label;
use kubecraft_core::{Mapping, Value};
use semver::Version;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::context::TemplateContext;
use crate::error::{EngineError, Result};
use crate::render::{render, unresolved_placeholders};

/// Chart API version written to Chart.yaml
pub const CHART_API_VERSION: &str = "v2";

/// Chart type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    #[default]
    Application,
    Library,
}

impl ChartType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChartType::Application => "application",
            ChartType::Library => "library",
        }
    }
}

/// Chart maintainer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Maintainer {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

impl Maintainer {
    fn to_value(&self) -> Value {
        Mapping::new()
            .with("name", &self.name)
            .with_opt("email", self.email.as_deref())
            .with_opt("url", self.url.as_deref())
            .into()
    }
}

/// Chart.yaml contents
#[derive(Debug, Clone, PartialEq)]
pub struct ChartMetadata {
    pub api_version: String,
    pub name: String,
    pub version: Version,
    pub app_version: Option<String>,
    pub description: Option<String>,
    pub chart_type: ChartType,
    pub keywords: Vec<String>,
    pub home: Option<String>,
    pub maintainers: Vec<Maintainer>,
}

impl ChartMetadata {
    /// Create metadata, checking the chart name and SemVer version
    pub fn new(name: &str, version: &str) -> Result<Self> {
        if !is_dns1123_label(name) {
            return Err(EngineError::InvalidChart {
                message: format!("chart name '{}' is not a valid name", name),
                help: Some(
                    "use lowercase letters, digits and '-', starting and ending with an alphanumeric"
                        .to_string(),
                ),
            });
        }

        Ok(Self {
            api_version: CHART_API_VERSION.to_string(),
            name: name.to_string(),
            version: Version::parse(version)?,
            app_version: None,
            description: None,
            chart_type: ChartType::default(),
            keywords: Vec::new(),
            home: None,
            maintainers: Vec::new(),
        })
    }

    pub fn with_app_version(mut self, app_version: impl Into<String>) -> Self {
        self.app_version = Some(app_version.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_type(mut self, chart_type: ChartType) -> Self {
        self.chart_type = chart_type;
        self
    }

    pub fn with_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keywords.push(keyword.into());
        self
    }

    pub fn with_home(mut self, home: impl Into<String>) -> Self {
        self.home = Some(home.into());
        self
    }

    pub fn with_maintainer(mut self, maintainer: Maintainer) -> Self {
        self.maintainers.push(maintainer);
        self
    }

    /// Chart.yaml as a value, keys in Helm's conventional order
    pub fn to_value(&self) -> Value {
        let keywords = (!self.keywords.is_empty()).then(|| self.keywords.clone());
        let maintainers = (!self.maintainers.is_empty())
            .then(|| self.maintainers.iter().map(Maintainer::to_value).collect::<Vec<_>>());

        Mapping::new()
            .with("apiVersion", &self.api_version)
            .with("name", &self.name)
            .with_opt("description", self.description.as_deref())
            .with("type", self.chart_type.as_str())
            .with("version", self.version.to_string())
            .with_opt("appVersion", self.app_version.as_deref())
            .with_opt("keywords", keywords)
            .with_opt("home", self.home.as_deref())
            .with_opt("maintainers", maintainers)
            .into()
    }
}

/// A file of a chart, relative to the chart directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartFile {
    pub path: String,
    pub content: String,
}

/// A chart: metadata, default values and templates
#[derive(Debug, Clone)]
pub struct HelmChart {
    pub metadata: ChartMetadata,
    pub values: Mapping,
    /// Template contents keyed by file name under `templates/`
    pub templates: IndexMap<String, String>,
}

impl HelmChart {
    pub fn new(metadata: ChartMetadata) -> Self {
        Self {
            metadata,
            values: Mapping::new(),
            templates: IndexMap::new(),
        }
    }

    pub fn with_values(mut self, values: Mapping) -> Self {
        self.values = values;
        self
    }

    /// Add or replace a template
    pub fn add_template(&mut self, name: impl Into<String>, content: impl Into<String>) {
        self.templates.insert(name.into(), content.into());
    }

    /// All chart files: Chart.yaml, values.yaml, then templates in order
    ///
    /// Chart.yaml and values.yaml are read back by Helm with full YAML
    /// typing, so they are written with `serde_yaml`, which quotes strings
    /// such as `2.0` or `true` that would otherwise change type.
    pub fn files(&self) -> Result<Vec<ChartFile>> {
        let mut files = vec![
            document("Chart.yaml", &self.metadata.to_value())?,
            document("values.yaml", &Value::Mapping(self.values.clone()))?,
        ];

        files.extend(self.templates.iter().map(|(name, content)| ChartFile {
            path: format!("templates/{}", name),
            content: content.clone(),
        }));

        Ok(files)
    }

    /// Context seeded with this chart's values, name and version
    pub fn context(&self, release_name: &str, namespace: &str) -> TemplateContext {
        TemplateContext::new(self.values.clone())
            .with_release_name(release_name)
            .with_namespace(namespace)
            .with_chart_name(&self.metadata.name)
            .with_chart_version(self.metadata.version.to_string())
    }

    /// Render every template
    pub fn preview(&self, context: &TemplateContext) -> IndexMap<String, String> {
        self.templates
            .iter()
            .map(|(name, template)| {
                let rendered = render(template, context);
                let unresolved = unresolved_placeholders(&rendered);
                if !unresolved.is_empty() {
                    tracing::warn!(
                        template = %name,
                        placeholders = ?unresolved,
                        "template has placeholders that were not substituted"
                    );
                }
                (name.clone(), rendered)
            })
            .collect()
    }

    /// Write the chart under `dir/<chart name>/`, returning that directory
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf> {
        let chart_dir = dir.join(&self.metadata.name);
        if chart_dir.exists() {
            return Err(EngineError::OutputExists(chart_dir));
        }

        for file in self.files()? {
            let path = chart_dir.join(&file.path);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, &file.content)?;
            tracing::debug!(path = %path.display(), "wrote chart file");
        }

        Ok(chart_dir)
    }
}

fn document(path: &str, value: &Value) -> Result<ChartFile> {
    let content = serde_yaml::to_string(value).map_err(|source| EngineError::ChartSerialize {
        path: path.to_string(),
        source,
    })?;

    Ok(ChartFile {
        path: path.to_string(),
        content,
    })
}

const DEPLOYMENT_TEMPLATE: &str = r#"apiVersion: apps/v1
kind: Deployment
metadata:
  name: {{ .Release.Name }}-{{ .Chart.Name }}
  namespace: {{ .Release.Namespace }}
  labels:
    app.kubernetes.io/name: {{ .Chart.Name }}
    app.kubernetes.io/instance: {{ .Release.Name }}
    app.kubernetes.io/managed-by: Helm
    helm.sh/chart: {{ .Chart.Name }}-{{ .Chart.Version }}
spec:
  replicas: {{ .Values.replicaCount }}
  selector:
    matchLabels:
      app.kubernetes.io/name: {{ .Chart.Name }}
      app.kubernetes.io/instance: {{ .Release.Name }}
  template:
    metadata:
      labels:
        app.kubernetes.io/name: {{ .Chart.Name }}
        app.kubernetes.io/instance: {{ .Release.Name }}
    spec:
      containers:
        - name: {{ .Chart.Name }}
          image: "{{ .Values.image.repository }}:{{ .Values.image.tag }}"
          imagePullPolicy: {{ .Values.image.pullPolicy }}
          ports:
            - name: http
              containerPort: {{ .Values.service.port }}
              protocol: TCP
"#;

const SERVICE_TEMPLATE: &str = r#"apiVersion: v1
kind: Service
metadata:
  name: {{ .Release.Name }}-{{ .Chart.Name }}
  namespace: {{ .Release.Namespace }}
  labels:
    app.kubernetes.io/name: {{ .Chart.Name }}
    app.kubernetes.io/instance: {{ .Release.Name }}
    app.kubernetes.io/managed-by: Helm
    helm.sh/chart: {{ .Chart.Name }}-{{ .Chart.Version }}
spec:
  type: {{ .Values.service.type }}
  ports:
    - port: {{ .Values.service.port }}
      targetPort: http
      protocol: TCP
      name: http
  selector:
    app.kubernetes.io/name: {{ .Chart.Name }}
    app.kubernetes.io/instance: {{ .Release.Name }}
"#;

/// Scaffold an application chart with a Deployment and a Service
pub fn standard_chart(
    name: &str,
    image_repository: &str,
    image_tag: &str,
    port: u16,
) -> Result<HelmChart> {
    let metadata = ChartMetadata::new(name, "0.1.0")?
        .with_description(format!("A Helm chart for {}", name))
        .with_app_version(image_tag);

    let values = Mapping::new()
        .with("replicaCount", 1)
        .with(
            "image",
            Mapping::new()
                .with("repository", image_repository)
                .with("tag", image_tag)
                .with("pullPolicy", "IfNotPresent"),
        )
        .with(
            "service",
            Mapping::new().with("type", "ClusterIP").with("port", port),
        );

    let mut chart = HelmChart::new(metadata).with_values(values);
    chart.add_template("deployment.yaml", DEPLOYMENT_TEMPLATE);
    chart.add_template("service.yaml", SERVICE_TEMPLATE);
    Ok(chart)
}
