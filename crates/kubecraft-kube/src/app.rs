//! Application bundles
//!
//! An `AppSpec` describes one containerized service in a few fields and
//! expands into every manifest needed to run it.

use kubecraft_core::labels::{CHECKSUM_CONFIG_ANNOTATION, checksum_annotation};
use kubecraft_core::{LabelSet, Value, selector_labels, standard_labels, to_yaml_string};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

use crate::builders::{
    self, ConfigMapSpec, ContainerPort, ContainerSpec, DeploymentSpec, EnvVar, HpaSpec,
    IngressPath, IngressRule, IngressSpec, IngressTls, NamespaceSpec, ObjectMeta, Probe,
    ResourceRequirements, SecretSpec, ServicePort, ServiceSpec, ServiceType,
};
use crate::error::{KubeError, Result};

/// Name of the container port every bundle exposes
const PORT_NAME: &str = "http";

fn default_port() -> u16 {
    80
}

fn default_replicas() -> u32 {
    1
}

fn default_ingress_path() -> String {
    "/".to_string()
}

/// Ingress settings for an application
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppIngress {
    pub host: String,
    #[serde(default = "default_ingress_path")]
    pub path: String,
    #[serde(default)]
    pub class_name: Option<String>,
    /// Secret holding the TLS certificate; TLS is off when unset
    #[serde(default)]
    pub tls_secret: Option<String>,
}

/// Autoscaling settings for an application
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppAutoscaling {
    #[serde(default = "default_replicas")]
    pub min_replicas: u32,
    pub max_replicas: u32,
    #[serde(default)]
    pub target_cpu_utilization: Option<u32>,
    #[serde(default)]
    pub target_memory_utilization: Option<u32>,
}

/// One application and everything it needs
///
/// ```yaml
/// name: shop
/// namespace: apps
/// image: ghcr.io/acme/shop:1.4.0
/// port: 8080
/// config:
///   LOG_LEVEL: info
/// ingress:
///   host: shop.example.com
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSpec {
    pub name: String,
    pub image: String,

    #[serde(default)]
    pub namespace: Option<String>,
    /// Emit a Namespace manifest as well
    #[serde(default)]
    pub create_namespace: bool,

    /// `app.kubernetes.io/version`
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub part_of: Option<String>,

    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_replicas")]
    pub replicas: u32,
    #[serde(default)]
    pub service_type: ServiceType,

    /// Literal container environment
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    /// Non-secret settings, stored in a ConfigMap and loaded as environment
    #[serde(default)]
    pub config: BTreeMap<String, String>,
    /// Secret settings, stored in a Secret and loaded as environment
    #[serde(default)]
    pub secrets: BTreeMap<String, String>,

    #[serde(default)]
    pub resources: Option<ResourceRequirements>,
    /// HTTP path for liveness and readiness probes
    #[serde(default)]
    pub health_path: Option<String>,

    #[serde(default)]
    pub ingress: Option<AppIngress>,
    #[serde(default)]
    pub autoscaling: Option<AppAutoscaling>,
}

impl AppSpec {
    /// Minimal spec: one replica, port 80, nothing optional
    pub fn new(name: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            image: image.into(),
            namespace: None,
            create_namespace: false,
            version: None,
            part_of: None,
            port: default_port(),
            replicas: default_replicas(),
            service_type: ServiceType::default(),
            env: BTreeMap::new(),
            config: BTreeMap::new(),
            secrets: BTreeMap::new(),
            resources: None,
            health_path: None,
            ingress: None,
            autoscaling: None,
        }
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn config_map_name(&self) -> String {
        format!("{}-config", self.name)
    }

    pub fn secret_name(&self) -> String {
        format!("{}-secret", self.name)
    }

    /// Labels on every resource of the bundle
    pub fn labels(&self) -> BTreeMap<String, String> {
        let mut set = LabelSet::new(&self.name).instance(&self.name);
        if let Some(version) = &self.version {
            set = set.version(version);
        }
        if let Some(part_of) = &self.part_of {
            set = set.part_of(part_of);
        }
        standard_labels(&set)
    }

    /// Labels shared by the Deployment selector and the Service
    pub fn selector(&self) -> BTreeMap<String, String> {
        selector_labels(&self.name, Some(&self.name))
    }

    fn meta(&self, name: impl Into<String>) -> ObjectMeta {
        let meta = ObjectMeta::new(name).with_labels(self.labels());
        match &self.namespace {
            Some(namespace) => meta.with_namespace(namespace),
            None => meta,
        }
    }

    /// Build the bundle, in apply order
    ///
    /// Namespace, ConfigMap, Secret, Deployment, Service, Ingress, HPA;
    /// optional resources are skipped when not configured.
    pub fn resources(&self) -> Result<Vec<Value>> {
        let mut resources = Vec::new();

        if self.create_namespace {
            let Some(namespace) = &self.namespace else {
                return Err(KubeError::InvalidSpec {
                    kind: "App",
                    message: "createNamespace requires a namespace".to_string(),
                });
            };
            resources.push(builders::namespace(&NamespaceSpec {
                metadata: ObjectMeta::new(namespace).with_labels(self.labels()),
            })?);
        }

        let mut config_checksum = None;
        if !self.config.is_empty() {
            let config_map = builders::config_map(&ConfigMapSpec {
                metadata: self.meta(self.config_map_name()),
                data: self.config.clone(),
            })?;
            config_checksum = Some(checksum_annotation(&to_yaml_string(&config_map)));
            resources.push(config_map);
        }

        if !self.secrets.is_empty() {
            resources.push(builders::secret(&SecretSpec {
                metadata: self.meta(self.secret_name()),
                secret_type: None,
                string_data: self.secrets.clone(),
                encode: true,
            })?);
        }

        resources.push(builders::deployment(&self.deployment_spec(config_checksum))?);
        resources.push(builders::service(&self.service_spec())?);

        if let Some(ingress) = &self.ingress {
            resources.push(builders::ingress(&self.ingress_spec(ingress))?);
        }

        if let Some(autoscaling) = &self.autoscaling {
            resources.push(builders::hpa(&HpaSpec {
                metadata: self.meta(&self.name),
                target_name: self.name.clone(),
                target_kind: "Deployment".to_string(),
                target_api_version: "apps/v1".to_string(),
                min_replicas: autoscaling.min_replicas,
                max_replicas: autoscaling.max_replicas,
                target_cpu_utilization: autoscaling.target_cpu_utilization,
                target_memory_utilization: autoscaling.target_memory_utilization,
            })?);
        }

        tracing::debug!(app = %self.name, count = resources.len(), "built resource bundle");
        Ok(resources)
    }

    fn deployment_spec(&self, config_checksum: Option<String>) -> DeploymentSpec {
        let mut container = ContainerSpec::new(&self.name, &self.image);
        container.ports.push(ContainerPort {
            name: Some(PORT_NAME.to_string()),
            container_port: self.port,
            protocol: None,
        });
        container.env = self
            .env
            .iter()
            .map(|(name, value)| EnvVar::new(name, value))
            .collect();
        container.env_from_config_map = (!self.config.is_empty()).then(|| self.config_map_name());
        container.env_from_secret = (!self.secrets.is_empty()).then(|| self.secret_name());
        container.resources = self.resources.clone();
        if let Some(path) = &self.health_path {
            container.liveness_probe = Some(Probe::http(path, PORT_NAME));
            container.readiness_probe = Some(Probe::http(path, PORT_NAME));
        }

        let mut pod_annotations = BTreeMap::new();
        if let Some(checksum) = config_checksum {
            pod_annotations.insert(CHECKSUM_CONFIG_ANNOTATION.to_string(), checksum);
        }

        DeploymentSpec {
            metadata: self.meta(&self.name),
            replicas: self.replicas,
            selector: self.selector(),
            pod_labels: self.labels(),
            pod_annotations,
            containers: vec![container],
        }
    }

    fn service_spec(&self) -> ServiceSpec {
        let mut port = ServicePort::new(self.port);
        port.name = Some(PORT_NAME.to_string());
        port.target_port = Some(PORT_NAME.to_string());

        ServiceSpec {
            metadata: self.meta(&self.name),
            service_type: self.service_type,
            selector: self.selector(),
            ports: vec![port],
        }
    }

    fn ingress_spec(&self, ingress: &AppIngress) -> IngressSpec {
        let tls = ingress
            .tls_secret
            .iter()
            .map(|secret| IngressTls {
                hosts: vec![ingress.host.clone()],
                secret_name: secret.clone(),
            })
            .collect();

        IngressSpec {
            metadata: self.meta(&self.name),
            ingress_class_name: ingress.class_name.clone(),
            tls,
            rules: vec![IngressRule {
                host: Some(ingress.host.clone()),
                paths: vec![IngressPath {
                    path: ingress.path.clone(),
                    path_type: "Prefix".to_string(),
                    service_name: self.name.clone(),
                    service_port: self.port,
                }],
            }],
        }
    }
}
