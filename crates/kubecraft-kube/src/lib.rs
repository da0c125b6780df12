//! kubecraft Kube - Typed builders for Kubernetes manifests
//!
//! Builders turn small, serde-friendly spec structs into `Value` trees that
//! the core serializer renders as YAML:
//! - `builders`: Deployment, Service, ConfigMap, Secret, Ingress, Namespace, HPA
//! - `app`: a whole application bundle from one `AppSpec`
//! - `validate`: structural checks on rendered manifests

pub mod app;
pub mod builders;
pub mod error;
pub mod validate;

pub use app::AppSpec;
pub use builders::{
    ConfigMapSpec, ContainerPort, ContainerSpec, DeploymentSpec, EnvVar, HpaSpec, IngressPath,
    IngressRule, IngressSpec, IngressTls, NamespaceSpec, ObjectMeta, Probe, ResourceRequirements,
    SecretSpec, ServicePort, ServiceSpec, ServiceType,
};
pub use error::{KubeError, Result};
pub use validate::{ValidationIssue, ValidationReport, validate_manifest};
