//! Recommended labels and label validation
//!
//! Kubernetes recommends a shared set of `app.kubernetes.io/*` labels on
//! every object belonging to an application. The helpers here build those
//! maps and check keys and values against the API server's rules.

use once_cell::sync::Lazy;
use regex::Regex;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

use crate::error::{CoreError, Result};

/// Well-known label keys
pub mod keys {
    pub const NAME: &str = "app.kubernetes.io/name";
    pub const INSTANCE: &str = "app.kubernetes.io/instance";
    pub const VERSION: &str = "app.kubernetes.io/version";
    pub const COMPONENT: &str = "app.kubernetes.io/component";
    pub const PART_OF: &str = "app.kubernetes.io/part-of";
    pub const MANAGED_BY: &str = "app.kubernetes.io/managed-by";
}

/// Annotation holding a digest of mounted configuration
pub const CHECKSUM_CONFIG_ANNOTATION: &str = "checksum/config";

/// Value written to `app.kubernetes.io/managed-by` when none is given
pub const DEFAULT_MANAGED_BY: &str = "kubecraft";

const MAX_LABEL_VALUE_LEN: usize = 63;
const MAX_PREFIX_LEN: usize = 253;

static LABEL_VALUE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9]([-A-Za-z0-9_.]*[A-Za-z0-9])?$").expect("valid regex")
});

static DNS1123_LABEL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?$").expect("valid regex"));

/// Inputs for the recommended label set
#[derive(Debug, Clone, Default)]
pub struct LabelSet {
    pub name: String,
    pub instance: Option<String>,
    pub version: Option<String>,
    pub component: Option<String>,
    pub part_of: Option<String>,
    pub managed_by: Option<String>,
}

impl LabelSet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn instance(mut self, instance: impl Into<String>) -> Self {
        self.instance = Some(instance.into());
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn component(mut self, component: impl Into<String>) -> Self {
        self.component = Some(component.into());
        self
    }

    pub fn part_of(mut self, part_of: impl Into<String>) -> Self {
        self.part_of = Some(part_of.into());
        self
    }

    pub fn managed_by(mut self, managed_by: impl Into<String>) -> Self {
        self.managed_by = Some(managed_by.into());
        self
    }
}

/// Build the full recommended label map
pub fn standard_labels(set: &LabelSet) -> BTreeMap<String, String> {
    let mut labels = selector_labels(&set.name, set.instance.as_deref());

    let optional = [
        (keys::VERSION, &set.version),
        (keys::COMPONENT, &set.component),
        (keys::PART_OF, &set.part_of),
    ];
    for (key, value) in optional {
        if let Some(value) = value {
            labels.insert(key.to_string(), value.clone());
        }
    }

    labels.insert(
        keys::MANAGED_BY.to_string(),
        set.managed_by
            .clone()
            .unwrap_or_else(|| DEFAULT_MANAGED_BY.to_string()),
    );

    labels
}

/// Labels stable enough to use in a selector
///
/// Selectors are immutable on Deployments, so version and other
/// frequently-changing labels are left out.
pub fn selector_labels(name: &str, instance: Option<&str>) -> BTreeMap<String, String> {
    let mut labels = BTreeMap::new();
    labels.insert(keys::NAME.to_string(), name.to_string());
    if let Some(instance) = instance {
        labels.insert(keys::INSTANCE.to_string(), instance.to_string());
    }
    labels
}

/// Merge two label maps, `overlay` wins on conflicts
pub fn merge_labels(
    base: &BTreeMap<String, String>,
    overlay: &BTreeMap<String, String>,
) -> BTreeMap<String, String> {
    let mut merged = base.clone();
    merged.extend(overlay.iter().map(|(k, v)| (k.clone(), v.clone())));
    merged
}

/// Check a label value: at most 63 characters, alphanumeric at both ends
pub fn validate_label_value(value: &str) -> Result<()> {
    if value.is_empty() {
        return Ok(());
    }
    if value.len() > MAX_LABEL_VALUE_LEN {
        return Err(invalid("value", value, "must be 63 characters or less"));
    }
    if !LABEL_VALUE_RE.is_match(value) {
        return Err(invalid(
            "value",
            value,
            "must consist of alphanumerics, '-', '_' or '.', starting and ending with an alphanumeric",
        ));
    }
    Ok(())
}

/// Check a label key: optional DNS subdomain prefix, then a name part
pub fn validate_label_key(key: &str) -> Result<()> {
    let (prefix, name) = match key.split_once('/') {
        Some((prefix, name)) => (Some(prefix), name),
        None => (None, key),
    };

    if let Some(prefix) = prefix {
        if prefix.len() > MAX_PREFIX_LEN || !is_dns1123_subdomain(prefix) {
            return Err(invalid("key", key, "prefix must be a DNS subdomain"));
        }
    }

    if name.is_empty() {
        return Err(invalid("key", key, "name part must not be empty"));
    }
    if name.len() > MAX_LABEL_VALUE_LEN {
        return Err(invalid("key", key, "name part must be 63 characters or less"));
    }
    if !LABEL_VALUE_RE.is_match(name) {
        return Err(invalid(
            "key",
            key,
            "name part must consist of alphanumerics, '-', '_' or '.'",
        ));
    }
    Ok(())
}

/// Validate every key and value of a label map
pub fn validate_labels(labels: &BTreeMap<String, String>) -> Result<()> {
    for (key, value) in labels {
        validate_label_key(key)?;
        validate_label_value(value)?;
    }
    Ok(())
}

/// RFC 1123 label: lowercase alphanumerics and '-', at most 63 characters
pub fn is_dns1123_label(s: &str) -> bool {
    s.len() <= MAX_LABEL_VALUE_LEN && DNS1123_LABEL_RE.is_match(s)
}

/// RFC 1123 subdomain: dot-separated labels, at most 253 characters
pub fn is_dns1123_subdomain(s: &str) -> bool {
    !s.is_empty() && s.len() <= MAX_PREFIX_LEN && s.split('.').all(is_dns1123_label)
}

/// SHA-256 hex digest, used for `checksum/config` pod annotations
pub fn checksum_annotation(content: &str) -> String {
    hex::encode(Sha256::digest(content.as_bytes()))
}

fn invalid(kind: &'static str, input: &str, reason: &str) -> CoreError {
    CoreError::InvalidLabel {
        kind,
        input: input.to_string(),
        reason: reason.to_string(),
    }
}
