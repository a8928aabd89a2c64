//! K8s-style resource types for dashboard ConfigMaps.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// API version accepted for ConfigMap manifests.
pub const API_VERSION: &str = "v1";

/// Kind accepted for ConfigMap manifests.
pub const CONFIG_MAP_KIND: &str = "ConfigMap";

/// Namespace assumed when a manifest does not name one.
pub const DEFAULT_NAMESPACE: &str = "default";

/// Identifies a resource within the watched scope.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResourceId {
    pub namespace: String,
    pub name: String,
}

impl ResourceId {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

impl FromStr for ResourceId {
    type Err = String;

    /// Parses the `namespace/name` key form.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('/') {
            Some((namespace, name))
                if !namespace.is_empty() && !name.is_empty() && !name.contains('/') =>
            {
                Ok(ResourceId::new(namespace, name))
            }
            _ => Err(format!("Expected 'namespace/name', got '{}'", s)),
        }
    }
}

/// A resource's current content: labels plus named entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    pub id: ResourceId,
    pub labels: BTreeMap<String, String>,
    pub entries: BTreeMap<String, Vec<u8>>,
}

impl Resource {
    /// Creates an empty resource.
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: ResourceId::new(namespace, name),
            labels: BTreeMap::new(),
            entries: BTreeMap::new(),
        }
    }

    /// Adds an entry.
    pub fn with_entry(mut self, key: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    /// Adds a label.
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }
}

/// Metadata for a manifest, following K8s conventions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObjectMeta {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

/// Minimal header used to detect the kind before full parsing.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceHeader {
    #[serde(default)]
    pub api_version: String,
    #[serde(default)]
    pub kind: String,
}

/// A ConfigMap as written in a manifest file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigMapManifest {
    pub api_version: String,
    pub kind: String,
    pub metadata: ObjectMeta,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub data: BTreeMap<String, String>,
    /// Base64-encoded values.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub binary_data: BTreeMap<String, String>,
}

impl ConfigMapManifest {
    /// Returns the identifier this manifest resolves to.
    pub fn id(&self) -> ResourceId {
        let namespace = self
            .metadata
            .namespace
            .as_deref()
            .filter(|ns| !ns.is_empty())
            .unwrap_or(DEFAULT_NAMESPACE);
        ResourceId::new(namespace, self.metadata.name.clone())
    }

    /// Converts the manifest into a resource, decoding `binaryData`.
    pub fn into_resource(self) -> Result<Resource, String> {
        if self.api_version != API_VERSION {
            return Err(format!(
                "Invalid API version '{}', expected '{}'",
                self.api_version, API_VERSION
            ));
        }
        if self.metadata.name.is_empty() {
            return Err("metadata.name is required".to_string());
        }

        let id = self.id();
        let mut entries: BTreeMap<String, Vec<u8>> = self
            .data
            .into_iter()
            .map(|(k, v)| (k, v.into_bytes()))
            .collect();

        for (key, encoded) in self.binary_data {
            if entries.contains_key(&key) {
                return Err(format!("Key '{}' is present in both data and binaryData", key));
            }
            let decoded = BASE64
                .decode(encoded.trim())
                .map_err(|e| format!("binaryData key '{}' is not valid base64: {}", key, e))?;
            entries.insert(key, decoded);
        }

        Ok(Resource {
            id,
            labels: self.metadata.labels,
            entries,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest(yaml: &str) -> ConfigMapManifest {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_resource_id_display_and_parse() {
        let id = ResourceId::new("monitoring", "node-exporter");
        assert_eq!(id.to_string(), "monitoring/node-exporter");
        assert_eq!("monitoring/node-exporter".parse::<ResourceId>().unwrap(), id);
    }

    #[test]
    fn test_resource_id_parse_rejects_malformed() {
        assert!("no-slash".parse::<ResourceId>().is_err());
        assert!("/name".parse::<ResourceId>().is_err());
        assert!("ns/".parse::<ResourceId>().is_err());
        assert!("a/b/c".parse::<ResourceId>().is_err());
    }

    #[test]
    fn test_manifest_into_resource() {
        let resource = manifest(
            r#"
apiVersion: v1
kind: ConfigMap
metadata:
  name: demo
  namespace: monitoring
  labels:
    grafana-dashboard: "true"
data:
  a.json: "{}"
  readme.txt: hi
"#,
        )
        .into_resource()
        .unwrap();

        assert_eq!(resource.id, ResourceId::new("monitoring", "demo"));
        assert_eq!(resource.labels.get("grafana-dashboard").unwrap(), "true");
        assert_eq!(resource.entries.get("a.json").unwrap(), b"{}");
        assert_eq!(resource.entries.get("readme.txt").unwrap(), b"hi");
    }

    #[test]
    fn test_manifest_defaults_namespace() {
        let m = manifest(
            r#"
apiVersion: v1
kind: ConfigMap
metadata:
  name: demo
"#,
        );
        assert_eq!(m.id(), ResourceId::new("default", "demo"));
    }

    #[test]
    fn test_manifest_binary_data_decoded() {
        let resource = manifest(
            r#"
apiVersion: v1
kind: ConfigMap
metadata:
  name: demo
binaryData:
  packed.json: e30=
"#,
        )
        .into_resource()
        .unwrap();
        assert_eq!(resource.entries.get("packed.json").unwrap(), b"{}");
    }

    #[test]
    fn test_manifest_duplicate_key_rejected() {
        let err = manifest(
            r#"
apiVersion: v1
kind: ConfigMap
metadata:
  name: demo
data:
  a.json: "{}"
binaryData:
  a.json: e30=
"#,
        )
        .into_resource()
        .unwrap_err();
        assert!(err.contains("both data and binaryData"));
    }

    #[test]
    fn test_manifest_invalid_base64_rejected() {
        let err = manifest(
            r#"
apiVersion: v1
kind: ConfigMap
metadata:
  name: demo
binaryData:
  a.json: "!!not base64!!"
"#,
        )
        .into_resource()
        .unwrap_err();
        assert!(err.contains("not valid base64"));
    }

    #[test]
    fn test_manifest_wrong_api_version_rejected() {
        let err = manifest(
            r#"
apiVersion: v2
kind: ConfigMap
metadata:
  name: demo
"#,
        )
        .into_resource()
        .unwrap_err();
        assert!(err.contains("Invalid API version"));
    }
}
