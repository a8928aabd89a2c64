//! Builders for ConfigMap resources and manifests.

#![allow(dead_code)]

use std::collections::BTreeMap;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use dashboard_loader::resource::{ConfigMapManifest, ObjectMeta, API_VERSION, CONFIG_MAP_KIND};
use dashboard_loader::Resource;

/// Builder for a ConfigMap that can be rendered as a `Resource` or as YAML.
pub struct ConfigMapBuilder {
    namespace: String,
    name: String,
    labels: BTreeMap<String, String>,
    data: BTreeMap<String, String>,
    binary_data: BTreeMap<String, Vec<u8>>,
}

impl ConfigMapBuilder {
    pub fn new(namespace: &str, name: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            name: name.to_string(),
            labels: BTreeMap::new(),
            data: BTreeMap::new(),
            binary_data: BTreeMap::new(),
        }
    }

    /// Adds the default `grafana-dashboard=true` label.
    pub fn dashboard(self) -> Self {
        self.label("grafana-dashboard", "true")
    }

    pub fn label(mut self, key: &str, value: &str) -> Self {
        self.labels.insert(key.to_string(), value.to_string());
        self
    }

    pub fn data(mut self, key: &str, value: &str) -> Self {
        self.data.insert(key.to_string(), value.to_string());
        self
    }

    pub fn binary(mut self, key: &str, value: &[u8]) -> Self {
        self.binary_data.insert(key.to_string(), value.to_vec());
        self
    }

    pub fn to_resource(&self) -> Resource {
        let mut resource = Resource::new(self.namespace.as_str(), self.name.as_str());
        resource.labels = self.labels.clone();
        for (key, value) in &self.data {
            resource.entries.insert(key.clone(), value.clone().into_bytes());
        }
        for (key, value) in &self.binary_data {
            resource.entries.insert(key.clone(), value.clone());
        }
        resource
    }

    pub fn to_manifest(&self) -> ConfigMapManifest {
        ConfigMapManifest {
            api_version: API_VERSION.to_string(),
            kind: CONFIG_MAP_KIND.to_string(),
            metadata: ObjectMeta {
                name: self.name.clone(),
                namespace: Some(self.namespace.clone()),
                labels: self.labels.clone(),
                annotations: BTreeMap::new(),
            },
            data: self.data.clone(),
            binary_data: self
                .binary_data
                .iter()
                .map(|(k, v)| (k.clone(), BASE64.encode(v)))
                .collect(),
        }
    }

    pub fn to_yaml(&self) -> String {
        serde_yaml::to_string(&self.to_manifest()).expect("Failed to serialize manifest")
    }
}
