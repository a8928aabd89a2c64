//! Loads ConfigMap manifests from a directory tree.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use walkdir::WalkDir;

use crate::error::SourceError;
use crate::resource::{ConfigMapManifest, Resource, ResourceHeader, ResourceId, CONFIG_MAP_KIND};

use super::ResourceLister;

const MANIFEST_EXTENSIONS: &[&str] = &["yaml", "yml", "json"];

/// Reads every ConfigMap manifest below a directory.
///
/// Files may hold several `---` separated documents. Documents of other
/// kinds are ignored. Any unreadable or malformed ConfigMap fails the whole
/// load, so a broken file never looks like a set of deletions.
#[derive(Debug, Clone)]
pub struct ManifestLoader {
    manifest_dir: PathBuf,
}

impl ManifestLoader {
    pub fn new(manifest_dir: impl Into<PathBuf>) -> Self {
        Self {
            manifest_dir: manifest_dir.into(),
        }
    }

    pub fn manifest_dir(&self) -> &Path {
        &self.manifest_dir
    }

    /// Loads all ConfigMaps, sorted by id.
    pub fn load(&self) -> Result<Vec<Resource>, SourceError> {
        if !self.manifest_dir.is_dir() {
            return Err(SourceError::ManifestDirNotFound(self.manifest_dir.clone()));
        }

        let mut found: BTreeMap<ResourceId, (PathBuf, Resource)> = BTreeMap::new();

        for entry in WalkDir::new(&self.manifest_dir)
            .follow_links(true)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| SourceError::ReadManifest {
                path: e
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| self.manifest_dir.clone()),
                source: e.into(),
            })?;
            let path = entry.path();

            if !entry.file_type().is_file() || self.is_hidden(path) || !has_manifest_extension(path)
            {
                continue;
            }

            for resource in self.load_file(path)? {
                if let Some((first, _)) = found.get(&resource.id) {
                    return Err(SourceError::DuplicateResource {
                        id: resource.id.to_string(),
                        first: first.clone(),
                        second: path.to_path_buf(),
                    });
                }
                found.insert(resource.id.clone(), (path.to_path_buf(), resource));
            }
        }

        log::debug!(
            "Loaded {} ConfigMap(s) from {}",
            found.len(),
            self.manifest_dir.display()
        );

        Ok(found.into_values().map(|(_, resource)| resource).collect())
    }

    /// Loads the ConfigMaps of a single file.
    pub fn load_file(&self, path: &Path) -> Result<Vec<Resource>, SourceError> {
        let content = fs::read_to_string(path).map_err(|e| SourceError::ReadManifest {
            path: path.to_path_buf(),
            source: e,
        })?;

        self.parse_manifests(&content, path)
    }

    /// Parses every ConfigMap document in `content`.
    pub fn parse_manifests(&self, content: &str, path: &Path) -> Result<Vec<Resource>, SourceError> {
        let parse_error = |e: serde_yaml::Error| SourceError::ParseManifest {
            path: path.to_path_buf(),
            message: e.to_string(),
        };

        let mut resources = Vec::new();
        for document in serde_yaml::Deserializer::from_str(content) {
            let value = serde_yaml::Value::deserialize(document).map_err(parse_error)?;
            if value.is_null() {
                continue;
            }

            let header: ResourceHeader =
                serde_yaml::from_value(value.clone()).map_err(parse_error)?;
            if header.kind != CONFIG_MAP_KIND {
                log::debug!(
                    "Skipping {} document in {}",
                    if header.kind.is_empty() { "untyped" } else { header.kind.as_str() },
                    path.display()
                );
                continue;
            }

            let manifest: ConfigMapManifest = serde_yaml::from_value(value).map_err(parse_error)?;
            let id = manifest.id();
            let resource = manifest
                .into_resource()
                .map_err(|message| SourceError::InvalidResource {
                    id: id.to_string(),
                    path: path.to_path_buf(),
                    message,
                })?;
            resources.push(resource);
        }

        Ok(resources)
    }

    // Any component of the relative path starting with '.' hides the file.
    fn is_hidden(&self, path: &Path) -> bool {
        path.strip_prefix(&self.manifest_dir)
            .map(|relative| {
                relative.components().any(|c| {
                    c.as_os_str()
                        .to_str()
                        .map(|s| s.starts_with('.'))
                        .unwrap_or(false)
                })
            })
            .unwrap_or(false)
    }
}

impl ResourceLister for ManifestLoader {
    fn list(&self) -> Result<Vec<Resource>, SourceError> {
        self.load()
    }
}

fn has_manifest_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| MANIFEST_EXTENSIONS.contains(&ext))
        .unwrap_or(false)
}
