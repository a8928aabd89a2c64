use std::path::{Path, PathBuf};

use crate::resource::ResourceId;
use crate::sanitize::{validate_segment, SegmentError};

/// Extension an entry key must carry to be written out.
pub const DASHBOARD_EXTENSION: &str = ".json";

/// Returns true if `key` names a dashboard file.
pub fn is_dashboard_key(key: &str) -> bool {
    key.ends_with(DASHBOARD_EXTENSION)
}

/// Maps resources onto `{output_root}/{namespace}/{name}/{key}`.
#[derive(Debug, Clone)]
pub struct DashboardLayout {
    output_root: PathBuf,
}

impl DashboardLayout {
    pub fn new<P: AsRef<Path>>(output_root: P) -> Self {
        Self {
            output_root: output_root.as_ref().to_path_buf(),
        }
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    /// Directory holding the files of one resource.
    pub fn directory_for(&self, id: &ResourceId) -> Result<PathBuf, SegmentError> {
        validate_segment("namespace", &id.namespace)?;
        validate_segment("name", &id.name)?;
        Ok(self.output_root.join(&id.namespace).join(&id.name))
    }

    /// Path of the file for one entry key.
    pub fn file_for(&self, id: &ResourceId, key: &str) -> Result<PathBuf, SegmentError> {
        let dir = self.directory_for(id)?;
        validate_segment("key", key)?;
        Ok(dir.join(key))
    }
}
