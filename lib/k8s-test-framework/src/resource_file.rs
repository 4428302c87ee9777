use std::{io::Write, path::Path};

use snafu::ResultExt;
use tempfile::{NamedTempFile, TempPath};

use crate::{Result, ResourceFileSnafu, SerializeSnafu};

/// A manifest written to a temporary file for `kubectl -f`.
///
/// The file is removed when this value is dropped.
#[derive(Debug)]
pub struct ResourceFile {
    path: TempPath,
}

impl ResourceFile {
    /// Write raw manifest text (YAML or JSON).
    pub fn new(data: &str) -> Result<Self> {
        let mut file = tempfile::Builder::new()
            .prefix("appstudio-e2e-")
            .suffix(".yaml")
            .tempfile()
            .context(ResourceFileSnafu)?;
        file.write_all(data.as_bytes()).context(ResourceFileSnafu)?;
        Ok(Self::from_file(file))
    }

    /// Write a typed object as a JSON manifest.
    pub fn from_object<T: serde::Serialize>(object: &T) -> Result<Self> {
        let data = serde_json::to_string(object).context(SerializeSnafu)?;
        Self::new(&data)
    }

    fn from_file(file: NamedTempFile) -> Self {
        Self {
            path: file.into_temp_path(),
        }
    }

    /// Location of the manifest on disk.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use k8s_openapi::api::core::v1::ConfigMap;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

    use super::*;

    #[test]
    fn writes_and_removes_manifest() {
        let file = ResourceFile::new("kind: ConfigMap\n").unwrap();
        let path = file.path().to_path_buf();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "kind: ConfigMap\n");

        drop(file);
        assert!(!path.exists());
    }

    #[test]
    fn serializes_typed_objects() {
        let config_map = ConfigMap {
            metadata: ObjectMeta {
                name: Some("settings".to_owned()),
                ..Default::default()
            },
            ..Default::default()
        };
        let file = ResourceFile::from_object(&config_map).unwrap();
        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(file.path()).unwrap()).unwrap();
        assert_eq!(written["metadata"]["name"], "settings");
    }
}
