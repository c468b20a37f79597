// Routing objects written as one multi-document YAML file per binding

use crate::core::errors::ProxyError;
use crate::mesh::{ConfigStore, RoutingObject};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub struct FileConfigStore {
    directory: PathBuf,
}

impl FileConfigStore {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// `<directory>/<binding_id>.yml`
    pub fn binding_file(&self, binding_id: &str) -> Result<PathBuf, ProxyError> {
        if binding_id.is_empty()
            || binding_id == "."
            || binding_id == ".."
            || binding_id.contains(['/', '\\'])
        {
            return Err(ProxyError::ConfigStore(format!(
                "Invalid binding id '{}'",
                binding_id
            )));
        }
        Ok(self.directory.join(format!("{}.yml", binding_id)))
    }
}

/// Render objects as YAML documents separated by `---`
pub fn to_yaml_documents(objects: &[RoutingObject]) -> Result<String, ProxyError> {
    let mut documents = String::new();
    for object in objects {
        let document = serde_yaml::to_string(object)
            .map_err(|e| ProxyError::ConfigStore(format!("Failed to render {}: {}", object.kind, e)))?;
        documents.push_str("---\n");
        documents.push_str(&document);
    }
    Ok(documents)
}

#[async_trait]
impl ConfigStore for FileConfigStore {
    async fn create_routing_objects(
        &self,
        binding_id: &str,
        objects: &[RoutingObject],
    ) -> Result<(), ProxyError> {
        let path = self.binding_file(binding_id)?;
        let documents = to_yaml_documents(objects)?;

        tokio::fs::create_dir_all(&self.directory).await.map_err(|e| {
            ProxyError::ConfigStore(format!(
                "Failed to create {}: {}",
                self.directory.display(),
                e
            ))
        })?;
        tokio::fs::write(&path, documents).await.map_err(|e| {
            ProxyError::ConfigStore(format!("Failed to write {}: {}", path.display(), e))
        })?;

        info!(
            binding_id = %binding_id,
            objects = objects.len(),
            path = %path.display(),
            "Routing objects written"
        );
        Ok(())
    }

    async fn delete_binding(&self, binding_id: &str) -> Result<(), ProxyError> {
        let path = self.binding_file(binding_id)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                info!(binding_id = %binding_id, path = %path.display(), "Routing objects removed");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(binding_id = %binding_id, "No routing objects to remove");
                Ok(())
            }
            Err(e) => Err(ProxyError::ConfigStore(format!(
                "Failed to remove {}: {}",
                path.display(),
                e
            ))),
        }
    }
}
