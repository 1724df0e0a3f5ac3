use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::{debug, error, info, instrument};

use crate::persistence::{MetadataSnapshot, PersistenceStore, Result};

/// Lays blocks out under a single root directory:
/// `<root>/nodes/node_<id>.json` for per node payload lists and
/// `<root>/metadata.json` for the directory snapshot.
#[derive(Clone)]
pub struct FileStore {
    root: String,
}

impl FileStore {
    pub fn new(root: &str) -> Result<Self> {
        match std::fs::create_dir_all(format!("{root}/nodes")) {
            Ok(_v) => {
                info!(%root, "Created root for block persistence");
            }
            Err(e) => {
                error!(%root, error = %e, "Error while creating the root for block persistence");
                return Err(e.into());
            }
        }
        Ok(FileStore {
            root: root.to_owned(),
        })
    }
    pub fn cleanup(&self) {
        let _ = std::fs::remove_dir_all(&self.root);
    }
    fn node_path(&self, node_id: u64) -> PathBuf {
        Path::new(&self.root)
            .join("nodes")
            .join(format!("node_{node_id}.json"))
    }
    fn metadata_path(&self) -> PathBuf {
        Path::new(&self.root).join("metadata.json")
    }
}

#[async_trait]
impl PersistenceStore for FileStore {
    #[instrument(name = "file_store_save_node", skip(self, payloads))]
    async fn save_node(&self, node_id: u64, payloads: &[Vec<u8>]) -> Result<()> {
        let encoded = serde_json::to_vec(&payloads)?;
        fs::write(self.node_path(node_id), encoded).await?;
        debug!(node_id, count = payloads.len(), "node payloads persisted");
        Ok(())
    }
    #[instrument(name = "file_store_load_node", skip(self))]
    async fn load_node(&self, node_id: u64) -> Result<Vec<Vec<u8>>> {
        match fs::read(self.node_path(node_id)).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(vec![]),
            Err(e) => Err(e.into()),
        }
    }
    #[instrument(name = "file_store_remove_node", skip(self))]
    async fn remove_node(&self, node_id: u64) -> Result<()> {
        let path = self.node_path(node_id);
        let exists = match fs::try_exists(&path).await {
            Ok(v) => v,
            Err(e) => {
                error!("error while checking if node file exists e : {}", e);
                false
            }
        };
        if exists {
            fs::remove_file(&path).await?;
        }
        Ok(())
    }
    #[instrument(name = "file_store_save_metadata", skip(self, snapshot))]
    async fn save_metadata(&self, snapshot: &MetadataSnapshot) -> Result<()> {
        let encoded = serde_json::to_vec(snapshot)?;
        fs::write(self.metadata_path(), encoded).await?;
        debug!(files = snapshot.files.len(), "metadata snapshot persisted");
        Ok(())
    }
}

#[cfg(test)]
impl Drop for FileStore {
    fn drop(&mut self) {
        self.cleanup();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::tests::persistence_store_test;
    #[tokio::test]
    async fn file_store_test() -> Result<()> {
        let store = FileStore::new("./temp/file_store_test")?;
        persistence_store_test(store).await
    }
}
