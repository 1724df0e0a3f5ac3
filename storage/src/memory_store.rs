use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::persistence::{MetadataSnapshot, PersistenceStore, Result};

/// Keeps everything in process memory. Clones share the same maps, so a
/// test can hand one clone to the recorder and inspect the other.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    nodes: Arc<Mutex<HashMap<u64, Vec<Vec<u8>>>>>,
    metadata: Arc<Mutex<Option<MetadataSnapshot>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
    pub async fn node_payloads(&self, node_id: u64) -> Vec<Vec<u8>> {
        self.nodes
            .lock()
            .await
            .get(&node_id)
            .cloned()
            .unwrap_or_default()
    }
    pub async fn metadata(&self) -> Option<MetadataSnapshot> {
        self.metadata.lock().await.clone()
    }
}

#[async_trait]
impl PersistenceStore for MemoryStore {
    async fn save_node(&self, node_id: u64, payloads: &[Vec<u8>]) -> Result<()> {
        self.nodes.lock().await.insert(node_id, payloads.to_vec());
        Ok(())
    }
    async fn load_node(&self, node_id: u64) -> Result<Vec<Vec<u8>>> {
        Ok(self
            .nodes
            .lock()
            .await
            .get(&node_id)
            .cloned()
            .unwrap_or_default())
    }
    async fn remove_node(&self, node_id: u64) -> Result<()> {
        self.nodes.lock().await.remove(&node_id);
        Ok(())
    }
    async fn save_metadata(&self, snapshot: &MetadataSnapshot) -> Result<()> {
        *self.metadata.lock().await = Some(snapshot.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::tests::persistence_store_test;
    #[tokio::test]
    async fn memory_store_test() -> Result<()> {
        persistence_store_test(MemoryStore::new()).await
    }
}
