use std::time::SystemTime;

use async_trait::async_trait;
use serde::Serialize;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BlockRecord {
    pub payload: Vec<u8>,
    pub replicas: Vec<u64>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FileRecord {
    pub filename: String,
    pub blocks: Vec<BlockRecord>,
}

#[derive(Clone, Debug, Serialize)]
pub struct MetadataSnapshot {
    pub timestamp: SystemTime,
    pub files: Vec<FileRecord>,
}

impl MetadataSnapshot {
    pub fn new(files: Vec<FileRecord>) -> Self {
        Self {
            timestamp: SystemTime::now(),
            files,
        }
    }
}

impl PartialEq for MetadataSnapshot {
    fn eq(&self, other: &Self) -> bool {
        self.files == other.files
    }
}

#[async_trait]
pub trait PersistenceStore {
    /// replaces whatever was stored for this node with the given payload list
    async fn save_node(&self, node_id: u64, payloads: &[Vec<u8>]) -> Result<()>;
    /// nodes that were never saved load as an empty payload list
    async fn load_node(&self, node_id: u64) -> Result<Vec<Vec<u8>>>;
    async fn remove_node(&self, node_id: u64) -> Result<()>;
    /// write only, there is no load counterpart: directory metadata is
    /// rebuilt from scratch on every run
    async fn save_metadata(&self, snapshot: &MetadataSnapshot) -> Result<()>;
}
