use storage::persistence::{BlockRecord, FileRecord, MetadataSnapshot};

use crate::cluster::Cluster;
use crate::cluster::datanode::NodeId;
use crate::directory::FileDirectory;

/// Everything the namenode knows, owned as one value behind a single lock
/// so cluster membership and directory metadata can never drift apart
/// mid operation.
#[derive(Debug, Clone, Default)]
pub struct NamenodeState {
    pub cluster: Cluster,
    pub directory: FileDirectory,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeStatus {
    pub id: NodeId,
    pub alive: bool,
    pub payload_count: usize,
}

impl NamenodeState {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn with_nodes(count: usize) -> Self {
        Self {
            cluster: Cluster::with_nodes(count),
            directory: FileDirectory::new(),
        }
    }
    /// scrubs a departed node id from every block's replica list, returns
    /// how many listings were dropped
    pub fn strip_replica(&mut self, node_id: NodeId) -> usize {
        let mut stripped = 0;
        for entry in self.directory.entries_mut() {
            for block in entry.blocks.iter_mut() {
                if block.remove_replica(node_id) {
                    stripped += 1;
                }
            }
        }
        stripped
    }
    pub fn node_report(&self) -> Vec<NodeStatus> {
        self.cluster
            .nodes()
            .map(|node| NodeStatus {
                id: node.id,
                alive: node.alive,
                payload_count: node.payload_count(),
            })
            .collect()
    }
}

impl Into<MetadataSnapshot> for &NamenodeState {
    fn into(self) -> MetadataSnapshot {
        MetadataSnapshot::new(
            self.directory
                .entries()
                .map(|entry| FileRecord {
                    filename: entry.filename.clone(),
                    blocks: entry
                        .blocks
                        .iter()
                        .map(|block| BlockRecord {
                            payload: block.payload.clone(),
                            replicas: block.replicas.clone(),
                        })
                        .collect(),
                })
                .collect(),
        )
    }
}
