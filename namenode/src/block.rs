use crate::cluster::datanode::NodeId;

pub type BlockPayload = Vec<u8>;

/// One fixed size piece of a file plus the ids of the datanodes holding a
/// copy. Replica ids stay in the order they were assigned.
#[derive(Debug, Clone)]
pub struct Block {
    pub payload: BlockPayload,
    pub replicas: Vec<NodeId>,
}

impl Block {
    pub fn new(payload: BlockPayload) -> Self {
        Self {
            payload,
            replicas: vec![],
        }
    }
    pub fn has_replica(&self, node_id: NodeId) -> bool {
        self.replicas.contains(&node_id)
    }
    /// no duplicates, a node holds at most one listed copy of a block
    pub fn add_replica(&mut self, node_id: NodeId) -> bool {
        if self.has_replica(node_id) {
            return false;
        }
        self.replicas.push(node_id);
        true
    }
    pub fn remove_replica(&mut self, node_id: NodeId) -> bool {
        let before = self.replicas.len();
        self.replicas.retain(|&id| id != node_id);
        self.replicas.len() != before
    }
}

#[derive(Debug, Clone)]
pub struct FileEntry {
    pub filename: String,
    pub blocks: Vec<Block>,
}

impl FileEntry {
    pub fn new(filename: &str) -> Self {
        Self {
            filename: filename.to_owned(),
            blocks: vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replica_list_rejects_duplicates() {
        let mut block = Block::new(b"Hell".to_vec());
        assert!(block.add_replica(2));
        assert!(!block.add_replica(2));
        assert_eq!(block.replicas, vec![2]);
    }

    #[test]
    fn remove_replica_reports_whether_it_was_listed() {
        let mut block = Block::new(b"Hell".to_vec());
        block.add_replica(0);
        block.add_replica(5);
        assert!(block.remove_replica(0));
        assert!(!block.remove_replica(0));
        assert_eq!(block.replicas, vec![5]);
    }
}
