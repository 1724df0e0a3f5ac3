use crate::block::BlockPayload;

pub type NodeId = u64;

/// Simulated datanode: an alive flag plus the payload copies it holds, in
/// the order they arrived. Payloads are raw bytes, the node knows nothing
/// about which file or block they belong to.
#[derive(Debug, Clone)]
pub struct DataNode {
    pub id: NodeId,
    pub alive: bool,
    payloads: Vec<BlockPayload>,
}

impl DataNode {
    pub fn new(id: NodeId) -> Self {
        Self {
            id,
            alive: true,
            payloads: vec![],
        }
    }
    pub fn store_payload(&mut self, payload: BlockPayload) {
        self.payloads.push(payload);
    }
    /// drops a single copy, the earliest match wins; duplicates with the
    /// same bytes stay behind
    pub fn remove_payload(&mut self, payload: &[u8]) -> bool {
        if let Some(position) = self
            .payloads
            .iter()
            .position(|stored| stored.as_slice() == payload)
        {
            self.payloads.remove(position);
            return true;
        }
        false
    }
    pub fn find_payload(&self, payload: &[u8]) -> Option<&BlockPayload> {
        self.payloads
            .iter()
            .find(|stored| stored.as_slice() == payload)
    }
    pub fn holds_payload(&self, payload: &[u8]) -> bool {
        self.find_payload(payload).is_some()
    }
    /// most recently stored copy first, used when draining a donor during
    /// rebalancing
    pub fn take_last_payload(&mut self) -> Option<BlockPayload> {
        self.payloads.pop()
    }
    pub fn payload_count(&self) -> usize {
        self.payloads.len()
    }
    pub fn payloads(&self) -> &[BlockPayload] {
        &self.payloads
    }
    /// replaces the payload list wholesale, used when reloading persisted
    /// state at startup
    pub fn seed(&mut self, payloads: Vec<BlockPayload>) {
        self.payloads = payloads;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remove_payload_drops_one_copy_per_call() {
        let mut node = DataNode::new(0);
        node.store_payload(b"Hell".to_vec());
        node.store_payload(b"Hell".to_vec());
        assert!(node.remove_payload(b"Hell"));
        assert_eq!(node.payload_count(), 1);
        assert!(node.holds_payload(b"Hell"));
        assert!(node.remove_payload(b"Hell"));
        assert!(!node.remove_payload(b"Hell"));
        assert_eq!(node.payload_count(), 0);
    }

    #[test]
    fn take_last_payload_is_most_recent_first() {
        let mut node = DataNode::new(0);
        node.store_payload(b"aa".to_vec());
        node.store_payload(b"bb".to_vec());
        assert_eq!(node.take_last_payload(), Some(b"bb".to_vec()));
        assert_eq!(node.take_last_payload(), Some(b"aa".to_vec()));
        assert_eq!(node.take_last_payload(), None);
    }
}
