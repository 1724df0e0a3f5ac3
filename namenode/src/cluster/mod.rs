pub mod datanode;

use std::collections::BTreeMap;

use crate::cluster::datanode::{DataNode, NodeId};
use crate::error::NamenodeError;

/// The set of registered datanodes. Ids are handed out monotonically and
/// never reused, so removing a node leaves a hole in the id space instead
/// of renumbering the survivors.
#[derive(Debug, Clone, Default)]
pub struct Cluster {
    nodes: BTreeMap<NodeId, DataNode>,
    next_id: NodeId,
}

impl Cluster {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn with_nodes(count: usize) -> Self {
        let mut cluster = Self::new();
        for _ in 0..count {
            cluster.add_node();
        }
        cluster
    }
    pub fn add_node(&mut self) -> NodeId {
        let node_id = self.next_id;
        self.next_id += 1;
        self.nodes.insert(node_id, DataNode::new(node_id));
        node_id
    }
    pub fn remove_node(&mut self, node_id: NodeId) -> Result<DataNode, NamenodeError> {
        self.nodes
            .remove(&node_id)
            .ok_or(NamenodeError::InvalidNode(node_id))
    }
    pub fn kill_node(&mut self, node_id: NodeId) -> Result<(), NamenodeError> {
        match self.nodes.get_mut(&node_id) {
            Some(node) => {
                node.alive = false;
                Ok(())
            }
            None => Err(NamenodeError::InvalidNode(node_id)),
        }
    }
    pub fn recover_node(&mut self, node_id: NodeId) -> Result<(), NamenodeError> {
        match self.nodes.get_mut(&node_id) {
            Some(node) => {
                node.alive = true;
                Ok(())
            }
            None => Err(NamenodeError::InvalidNode(node_id)),
        }
    }
    pub fn is_valid(&self, node_id: NodeId) -> bool {
        self.nodes.contains_key(&node_id)
    }
    pub fn is_alive(&self, node_id: NodeId) -> bool {
        self.nodes.get(&node_id).map(|node| node.alive).unwrap_or(false)
    }
    pub fn node(&self, node_id: NodeId) -> Option<&DataNode> {
        self.nodes.get(&node_id)
    }
    pub fn node_mut(&mut self, node_id: NodeId) -> Option<&mut DataNode> {
        self.nodes.get_mut(&node_id)
    }
    /// ascending id order
    pub fn nodes(&self) -> impl Iterator<Item = &DataNode> {
        self.nodes.values()
    }
    pub fn node_ids(&self) -> Vec<NodeId> {
        self.nodes.keys().copied().collect()
    }
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
    pub fn alive_node_count(&self) -> usize {
        self.nodes.values().filter(|node| node.alive).count()
    }
}
