use utilities::logger::{info, instrument, tracing};

use crate::cluster::datanode::NodeId;
use crate::error::NamenodeError;
use crate::namenode_state::NamenodeState;

/// Repair and rebalancing sweeps over the whole state. Pure in memory
/// work, persistence is the caller's problem.
pub struct ReplicationEngine {
    replication_factor: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RepairSummary {
    /// replica ids dropped because their node no longer exists
    pub purged_replicas: usize,
    /// copies written to alive nodes to get blocks back to the factor
    pub restored_replicas: usize,
}

impl RepairSummary {
    pub fn changed(&self) -> bool {
        self.purged_replicas > 0 || self.restored_replicas > 0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RebalanceSummary {
    pub donor: Option<NodeId>,
    pub moved_payloads: usize,
    pub filled_replicas: usize,
}

impl ReplicationEngine {
    pub fn new(replication_factor: usize) -> Self {
        Self { replication_factor }
    }
    pub fn replication_factor(&self) -> usize {
        self.replication_factor
    }

    /// One repair sweep: drop replica ids pointing at removed nodes, then
    /// top every block back up to the replication factor using alive
    /// nodes in ascending id order. Dead node ids stay listed, those
    /// copies come back when the node recovers.
    #[instrument(name = "replication_repair_pass", skip(self, state))]
    pub fn repair_pass(&self, state: &mut NamenodeState) -> RepairSummary {
        let mut summary = RepairSummary::default();
        let NamenodeState { cluster, directory } = state;
        let candidates = cluster.node_ids();
        for entry in directory.entries_mut() {
            for block in entry.blocks.iter_mut() {
                let before = block.replicas.len();
                block.replicas.retain(|&id| cluster.is_valid(id));
                summary.purged_replicas += before - block.replicas.len();

                let mut alive = block
                    .replicas
                    .iter()
                    .filter(|&&id| cluster.is_alive(id))
                    .count();
                if alive >= self.replication_factor {
                    continue;
                }
                for &candidate in &candidates {
                    if alive >= self.replication_factor {
                        break;
                    }
                    if !cluster.is_alive(candidate) || block.has_replica(candidate) {
                        continue;
                    }
                    if let Some(node) = cluster.node_mut(candidate) {
                        node.store_payload(block.payload.clone());
                        block.add_replica(candidate);
                        alive += 1;
                        summary.restored_replicas += 1;
                    }
                }
            }
        }
        if summary.changed() {
            info!(
                purged = summary.purged_replicas,
                restored = summary.restored_replicas,
                "repair pass adjusted replica placement"
            );
        }
        summary
    }

    /// Runs when a node joins. First the most loaded old node donates half
    /// of its copies, newest first, and the owning blocks are repointed.
    /// Then the new node lends itself to blocks still short of the factor.
    #[instrument(name = "replication_rebalance", skip(self, state))]
    pub fn rebalance(
        &self,
        state: &mut NamenodeState,
        new_node: NodeId,
    ) -> Result<RebalanceSummary, NamenodeError> {
        if !state.cluster.is_valid(new_node) {
            return Err(NamenodeError::InvalidNode(new_node));
        }
        let mut summary = RebalanceSummary::default();
        let NamenodeState { cluster, directory } = state;

        // strictly most loaded wins, ties go to the lowest id
        let mut donor_load = 0;
        for node in cluster.nodes() {
            if node.id == new_node {
                continue;
            }
            if node.payload_count() > donor_load {
                donor_load = node.payload_count();
                summary.donor = Some(node.id);
            }
        }
        if let Some(donor_id) = summary.donor {
            for _ in 0..donor_load / 2 {
                let payload = match cluster
                    .node_mut(donor_id)
                    .and_then(|node| node.take_last_payload())
                {
                    Some(v) => v,
                    None => break,
                };
                if let Some(node) = cluster.node_mut(new_node) {
                    node.store_payload(payload.clone());
                }
                summary.moved_payloads += 1;
                // repoint the owning block at its new home
                'files: for entry in directory.entries_mut() {
                    for block in entry.blocks.iter_mut() {
                        if block.payload == payload
                            && block.has_replica(donor_id)
                            && !block.has_replica(new_node)
                        {
                            block.remove_replica(donor_id);
                            block.add_replica(new_node);
                            break 'files;
                        }
                    }
                }
            }
        }
        for entry in directory.entries_mut() {
            for block in entry.blocks.iter_mut() {
                if block.replicas.len() >= self.replication_factor || block.has_replica(new_node) {
                    continue;
                }
                if let Some(node) = cluster.node_mut(new_node) {
                    node.store_payload(block.payload.clone());
                    block.add_replica(new_node);
                    summary.filled_replicas += 1;
                }
            }
        }
        info!(
            donor = ?summary.donor,
            moved = summary.moved_payloads,
            filled = summary.filled_replicas,
            "rebalanced cluster onto new node"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{Block, FileEntry};

    fn place_block(state: &mut NamenodeState, filename: &str, payload: &[u8], replicas: &[NodeId]) {
        let mut entry = state
            .directory
            .remove(filename)
            .unwrap_or_else(|| FileEntry::new(filename));
        let mut block = Block::new(payload.to_vec());
        for &node_id in replicas {
            if let Some(node) = state.cluster.node_mut(node_id) {
                node.store_payload(payload.to_vec());
            }
            block.add_replica(node_id);
        }
        entry.blocks.push(block);
        state.directory.insert(entry);
    }

    fn block_replicas(state: &NamenodeState, filename: &str, order: usize) -> Vec<NodeId> {
        state.directory.get(filename).unwrap().blocks[order]
            .replicas
            .clone()
    }

    #[test]
    fn repair_restores_alive_replicas_to_the_factor() {
        let engine = ReplicationEngine::new(2);
        let mut state = NamenodeState::with_nodes(3);
        place_block(&mut state, "a.txt", b"Hell", &[0, 1]);
        state.cluster.kill_node(1).unwrap();

        let summary = engine.repair_pass(&mut state);
        assert_eq!(summary.restored_replicas, 1);
        assert_eq!(summary.purged_replicas, 0);
        // dead id 1 stays listed, node 2 picked up the slack
        assert_eq!(block_replicas(&state, "a.txt", 0), vec![0, 1, 2]);
        assert!(state.cluster.node(2).unwrap().holds_payload(b"Hell"));
    }

    #[test]
    fn repair_purges_ids_of_removed_nodes() {
        let engine = ReplicationEngine::new(2);
        let mut state = NamenodeState::with_nodes(3);
        place_block(&mut state, "a.txt", b"Hell", &[0, 1]);
        state.cluster.remove_node(1).unwrap();

        let summary = engine.repair_pass(&mut state);
        assert_eq!(summary.purged_replicas, 1);
        assert_eq!(summary.restored_replicas, 1);
        assert_eq!(block_replicas(&state, "a.txt", 0), vec![0, 2]);
    }

    #[test]
    fn repair_caps_at_the_alive_node_count() {
        let engine = ReplicationEngine::new(2);
        let mut state = NamenodeState::with_nodes(3);
        place_block(&mut state, "a.txt", b"Hell", &[1]);
        state.cluster.kill_node(1).unwrap();
        state.cluster.kill_node(2).unwrap();

        let summary = engine.repair_pass(&mut state);
        assert_eq!(summary.restored_replicas, 1);
        let replicas = block_replicas(&state, "a.txt", 0);
        let alive = replicas
            .iter()
            .filter(|&&id| state.cluster.is_alive(id))
            .count();
        assert_eq!(alive, 1);
        assert_eq!(replicas, vec![1, 0]);
    }

    #[test]
    fn repair_is_idempotent_once_balanced() {
        let engine = ReplicationEngine::new(2);
        let mut state = NamenodeState::with_nodes(3);
        place_block(&mut state, "a.txt", b"Hell", &[0, 1]);
        state.cluster.kill_node(0).unwrap();

        assert!(engine.repair_pass(&mut state).changed());
        assert!(!engine.repair_pass(&mut state).changed());
    }

    #[test]
    fn rebalance_moves_half_the_donor_load_newest_first() {
        let engine = ReplicationEngine::new(1);
        let mut state = NamenodeState::with_nodes(3);
        for order in 0..6u8 {
            place_block(&mut state, "data.bin", &[b'b', b'0' + order], &[0]);
        }
        let new_node = state.cluster.add_node();

        let summary = engine.rebalance(&mut state, new_node).unwrap();
        assert_eq!(summary.donor, Some(0));
        assert_eq!(summary.moved_payloads, 3);
        assert_eq!(summary.filled_replicas, 0);
        assert_eq!(state.cluster.node(0).unwrap().payload_count(), 3);
        assert_eq!(state.cluster.node(new_node).unwrap().payload_count(), 3);
        // newest copies moved, so the last three blocks changed homes
        for order in 0..3 {
            assert_eq!(block_replicas(&state, "data.bin", order), vec![0]);
        }
        for order in 3..6 {
            assert_eq!(block_replicas(&state, "data.bin", order), vec![new_node]);
        }
    }

    #[test]
    fn rebalance_fill_phase_tops_up_short_blocks() {
        let engine = ReplicationEngine::new(2);
        let mut state = NamenodeState::with_nodes(3);
        for order in 0..6u8 {
            place_block(&mut state, "data.bin", &[b'b', b'0' + order], &[0]);
        }
        let new_node = state.cluster.add_node();

        let summary = engine.rebalance(&mut state, new_node).unwrap();
        assert_eq!(summary.moved_payloads, 3);
        // donated blocks already list the new node, only the ones left on
        // the donor gain a second copy
        assert_eq!(summary.filled_replicas, 3);
        assert_eq!(state.cluster.node(new_node).unwrap().payload_count(), 6);
        for order in 0..3 {
            assert_eq!(block_replicas(&state, "data.bin", order), vec![0, new_node]);
        }
        for order in 3..6 {
            assert_eq!(block_replicas(&state, "data.bin", order), vec![new_node]);
        }
    }

    #[test]
    fn rebalance_tie_breaks_on_the_lowest_node_id() {
        let engine = ReplicationEngine::new(1);
        let mut state = NamenodeState::with_nodes(3);
        place_block(&mut state, "a.txt", b"aa", &[1]);
        place_block(&mut state, "a.txt", b"bb", &[1]);
        place_block(&mut state, "b.txt", b"cc", &[2]);
        place_block(&mut state, "b.txt", b"dd", &[2]);
        let new_node = state.cluster.add_node();

        let summary = engine.rebalance(&mut state, new_node).unwrap();
        assert_eq!(summary.donor, Some(1));
        assert_eq!(summary.moved_payloads, 1);
    }

    #[test]
    fn rebalance_with_an_empty_cluster_load_has_no_donor() {
        let engine = ReplicationEngine::new(2);
        let mut state = NamenodeState::with_nodes(2);
        let new_node = state.cluster.add_node();

        let summary = engine.rebalance(&mut state, new_node).unwrap();
        assert_eq!(summary.donor, None);
        assert_eq!(summary.moved_payloads, 0);
        assert_eq!(summary.filled_replicas, 0);
    }

    #[test]
    fn rebalance_rejects_unknown_nodes() {
        let engine = ReplicationEngine::new(2);
        let mut state = NamenodeState::with_nodes(2);
        assert_eq!(
            engine.rebalance(&mut state, 9),
            Err(NamenodeError::InvalidNode(9))
        );
    }

    #[test]
    fn rebalance_repoints_one_block_per_moved_copy_for_duplicate_payloads() {
        let engine = ReplicationEngine::new(1);
        let mut state = NamenodeState::with_nodes(1);
        place_block(&mut state, "a.txt", b"Hell", &[0]);
        place_block(&mut state, "b.txt", b"Hell", &[0]);
        let new_node = state.cluster.add_node();

        let summary = engine.rebalance(&mut state, new_node).unwrap();
        assert_eq!(summary.moved_payloads, 1);
        // exactly one of the two identical blocks changed homes
        let moved = [
            block_replicas(&state, "a.txt", 0),
            block_replicas(&state, "b.txt", 0),
        ];
        assert!(moved.contains(&vec![new_node]));
        assert!(moved.contains(&vec![0]));
        assert_eq!(state.cluster.node(0).unwrap().payload_count(), 1);
        assert_eq!(state.cluster.node(new_node).unwrap().payload_count(), 1);
    }
}
