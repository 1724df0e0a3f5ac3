use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};
use utilities::logger::{instrument, tracing};

use crate::cluster::Cluster;
use crate::cluster::datanode::NodeId;
use crate::error::NamenodeError;

pub trait PlacementPolicy {
    /// picks up to `count` distinct node ids to hold copies of one block
    fn select_replicas(
        &mut self,
        cluster: &Cluster,
        count: usize,
    ) -> Result<Vec<NodeId>, NamenodeError>;
}

/// Shuffle and take. Every registered node is a candidate, dead ones
/// included; liveness gaps are healed later by the heartbeat repair pass.
pub struct RandomPlacement {
    rng: StdRng,
}

impl RandomPlacement {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomPlacement {
    fn default() -> Self {
        Self::new()
    }
}

impl PlacementPolicy for RandomPlacement {
    #[instrument(name = "policy_select_replicas", skip(self, cluster))]
    fn select_replicas(
        &mut self,
        cluster: &Cluster,
        count: usize,
    ) -> Result<Vec<NodeId>, NamenodeError> {
        let mut candidates = cluster.node_ids();
        if candidates.is_empty() {
            return Err(NamenodeError::EmptyCluster);
        }
        candidates.shuffle(&mut self.rng);
        candidates.truncate(count);
        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selects_distinct_valid_ids() {
        let cluster = Cluster::with_nodes(5);
        let mut policy = RandomPlacement::with_seed(7);
        for _ in 0..20 {
            let mut replicas = policy.select_replicas(&cluster, 3).unwrap();
            assert_eq!(replicas.len(), 3);
            replicas.sort_unstable();
            replicas.dedup();
            assert_eq!(replicas.len(), 3);
            assert!(replicas.iter().all(|&id| cluster.is_valid(id)));
        }
    }

    #[test]
    fn clamps_to_available_nodes() {
        let cluster = Cluster::with_nodes(2);
        let mut policy = RandomPlacement::with_seed(7);
        let replicas = policy.select_replicas(&cluster, 5).unwrap();
        assert_eq!(replicas.len(), 2);
    }

    #[test]
    fn dead_nodes_stay_eligible() {
        let mut cluster = Cluster::with_nodes(3);
        cluster.kill_node(0).unwrap();
        cluster.kill_node(1).unwrap();
        cluster.kill_node(2).unwrap();
        let mut policy = RandomPlacement::with_seed(7);
        assert_eq!(policy.select_replicas(&cluster, 2).unwrap().len(), 2);
    }

    #[test]
    fn empty_cluster_is_an_error() {
        let cluster = Cluster::new();
        let mut policy = RandomPlacement::with_seed(7);
        assert_eq!(
            policy.select_replicas(&cluster, 2),
            Err(NamenodeError::EmptyCluster)
        );
    }
}
