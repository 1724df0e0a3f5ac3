use std::sync::Arc;

use tokio::sync::Mutex;
use utilities::logger::{info, instrument, trace, tracing};

use crate::{
    block::{Block, FileEntry},
    block_splitter::{BlockSplitter, FixedSizeSplitter},
    cluster::datanode::NodeId,
    directory::{FileMetadata, FileSummary},
    error::NamenodeError,
    namenode_state::{NamenodeState, NodeStatus},
    placement::{PlacementPolicy, RandomPlacement},
    recorder::{PersistJob, Recorder, snapshot_jobs},
    replication::{RebalanceSummary, ReplicationEngine},
};

pub struct ReadOutcome {
    pub content: Vec<u8>,
    /// blocks with no valid alive replica holding a matching copy
    pub missing_blocks: usize,
}

/// Front door for every client facing operation. Mutations follow one
/// shape: lock the state, change it, enqueue the snapshot before the guard
/// is released. The send never blocks, so the recorder receives snapshots
/// in the same order the state changed and writes the newest one last.
pub struct ClientHandler {
    state: Arc<Mutex<NamenodeState>>,
    block_splitter: Box<dyn BlockSplitter + Send + Sync>,
    placement: Mutex<Box<dyn PlacementPolicy + Send + Sync>>,
    replication: ReplicationEngine,
    recorder: Recorder,
}

impl ClientHandler {
    pub fn new(
        state: Arc<Mutex<NamenodeState>>,
        block_size: usize,
        replication_factor: usize,
        recorder: Recorder,
    ) -> Self {
        Self {
            state,
            block_splitter: Box::new(FixedSizeSplitter::new(block_size)),
            placement: Mutex::new(Box::new(RandomPlacement::new())),
            replication: ReplicationEngine::new(replication_factor),
            recorder,
        }
    }

    /// Splits the content, places every block on randomly chosen nodes and
    /// registers the file. Storing a name that already exists replaces its
    /// directory entry wholesale; the old payload copies stay on their
    /// nodes until a later delete matches them away.
    #[instrument(name = "client_store_file", skip(self, content), fields(content_len = content.len()))]
    pub async fn upload(&self, filename: &str, content: &[u8]) -> Result<usize, NamenodeError> {
        let payloads = self.block_splitter.split(content);
        trace!(blocks = payloads.len(), "split content into blocks");
        let mut state = self.state.lock().await;
        let mut placement = self.placement.lock().await;
        let mut entry = FileEntry::new(filename);
        for payload in payloads {
            let replicas = placement
                .select_replicas(&state.cluster, self.replication.replication_factor())?;
            let mut block = Block::new(payload);
            for &node_id in &replicas {
                if let Some(node) = state.cluster.node_mut(node_id) {
                    node.store_payload(block.payload.clone());
                    block.add_replica(node_id);
                }
            }
            entry.blocks.push(block);
        }
        let block_count = entry.blocks.len();
        if state.directory.insert(entry).is_some() {
            info!(%filename, "replaced existing entry, overwritten payloads stay on their nodes");
        }
        self.recorder.record(snapshot_jobs(&state));
        info!(%filename, block_count, "stored file");
        Ok(block_count)
    }

    /// Serves each block from the first listed replica that is valid,
    /// alive and actually holds a matching copy. Blocks with no such
    /// replica are skipped and counted instead of failing the read.
    #[instrument(name = "client_fetch_file", skip(self))]
    pub async fn read(&self, filename: &str) -> Result<ReadOutcome, NamenodeError> {
        let state = self.state.lock().await;
        let entry = match state.directory.get(filename) {
            Some(v) => v,
            None => return Err(NamenodeError::FileNotFound(filename.to_owned())),
        };
        let mut content = vec![];
        let mut missing_blocks = 0;
        for block in &entry.blocks {
            let served = block.replicas.iter().find_map(|&node_id| {
                state
                    .cluster
                    .node(node_id)
                    .filter(|node| node.alive)
                    .and_then(|node| node.find_payload(&block.payload))
            });
            match served {
                Some(payload) => content.extend_from_slice(payload),
                None => missing_blocks += 1,
            }
        }
        trace!(bytes = content.len(), missing_blocks, "fetch file request handled");
        Ok(ReadOutcome {
            content,
            missing_blocks,
        })
    }

    /// Unregisters the file and removes one matching payload copy from
    /// every listed node that still exists, dead ones included.
    #[instrument(name = "client_delete_file", skip(self))]
    pub async fn delete(&self, filename: &str) -> Result<(), NamenodeError> {
        let mut state = self.state.lock().await;
        let entry = match state.directory.remove(filename) {
            Some(v) => v,
            None => return Err(NamenodeError::FileNotFound(filename.to_owned())),
        };
        for block in &entry.blocks {
            for &node_id in &block.replicas {
                if let Some(node) = state.cluster.node_mut(node_id) {
                    node.remove_payload(&block.payload);
                }
            }
        }
        self.recorder.record(snapshot_jobs(&state));
        info!(%filename, "deleted file");
        Ok(())
    }

    pub async fn list_files(&self) -> Vec<FileSummary> {
        self.state.lock().await.directory.summaries()
    }

    pub async fn show_metadata(&self, filename: &str) -> Result<FileMetadata, NamenodeError> {
        self.state
            .lock()
            .await
            .directory
            .metadata(filename)
            .ok_or_else(|| NamenodeError::FileNotFound(filename.to_owned()))
    }

    pub async fn node_report(&self) -> Vec<NodeStatus> {
        self.state.lock().await.node_report()
    }

    /// Simulated crash: the node keeps its payloads but stops serving
    /// reads until recovered.
    #[instrument(name = "client_kill_node", skip(self))]
    pub async fn kill_node(&self, node_id: NodeId) -> Result<(), NamenodeError> {
        let mut state = self.state.lock().await;
        state.cluster.kill_node(node_id)?;
        info!(node_id, "marked datanode dead");
        self.recorder.record(snapshot_jobs(&state));
        Ok(())
    }

    #[instrument(name = "client_recover_node", skip(self))]
    pub async fn recover_node(&self, node_id: NodeId) -> Result<(), NamenodeError> {
        let mut state = self.state.lock().await;
        state.cluster.recover_node(node_id)?;
        info!(node_id, "marked datanode alive");
        self.recorder.record(snapshot_jobs(&state));
        Ok(())
    }

    /// Registers a fresh node and immediately rebalances onto it.
    #[instrument(name = "client_add_node", skip(self))]
    pub async fn add_node(&self) -> Result<(NodeId, RebalanceSummary), NamenodeError> {
        let mut state = self.state.lock().await;
        let node_id = state.cluster.add_node();
        let summary = self.replication.rebalance(&mut state, node_id)?;
        self.recorder.record(snapshot_jobs(&state));
        Ok((node_id, summary))
    }

    /// Drops the node and scrubs its id from all metadata. Blocks left
    /// under the factor are healed by the next heartbeat repair pass, not
    /// here.
    #[instrument(name = "client_remove_node", skip(self))]
    pub async fn remove_node(&self, node_id: NodeId) -> Result<(), NamenodeError> {
        let mut state = self.state.lock().await;
        state.cluster.remove_node(node_id)?;
        let stripped = state.strip_replica(node_id);
        info!(node_id, stripped, "removed datanode from cluster");
        let mut jobs = snapshot_jobs(&state);
        jobs.push(PersistJob::NodeRemoved { node_id });
        self.recorder.record(jobs);
        Ok(())
    }
}
