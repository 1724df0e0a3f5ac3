use storage::persistence::{MetadataSnapshot, PersistenceStore};
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::task::JoinHandle;
use utilities::logger::error;

use crate::block::BlockPayload;
use crate::cluster::datanode::NodeId;
use crate::namenode_state::NamenodeState;

#[derive(Debug, Clone)]
pub enum PersistJob {
    Node {
        node_id: NodeId,
        payloads: Vec<BlockPayload>,
    },
    NodeRemoved {
        node_id: NodeId,
    },
    Metadata(MetadataSnapshot),
}

/// Hands persistence work to a dedicated writer task. The channel is
/// unbounded and `record` never blocks, so callers enqueue snapshots while
/// still holding the state lock and the writer sees them in mutation order.
/// The disk writes happen on the other side, one job at a time.
#[derive(Clone)]
pub struct Recorder {
    producer: UnboundedSender<PersistJob>,
}

/// Join handle for the writer task. The writer exits once every `Recorder`
/// clone has been dropped and the queue is drained, so jobs accepted before
/// that point are all written by the time `shutdown` returns.
pub struct RecorderHandle {
    handle: JoinHandle<()>,
}

impl RecorderHandle {
    pub async fn shutdown(self) {
        if let Err(e) = self.handle.await {
            error!(error = %e, "persistence writer ended abnormally");
        }
    }
}

impl Recorder {
    pub fn start(store: Box<dyn PersistenceStore + Send + Sync>) -> (Self, RecorderHandle) {
        let (tx, mut rx) = mpsc::unbounded_channel::<PersistJob>();
        let handle = tokio::spawn(async move {
            while let Some(job) = rx.recv().await {
                let outcome = match &job {
                    PersistJob::Node { node_id, payloads } => {
                        store.save_node(*node_id, payloads).await
                    }
                    PersistJob::NodeRemoved { node_id } => store.remove_node(*node_id).await,
                    PersistJob::Metadata(snapshot) => store.save_metadata(snapshot).await,
                };
                if let Err(e) = outcome {
                    error!(error = %e, "Error while persisting state change");
                }
            }
        });
        (Self { producer: tx }, RecorderHandle { handle })
    }
    pub fn record(&self, jobs: Vec<PersistJob>) {
        for job in jobs {
            if let Err(e) = self.producer.send(job) {
                error!(error = %e, "Error while sending job to persistence writer");
            }
        }
    }
}

/// full picture of the current state: one job per node plus the directory
/// snapshot
pub fn snapshot_jobs(state: &NamenodeState) -> Vec<PersistJob> {
    let mut jobs: Vec<PersistJob> = state
        .cluster
        .nodes()
        .map(|node| PersistJob::Node {
            node_id: node.id,
            payloads: node.payloads().to_vec(),
        })
        .collect();
    jobs.push(PersistJob::Metadata(state.into()));
    jobs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{Block, FileEntry};
    use storage::memory_store::MemoryStore;

    #[tokio::test]
    async fn writer_applies_jobs_in_submission_order() {
        let store = MemoryStore::new();
        let (recorder, writer) = Recorder::start(Box::new(store.clone()));
        recorder.record(vec![
            PersistJob::Node {
                node_id: 0,
                payloads: vec![b"Hell".to_vec()],
            },
            PersistJob::Node {
                node_id: 0,
                payloads: vec![b"Hell".to_vec(), b"oWor".to_vec()],
            },
        ]);
        drop(recorder);
        writer.shutdown().await;
        assert_eq!(
            store.node_payloads(0).await,
            vec![b"Hell".to_vec(), b"oWor".to_vec()]
        );
    }

    #[tokio::test]
    async fn shutdown_flushes_every_accepted_job() {
        let store = MemoryStore::new();
        let (recorder, writer) = Recorder::start(Box::new(store.clone()));
        // nothing here yields, so the whole backlog is still queued when the
        // last sender drops
        for node_id in 0..100u64 {
            recorder.record(vec![PersistJob::Node {
                node_id,
                payloads: vec![b"Hell".to_vec()],
            }]);
        }
        drop(recorder);
        writer.shutdown().await;
        for node_id in 0..100u64 {
            assert_eq!(store.node_payloads(node_id).await, vec![b"Hell".to_vec()]);
        }
    }

    #[tokio::test]
    async fn snapshot_jobs_cover_every_node_and_the_directory() {
        let mut state = NamenodeState::with_nodes(2);
        let mut entry = FileEntry::new("a.txt");
        let mut block = Block::new(b"Hell".to_vec());
        if let Some(node) = state.cluster.node_mut(1) {
            node.store_payload(b"Hell".to_vec());
        }
        block.add_replica(1);
        entry.blocks.push(block);
        state.directory.insert(entry);

        let jobs = snapshot_jobs(&state);
        assert_eq!(jobs.len(), 3);

        let store = MemoryStore::new();
        let (recorder, writer) = Recorder::start(Box::new(store.clone()));
        recorder.record(jobs);
        drop(recorder);
        writer.shutdown().await;
        assert!(store.node_payloads(0).await.is_empty());
        assert_eq!(store.node_payloads(1).await, vec![b"Hell".to_vec()]);
        let metadata = store.metadata().await.unwrap();
        assert_eq!(metadata.files.len(), 1);
        assert_eq!(metadata.files[0].blocks[0].replicas, vec![1]);
    }
}
